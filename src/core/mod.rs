//! Core deformation labelling modules

pub mod overlap;
pub mod accumulate;
pub mod extent;
pub mod label;
pub mod corpus;
pub mod baselines;
pub mod pixel;

// Re-export main types
pub use overlap::{overlap_days, DateSpan};
pub use accumulate::{Contribution, DeformationAccumulator, LabellingParams};
pub use extent::{footprint_polygon, SpatialExtent};
pub use label::{label, Labeller};
pub use corpus::{classify, label_corpus, CorpusLabeller, CorpusLabels, CorpusParams, LabelClass, LabelRow, LabelTable, SeriesCounts};
pub use baselines::{acquisitions_from_ifg_names, baselines_from_names, cumulative_baselines, daisy_chain};
pub use pixel::ll_to_pixel;
