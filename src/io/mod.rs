//! Annotation and time series record I/O

pub mod annotation;
pub mod series;

pub use annotation::{read_annotation_file, write_annotation_file, AnnotationParser, AnnotationSet};
pub use series::{read_series_json, read_series_manifests, series_from_annotation_file, write_series_json};
