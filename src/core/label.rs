use crate::core::accumulate::{sum_contributions, DeformationAccumulator, LabellingParams};
use crate::core::extent::SpatialExtent;
use crate::types::{Episode, Interferogram, Label, VolcnetResult};

/// Labels single interferograms from annotated deformation episodes
#[derive(Debug, Clone, Default)]
pub struct Labeller {
    accumulator: DeformationAccumulator,
}

impl Labeller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: LabellingParams) -> Self {
        Self {
            accumulator: DeformationAccumulator::with_params(params),
        }
    }

    /// Label the interferogram named `YYYYMMDD_YYYYMMDD` (either date order).
    ///
    /// Every episode is validated first, so a window that stops before it
    /// starts is a `DataFormat` error rather than a zero contribution.
    pub fn label(&self, ifg_name: &str, persistent: &[Episode], transient: &[Episode]) -> VolcnetResult<Label> {
        let ifg = Interferogram::from_name(ifg_name)?;
        for episode in persistent.iter().chain(transient.iter()) {
            episode.validate()?;
        }
        Ok(self.label_interferogram(&ifg, persistent, transient))
    }

    /// Label an already parsed interferogram
    pub fn label_interferogram(&self, ifg: &Interferogram, persistent: &[Episode], transient: &[Episode]) -> Label {
        let contributions = self.accumulator.contributions(ifg, persistent, transient);

        let mut sources: Vec<String> = Vec::new();
        let mut extent = SpatialExtent::new();
        for contribution in &contributions {
            let episode = contribution.episode;
            if !sources.iter().any(|s| s == &episode.source) {
                sources.push(episode.source.clone());
            }
            extent.add_footprint(&episode.footprint);
        }

        let magnitude = sum_contributions(&contributions);
        log::debug!(
            "{}: {} contributing episodes, {:.4} m from {:?}",
            ifg,
            contributions.len(),
            magnitude,
            sources
        );

        Label {
            magnitude,
            sources,
            extent: extent.exterior(),
        }
    }
}

/// Label one interferogram with the default parameters
pub fn label(ifg_name: &str, persistent: &[Episode], transient: &[Episode]) -> VolcnetResult<Label> {
    Labeller::new().label(ifg_name, persistent, transient)
}
