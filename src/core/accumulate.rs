use crate::core::overlap::DateSpan;
use crate::types::{Episode, EpisodeKind, Interferogram};

/// Parameters shared by the labelling stages
#[derive(Debug, Clone)]
pub struct LabellingParams {
    /// Days per year used to prorate persistent rates
    pub days_per_year: f64,
}

impl Default for LabellingParams {
    fn default() -> Self {
        Self {
            days_per_year: 365.25, // Julian year
        }
    }
}

/// Deformation contributed by one episode to one interferogram
#[derive(Debug, Clone)]
pub struct Contribution<'a> {
    pub episode: &'a Episode,
    pub overlap_days: i64,
    /// Signed deformation in metres, already flipped for backward interferograms
    pub deformation: f64,
}

/// Combines overlapping episodes into one signed deformation magnitude
#[derive(Debug, Clone, Default)]
pub struct DeformationAccumulator {
    params: LabellingParams,
}

impl DeformationAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: LabellingParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &LabellingParams {
        &self.params
    }

    /// Deformation from a single episode over a forward-ordered span.
    ///
    /// Returns `None` when the episode does not overlap the span.
    pub fn contribution(&self, episode: &Episode, span: &DateSpan, backward: bool) -> Option<(i64, f64)> {
        let overlap = span.overlap_days(&episode.window);
        if overlap <= 0 {
            return None;
        }

        let deformation = match episode.kind {
            EpisodeKind::Persistent { rate } => (overlap as f64 / self.params.days_per_year) * rate,
            EpisodeKind::Transient { magnitude } => magnitude,
        };

        Some((overlap, if backward { -deformation } else { deformation }))
    }

    /// Every overlapping episode, persistent first then transient, in list order
    pub fn contributions<'a>(
        &self,
        ifg: &Interferogram,
        persistent: &'a [Episode],
        transient: &'a [Episode],
    ) -> Vec<Contribution<'a>> {
        let span = ifg.span();
        let backward = ifg.is_backward();

        persistent
            .iter()
            .chain(transient.iter())
            .filter_map(|episode| {
                self.contribution(episode, &span, backward)
                    .map(|(overlap_days, deformation)| Contribution {
                        episode,
                        overlap_days,
                        deformation,
                    })
            })
            .collect()
    }

    /// Total signed deformation predicted in `ifg`
    pub fn accumulate(&self, ifg: &Interferogram, persistent: &[Episode], transient: &[Episode]) -> f64 {
        sum_contributions(&self.contributions(ifg, persistent, transient))
    }
}

pub(crate) fn sum_contributions(contributions: &[Contribution<'_>]) -> f64 {
    contributions.iter().fold(0.0, |total, c| total + c.deformation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square() -> Vec<(f64, f64)> {
        vec![(0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0), (0.0, 1.0)]
    }

    fn ifg(name: &str) -> Interferogram {
        Interferogram::from_name(name).unwrap()
    }

    #[test]
    fn test_persistent_is_prorated() {
        let sill = Episode::persistent(0.4, "20141213", "20170706", "sill", square()).unwrap();
        let accumulator = DeformationAccumulator::new();

        let total = accumulator.accumulate(&ifg("20150101_20160101"), &[sill.clone()], &[]);
        assert_relative_eq!(total, 0.4 * 365.0 / 365.25, epsilon = 1e-12);

        // four calendar years contain exactly 4 * 365.25 days
        let long = Episode::persistent(0.4, "20100101", "20200101", "sill", square()).unwrap();
        let total = accumulator.accumulate(&ifg("20120101_20160101"), &[long], &[]);
        assert_relative_eq!(total, 1.6, epsilon = 1e-12);
    }

    #[test]
    fn test_persistent_limited_to_episode_window() {
        let sill = Episode::persistent(0.4, "20141213", "20170706", "sill", square()).unwrap();
        let accumulator = DeformationAccumulator::new();

        // the interferogram runs past the end of the episode
        let total = accumulator.accumulate(&ifg("20170101_20180101"), &[sill], &[]);
        assert_relative_eq!(total, 0.4 * 186.0 / 365.25, epsilon = 1e-12);
    }

    #[test]
    fn test_transient_is_not_prorated() {
        let dyke = Episode::transient(0.7, "20180526", "20180607", "dyke", square()).unwrap();
        let accumulator = DeformationAccumulator::new();

        assert_relative_eq!(accumulator.accumulate(&ifg("20180526_20180713"), &[], &[dyke.clone()]), 0.7);
        assert_relative_eq!(accumulator.accumulate(&ifg("20180606_20180713"), &[], &[dyke.clone()]), 0.7);
        assert_eq!(accumulator.accumulate(&ifg("20180607_20180713"), &[], &[dyke]), 0.0);
    }

    #[test]
    fn test_backward_flips_every_contribution() {
        let sill = Episode::persistent(0.4, "20141213", "20190706", "sill", square()).unwrap();
        let dyke = Episode::transient(0.7, "20180526", "20180607", "dyke", square()).unwrap();
        let persistent = vec![sill];
        let transient = vec![dyke];
        let accumulator = DeformationAccumulator::new();

        let forward = accumulator.accumulate(&ifg("20180101_20180713"), &persistent, &transient);
        let backward = accumulator.accumulate(&ifg("20180713_20180101"), &persistent, &transient);
        assert_relative_eq!(forward, 0.4 * 193.0 / 365.25 + 0.7, epsilon = 1e-12);
        assert_eq!(backward, -forward);

        let contributions = accumulator.contributions(&ifg("20180713_20180101"), &persistent, &transient);
        assert_eq!(contributions.len(), 2);
        assert!(contributions.iter().all(|c| c.deformation < 0.0));
        assert_eq!(contributions[0].overlap_days, 193);
    }

    #[test]
    fn test_no_overlap_contributes_nothing() {
        let sill = Episode::persistent(0.4, "20141213", "20170706", "sill", square()).unwrap();
        let dyke = Episode::transient(0.7, "20180526", "20180607", "dyke", square()).unwrap();
        let accumulator = DeformationAccumulator::new();

        let persistent = [sill];
        let transient = [dyke];
        let contributions = accumulator.contributions(&ifg("20190101_20190301"), &persistent, &transient);
        assert!(contributions.is_empty());
        assert_eq!(sum_contributions(&contributions), 0.0);
    }

    #[test]
    fn test_custom_days_per_year() {
        let sill = Episode::persistent(0.365, "20100101", "20200101", "sill", square()).unwrap();
        let accumulator = DeformationAccumulator::with_params(LabellingParams { days_per_year: 365.0 });
        let total = accumulator.accumulate(&ifg("20150101_20150111"), &[sill], &[]);
        assert_relative_eq!(total, 0.01, epsilon = 1e-12);
    }
}
