use chrono::NaiveDate;
use ndarray::{s, Array2, Array3};
use serde::{Deserialize, Serialize};

use crate::core::overlap::DateSpan;

/// Date format used for acquisitions and episode windows
pub const DATE_FORMAT: &str = "%Y%m%d";

/// Closed lon/lat vertex ring (clockwise, first vertex repeated last)
pub type Footprint = Vec<(f64, f64)>;

/// Parse an 8-digit `YYYYMMDD` acquisition date
pub fn parse_acquisition_date(raw: &str) -> VolcnetResult<NaiveDate> {
    if raw.len() != 8 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(VolcnetError::DataFormat(format!(
            "invalid date '{}': expected YYYYMMDD",
            raw
        )));
    }

    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|e| {
        VolcnetError::DataFormat(format!("invalid date '{}': {}", raw, e))
    })
}

/// Format a date as `YYYYMMDD`
pub fn format_acquisition_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Interferogram between two acquisitions, in the order they were named
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interferogram {
    pub primary: NaiveDate,
    pub secondary: NaiveDate,
}

impl Interferogram {
    pub fn new(primary: NaiveDate, secondary: NaiveDate) -> Self {
        Self { primary, secondary }
    }

    /// Parse a `YYYYMMDD_YYYYMMDD` name. Either chronological order is accepted.
    pub fn from_name(name: &str) -> VolcnetResult<Self> {
        let (primary, secondary) = name.split_once('_').ok_or_else(|| {
            VolcnetError::DataFormat(format!(
                "invalid interferogram name '{}': expected YYYYMMDD_YYYYMMDD",
                name
            ))
        })?;

        Ok(Self::new(
            parse_acquisition_date(primary)?,
            parse_acquisition_date(secondary)?,
        ))
    }

    pub fn name(&self) -> String {
        format!(
            "{}_{}",
            format_acquisition_date(self.primary),
            format_acquisition_date(self.secondary)
        )
    }

    /// True when the primary acquisition is later than the secondary
    pub fn is_backward(&self) -> bool {
        self.primary > self.secondary
    }

    /// Forward-ordered span (earlier, later)
    pub fn span(&self) -> DateSpan {
        if self.is_backward() {
            DateSpan::from_ordered(self.secondary, self.primary)
        } else {
            DateSpan::from_ordered(self.primary, self.secondary)
        }
    }

    /// Signed temporal baseline in days, negative for backward interferograms
    pub fn temporal_baseline(&self) -> i64 {
        let days = self.span().days();
        if self.is_backward() {
            -days
        } else {
            days
        }
    }
}

impl std::fmt::Display for Interferogram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// How an episode expresses deformation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EpisodeKind {
    /// Steady deformation at `rate` metres per year
    Persistent { rate: f64 },
    /// Discrete event of `magnitude` metres, expressed once
    Transient { magnitude: f64 },
}

/// Annotated deformation episode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawEpisode")]
pub struct Episode {
    #[serde(flatten)]
    pub kind: EpisodeKind,
    #[serde(flatten)]
    pub window: DateSpan,
    pub source: String,
    pub footprint: Footprint,
}

#[derive(Deserialize)]
struct RawEpisode {
    #[serde(flatten)]
    kind: EpisodeKind,
    #[serde(flatten)]
    window: DateSpan,
    source: String,
    footprint: Footprint,
}

impl TryFrom<RawEpisode> for Episode {
    type Error = VolcnetError;

    fn try_from(raw: RawEpisode) -> VolcnetResult<Self> {
        Episode::new(raw.kind, raw.window, raw.source, raw.footprint)
    }
}

impl Episode {
    pub fn new(
        kind: EpisodeKind,
        window: DateSpan,
        source: impl Into<String>,
        footprint: Footprint,
    ) -> VolcnetResult<Self> {
        let episode = Self {
            kind,
            window,
            source: source.into(),
            footprint,
        };
        episode.validate()?;
        Ok(episode)
    }

    /// Persistent episode from raw `YYYYMMDD` window dates
    pub fn persistent(
        rate: f64,
        start: &str,
        stop: &str,
        source: impl Into<String>,
        footprint: Footprint,
    ) -> VolcnetResult<Self> {
        Self::new(
            EpisodeKind::Persistent { rate },
            DateSpan::parse(start, stop)?,
            source,
            footprint,
        )
    }

    /// Transient episode from raw `YYYYMMDD` window dates
    pub fn transient(
        magnitude: f64,
        start: &str,
        stop: &str,
        source: impl Into<String>,
        footprint: Footprint,
    ) -> VolcnetResult<Self> {
        Self::new(
            EpisodeKind::Transient { magnitude },
            DateSpan::parse(start, stop)?,
            source,
            footprint,
        )
    }

    pub fn is_persistent(&self) -> bool {
        matches!(self.kind, EpisodeKind::Persistent { .. })
    }

    /// Check the window ordering and footprint shape
    pub fn validate(&self) -> VolcnetResult<()> {
        if self.window.stop < self.window.start {
            return Err(VolcnetError::DataFormat(format!(
                "episode '{}' stops ({}) before it starts ({})",
                self.source,
                format_acquisition_date(self.window.stop),
                format_acquisition_date(self.window.start)
            )));
        }

        if self.footprint.len() < 3 {
            return Err(VolcnetError::Geometry(format!(
                "episode '{}' footprint has {} vertices, need at least 3",
                self.source,
                self.footprint.len()
            )));
        }

        if self
            .footprint
            .iter()
            .any(|(lon, lat)| !lon.is_finite() || !lat.is_finite())
        {
            return Err(VolcnetError::Geometry(format!(
                "episode '{}' footprint has non-finite vertices",
                self.source
            )));
        }

        Ok(())
    }
}

/// Label for one interferogram
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Label {
    /// Predicted deformation in metres (signed)
    pub magnitude: f64,
    /// Contributing sources, de-duplicated in scan order
    pub sources: Vec<String>,
    /// Closed exterior ring of the contributing footprints, empty if none
    pub extent: Footprint,
}

/// One VolcNet time series: its acquisitions and annotated episodes
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimeSeries {
    pub name: String,
    /// `YYYYMMDD` acquisition dates in time order
    pub acquisitions: Vec<String>,
    #[serde(default)]
    pub persistent: Vec<Episode>,
    #[serde(default)]
    pub transient: Vec<Episode>,
}

impl TimeSeries {
    pub fn new(name: impl Into<String>, acquisitions: Vec<String>) -> Self {
        Self {
            name: name.into(),
            acquisitions,
            ..Default::default()
        }
    }

    pub fn with_episodes(mut self, persistent: Vec<Episode>, transient: Vec<Episode>) -> Self {
        self.persistent = persistent;
        self.transient = transient;
        self
    }

    /// Parse every acquisition date
    pub fn acquisition_dates(&self) -> VolcnetResult<Vec<NaiveDate>> {
        self.acquisitions
            .iter()
            .map(|raw| parse_acquisition_date(raw))
            .collect()
    }

    /// Validate acquisitions and episodes
    pub fn validate(&self) -> VolcnetResult<()> {
        self.acquisition_dates()?;
        for episode in self.persistent.iter().chain(self.transient.iter()) {
            episode.validate()?;
        }
        Ok(())
    }
}

/// Cumulative displacement cube for one time series
#[derive(Debug, Clone)]
pub struct DisplacementStack {
    /// Cumulative displacement in metres (acquisition x ny x nx)
    pub cumulative: Array3<f32>,
    /// Longitude of each pixel (ny x nx)
    pub lons: Array2<f64>,
    /// Latitude of each pixel (ny x nx)
    pub lats: Array2<f64>,
}

impl DisplacementStack {
    pub fn new(cumulative: Array3<f32>, lons: Array2<f64>, lats: Array2<f64>) -> VolcnetResult<Self> {
        let (_, ny, nx) = cumulative.dim();
        if lons.dim() != (ny, nx) || lats.dim() != (ny, nx) {
            return Err(VolcnetError::Shape(format!(
                "lon/lat grids {:?}/{:?} do not match image size {:?}",
                lons.dim(),
                lats.dim(),
                (ny, nx)
            )));
        }
        Ok(Self {
            cumulative,
            lons,
            lats,
        })
    }

    pub fn n_acquisitions(&self) -> usize {
        self.cumulative.dim().0
    }

    /// Difference image `cumulative[secondary] - cumulative[primary]`
    pub fn interferogram(&self, primary: usize, secondary: usize) -> VolcnetResult<Array2<f32>> {
        let n_acq = self.n_acquisitions();
        if primary >= n_acq || secondary >= n_acq {
            return Err(VolcnetError::Shape(format!(
                "acquisition pair ({}, {}) out of range for {} acquisitions",
                primary, secondary, n_acq
            )));
        }

        let first = self.cumulative.slice(s![primary, .., ..]);
        let second = self.cumulative.slice(s![secondary, .., ..]);
        Ok(&second - &first)
    }

    /// Convert a lon/lat polygon to pixel positions on this stack's grid
    pub fn extent_to_pixels(&self, extent: &[(f64, f64)]) -> VolcnetResult<Vec<(f64, f64)>> {
        crate::core::pixel::ll_to_pixel(extent, &self.lons, &self.lats)
    }
}

/// Error types for VolcNet labelling
#[derive(Debug, thiserror::Error)]
pub enum VolcnetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data format: {0}")]
    DataFormat(String),

    #[error("Annotation error: {0}")]
    Annotation(String),

    #[error("Geometry error: {0}")]
    Geometry(String),

    #[error("Shape error: {0}")]
    Shape(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for VolcNet operations
pub type VolcnetResult<T> = Result<T, VolcnetError>;

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array;

    fn square() -> Footprint {
        vec![(0.0, 1.0), (1.0, 1.0), (1.0, 0.0), (0.0, 0.0), (0.0, 1.0)]
    }

    #[test]
    fn test_parse_acquisition_date() {
        let date = parse_acquisition_date("20180526").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2018, 5, 26).unwrap());
        assert_eq!(format_acquisition_date(date), "20180526");

        for bad in ["2018052", "201805261", "2018-5-26", "20181301", "20180230", ""] {
            match parse_acquisition_date(bad) {
                Err(VolcnetError::DataFormat(msg)) => assert!(msg.contains(bad)),
                other => panic!("expected DataFormat for '{}', got {:?}", bad, other),
            }
        }
    }

    #[test]
    fn test_interferogram_forward_and_backward() {
        let forward = Interferogram::from_name("20180526_20180713").unwrap();
        assert!(!forward.is_backward());
        assert_eq!(forward.temporal_baseline(), 48);
        assert_eq!(forward.name(), "20180526_20180713");

        let backward = Interferogram::from_name("20180713_20180526").unwrap();
        assert!(backward.is_backward());
        assert_eq!(backward.temporal_baseline(), -48);
        assert_eq!(backward.span(), forward.span());
        assert_eq!(backward.to_string(), "20180713_20180526");
    }

    #[test]
    fn test_interferogram_bad_name() {
        assert!(matches!(
            Interferogram::from_name("20180526-20180713"),
            Err(VolcnetError::DataFormat(_))
        ));
        assert!(matches!(
            Interferogram::from_name("20180526_2018071"),
            Err(VolcnetError::DataFormat(_))
        ));
    }

    #[test]
    fn test_episode_validation() {
        assert!(Episode::persistent(0.4, "20141213", "20170706", "sill", square()).is_ok());
        assert!(matches!(
            Episode::transient(0.7, "20180607", "20180526", "dyke", square()),
            Err(VolcnetError::DataFormat(_))
        ));
        assert!(matches!(
            Episode::transient(0.7, "20180526", "20180607", "dyke", vec![(0.0, 0.0)]),
            Err(VolcnetError::Geometry(_))
        ));
    }

    #[test]
    fn test_episode_json_uses_yyyymmdd_dates() {
        let episode = Episode::transient(0.7, "20180526", "20180607", "dyke", square()).unwrap();
        let json = serde_json::to_value(&episode).unwrap();
        assert_eq!(json["kind"], "transient");
        assert_eq!(json["def_episode_start"], 20180526);
        assert_eq!(json["def_episode_stop"], 20180607);

        let back: Episode = serde_json::from_value(json).unwrap();
        assert_eq!(back, episode);
    }

    #[test]
    fn test_episode_json_is_validated() {
        let reversed = serde_json::json!({
            "kind": "transient",
            "magnitude": 0.7,
            "def_episode_start": 20180607,
            "def_episode_stop": 20180526,
            "source": "dyke",
            "footprint": square(),
        });
        let err = serde_json::from_value::<Episode>(reversed).unwrap_err();
        assert!(err.to_string().contains("20180607"));

        let line = serde_json::json!({
            "kind": "persistent",
            "rate": 0.4,
            "def_episode_start": 20141213,
            "def_episode_stop": 20180526,
            "source": "sill",
            "footprint": [[0.0, 0.0], [1.0, 1.0]],
        });
        assert!(serde_json::from_value::<Episode>(line).is_err());
    }

    #[test]
    fn test_displacement_stack_interferogram() {
        let cumulative = Array::from_shape_fn((3, 2, 2), |(t, _, _)| t as f32 * 0.5);
        let lons = Array::from_shape_fn((2, 2), |(_, j)| 10.0 + j as f64 * 0.1);
        let lats = Array::from_shape_fn((2, 2), |(i, _)| 5.0 - i as f64 * 0.1);
        let stack = DisplacementStack::new(cumulative, lons, lats).unwrap();

        let ifg = stack.interferogram(0, 2).unwrap();
        assert!(ifg.iter().all(|v| (*v - 1.0).abs() < 1e-6));
        let reversed = stack.interferogram(2, 0).unwrap();
        assert!(reversed.iter().all(|v| (*v + 1.0).abs() < 1e-6));
        assert!(matches!(stack.interferogram(0, 3), Err(VolcnetError::Shape(_))));
    }
}
