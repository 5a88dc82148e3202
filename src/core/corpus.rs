use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::core::accumulate::LabellingParams;
use crate::core::label::Labeller;
use crate::types::{Interferogram, Label, TimeSeries, VolcnetResult};

/// Corpus labelling parameters
#[derive(Debug, Clone)]
pub struct CorpusParams {
    /// Deformation below this magnitude (metres) is treated as noise
    pub noise_floor: f64,
    /// Label the pairs of each series in parallel
    pub parallel: bool,
    pub labelling: LabellingParams,
}

impl Default for CorpusParams {
    fn default() -> Self {
        Self {
            noise_floor: 0.05, // 5 cm
            parallel: true,
            labelling: LabellingParams::default(),
        }
    }
}

/// One labelled acquisition pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LabelRow {
    pub series: usize,
    pub primary: usize,
    pub secondary: usize,
    pub magnitude: f64,
}

/// Rows of one label class, in the order they were visited
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabelTable {
    rows: Vec<LabelRow>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, row: LabelRow) {
        self.rows.push(row);
    }

    pub fn rows(&self) -> &[LabelRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LabelRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// `n x 4` matrix of (series, primary, secondary, magnitude)
    pub fn to_array(&self) -> Array2<f64> {
        let mut array = Array2::zeros((self.rows.len(), 4));
        for (i, row) in self.rows.iter().enumerate() {
            array[[i, 0]] = row.series as f64;
            array[[i, 1]] = row.primary as f64;
            array[[i, 2]] = row.secondary as f64;
            array[[i, 3]] = row.magnitude;
        }
        array
    }
}

/// Label class a pair is routed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LabelClass {
    Dyke,
    Sill,
    /// No significant deformation
    Atmo,
    /// Above the noise floor but with no dyke/sill first source
    Unclassified,
}

impl std::fmt::Display for LabelClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LabelClass::Dyke => write!(f, "dyke"),
            LabelClass::Sill => write!(f, "sill"),
            LabelClass::Atmo => write!(f, "atmo"),
            LabelClass::Unclassified => write!(f, "unclassified"),
        }
    }
}

/// Route a label by magnitude, then by its first source
pub fn classify(label: &Label, noise_floor: f64) -> LabelClass {
    if label.magnitude.abs() < noise_floor {
        return LabelClass::Atmo;
    }

    match label.sources.first().map(String::as_str) {
        Some("dyke") => LabelClass::Dyke,
        Some("sill") => LabelClass::Sill,
        _ => LabelClass::Unclassified,
    }
}

/// Per-series row counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesCounts {
    pub dyke: usize,
    pub sill: usize,
    pub atmo: usize,
    pub unclassified: usize,
}

impl SeriesCounts {
    pub fn total(&self) -> usize {
        self.dyke + self.sill + self.atmo + self.unclassified
    }
}

/// Bulk label tables for a corpus of time series
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorpusLabels {
    pub dyke: LabelTable,
    pub sill: LabelTable,
    pub atmo: LabelTable,
    pub unclassified: LabelTable,
}

impl CorpusLabels {
    pub fn push(&mut self, class: LabelClass, row: LabelRow) {
        match class {
            LabelClass::Dyke => self.dyke.push(row),
            LabelClass::Sill => self.sill.push(row),
            LabelClass::Atmo => self.atmo.push(row),
            LabelClass::Unclassified => self.unclassified.push(row),
        }
    }

    pub fn table(&self, class: LabelClass) -> &LabelTable {
        match class {
            LabelClass::Dyke => &self.dyke,
            LabelClass::Sill => &self.sill,
            LabelClass::Atmo => &self.atmo,
            LabelClass::Unclassified => &self.unclassified,
        }
    }

    pub fn total(&self) -> usize {
        self.dyke.len() + self.sill.len() + self.atmo.len() + self.unclassified.len()
    }

    /// Dyke, sill and atmo rows concatenated, the order datasets are built in
    pub fn all(&self) -> LabelTable {
        let mut table = LabelTable::new();
        for row in self.dyke.iter().chain(self.sill.iter()).chain(self.atmo.iter()) {
            table.push(*row);
        }
        table
    }

    /// Row counts for each of `n_series` series
    pub fn counts_per_series(&self, n_series: usize) -> Vec<SeriesCounts> {
        let mut counts = vec![SeriesCounts::default(); n_series];
        let classes = [
            LabelClass::Dyke,
            LabelClass::Sill,
            LabelClass::Atmo,
            LabelClass::Unclassified,
        ];
        for class in classes {
            for row in self.table(class).iter() {
                if let Some(entry) = counts.get_mut(row.series) {
                    match class {
                        LabelClass::Dyke => entry.dyke += 1,
                        LabelClass::Sill => entry.sill += 1,
                        LabelClass::Atmo => entry.atmo += 1,
                        LabelClass::Unclassified => entry.unclassified += 1,
                    }
                }
            }
        }
        counts
    }
}

/// Labels every directed acquisition pair of every time series
#[derive(Debug, Clone, Default)]
pub struct CorpusLabeller {
    params: CorpusParams,
    labeller: Labeller,
}

impl CorpusLabeller {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_params(params: CorpusParams) -> Self {
        let labeller = Labeller::with_params(params.labelling.clone());
        Self { params, labeller }
    }

    pub fn params(&self) -> &CorpusParams {
        &self.params
    }

    /// Label all series, series order outer then primary then secondary
    pub fn label_corpus(&self, series: &[TimeSeries]) -> VolcnetResult<CorpusLabels> {
        log::info!(
            "Labelling {} time series (noise floor {:.3} m)",
            series.len(),
            self.params.noise_floor
        );

        let mut labels = CorpusLabels::default();
        for (series_index, time_series) in series.iter().enumerate() {
            let routed = self.label_series(series_index, time_series)?;

            let unclassified = routed
                .iter()
                .filter(|(class, _)| *class == LabelClass::Unclassified)
                .count();
            if unclassified > 0 {
                log::warn!(
                    "{}: {} pairs above the noise floor have no dyke/sill source",
                    time_series.name,
                    unclassified
                );
            }

            for (class, row) in routed {
                labels.push(class, row);
            }
        }

        log::info!(
            "Labelled {} pairs: {} dyke, {} sill, {} atmo, {} unclassified",
            labels.total(),
            labels.dyke.len(),
            labels.sill.len(),
            labels.atmo.len(),
            labels.unclassified.len()
        );

        Ok(labels)
    }

    /// Label and classify every directed pair of one series, in visit order
    pub fn label_series(&self, series_index: usize, series: &TimeSeries) -> VolcnetResult<Vec<(LabelClass, LabelRow)>> {
        series.validate()?;
        let dates = series.acquisition_dates()?;
        log::debug!("{}: {} acquisitions", series.name, dates.len());

        let pairs: Vec<(usize, usize)> = (0..dates.len())
            .flat_map(|i| (0..dates.len()).map(move |j| (i, j)))
            .filter(|&(i, j)| dates[i] != dates[j])
            .collect();

        let route = |&(primary, secondary): &(usize, usize)| {
            let ifg = Interferogram::new(dates[primary], dates[secondary]);
            let label = self
                .labeller
                .label_interferogram(&ifg, &series.persistent, &series.transient);
            let class = classify(&label, self.params.noise_floor);
            if class == LabelClass::Unclassified {
                log::debug!(
                    "{} {}: {:.4} m with sources {:?} is unclassified",
                    series.name,
                    ifg,
                    label.magnitude,
                    label.sources
                );
            }
            (
                class,
                LabelRow {
                    series: series_index,
                    primary,
                    secondary,
                    magnitude: label.magnitude,
                },
            )
        };

        #[cfg(feature = "parallel")]
        {
            if self.params.parallel {
                use rayon::prelude::*;
                return Ok(pairs.par_iter().map(&route).collect());
            }
        }

        Ok(pairs.iter().map(&route).collect())
    }
}

/// Label a corpus with the given noise floor and default parameters
pub fn label_corpus(series: &[TimeSeries], noise_floor: f64) -> VolcnetResult<CorpusLabels> {
    CorpusLabeller::with_params(CorpusParams {
        noise_floor,
        ..Default::default()
    })
    .label_corpus(series)
}
