//! VolcNet: deformation labelling for InSAR time series of volcanoes
//!
//! Given the acquisitions of a cumulative displacement time series and
//! annotated deformation episodes (persistent rates and transient events),
//! this library predicts the deformation visible in any interferogram between
//! two acquisitions, attributes it to its sources, and outlines where it is.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    DisplacementStack, Episode, EpisodeKind, Footprint, Interferogram, Label, TimeSeries, VolcnetError,
    VolcnetResult,
};

pub use crate::core::{label, label_corpus, CorpusLabeller, CorpusLabels, CorpusParams, Labeller, LabellingParams};
pub use crate::io::{read_annotation_file, read_series_json, AnnotationParser};

#[cfg(feature = "python")]
mod python {
    use crate::core::{label, label_corpus};
    use crate::io::{read_annotation_file, read_series_manifests};
    use crate::types::VolcnetError;
    use numpy::{IntoPyArray, PyArray2};
    use pyo3::prelude::*;

    fn to_py_err(e: VolcnetError) -> PyErr {
        match e {
            VolcnetError::DataFormat(_) | VolcnetError::Annotation(_) => {
                PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("{}", e))
            }
            _ => PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!("{}", e)),
        }
    }

    /// Python module definition
    #[pymodule]
    fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(label_ifg, m)?)?;
        m.add_function(wrap_pyfunction!(label_files, m)?)?;
        Ok(())
    }

    /// Label one interferogram against the episodes of an annotation file
    #[pyfunction]
    fn label_ifg(ifg_name: &str, annotation_file: &str) -> PyResult<(f64, Vec<String>, Vec<(f64, f64)>)> {
        let annotations = read_annotation_file(annotation_file).map_err(to_py_err)?;
        let result = label(ifg_name, &annotations.persistent, &annotations.transient).map_err(to_py_err)?;
        Ok((result.magnitude, result.sources, result.extent))
    }

    /// Label every pair of the series in a list of JSON manifests.
    ///
    /// Series are numbered across all files in order. Returns the dyke, sill
    /// and atmo tables as `n x 4` arrays.
    #[pyfunction]
    #[pyo3(signature = (series_files, def_min = 0.05))]
    fn label_files<'py>(
        py: Python<'py>,
        series_files: Vec<String>,
        def_min: f64,
    ) -> PyResult<(&'py PyArray2<f64>, &'py PyArray2<f64>, &'py PyArray2<f64>)> {
        let series = read_series_manifests(&series_files).map_err(to_py_err)?;
        let labels = label_corpus(&series, def_min).map_err(to_py_err)?;
        Ok((
            labels.dyke.to_array().into_pyarray(py),
            labels.sill.to_array().into_pyarray(py),
            labels.atmo.to_array().into_pyarray(py),
        ))
    }
}
