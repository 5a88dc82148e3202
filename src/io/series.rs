use crate::io::annotation::read_annotation_file;
use crate::types::{TimeSeries, VolcnetResult};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Read time series records from a JSON file and validate them
pub fn read_series_json<P: AsRef<Path>>(path: P) -> VolcnetResult<Vec<TimeSeries>> {
    log::info!("Reading time series records: {}", path.as_ref().display());
    let reader = BufReader::new(File::open(path.as_ref())?);
    let series: Vec<TimeSeries> = serde_json::from_reader(reader)?;

    for record in &series {
        record.validate()?;
    }
    log::debug!("Read {} time series", series.len());

    Ok(series)
}

/// Read several manifests, concatenating their series in file order
pub fn read_series_manifests<P: AsRef<Path>>(paths: &[P]) -> VolcnetResult<Vec<TimeSeries>> {
    let mut series = Vec::new();
    for path in paths {
        series.extend(read_series_json(path)?);
    }
    Ok(series)
}

/// Write time series records as pretty-printed JSON
pub fn write_series_json<P: AsRef<Path>>(path: P, series: &[TimeSeries]) -> VolcnetResult<()> {
    log::info!("Writing {} time series to {}", series.len(), path.as_ref().display());
    let writer = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer_pretty(writer, series)?;
    Ok(())
}

/// Build a time series from its acquisitions and an annotation file
pub fn series_from_annotation_file<P: AsRef<Path>>(
    name: &str,
    acquisitions: Vec<String>,
    annotation_path: P,
) -> VolcnetResult<TimeSeries> {
    let annotations = read_annotation_file(annotation_path)?;
    let series = TimeSeries::new(name, acquisitions)
        .with_episodes(annotations.persistent, annotations.transient);
    series.validate()?;
    Ok(series)
}
