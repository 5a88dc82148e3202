//! Temporal baseline helpers for acquisition lists and interferogram names

use crate::types::{format_acquisition_date, parse_acquisition_date, Interferogram, VolcnetResult};

/// Sorted, de-duplicated acquisitions spanned by a set of interferogram names
pub fn acquisitions_from_ifg_names<S: AsRef<str>>(ifg_names: &[S]) -> VolcnetResult<Vec<String>> {
    let mut dates = Vec::with_capacity(ifg_names.len() * 2);
    for name in ifg_names {
        let ifg = Interferogram::from_name(name.as_ref())?;
        dates.push(ifg.primary);
        dates.push(ifg.secondary);
    }
    dates.sort();
    dates.dedup();

    Ok(dates.into_iter().map(format_acquisition_date).collect())
}

/// Names of the interferograms between consecutive acquisitions
pub fn daisy_chain<S: AsRef<str>>(acquisitions: &[S]) -> Vec<String> {
    acquisitions
        .windows(2)
        .map(|pair| format!("{}_{}", pair[0].as_ref(), pair[1].as_ref()))
        .collect()
}

/// Signed temporal baseline (days) of each interferogram name
pub fn baselines_from_names<S: AsRef<str>>(ifg_names: &[S]) -> VolcnetResult<Vec<i64>> {
    ifg_names
        .iter()
        .map(|name| Ok(Interferogram::from_name(name.as_ref())?.temporal_baseline()))
        .collect()
}

/// Days since the first acquisition, starting at 0
pub fn cumulative_baselines<S: AsRef<str>>(acquisitions: &[S]) -> VolcnetResult<Vec<i64>> {
    let dates = acquisitions
        .iter()
        .map(|raw| parse_acquisition_date(raw.as_ref()))
        .collect::<VolcnetResult<Vec<_>>>()?;

    Ok(match dates.first() {
        Some(&first) => dates.iter().map(|&d| (d - first).num_days()).collect(),
        None => Vec::new(),
    })
}
