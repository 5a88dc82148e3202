use ndarray::Array2;

use crate::types::{VolcnetError, VolcnetResult};

/// Convert (lon, lat) points to fractional (x, y) pixel positions.
///
/// `lons` and `lats` hold the coordinates of every pixel in matrix order, so
/// (0, 0) is the top-left pixel and y increases downwards.
pub fn ll_to_pixel(points: &[(f64, f64)], lons: &Array2<f64>, lats: &Array2<f64>) -> VolcnetResult<Vec<(f64, f64)>> {
    let (ny, nx) = lons.dim();
    if ny < 2 || nx < 2 || lats.dim() != (ny, nx) {
        return Err(VolcnetError::Shape(format!(
            "lon/lat grids must share a shape of at least 2x2, got {:?} and {:?}",
            lons.dim(),
            lats.dim()
        )));
    }

    let lon0 = lons[[0, 0]];
    let lat0 = lats[[0, 0]];
    let dx = (lons[[0, 0]] - lons[[0, 1]]).abs();
    let dy = (lats[[0, 0]] - lats[[1, 0]]).abs();
    if dx == 0.0 || dy == 0.0 {
        return Err(VolcnetError::Shape(
            "lon/lat grids have zero pixel spacing".to_string(),
        ));
    }

    Ok(points
        .iter()
        .map(|&(lon, lat)| ((lon - lon0) / dx, -(lat - lat0) / dy))
        .collect())
}
