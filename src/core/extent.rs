use geo::{Area, BooleanOps, LineString, MultiPolygon, Polygon};

/// Build a polygon from a lon/lat vertex ring
pub fn footprint_polygon(footprint: &[(f64, f64)]) -> Polygon<f64> {
    Polygon::new(LineString::from(footprint.to_vec()), Vec::new())
}

/// Running union of episode footprints for one interferogram
#[derive(Debug, Clone)]
pub struct SpatialExtent {
    union: MultiPolygon<f64>,
}

impl Default for SpatialExtent {
    fn default() -> Self {
        Self {
            union: MultiPolygon::new(Vec::new()),
        }
    }
}

impl SpatialExtent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union all footprints in order
    pub fn from_footprints<'a, I>(footprints: I) -> Self
    where
        I: IntoIterator<Item = &'a [(f64, f64)]>,
    {
        let mut extent = Self::new();
        for footprint in footprints {
            extent.add_footprint(footprint);
        }
        extent
    }

    /// Union one footprint into the running extent
    pub fn add_footprint(&mut self, footprint: &[(f64, f64)]) {
        let polygon = MultiPolygon::new(vec![footprint_polygon(footprint)]);
        self.union = if self.union.0.is_empty() {
            polygon
        } else {
            self.union.union(&polygon)
        };
    }

    pub fn is_empty(&self) -> bool {
        self.union.0.is_empty()
    }

    /// Number of disjoint parts in the union
    pub fn parts(&self) -> usize {
        self.union.0.len()
    }

    pub fn multipolygon(&self) -> &MultiPolygon<f64> {
        &self.union
    }

    /// Planar area of the union, in squared degrees
    pub fn area(&self) -> f64 {
        self.union.unsigned_area()
    }

    /// Closed exterior ring of the union as (lon, lat) pairs.
    ///
    /// A multi-part union is flattened to its largest part (the first one
    /// when areas tie). Interior holes are not reported.
    pub fn exterior(&self) -> Vec<(f64, f64)> {
        let mut largest: Option<(&Polygon<f64>, f64)> = None;
        for part in &self.union.0 {
            let area = part.unsigned_area();
            match largest {
                Some((_, best)) if area <= best => {}
                _ => largest = Some((part, area)),
            }
        }

        if self.parts() > 1 {
            log::debug!(
                "Extent has {} parts, reporting the largest exterior",
                self.parts()
            );
        }

        largest
            .map(|(polygon, _)| polygon.exterior().coords().map(|c| (c.x, c.y)).collect())
            .unwrap_or_default()
    }
}
