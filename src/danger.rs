use crate::coord::LatLng;
use crate::error::TreefallError;
use crate::geom::{CIRCLE_SEGMENTS, create_circle};
use crate::projection::degrees_per_meter;
use crate::risk::TreeRisk;
use geo::{Intersects, unary_union};
use geo_types::{Geometry, MultiPolygon, Polygon};
use log::debug;
use rayon::prelude::*;

/// A building outline in WGS84 degrees (x = longitude, y = latitude).
#[derive(Debug, Clone, PartialEq)]
pub struct BuildingFootprint {
    /// Identifier assigned by the footprint source, when it has one
    pub id: Option<String>,
    pub geometry: MultiPolygon<f64>,
}

impl BuildingFootprint {
    pub fn new(geometry: MultiPolygon<f64>) -> Self {
        Self { id: None, geometry }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Wraps polygonal geometries. Points and lines are not buildings and
    /// yield `None`.
    pub fn from_geometry(geometry: Geometry<f64>) -> Option<Self> {
        match geometry {
            Geometry::Polygon(poly) => Some(Self::from(poly)),
            Geometry::MultiPolygon(mp) => Some(Self::from(mp)),
            _ => None,
        }
    }
}

impl From<Polygon<f64>> for BuildingFootprint {
    fn from(polygon: Polygon<f64>) -> Self {
        Self::new(MultiPolygon::new(vec![polygon]))
    }
}

impl From<MultiPolygon<f64>> for BuildingFootprint {
    fn from(multi: MultiPolygon<f64>) -> Self {
        Self::new(multi)
    }
}

/// Approximates a metric radius at `lat` as a single degree radius.
///
/// Averages the latitude and longitude conversions, which turns the true
/// ground circle into a degree-space circle. The distortion grows with
/// latitude and radius; fine for tens of metres at moderate latitudes.
pub fn fall_radius_degrees(fall_radius_m: f64, lat: f64) -> Result<f64, TreefallError> {
    let (deg_lat_per_m, deg_lng_per_m) = degrees_per_meter(lat)?;
    let fall_deg_lat = fall_radius_m * deg_lat_per_m;
    let fall_deg_lng = fall_radius_m * deg_lng_per_m;
    Ok((fall_deg_lat + fall_deg_lng) / 2.0)
}

/// Dissolves all footprints into one geometry.
pub fn merge_footprints(buildings: &[BuildingFootprint]) -> MultiPolygon<f64> {
    unary_union(buildings.iter().map(|b| &b.geometry))
}

fn reaches(location: &LatLng, radius_deg: f64, merged: &MultiPolygon<f64>) -> bool {
    let center = location.to_point();
    if radius_deg <= 0.0 {
        return center.intersects(merged);
    }
    create_circle(&center, radius_deg, CIRCLE_SEGMENTS).intersects(merged)
}

/// Flags each tree whose fall circle touches or overlaps any building.
///
/// Returns new records in input order; `trees` is left untouched. An empty
/// building set marks every tree safe without any geometry work.
///
/// # Example
/// ```
/// use treefall_rs::{classify_danger, Detection, LatLng, TreeRisk};
///
/// # fn main() -> Result<(), treefall_rs::TreefallError> {
/// let tree = TreeRisk {
///     detection: Detection::new(0.0, 0.0, 40.0, 40.0, 0.9, "Tree")?,
///     location: LatLng::new(37.0, -122.0),
///     canopy_radius_m: 4.0,
///     fall_radius_m: 8.0,
///     danger: false,
/// };
/// let classified = classify_danger(&[tree], &[])?;
/// assert!(!classified[0].danger);
/// # Ok(())
/// # }
/// ```
pub fn classify_danger(
    trees: &[TreeRisk],
    buildings: &[BuildingFootprint],
) -> Result<Vec<TreeRisk>, TreefallError> {
    if trees.is_empty() || buildings.is_empty() {
        debug!(
            "skipping danger geometry ({} trees, {} buildings)",
            trees.len(),
            buildings.len()
        );
        return Ok(trees.iter().map(|t| t.with_danger(false)).collect());
    }

    let merged = merge_footprints(buildings);

    let classified: Vec<TreeRisk> = trees
        .par_iter()
        .map(|tree| {
            let radius_deg = fall_radius_degrees(tree.fall_radius_m, tree.tree_lat())?;
            Ok(tree.with_danger(reaches(&tree.location, radius_deg, &merged)))
        })
        .collect::<Result<_, TreefallError>>()?;

    debug!(
        "{} of {} trees reach one of {} buildings",
        classified.iter().filter(|t| t.danger).count(),
        classified.len(),
        buildings.len()
    );
    Ok(classified)
}
