use crate::coord::LatLng;
use crate::detection::Detection;
use crate::error::TreefallError;
use crate::projection::TileContext;
use log::debug;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A felled tree may reach up to this many canopy radii from its base.
pub const DEFAULT_FALL_MULTIPLIER: f64 = 2.0;

/// A detection placed on the ground, with its physical reach.
///
/// Built by [`compute_tree_risks`] with `danger` false; only
/// [`classify_danger`](crate::classify_danger) produces records where it
/// can be true.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeRisk {
    /// The detector output this tree was derived from, unchanged
    pub detection: Detection,
    /// Crown centroid in WGS84
    pub location: LatLng,
    pub canopy_radius_m: f64,
    pub fall_radius_m: f64,
    pub danger: bool,
}

impl TreeRisk {
    pub fn tree_lat(&self) -> f64 {
        self.location.lat
    }

    pub fn tree_lng(&self) -> f64 {
        self.location.lng
    }

    /// `"danger"` or `"safe"`.
    pub fn status(&self) -> &'static str {
        if self.danger { "danger" } else { "safe" }
    }

    pub(crate) fn with_danger(&self, danger: bool) -> Self {
        Self {
            danger,
            ..self.clone()
        }
    }
}

/// Policy knobs of the risk computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    pub fall_multiplier: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            fall_multiplier: DEFAULT_FALL_MULTIPLIER,
        }
    }
}

impl RiskConfig {
    pub fn new(fall_multiplier: f64) -> Result<Self, TreefallError> {
        let config = Self { fall_multiplier };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), TreefallError> {
        if !self.fall_multiplier.is_finite() || self.fall_multiplier < 0.0 {
            return Err(TreefallError::InvalidFallMultiplier(self.fall_multiplier));
        }
        Ok(())
    }
}

fn tree_risk(detection: &Detection, tile: &TileContext, fall_multiplier: f64) -> TreeRisk {
    let mpp = tile.meters_per_pixel();
    let location = tile.pixel_to_lat_lng(detection.center());

    // canopy diameter ~ mean box edge, radius is half of that
    let width_m = detection.width() * mpp;
    let height_m = detection.height() * mpp;
    let canopy_radius_m = (width_m + height_m) / 4.0;

    TreeRisk {
        detection: detection.clone(),
        location,
        canopy_radius_m,
        fall_radius_m: canopy_radius_m * fall_multiplier,
        danger: false,
    }
}

/// Georeferences every detection on `tile` and estimates its canopy and
/// fall radius. Output order matches input order.
///
/// # Example
/// ```
/// use treefall_rs::{Detection, LatLng, RiskConfig, TileContext, compute_tree_risks};
///
/// # fn main() -> Result<(), treefall_rs::TreefallError> {
/// let tile = TileContext::new(LatLng::new(37.0, -122.0), 19, 640, 1.0, 640, 640)?;
/// let detections = vec![Detection::new(300.0, 300.0, 320.0, 320.0, 0.9, "Tree")?];
/// let trees = compute_tree_risks(&detections, &tile, &RiskConfig::default())?;
/// assert!((trees[0].canopy_radius_m - 2.385).abs() < 1e-3);
/// # Ok(())
/// # }
/// ```
pub fn compute_tree_risks(
    detections: &[Detection],
    tile: &TileContext,
    config: &RiskConfig,
) -> Result<Vec<TreeRisk>, TreefallError> {
    config.validate()?;

    let trees: Vec<TreeRisk> = detections
        .par_iter()
        .map(|d| tree_risk(d, tile, config.fall_multiplier))
        .collect();

    debug!(
        "computed {} tree risks at {:.4} m/px (fall multiplier {})",
        trees.len(),
        tile.meters_per_pixel(),
        config.fall_multiplier
    );
    Ok(trees)
}
