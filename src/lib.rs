//! # treefall-rs
//!
//! Places tree crowns detected in a satellite tile on the ground and flags
//! the ones whose fall radius reaches a building. The core is four steps.
//!
//! ### 1. `TileContext` - Pixel/WGS84 Conversion
//!
//! ```
//! use treefall_rs::{LatLng, PixelCoord, TileContext};
//!
//! # fn main() -> Result<(), treefall_rs::TreefallError> {
//! let tile = TileContext::new(LatLng::new(37.0, -122.0), 19, 640, 1.0, 640, 640)?;
//! let corner = tile.pixel_to_lat_lng(PixelCoord::new(0.0, 0.0));
//! assert!(corner.lat > 37.0 && corner.lng < -122.0);
//! println!("{:.3} m/px", tile.meters_per_pixel());
//! # Ok(())
//! # }
//! ```
//!
//! ### 2. `filter_detections` - Detector Post-Processing
//!
//! Pick a [`FilterPreset`]; there is no default.
//!
//! ```
//! use treefall_rs::{Detection, FilterPreset, filter_detections};
//!
//! # fn main() -> Result<(), treefall_rs::TreefallError> {
//! let raw = vec![Detection::new(300.0, 300.0, 340.0, 340.0, 0.25, "Tree")?];
//! assert!(filter_detections(&raw, &FilterPreset::Loose.filter_config()).is_empty());
//! # Ok(())
//! # }
//! ```
//!
//! ### 3. `compute_tree_risks` and `classify_danger` - Fall Risk
//!
//! ```
//! use treefall_rs::{
//!     BuildingFootprint, Detection, LatLng, RiskConfig, TileContext, classify_danger,
//!     compute_tree_risks, parse_wkt,
//! };
//!
//! # fn main() -> Result<(), treefall_rs::TreefallError> {
//! let tile = TileContext::new(LatLng::new(37.0, -122.0), 19, 640, 1.0, 640, 640)?;
//! let detections = vec![Detection::new(300.0, 300.0, 340.0, 340.0, 0.9, "Tree")?];
//! let trees = compute_tree_risks(&detections, &tile, &RiskConfig::default())?;
//!
//! let house = parse_wkt(
//!     "POLYGON((-121.99997 36.99995,-121.99985 36.99995,-121.99985 37.00005,-121.99997 37.00005,-121.99997 36.99995))",
//! )?;
//! let buildings: Vec<BuildingFootprint> = BuildingFootprint::from_geometry(house).into_iter().collect();
//! let classified = classify_danger(&trees, &buildings)?;
//! assert!(classified[0].danger);
//! # Ok(())
//! # }
//! ```
//!
//! ### 4. `Pipeline` - Address to Assessment
//!
//! Wire a [`Geocoder`], [`TileFetcher`], [`TreeDetector`] and
//! [`BuildingSource`] into a [`Pipeline`] and call `run(address)`. The tile
//! and footprint fetches run concurrently; a failed footprint fetch is
//! logged and treated as "no buildings".
//!
//! ```no_run
//! use treefall_rs::{
//!     AssessmentConfig, DetectorHandle, FilterPreset, GeoJsonBuildingSource, Pipeline,
//!     ReplayDetector,
//! };
//! # use treefall_rs::{Geocoder, LatLng, TileFetcher, TileImage, TileRequest, TreefallError};
//! # use std::time::Duration;
//! # struct MyGeocoder;
//! # impl Geocoder for MyGeocoder {
//! #     fn geocode(&self, _: &str, _: Duration) -> Result<LatLng, TreefallError> { unimplemented!() }
//! # }
//! # struct MyTiles;
//! # impl TileFetcher for MyTiles {
//! #     fn fetch_tile(&self, _: &TileRequest, _: Duration) -> Result<TileImage, TreefallError> { unimplemented!() }
//! # }
//!
//! # fn main() -> Result<(), TreefallError> {
//! let pipeline = Pipeline::new(
//!     MyGeocoder,
//!     MyTiles,
//!     DetectorHandle::new(ReplayDetector::from_csv("detections.csv")?),
//!     GeoJsonBuildingSource::from_file("buildings.geojson")?,
//!     AssessmentConfig::new(FilterPreset::Tight),
//! )?;
//! let assessment = pipeline.run("200 Colma Blvd, Colma, CA")?;
//! println!("{} of {} trees in danger", assessment.danger_count(), assessment.trees.len());
//! # Ok(())
//! # }
//! ```
//!

pub mod config;
pub mod coord;
pub mod danger;
pub mod detection;
pub mod error;
pub mod geom;
pub mod io;
pub mod pipeline;
pub mod projection;
pub mod risk;

pub use config::AssessmentConfig;
pub use coord::{Coordinate, LatLng, PixelCoord};
pub use danger::{BuildingFootprint, classify_danger, fall_radius_degrees, merge_footprints};
pub use detection::{Detection, DetectorSettings, FilterConfig, FilterPreset, filter_detections};
pub use error::TreefallError;
pub use geom::{CIRCLE_SEGMENTS, create_circle, parse_wkt};
pub use io::{
    TreeRisksToArrow, parse_buildings, parse_buildings_wkt, read_buildings, read_buildings_wkt,
    read_detections, read_detections_from, trees_to_feature_collection, write_tree_risks,
};
pub use pipeline::{
    BuildingSource, DetectorHandle, GeoJsonBuildingSource, Geocoder, NetworkPolicy, Pipeline,
    ReplayDetector, RiskAssessment, TileFetcher, TileImage, TreeDetector, parse_geocode_response,
    with_retries,
};
pub use projection::{
    DEFAULT_SCALE, DEFAULT_TILE_SIZE, DEFAULT_ZOOM, MAX_MERCATOR_LATITUDE, MAX_ZOOM_LEVEL,
    TileBounds, TileContext, TileRequest, degrees_per_meter, lat_lng_to_pixel, meters_per_pixel,
    pixel_to_lat_lng, tile_bounds,
};
pub use risk::{DEFAULT_FALL_MULTIPLIER, RiskConfig, TreeRisk, compute_tree_risks};

pub use geo_types;
pub use geojson;

#[cfg(test)]
mod tests {
    use super::*;
    use geo_types::polygon;

    const CENTER: LatLng = LatLng {
        lat: 37.6766,
        lng: -122.4594,
    };

    fn raw_detections() -> Result<Vec<Detection>, TreefallError> {
        Ok(vec![
            // mature crown near the middle
            Detection::new(300.0, 300.0, 360.0, 350.0, 0.82, "Tree")?,
            // low score, dropped by both presets
            Detection::new(100.0, 100.0, 150.0, 150.0, 0.2, "Tree")?,
            // shrub, kept only by the loose preset
            Detection::new(500.0, 80.0, 515.0, 95.0, 0.7, "Tree")?,
            // far corner
            Detection::new(20.0, 560.0, 80.0, 620.0, 0.55, "Tree")?,
        ])
    }

    /// Footprint hugging the east side of the central crown.
    fn neighbour(tile: &TileContext) -> BuildingFootprint {
        let nw = tile.pixel_to_lat_lng(PixelCoord::new(365.0, 290.0));
        let se = tile.pixel_to_lat_lng(PixelCoord::new(420.0, 360.0));
        BuildingFootprint::from(polygon![
            (x: nw.lng, y: nw.lat),
            (x: se.lng, y: nw.lat),
            (x: se.lng, y: se.lat),
            (x: nw.lng, y: se.lat),
            (x: nw.lng, y: nw.lat),
        ])
    }

    #[test]
    fn test_tight_preset_end_to_end() -> Result<(), TreefallError> {
        let tile = TileContext::new(CENTER, 19, 640, 1.0, 640, 640)?;
        let kept = filter_detections(&raw_detections()?, &FilterPreset::Tight.filter_config());
        assert_eq!(kept.len(), 2);

        let trees = compute_tree_risks(&kept, &tile, &RiskConfig::default())?;
        let classified = classify_danger(&trees, &[neighbour(&tile)])?;

        assert_eq!(classified.len(), 2);
        assert!(classified[0].danger);
        assert!(!classified[1].danger);
        assert!(tile.bounds().contains(&classified[1].location));
        Ok(())
    }

    #[test]
    fn test_loose_preset_keeps_shrub() -> Result<(), TreefallError> {
        let kept = filter_detections(&raw_detections()?, &FilterPreset::Loose.filter_config());
        assert_eq!(kept.len(), 3);
        assert_eq!(kept[1].xmin, 500.0);
        Ok(())
    }

    #[test]
    fn test_zero_multiplier_is_all_safe() -> Result<(), TreefallError> {
        let tile = TileContext::new(CENTER, 19, 640, 1.0, 640, 640)?;
        let kept = filter_detections(&raw_detections()?, &FilterPreset::Tight.filter_config());
        let trees = compute_tree_risks(&kept, &tile, &RiskConfig::new(0.0)?)?;
        let classified = classify_danger(&trees, &[neighbour(&tile)])?;

        assert!(classified.iter().all(|t| t.fall_radius_m == 0.0 && !t.danger));
        Ok(())
    }

    #[test]
    fn test_crown_center_round_trips_through_tile() -> Result<(), TreefallError> {
        let tile = TileContext::new(CENTER, 20, 640, 2.0, 1280, 1280)?;
        let trees = compute_tree_risks(&raw_detections()?, &tile, &RiskConfig::default())?;

        for (tree, detection) in trees.iter().zip(raw_detections()?) {
            let back = tile.lat_lng_to_pixel(&tree.location);
            let center = detection.center();
            assert!((back.x - center.x).abs() < 1e-6);
            assert!((back.y - center.y).abs() < 1e-6);
        }
        Ok(())
    }

    #[test]
    fn test_outputs_agree_on_danger() -> Result<(), TreefallError> {
        let tile = TileContext::new(CENTER, 19, 640, 1.0, 640, 640)?;
        let kept = filter_detections(&raw_detections()?, &FilterPreset::Tight.filter_config());
        let trees = classify_danger(
            &compute_tree_risks(&kept, &tile, &RiskConfig::default())?,
            &[neighbour(&tile)],
        )?;

        let batch = trees.to_record_batch()?;
        assert_eq!(batch.num_rows(), 2);

        let fc = trees_to_feature_collection(&trees);
        let statuses: Vec<_> = fc
            .features
            .iter()
            .filter_map(|f| f.property("status").and_then(|v| v.as_str()))
            .collect();
        assert_eq!(statuses, vec!["danger", "safe"]);

        let mut out = Vec::new();
        write_tree_risks(&mut out, &trees)?;
        let text = String::from_utf8(out).map_err(|e| TreefallError::IoError(e.to_string()))?;
        assert_eq!(text.lines().filter(|l| l.ends_with(",true")).count(), 1);
        Ok(())
    }
}
