//! Wiring of the external collaborators around the georeferencing core.
//!
//! Geocoding, tile retrieval, crown detection and footprint retrieval are
//! traits so callers can plug in HTTP clients, a model runtime, or the
//! file-backed sources shipped here.

pub mod geocode;
mod policy;
mod run;
mod sources;

pub use geocode::parse_geocode_response;
pub use policy::{NetworkPolicy, with_retries};
pub use run::{Pipeline, RiskAssessment};
pub use sources::{
    BuildingSource, DetectorHandle, GeoJsonBuildingSource, Geocoder, ReplayDetector, TileFetcher,
    TileImage, TreeDetector,
};
