use crate::coord::LatLng;
use crate::error::TreefallError;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: GeocodeGeometry,
}

#[derive(Debug, Deserialize)]
struct GeocodeGeometry {
    location: LatLng,
}

/// Extracts the first result's location from a Google geocoding JSON body.
///
/// Any status other than `OK` is a [`TreefallError::GeocodeFailed`]
/// carrying that status.
pub fn parse_geocode_response(body: &str) -> Result<LatLng, TreefallError> {
    let response: GeocodeResponse = serde_json::from_str(body)
        .map_err(|e| TreefallError::GeocodeFailed(format!("malformed response: {}", e)))?;

    if response.status != "OK" {
        return Err(TreefallError::GeocodeFailed(response.status));
    }

    response
        .results
        .into_iter()
        .next()
        .map(|r| r.geometry.location)
        .ok_or_else(|| TreefallError::GeocodeFailed("OK without results".to_string()))
}
