use crate::error::TreefallError;
use geo_types::Geometry;
use std::str::FromStr;
use wkt::Wkt;

/// Parses one WKT geometry, with x = longitude and y = latitude.
pub fn parse_wkt(s: &str) -> Result<Geometry<f64>, TreefallError> {
    let wkt: Wkt<f64> =
        Wkt::from_str(s.trim()).map_err(|e| TreefallError::GeometryParseError(e.to_string()))?;

    wkt.try_into()
        .map_err(|_| TreefallError::GeometryParseError(format!("unsupported WKT: {}", s.trim())))
}
