use crate::danger::BuildingFootprint;
use crate::error::TreefallError;
use crate::geom::parse_wkt;
use log::debug;
use std::path::Path;

/// Parses building footprints written one WKT geometry per line.
///
/// Blank lines and lines starting with `#` are skipped. Points and lines
/// are dropped like in the GeoJSON reader.
pub fn parse_buildings_wkt(s: &str) -> Result<Vec<BuildingFootprint>, TreefallError> {
    let mut buildings = Vec::new();
    let mut dropped = 0;

    for (i, line) in s.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let geometry = parse_wkt(line).map_err(|e| {
            TreefallError::GeometryParseError(format!("line {}: {}", i + 1, e))
        })?;
        match BuildingFootprint::from_geometry(geometry) {
            Some(building) => buildings.push(building),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!("dropped {} non-polygonal WKT lines", dropped);
    }
    Ok(buildings)
}

/// Reads building footprints from a WKT-per-line file.
pub fn read_buildings_wkt(
    path: impl AsRef<Path>,
) -> Result<Vec<BuildingFootprint>, TreefallError> {
    let text =
        std::fs::read_to_string(path).map_err(|e| TreefallError::IoError(e.to_string()))?;
    parse_buildings_wkt(&text)
}
