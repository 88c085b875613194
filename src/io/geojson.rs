use crate::danger::BuildingFootprint;
use crate::error::TreefallError;
use crate::risk::TreeRisk;
use geo_types::Geometry;
use geojson::feature::Id;
use geojson::{Feature, FeatureCollection, GeoJson, JsonObject, Value};
use log::debug;
use serde_json::json;
use std::path::Path;

fn feature_id(feature: &Feature) -> Option<String> {
    match &feature.id {
        Some(Id::String(s)) => Some(s.clone()),
        Some(Id::Number(n)) => Some(n.to_string()),
        None => feature
            .property("id")
            .or_else(|| feature.property("osmid"))
            .map(|v| match v.as_str() {
                Some(s) => s.to_string(),
                None => v.to_string(),
            }),
    }
}

fn feature_to_building(feature: Feature) -> Result<Option<BuildingFootprint>, TreefallError> {
    let id = feature_id(&feature);
    let Some(geometry) = feature.geometry else {
        return Ok(None);
    };
    let geometry = Geometry::<f64>::try_from(geometry)
        .map_err(|e| TreefallError::GeometryParseError(e.to_string()))?;

    Ok(BuildingFootprint::from_geometry(geometry).map(|b| match id {
        Some(id) => b.with_id(id),
        None => b,
    }))
}

/// Parses building footprints from GeoJSON (a FeatureCollection, a single
/// Feature or a bare Geometry). Only Polygon and MultiPolygon geometries
/// are kept.
pub fn parse_buildings(s: &str) -> Result<Vec<BuildingFootprint>, TreefallError> {
    let geojson: GeoJson = s
        .parse()
        .map_err(|e: geojson::Error| TreefallError::GeometryParseError(e.to_string()))?;

    let features = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(feat) => vec![feat],
        GeoJson::Geometry(geom) => vec![Feature::from(geom)],
    };

    let total = features.len();
    let mut buildings = Vec::with_capacity(total);
    for feature in features {
        if let Some(building) = feature_to_building(feature)? {
            buildings.push(building);
        }
    }

    if buildings.len() < total {
        debug!(
            "dropped {} non-polygonal features out of {}",
            total - buildings.len(),
            total
        );
    }
    Ok(buildings)
}

/// Reads building footprints from a GeoJSON file.
pub fn read_buildings(path: impl AsRef<Path>) -> Result<Vec<BuildingFootprint>, TreefallError> {
    let text =
        std::fs::read_to_string(path).map_err(|e| TreefallError::IoError(e.to_string()))?;
    parse_buildings(&text)
}

/// One Point feature per tree, carrying every field as a property plus a
/// `status` of `danger` or `safe`.
pub fn trees_to_feature_collection(trees: &[TreeRisk]) -> FeatureCollection {
    let features = trees
        .iter()
        .map(|tree| {
            let d = &tree.detection;
            let mut properties = JsonObject::new();
            properties.insert("xmin".to_string(), json!(d.xmin));
            properties.insert("ymin".to_string(), json!(d.ymin));
            properties.insert("xmax".to_string(), json!(d.xmax));
            properties.insert("ymax".to_string(), json!(d.ymax));
            properties.insert("score".to_string(), json!(d.score));
            properties.insert("label".to_string(), json!(d.label));
            properties.insert("canopy_radius_m".to_string(), json!(tree.canopy_radius_m));
            properties.insert("fall_radius_m".to_string(), json!(tree.fall_radius_m));
            properties.insert("danger".to_string(), json!(tree.danger));
            properties.insert("status".to_string(), json!(tree.status()));

            Feature {
                bbox: None,
                geometry: Some(geojson::Geometry::new(Value::Point(vec![
                    tree.tree_lng(),
                    tree.tree_lat(),
                ]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}
