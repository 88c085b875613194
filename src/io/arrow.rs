use crate::danger::fall_radius_degrees;
use crate::error::TreefallError;
use crate::geom::{CIRCLE_SEGMENTS, create_circle};
use crate::risk::TreeRisk;
use arrow_array::{BooleanArray, Float64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use geo_types::Polygon;
use geoarrow_array::IntoArrow;
use geoarrow_array::array::{PointArray, PolygonArray};
use geoarrow_array::builder::{PointBuilder, PolygonBuilder};
use geoarrow_schema::{Crs, Dimension, Metadata, PointType, PolygonType};
use rayon::prelude::*;
use std::sync::Arc;

fn wgs84_metadata() -> Arc<Metadata> {
    let crs = Crs::from_authority_code("EPSG:4326".to_string());
    Arc::new(Metadata::new(crs, None))
}

/// Trait for handing collections of [`TreeRisk`]s to columnar renderers.
///
/// Implemented for `[TreeRisk]` and `Vec<TreeRisk>`.
pub trait TreeRisksToArrow {
    /// Converts tree locations to an Arrow PointArray.
    fn to_arrow_points(&self) -> PointArray;
    /// Converts fall circles (degree-space buffers) to an Arrow PolygonArray.
    fn to_arrow_fall_circles(&self) -> Result<PolygonArray, TreefallError>;
    /// Converts trees to a RecordBatch with every detection and risk column
    /// plus a point geometry. The schema is the same for an empty input.
    fn to_record_batch(&self) -> Result<RecordBatch, TreefallError>;
}

impl TreeRisksToArrow for [TreeRisk] {
    fn to_arrow_points(&self) -> PointArray {
        let point = PointType::new(Dimension::XY, wgs84_metadata());
        let mut builder = PointBuilder::with_capacity(point, self.len());

        for tree in self {
            builder.push_point(Some(&tree.location.to_point()));
        }
        builder.finish()
    }

    fn to_arrow_fall_circles(&self) -> Result<PolygonArray, TreefallError> {
        let poly = PolygonType::new(Dimension::XY, wgs84_metadata());
        let circles: Vec<Polygon<f64>> = self
            .par_iter()
            .map(|t: &TreeRisk| {
                let radius = fall_radius_degrees(t.fall_radius_m, t.tree_lat())?;
                Ok(create_circle(&t.location.to_point(), radius, CIRCLE_SEGMENTS))
            })
            .collect::<Result<_, TreefallError>>()?;
        Ok(PolygonBuilder::from_polygons(&circles, poly).finish())
    }

    fn to_record_batch(&self) -> Result<RecordBatch, TreefallError> {
        let point_array = self.to_arrow_points();
        let xmin: Float64Array = self.iter().map(|t| Some(t.detection.xmin)).collect();
        let ymin: Float64Array = self.iter().map(|t| Some(t.detection.ymin)).collect();
        let xmax: Float64Array = self.iter().map(|t| Some(t.detection.xmax)).collect();
        let ymax: Float64Array = self.iter().map(|t| Some(t.detection.ymax)).collect();
        let scores: Float64Array = self.iter().map(|t| Some(t.detection.score)).collect();
        let labels: StringArray = self
            .iter()
            .map(|t| Some(t.detection.label.as_str()))
            .collect();
        let lats: Float64Array = self.iter().map(|t| Some(t.tree_lat())).collect();
        let lngs: Float64Array = self.iter().map(|t| Some(t.tree_lng())).collect();
        let canopy: Float64Array = self.iter().map(|t| Some(t.canopy_radius_m)).collect();
        let fall: Float64Array = self.iter().map(|t| Some(t.fall_radius_m)).collect();
        let danger: BooleanArray = self.iter().map(|t| Some(t.danger)).collect();

        let geometry_field = point_array.extension_type().to_field("geometry", false);
        let schema = Schema::new(vec![
            Field::new("xmin", DataType::Float64, false),
            Field::new("ymin", DataType::Float64, false),
            Field::new("xmax", DataType::Float64, false),
            Field::new("ymax", DataType::Float64, false),
            Field::new("score", DataType::Float64, false),
            Field::new("label", DataType::Utf8, false),
            Field::new("tree_lat", DataType::Float64, false),
            Field::new("tree_lng", DataType::Float64, false),
            Field::new("canopy_radius_m", DataType::Float64, false),
            Field::new("fall_radius_m", DataType::Float64, false),
            Field::new("danger", DataType::Boolean, false),
            geometry_field,
        ]);

        RecordBatch::try_new(
            Arc::new(schema),
            vec![
                Arc::new(xmin),
                Arc::new(ymin),
                Arc::new(xmax),
                Arc::new(ymax),
                Arc::new(scores),
                Arc::new(labels),
                Arc::new(lats),
                Arc::new(lngs),
                Arc::new(canopy),
                Arc::new(fall),
                Arc::new(danger),
                Arc::new(point_array.into_arrow()),
            ],
        )
        .map_err(|e| TreefallError::IoError(e.to_string()))
    }
}

impl TreeRisksToArrow for Vec<TreeRisk> {
    fn to_arrow_points(&self) -> PointArray {
        self.as_slice().to_arrow_points()
    }

    fn to_arrow_fall_circles(&self) -> Result<PolygonArray, TreefallError> {
        self.as_slice().to_arrow_fall_circles()
    }

    fn to_record_batch(&self) -> Result<RecordBatch, TreefallError> {
        self.as_slice().to_record_batch()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::LatLng;
    use crate::detection::Detection;
    use arrow_array::Array;
    use arrow_array::cast::AsArray;
    use geoarrow_array::GeoArrowArray;

    fn trees() -> Result<Vec<TreeRisk>, TreefallError> {
        Ok(vec![
            TreeRisk {
                detection: Detection::new(300.0, 300.0, 320.0, 320.0, 0.9, "Tree")?,
                location: LatLng::new(37.0000214, -122.0000269),
                canopy_radius_m: 2.385,
                fall_radius_m: 4.77,
                danger: true,
            },
            TreeRisk {
                detection: Detection::new(10.0, 10.0, 50.0, 60.0, 0.4, "Tree")?,
                location: LatLng::new(37.0003, -122.0004),
                canopy_radius_m: 5.4,
                fall_radius_m: 10.8,
                danger: false,
            },
        ])
    }

    #[test]
    fn test_trees_to_arrow_points() -> Result<(), TreefallError> {
        let point_array = trees()?.to_arrow_points();
        assert_eq!(point_array.len(), 2);
        Ok(())
    }

    #[test]
    fn test_trees_to_fall_circles() -> Result<(), TreefallError> {
        let circles = trees()?.to_arrow_fall_circles()?;
        assert_eq!(circles.len(), 2);
        Ok(())
    }

    #[test]
    fn test_record_batch_columns() -> Result<(), TreefallError> {
        let batch = trees()?.to_record_batch()?;
        assert_eq!(batch.num_rows(), 2);
        assert_eq!(batch.num_columns(), 12);

        let danger = batch
            .column_by_name("danger")
            .ok_or_else(|| TreefallError::IoError("missing danger column".into()))?
            .as_boolean();
        assert!(danger.value(0));
        assert!(!danger.value(1));
        Ok(())
    }

    #[test]
    fn test_empty_record_batch_keeps_danger_column() -> Result<(), TreefallError> {
        let empty: Vec<TreeRisk> = Vec::new();
        let batch = empty.to_record_batch()?;

        assert_eq!(batch.num_rows(), 0);
        let field = batch
            .schema()
            .field_with_name("danger")
            .map_err(|e| TreefallError::IoError(e.to_string()))?
            .clone();
        assert_eq!(field.data_type(), &DataType::Boolean);
        assert_eq!(batch.column(10).len(), 0);
        Ok(())
    }
}
