use crate::detection::Detection;
use crate::error::TreefallError;
use crate::risk::TreeRisk;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

const TREE_RISK_HEADER: [&str; 11] = [
    "xmin",
    "ymin",
    "xmax",
    "ymax",
    "score",
    "label",
    "tree_lat",
    "tree_lng",
    "canopy_radius_m",
    "fall_radius_m",
    "danger",
];

/// Reads detector output from a CSV file with a
/// `xmin,ymin,xmax,ymax,score,label` header. Extra columns are ignored.
pub fn read_detections(csv_path: impl AsRef<Path>) -> Result<Vec<Detection>, TreefallError> {
    let file = File::open(csv_path).map_err(|e| TreefallError::IoError(e.to_string()))?;
    read_detections_from(file)
}

/// Same as [`read_detections`] over any reader.
pub fn read_detections_from<R: Read>(reader: R) -> Result<Vec<Detection>, TreefallError> {
    let mut reader = csv::Reader::from_reader(reader);
    let mut detections = Vec::new();

    for (i, result) in reader.deserialize::<Detection>().enumerate() {
        let detection = result.map_err(|e| TreefallError::CsvError(e.to_string()))?;
        detection.validate().map_err(|e| {
            TreefallError::CsvError(format!("Row {}: {}", i + 1, e))
        })?;
        detections.push(detection);
    }

    Ok(detections)
}

/// Writes classified trees as CSV. The header is written even when
/// `trees` is empty.
pub fn write_tree_risks<W: Write>(writer: W, trees: &[TreeRisk]) -> Result<(), TreefallError> {
    let mut writer = csv::Writer::from_writer(writer);

    writer
        .write_record(TREE_RISK_HEADER)
        .map_err(|e| TreefallError::CsvError(e.to_string()))?;

    for tree in trees {
        let d = &tree.detection;
        let row = [
            d.xmin.to_string(),
            d.ymin.to_string(),
            d.xmax.to_string(),
            d.ymax.to_string(),
            d.score.to_string(),
            d.label.clone(),
            tree.tree_lat().to_string(),
            tree.tree_lng().to_string(),
            tree.canopy_radius_m.to_string(),
            tree.fall_radius_m.to_string(),
            tree.danger.to_string(),
        ];
        writer
            .write_record(&row)
            .map_err(|e| TreefallError::CsvError(e.to_string()))?;
    }

    writer
        .flush()
        .map_err(|e| TreefallError::CsvError(e.to_string()))?;

    Ok(())
}
