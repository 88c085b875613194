pub mod arrow;
pub mod csv;
pub mod geojson;
pub mod wkt;

pub use self::arrow::TreeRisksToArrow;
pub use self::csv::{read_detections, read_detections_from, write_tree_risks};
pub use self::geojson::{parse_buildings, read_buildings, trees_to_feature_collection};
pub use self::wkt::{parse_buildings_wkt, read_buildings_wkt};
