mod circle;
mod parse;

pub use circle::{CIRCLE_SEGMENTS, create_circle};
pub use parse::parse_wkt;
