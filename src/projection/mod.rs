pub mod constants;
mod mercator;
mod tile;

pub use constants::{
    DEFAULT_SCALE, DEFAULT_TILE_SIZE, DEFAULT_ZOOM, GROUND_RESOLUTION_EQUATOR,
    MAX_MERCATOR_LATITUDE, MAX_ZOOM_LEVEL, METERS_PER_DEGREE,
};
pub use mercator::{
    degrees_per_meter, lat_lng_to_pixel, meters_per_pixel, pixel_to_lat_lng, tile_bounds,
};
pub use tile::{TileBounds, TileContext, TileRequest};
