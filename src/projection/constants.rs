/// Web Mercator ground resolution at the equator for zoom 0, in metres per pixel
pub const GROUND_RESOLUTION_EQUATOR: f64 = 156543.03392;

/// Metres spanned by one degree of latitude (and of longitude at the equator)
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Web Mercator is only valid up to roughly this latitude
pub const MAX_MERCATOR_LATITUDE: f64 = 85.0;

/// Maximum zoom level accepted
pub const MAX_ZOOM_LEVEL: u8 = 30;

/// Zoom used for satellite tiles unless the caller overrides it
pub const DEFAULT_ZOOM: u8 = 19;

/// Nominal tile edge in pixels
pub const DEFAULT_TILE_SIZE: u32 = 640;

/// Device scale factor of the tile service
pub const DEFAULT_SCALE: f64 = 1.0;
