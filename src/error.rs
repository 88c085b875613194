/// Error type for treefall-rs operations.
#[derive(Debug, Clone, PartialEq)]
pub enum TreefallError {
    /// Latitude is outside [-90, 90] or not a finite number.
    InvalidLatitude(f64),
    /// Latitude sits on a pole, where one pixel covers zero ground distance
    /// and metre/degree conversions would divide by zero.
    DegenerateResolution(f64),
    /// The zoom level is outside the valid range (0-30).
    InvalidZoomLevel(u8),
    /// The device scale factor is not a positive finite number.
    InvalidScale(f64),
    /// Tile image dimensions are zero.
    InvalidTileDimensions { width: u32, height: u32 },
    /// A detection box or score violates its invariants.
    InvalidDetection(String),
    /// Detection filter thresholds are inconsistent.
    InvalidFilterConfig(String),
    /// The fall multiplier is negative or not finite.
    InvalidFallMultiplier(f64),
    /// The geocoding service reported a non-success status.
    GeocodeFailed(String),
    /// A network call failed before a response was received.
    NetworkError(String),
    /// The tile service returned an error or an unreadable image.
    TileFetchFailed(String),
    /// The tree detector failed to load or to run.
    DetectorError(String),
    /// The building-footprint service failed.
    BuildingFetchFailed(String),
    /// Failed to parse geometry from string (GeoJSON or WKT).
    GeometryParseError(String),
    /// CSV parsing or writing error.
    CsvError(String),
    /// File I/O or serialization error.
    IoError(String),
    /// Configuration could not be loaded.
    ConfigError(String),
}

impl TreefallError {
    /// Whether retrying the same call could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            TreefallError::NetworkError(_) => true,
            TreefallError::GeocodeFailed(status) => {
                status == "OVER_QUERY_LIMIT" || status == "UNKNOWN_ERROR"
            }
            _ => false,
        }
    }
}

impl std::fmt::Display for TreefallError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TreefallError::InvalidLatitude(lat) => write!(f, "Invalid latitude: {}", lat),
            TreefallError::DegenerateResolution(lat) => {
                write!(f, "Degenerate ground resolution at latitude {}", lat)
            }
            TreefallError::InvalidZoomLevel(z) => write!(f, "Invalid zoom level: {}", z),
            TreefallError::InvalidScale(s) => write!(f, "Invalid scale factor: {}", s),
            TreefallError::InvalidTileDimensions { width, height } => {
                write!(f, "Invalid tile dimensions: {}x{}", width, height)
            }
            TreefallError::InvalidDetection(msg) => write!(f, "Invalid detection: {}", msg),
            TreefallError::InvalidFilterConfig(msg) => {
                write!(f, "Invalid filter config: {}", msg)
            }
            TreefallError::InvalidFallMultiplier(m) => {
                write!(f, "Invalid fall multiplier: {}", m)
            }
            TreefallError::GeocodeFailed(status) => write!(f, "Geocoding failed: {}", status),
            TreefallError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            TreefallError::TileFetchFailed(msg) => write!(f, "Tile fetch failed: {}", msg),
            TreefallError::DetectorError(msg) => write!(f, "Detector error: {}", msg),
            TreefallError::BuildingFetchFailed(msg) => {
                write!(f, "Building fetch failed: {}", msg)
            }
            TreefallError::GeometryParseError(msg) => write!(f, "Geometry parse error: {}", msg),
            TreefallError::CsvError(msg) => write!(f, "CSV error: {}", msg),
            TreefallError::IoError(msg) => write!(f, "IO error: {}", msg),
            TreefallError::ConfigError(msg) => write!(f, "Config error: {}", msg),
        }
    }
}

impl std::error::Error for TreefallError {}
