use geo_types::{Coord, Point};
use serde::{Deserialize, Serialize};

/// Trait for types that carry a WGS84 latitude/longitude pair.
///
/// Implemented for [`LatLng`] and `geo_types::Point<f64>` (x = longitude,
/// y = latitude). Bare tuples are deliberately left out since `(lat, lng)`
/// and `(x, y)` orderings disagree.
pub trait Coordinate {
    /// Returns the latitude in degrees.
    fn lat(&self) -> f64;
    /// Returns the longitude in degrees.
    fn lng(&self) -> f64;
}

/// A WGS84 (EPSG:4326) position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Planar point with x = longitude, y = latitude.
    pub fn to_point(&self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }
}

impl Coordinate for LatLng {
    fn lat(&self) -> f64 {
        self.lat
    }
    fn lng(&self) -> f64 {
        self.lng
    }
}

impl Coordinate for Point<f64> {
    fn lat(&self) -> f64 {
        self.y()
    }
    fn lng(&self) -> f64 {
        self.x()
    }
}

impl From<Point<f64>> for LatLng {
    fn from(point: Point<f64>) -> Self {
        Self::new(point.y(), point.x())
    }
}

impl From<LatLng> for Point<f64> {
    fn from(coord: LatLng) -> Self {
        coord.to_point()
    }
}

/// A position in tile image space: origin top-left, y grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelCoord {
    pub x: f64,
    pub y: f64,
}

impl PixelCoord {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

impl From<PixelCoord> for Coord<f64> {
    fn from(pixel: PixelCoord) -> Self {
        Coord {
            x: pixel.x,
            y: pixel.y,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_trait_lat_lng() {
        let coord = LatLng::new(37.0, -122.4);
        assert_eq!(coord.lat(), 37.0);
        assert_eq!(coord.lng(), -122.4);
    }

    #[test]
    fn test_coordinate_trait_point() {
        let point = Point::new(-122.4, 37.0);
        assert_eq!(Coordinate::lat(&point), 37.0);
        assert_eq!(Coordinate::lng(&point), -122.4);
    }

    #[test]
    fn test_point_axis_order() {
        let point = LatLng::new(37.0, -122.4).to_point();
        assert_eq!(point.x(), -122.4);
        assert_eq!(point.y(), 37.0);
        assert_eq!(LatLng::from(point), LatLng::new(37.0, -122.4));
    }
}
