use crate::coord::{Coordinate, LatLng, PixelCoord};
use crate::error::TreefallError;
use crate::projection::constants::{
    DEFAULT_SCALE, DEFAULT_TILE_SIZE, DEFAULT_ZOOM, MAX_MERCATOR_LATITUDE,
};
use crate::projection::mercator::{LocalProjection, tile_bounds};
use geo_types::{Rect, coord};
use log::warn;
use serde::{Deserialize, Serialize};

/// Geographic bounding box covered by a tile, in WGS84 degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileBounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl TileBounds {
    /// Planar rectangle with x = longitude, y = latitude.
    pub fn to_rect(&self) -> Rect<f64> {
        Rect::new(
            coord! { x: self.west, y: self.south },
            coord! { x: self.east, y: self.north },
        )
    }

    pub fn contains(&self, coord: &impl Coordinate) -> bool {
        coord.lat() >= self.south
            && coord.lat() <= self.north
            && coord.lng() >= self.west
            && coord.lng() <= self.east
    }
}

/// What a tile fetcher is asked for.
///
/// # Example
/// ```
/// use treefall_rs::{LatLng, TileRequest};
///
/// let request = TileRequest::new(LatLng::new(37.6766, -122.4594))
///     .zoom(19)
///     .size(640)
///     .scale(2.0);
/// assert_eq!(request.expected_dimensions(), (1280, 1280));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TileRequest {
    pub center: LatLng,
    pub zoom: u8,
    /// Nominal edge length in pixels, before the scale factor
    pub size: u32,
    pub scale: f64,
}

impl TileRequest {
    pub fn new(center: LatLng) -> Self {
        Self {
            center,
            zoom: DEFAULT_ZOOM,
            size: DEFAULT_TILE_SIZE,
            scale: DEFAULT_SCALE,
        }
    }

    pub fn zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }

    pub fn size(mut self, size: u32) -> Self {
        self.size = size;
        self
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Pixel dimensions the returned image should have.
    pub fn expected_dimensions(&self) -> (u32, u32) {
        let edge = (self.size as f64 * self.scale).round() as u32;
        (edge, edge)
    }

    /// Ground extent of the requested tile.
    pub fn bounds(&self) -> Result<TileBounds, TreefallError> {
        let (width, _) = self.expected_dimensions();
        tile_bounds(&self.center, width, self.zoom, self.scale)
    }

    /// Query parameters for a static satellite map service.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("center", format!("{},{}", self.center.lat, self.center.lng)),
            ("zoom", self.zoom.to_string()),
            ("size", format!("{}x{}", self.size, self.size)),
            ("scale", self.scale.to_string()),
            ("maptype", "satellite".to_string()),
        ]
    }
}

/// Georeferencing of one fetched tile image.
///
/// Immutable once built: everything that places pixels on the ground
/// (risk computation, overlay rendering) goes through these methods so
/// forward and inverse conversions cannot drift apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileContext {
    center: LatLng,
    zoom: u8,
    pixel_size: u32,
    scale: f64,
    image_width: u32,
    image_height: u32,
    projection: LocalProjection,
}

impl TileContext {
    /// Builds a context for an image of `image_width` x `image_height`
    /// pixels rendered at `zoom` and device `scale` around `center`.
    ///
    /// # Example
    /// ```
    /// use treefall_rs::{LatLng, PixelCoord, TileContext};
    ///
    /// # fn main() -> Result<(), treefall_rs::TreefallError> {
    /// let tile = TileContext::new(LatLng::new(37.0, -122.0), 19, 640, 1.0, 640, 640)?;
    /// let center = tile.pixel_to_lat_lng(PixelCoord::new(320.0, 320.0));
    /// assert_eq!(center, LatLng::new(37.0, -122.0));
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(
        center: LatLng,
        zoom: u8,
        pixel_size: u32,
        scale: f64,
        image_width: u32,
        image_height: u32,
    ) -> Result<Self, TreefallError> {
        if !center.lat.is_finite() || center.lat.abs() > MAX_MERCATOR_LATITUDE {
            return Err(TreefallError::InvalidLatitude(center.lat));
        }
        if image_width == 0 || image_height == 0 {
            return Err(TreefallError::InvalidTileDimensions {
                width: image_width,
                height: image_height,
            });
        }
        let projection = LocalProjection::new(&center, image_width, image_height, zoom, scale)?;

        Ok(Self {
            center,
            zoom,
            pixel_size,
            scale,
            image_width,
            image_height,
            projection,
        })
    }

    /// Builds a context from the request and the dimensions the tile
    /// service actually delivered.
    ///
    /// The scale is taken from the delivered width over the nominal size,
    /// so a service that ignores the requested scale still yields the true
    /// ground resolution and the same ground extent as the request.
    pub fn from_request(
        request: &TileRequest,
        image_width: u32,
        image_height: u32,
    ) -> Result<Self, TreefallError> {
        if request.size == 0 {
            return Err(TreefallError::InvalidTileDimensions {
                width: request.size,
                height: request.size,
            });
        }
        let expected = request.expected_dimensions();
        let effective_scale = image_width as f64 / request.size as f64;
        if expected != (image_width, image_height) {
            warn!(
                "tile is {}x{} px but {}x{} was requested (size {}, scale {}), using scale {}",
                image_width,
                image_height,
                expected.0,
                expected.1,
                request.size,
                request.scale,
                effective_scale
            );
        }
        Self::new(
            request.center,
            request.zoom,
            request.size,
            effective_scale,
            image_width,
            image_height,
        )
    }

    pub fn center(&self) -> LatLng {
        self.center
    }

    pub fn center_lat(&self) -> f64 {
        self.center.lat
    }

    pub fn center_lng(&self) -> f64 {
        self.center.lng
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    /// Nominal tile size that was requested.
    pub fn pixel_size(&self) -> u32 {
        self.pixel_size
    }

    /// Scale the image was actually rendered at.
    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn image_width(&self) -> u32 {
        self.image_width
    }

    pub fn image_height(&self) -> u32 {
        self.image_height
    }

    /// Effective ground resolution of this image, scale factor included.
    pub fn meters_per_pixel(&self) -> f64 {
        self.projection.meters_per_pixel()
    }

    pub fn pixel_to_lat_lng(&self, pixel: PixelCoord) -> LatLng {
        self.projection.to_lat_lng(pixel)
    }

    pub fn lat_lng_to_pixel(&self, coord: &impl Coordinate) -> PixelCoord {
        self.projection.to_pixel(coord)
    }

    pub fn contains_pixel(&self, pixel: PixelCoord) -> bool {
        pixel.x >= 0.0
            && pixel.y >= 0.0
            && pixel.x <= self.image_width as f64
            && pixel.y <= self.image_height as f64
    }

    /// Ground extent of the image, edges included.
    pub fn bounds(&self) -> TileBounds {
        let w = self.image_width as f64;
        let h = self.image_height as f64;
        let top = self.pixel_to_lat_lng(PixelCoord::new(w / 2.0, 0.0));
        let bottom = self.pixel_to_lat_lng(PixelCoord::new(w / 2.0, h));
        let left = self.pixel_to_lat_lng(PixelCoord::new(0.0, h / 2.0));
        let right = self.pixel_to_lat_lng(PixelCoord::new(w, h / 2.0));

        TileBounds {
            north: top.lat,
            south: bottom.lat,
            east: right.lng,
            west: left.lng,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projection::mercator::meters_per_pixel;

    fn colma_tile() -> Result<TileContext, TreefallError> {
        TileContext::new(LatLng::new(37.6766, -122.4594), 19, 640, 1.0, 640, 640)
    }

    #[test]
    fn test_context_matches_free_bounds() -> Result<(), TreefallError> {
        let tile = colma_tile()?;
        let expected = tile_bounds(&tile.center(), 640, 19, 1.0)?;
        let bounds = tile.bounds();

        assert!((bounds.north - expected.north).abs() < 1e-12);
        assert!((bounds.south - expected.south).abs() < 1e-12);
        assert!((bounds.east - expected.east).abs() < 1e-12);
        assert!((bounds.west - expected.west).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_context_round_trip() -> Result<(), TreefallError> {
        let tile = colma_tile()?;
        let pixel = PixelCoord::new(12.25, 603.5);
        let back = tile.lat_lng_to_pixel(&tile.pixel_to_lat_lng(pixel));
        assert!((back.x - pixel.x).abs() < 1e-6);
        assert!((back.y - pixel.y).abs() < 1e-6);
        Ok(())
    }

    #[test]
    fn test_context_rejects_polar_center() {
        let result = TileContext::new(LatLng::new(86.0, 0.0), 19, 640, 1.0, 640, 640);
        assert!(matches!(result, Err(TreefallError::InvalidLatitude(_))));
    }

    #[test]
    fn test_context_rejects_empty_image() {
        let result = TileContext::new(LatLng::new(37.0, 0.0), 19, 640, 1.0, 0, 640);
        assert!(matches!(
            result,
            Err(TreefallError::InvalidTileDimensions { width: 0, .. })
        ));
    }

    #[test]
    fn test_from_request_with_scale() -> Result<(), TreefallError> {
        let request = TileRequest::new(LatLng::new(37.0, -122.0)).scale(2.0);
        let tile = TileContext::from_request(&request, 1280, 1280)?;

        let nominal = nominal_tile(&request)?;
        assert!((tile.meters_per_pixel() * 2.0 - nominal.meters_per_pixel()).abs() < 1e-12);
        assert!((tile.bounds().north - nominal.bounds().north).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_from_request_ignored_scale_uses_delivered_size() -> Result<(), TreefallError> {
        let request = TileRequest::new(LatLng::new(37.0, -122.0)).scale(2.0);
        let tile = TileContext::from_request(&request, 640, 640)?;

        let nominal = meters_per_pixel(37.0, 19, 1.0)?;
        assert!((tile.meters_per_pixel() - nominal).abs() < 1e-12);
        assert_eq!(tile.scale(), 1.0);

        let requested = request.bounds()?;
        let bounds = tile.bounds();
        assert!((bounds.north - requested.north).abs() < 1e-12);
        assert!((bounds.south - requested.south).abs() < 1e-12);
        assert!((bounds.east - requested.east).abs() < 1e-12);
        assert!((bounds.west - requested.west).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn test_from_request_zero_size_rejected() {
        let request = TileRequest::new(LatLng::new(37.0, -122.0)).size(0);
        assert!(matches!(
            TileContext::from_request(&request, 640, 640),
            Err(TreefallError::InvalidTileDimensions { .. })
        ));
    }

    fn nominal_tile(request: &TileRequest) -> Result<TileContext, TreefallError> {
        TileContext::new(request.center, request.zoom, request.size, 1.0, 640, 640)
    }

    #[test]
    fn test_request_bounds_and_params() -> Result<(), TreefallError> {
        let request = TileRequest::new(LatLng::new(37.0, -122.0));
        let bounds = request.bounds()?;
        assert!(bounds.contains(&request.center));

        let params = request.query_params();
        assert!(params.contains(&("size", "640x640".to_string())));
        assert!(params.contains(&("scale", "1".to_string())));
        assert!(params.contains(&("maptype", "satellite".to_string())));
        Ok(())
    }

    #[test]
    fn test_bounds_to_rect() -> Result<(), TreefallError> {
        let bounds = colma_tile()?.bounds();
        let rect = bounds.to_rect();
        assert_eq!(rect.min().x, bounds.west);
        assert_eq!(rect.max().y, bounds.north);
        Ok(())
    }

    #[test]
    fn test_contains_pixel() -> Result<(), TreefallError> {
        let tile = colma_tile()?;
        assert!(tile.contains_pixel(PixelCoord::new(0.0, 640.0)));
        assert!(!tile.contains_pixel(PixelCoord::new(-0.5, 10.0)));
        Ok(())
    }
}
