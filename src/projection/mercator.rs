use crate::coord::{Coordinate, LatLng, PixelCoord};
use crate::error::TreefallError;
use crate::projection::constants::{GROUND_RESOLUTION_EQUATOR, MAX_ZOOM_LEVEL, METERS_PER_DEGREE};
use crate::projection::tile::TileBounds;

fn check_latitude(lat: f64) -> Result<(), TreefallError> {
    if !lat.is_finite() || lat.abs() > 90.0 {
        return Err(TreefallError::InvalidLatitude(lat));
    }
    Ok(())
}

fn check_zoom(zoom: u8) -> Result<(), TreefallError> {
    if zoom > MAX_ZOOM_LEVEL {
        return Err(TreefallError::InvalidZoomLevel(zoom));
    }
    Ok(())
}

fn check_scale(scale: f64) -> Result<(), TreefallError> {
    if !scale.is_finite() || scale <= 0.0 {
        return Err(TreefallError::InvalidScale(scale));
    }
    Ok(())
}

/// Ground distance covered by one image pixel under Web Mercator.
///
/// `scale` is the device scale factor the tile was rendered at: a tile
/// requested at scale 2 has twice as many pixels over the same ground, so
/// each pixel covers half the distance.
///
/// Returns `0.0` exactly on the poles. Callers dividing by the result must
/// guard against that case.
///
/// # Example
/// ```
/// use treefall_rs::meters_per_pixel;
///
/// # fn main() -> Result<(), treefall_rs::TreefallError> {
/// let mpp = meters_per_pixel(37.0, 19, 1.0)?;
/// assert!((mpp - 0.2385).abs() < 1e-4);
/// # Ok(())
/// # }
/// ```
pub fn meters_per_pixel(lat: f64, zoom: u8, scale: f64) -> Result<f64, TreefallError> {
    check_latitude(lat)?;
    check_zoom(zoom)?;
    check_scale(scale)?;

    if lat.abs() == 90.0 {
        return Ok(0.0);
    }

    let resolution = GROUND_RESOLUTION_EQUATOR * lat.to_radians().cos() / 2f64.powi(zoom as i32);
    Ok(resolution / scale)
}

/// Degrees per metre along latitude and longitude at the given latitude.
///
/// Returns `(deg_lat_per_m, deg_lng_per_m)`. Longitude degrees shrink with
/// `cos(lat)`, latitude degrees do not.
pub fn degrees_per_meter(lat: f64) -> Result<(f64, f64), TreefallError> {
    check_latitude(lat)?;
    if lat.abs() == 90.0 {
        return Err(TreefallError::DegenerateResolution(lat));
    }

    let deg_lat_per_m = 1.0 / METERS_PER_DEGREE;
    let deg_lng_per_m = 1.0 / (METERS_PER_DEGREE * lat.to_radians().cos());
    Ok((deg_lat_per_m, deg_lng_per_m))
}

/// Flat-earth mapping between a tile's pixels and WGS84 around its centre.
///
/// Forward and inverse share the same precomputed factors so a round trip
/// only accumulates floating point error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct LocalProjection {
    center: LatLng,
    half_width: f64,
    half_height: f64,
    meters_per_pixel: f64,
    deg_lat_per_m: f64,
    deg_lng_per_m: f64,
}

impl LocalProjection {
    pub(crate) fn new(
        center: &impl Coordinate,
        image_width: u32,
        image_height: u32,
        zoom: u8,
        scale: f64,
    ) -> Result<Self, TreefallError> {
        let meters_per_pixel = meters_per_pixel(center.lat(), zoom, scale)?;
        let (deg_lat_per_m, deg_lng_per_m) = degrees_per_meter(center.lat())?;

        Ok(Self {
            center: LatLng::new(center.lat(), center.lng()),
            half_width: image_width as f64 / 2.0,
            half_height: image_height as f64 / 2.0,
            meters_per_pixel,
            deg_lat_per_m,
            deg_lng_per_m,
        })
    }

    pub(crate) fn meters_per_pixel(&self) -> f64 {
        self.meters_per_pixel
    }

    pub(crate) fn to_lat_lng(&self, pixel: PixelCoord) -> LatLng {
        let dx_m = (pixel.x - self.half_width) * self.meters_per_pixel;
        let dy_m = (pixel.y - self.half_height) * self.meters_per_pixel;

        // pixel y grows southward
        LatLng::new(
            self.center.lat - dy_m * self.deg_lat_per_m,
            self.center.lng + dx_m * self.deg_lng_per_m,
        )
    }

    pub(crate) fn to_pixel(&self, coord: &impl Coordinate) -> PixelCoord {
        let dx_m = (coord.lng() - self.center.lng) / self.deg_lng_per_m;
        let dy_m = (self.center.lat - coord.lat()) / self.deg_lat_per_m;

        PixelCoord::new(
            self.half_width + dx_m / self.meters_per_pixel,
            self.half_height + dy_m / self.meters_per_pixel,
        )
    }
}

/// Geographic bounding box of a square tile of `size_px` image pixels
/// centred on `center`.
pub fn tile_bounds(
    center: &impl Coordinate,
    size_px: u32,
    zoom: u8,
    scale: f64,
) -> Result<TileBounds, TreefallError> {
    let mpp = meters_per_pixel(center.lat(), zoom, scale)?;
    let (deg_lat_per_m, deg_lng_per_m) = degrees_per_meter(center.lat())?;

    let half_width_m = (size_px as f64 / 2.0) * mpp;
    let half_height_m = (size_px as f64 / 2.0) * mpp;

    Ok(TileBounds {
        north: center.lat() + half_height_m * deg_lat_per_m,
        south: center.lat() - half_height_m * deg_lat_per_m,
        east: center.lng() + half_width_m * deg_lng_per_m,
        west: center.lng() - half_width_m * deg_lng_per_m,
    })
}

/// Converts a pixel of a tile centred on `center` to WGS84.
pub fn pixel_to_lat_lng(
    pixel: PixelCoord,
    center: &impl Coordinate,
    image_width: u32,
    image_height: u32,
    zoom: u8,
    scale: f64,
) -> Result<LatLng, TreefallError> {
    let projection = LocalProjection::new(center, image_width, image_height, zoom, scale)?;
    Ok(projection.to_lat_lng(pixel))
}

/// Converts a WGS84 position to a pixel of a tile centred on `center`.
///
/// Exact inverse of [`pixel_to_lat_lng`].
pub fn lat_lng_to_pixel(
    coord: &impl Coordinate,
    center: &impl Coordinate,
    image_width: u32,
    image_height: u32,
    zoom: u8,
    scale: f64,
) -> Result<PixelCoord, TreefallError> {
    let projection = LocalProjection::new(center, image_width, image_height, zoom, scale)?;
    Ok(projection.to_pixel(coord))
}
