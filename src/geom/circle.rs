use geo_types::{Coord, LineString, Point, Polygon};

/// Vertices used to approximate a circle (16 per quadrant).
pub const CIRCLE_SEGMENTS: usize = 64;

/// Regular polygon approximating a circle of `radius` around `center`.
///
/// The first vertex sits at angle zero, i.e. `(x + radius, y)`.
pub fn create_circle(center: &Point<f64>, radius: f64, segments: usize) -> Polygon<f64> {
    let segments = segments.max(3);
    let mut coords = Vec::with_capacity(segments + 1);

    for i in 0..segments {
        let angle_rad = (i as f64 * 360.0 / segments as f64).to_radians();
        let x = center.x() + radius * angle_rad.cos();
        let y = center.y() + radius * angle_rad.sin();
        coords.push(Coord { x, y });
    }
    coords.push(coords[0]);

    Polygon::new(LineString::from(coords), vec![])
}
