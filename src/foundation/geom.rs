//! Point transforms and hit testing shared by the gesture controller.

use crate::foundation::core::{Point, Size, SurfaceSize};

/// Display-space placement of the surface, used to map client pointer
/// coordinates onto raster pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceView {
    /// Top-left of the surface's display box, in client coordinates.
    pub origin: Point,
    /// On-screen size of the surface, in display pixels.
    pub display: Size,
    /// Internal raster resolution.
    pub surface: SurfaceSize,
}

impl SurfaceView {
    /// Map a client-space point into raster pixel coordinates, scaling by
    /// `surface / display` independently per axis.
    ///
    /// A degenerate display box (either extent <= 0) maps everything to the
    /// origin rather than dividing by zero.
    pub fn to_surface(&self, client: Point) -> Point {
        if self.display.width <= 0.0 || self.display.height <= 0.0 {
            return Point::ORIGIN;
        }
        let scale_x = f64::from(self.surface.width) / self.display.width;
        let scale_y = f64::from(self.surface.height) / self.display.height;
        Point::new(
            (client.x - self.origin.x) * scale_x,
            (client.y - self.origin.y) * scale_y,
        )
    }
}

/// Absorbs the rounding of a rotate/inverse-rotate round trip so a point
/// exactly on the rectangle boundary still tests inside.
const HIT_TEST_SLACK: f64 = 1e-9;

/// Test whether `point` lies inside a rectangle of half-extents `half_size`
/// centered at `center` and rotated by `angle_rad`.
///
/// The point is inverse-rotated into the rectangle's local frame and tested
/// against axis-aligned bounds; the boundary itself is inclusive. Callers must
/// pass the same angle the renderer applies.
pub fn point_in_rotated_rect(point: Point, center: Point, half_size: Size, angle_rad: f64) -> bool {
    let d = point - center;
    let (sin, cos) = (-angle_rad).sin_cos();
    let local_x = d.x * cos - d.y * sin;
    let local_y = d.x * sin + d.y * cos;
    local_x.abs() <= half_size.width + HIT_TEST_SLACK
        && local_y.abs() <= half_size.height + HIT_TEST_SLACK
}

/// Euclidean distance between two points (two-finger gesture spread).
pub fn distance(a: Point, b: Point) -> f64 {
    a.distance(b)
}

/// Midpoint of two points (two-finger gesture center).
pub fn midpoint(a: Point, b: Point) -> Point {
    a.midpoint(b)
}
