//! Common types for line tessellation.

use cgmath::{InnerSpace, Point2, Vector2};

/// 2D point: [`Point2<f64>`].
pub type P2 = Point2<f64>;

/// 2D vector: a [`Vector2<f64>`].
pub type V2 = Vector2<f64>;

/// Integer point in tile-local coordinates.
///
/// Geometry decoded from a tile arrives in a fixed-resolution grid of
/// [`EXTENT`] units per tile side. Points may fall slightly outside the
/// `0..EXTENT` range when geometry crosses tile boundaries.
pub type TilePoint = Point2<i16>;

/// Number of coordinate units along one side of a tile.
pub const EXTENT: i32 = 8192;

/// Nominal size of a rendered tile, in pixels.
pub const TILE_SIZE: f64 = 512.0;

/// Rotate a V2 vector 90 degrees anti-clockwise.
pub fn perp(v: V2) -> V2 {
    V2::new(-v.y, v.x)
}

/// Scale a V2 vector to unit length.
///
/// The vector must have non-zero magnitude.
pub fn unit(v: V2) -> V2 {
    debug_assert!(v.magnitude2() > 0.0);
    v.normalize()
}

/// Vector from one tile point to another, in floating point.
pub fn diff(to: TilePoint, from: TilePoint) -> V2 {
    V2::new(to.x as f64 - from.x as f64, to.y as f64 - from.y as f64)
}

/// Euclidean distance between two tile points.
pub fn dist(a: TilePoint, b: TilePoint) -> f64 {
    diff(a, b).magnitude()
}

/// Step from a tile point toward another by a fixed distance.
///
/// The result is rounded back onto the integer tile grid. The two points
/// must be distinct.
///
/// # Parameters
///
/// - `from`: Point to step from.
/// - `to`: Point that defines the direction of the step.
/// - `offset`: Distance to travel, in tile units.
pub fn offset_toward(from: TilePoint, to: TilePoint, offset: f64) -> TilePoint {
    let d = diff(to, from);
    let scaled = d * (offset / d.magnitude());
    TilePoint::new(
        from.x + scaled.x.round() as i16,
        from.y + scaled.y.round() as i16,
    )
}
