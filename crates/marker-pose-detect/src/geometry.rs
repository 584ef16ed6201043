use nalgebra::{Point2, Vector2};

#[inline]
pub(crate) fn to_f32(p: Point2<i32>) -> Point2<f32> {
    Point2::new(p.x as f32, p.y as f32)
}

/// Pixel offset `to - from` as a float vector.
#[inline]
pub(crate) fn offset(from: Point2<i32>, to: Point2<i32>) -> Vector2<f32> {
    to_f32(to) - to_f32(from)
}

/// Euclidean distance between two pixel positions.
#[inline]
pub(crate) fn pixel_distance(a: Point2<i32>, b: Point2<i32>) -> f32 {
    offset(a, b).norm()
}

#[inline]
pub(crate) fn midpoint(a: Point2<i32>, b: Point2<i32>) -> Point2<f32> {
    nalgebra::center(&to_f32(a), &to_f32(b))
}
