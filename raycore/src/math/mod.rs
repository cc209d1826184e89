mod matrix;
mod point;
pub mod poly;
mod ray;
mod vector;

pub use matrix::*;
pub use point::*;
pub use ray::*;
pub use vector::*;

use crate::scene::EPSILON;

/// The ideal mirror direction of `dir` about `normal`, normalized.
pub fn reflection_direction(dir: Vector3, normal: Vector3) -> Vector3 {
    (dir - normal * (2. * dir.dot(normal))).normalize()
}

/// Calculate the transmission direction of `dir` through a surface with the
/// given `normal` (facing against `dir`), where `ratio` is the incident index
/// over the transmitted index.
///
/// Under total internal reflection the internally reflected direction is
/// returned instead. A grazing ray yields `None`: it transmits nothing.
pub fn transmission_direction(ratio: f64, dir: Vector3, normal: Vector3) -> Option<Vector3> {
    let cos_i = -dir.dot(normal);
    let cos_t2 = 1. - ratio * ratio * (1. - cos_i * cos_i);

    if cos_t2 < -EPSILON {
        Some((normal * (2. * cos_i) + dir).normalize())
    } else if cos_t2 > EPSILON {
        let cos_t = cos_t2.sqrt();
        Some((dir * ratio + normal * (ratio * cos_i - cos_t)).normalize())
    } else {
        None
    }
}
