use super::{reflection_direction, Matrix, Point3, Vector3};

#[derive(Clone, Debug, PartialEq)]
pub struct Ray {
    pub origin: Point3,
    pub direction: Vector3,
}

impl Ray {
    /// Instantiate a new Ray. The direction is expected to be already normalized.
    pub fn new(origin: Point3, direction: Vector3) -> Self {
        Self { origin, direction }
    }

    pub fn along(&self, t: f64) -> Point3 {
        self.origin + self.direction * t
    }

    /// Reflect this ray off of a position and a normal.
    pub fn reflect(&self, pos: Point3, normal: Vector3) -> Ray {
        Ray::new(pos, reflection_direction(self.direction, normal))
    }

    /// Map this ray through `m`. The direction is left unnormalized so that
    /// distances along the ray are the same in both spaces.
    pub fn transform(&self, m: &Matrix) -> Ray {
        Ray::new(m.transform_point(self.origin), m.transform_vector(self.direction))
    }
}
