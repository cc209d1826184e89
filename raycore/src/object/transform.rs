use crate::math::{Matrix, Point3, Vector3};

/// Placement of a primitive in the world: its authoring-time position,
/// rotation and scale, a constant acceleration for animated scenes, and the
/// derived world-to-object matrix the hit tests run through.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    pub original_position: Point3,

    /// Rotation about the world X, Y and Z axes, in degrees, applied in that order.
    pub original_rotation: Vector3,

    pub original_scale: Vector3,

    /// Units per time step the object moves by in `update`.
    pub acceleration: Vector3,

    position: Point3,
    inverse: Matrix,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            original_position: Point3::origin(),
            original_rotation: Vector3::default(),
            original_scale: Vector3::new(1., 1., 1.),
            acceleration: Vector3::default(),
            position: Point3::origin(),
            inverse: Matrix::default(),
        }
    }
}

impl Transform {
    pub fn new(position: Point3, rotation: Vector3, scale: Vector3) -> Self {
        let mut transform = Self {
            original_position: position,
            original_rotation: rotation,
            original_scale: scale,
            ..Default::default()
        };
        transform.update(0.);
        transform
    }

    /// A pure translation.
    pub fn at(position: Point3) -> Self {
        Self::new(position, Vector3::default(), Vector3::new(1., 1., 1.))
    }

    /// The current position, after the last `update`.
    pub fn position(&self) -> Point3 {
        self.position
    }

    /// The world-to-object matrix.
    pub fn inverse(&self) -> Matrix {
        self.inverse
    }

    /// The object-to-world matrix, `T * Rz * Ry * Rx * S`.
    pub fn forward(&self) -> Matrix {
        let r = self.original_rotation;
        Matrix::translation(self.position.to_vector())
            * Matrix::from_euler_zyx(r.x.to_radians(), r.y.to_radians(), r.z.to_radians())
            * Matrix::scaling(self.original_scale)
    }

    /// Move to `original_position + acceleration * dt` and rebuild the inverse
    /// matrix as `S^-1 * Rx^-1 * Ry^-1 * Rz^-1 * T^-1`.
    pub fn update(&mut self, dt: f64) {
        self.position = self.original_position + self.acceleration * dt;

        let r = self.original_rotation;
        let s = self.original_scale;
        self.inverse = Matrix::scaling(Vector3::new(1. / s.x, 1. / s.y, 1. / s.z))
            * Matrix::from_euler_xyz(-r.x.to_radians(), -r.y.to_radians(), -r.z.to_radians())
            * Matrix::translation(-self.position.to_vector());
    }
}
