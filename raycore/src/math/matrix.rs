use std::ops::Mul;

use super::{Point3, Vector3};

/// An affine 4x4 matrix. The bottom row is always `0 0 0 1`, so only the 3x3
/// linear part and the translation column are stored.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub m00: f64,
    pub m01: f64,
    pub m02: f64,
    pub m10: f64,
    pub m11: f64,
    pub m12: f64,
    pub m20: f64,
    pub m21: f64,
    pub m22: f64,
}

impl Matrix {
    /// Create a pure translation matrix.
    pub fn translation(v: Vector3) -> Self {
        Matrix {
            x: v.x,
            y: v.y,
            z: v.z,
            ..Default::default()
        }
    }

    /// Create a non-uniform scale matrix.
    pub fn scaling(v: Vector3) -> Self {
        Matrix {
            m00: v.x,
            m11: v.y,
            m22: v.z,
            ..Default::default()
        }
    }

    #[rustfmt::skip]
    fn euler_matrices(x: f64, y: f64, z: f64) -> (Self, Self, Self) {
        (
            Matrix { x: 0., y: 0., z: 0., m00: 1., m01: 0., m02: 0., m10: 0., m11: x.cos(), m12: -x.sin(), m20: 0., m21: x.sin(), m22: x.cos() },
            Matrix { x: 0., y: 0., z: 0., m00: y.cos(), m01: 0., m02: y.sin(), m10: 0., m11: 1., m12: 0., m20: -y.sin(), m21: 0., m22: y.cos() },
            Matrix { x: 0., y: 0., z: 0., m00: z.cos(), m01: -z.sin(), m02: 0., m10: z.sin(), m11: z.cos(), m12: 0., m20: 0., m21: 0., m22: 1. },
        )
    }

    /// Create a rotation from Euler angles (radians) as `Rx * Ry * Rz`: the
    /// Z rotation is applied to a vector first.
    pub fn from_euler_xyz(x: f64, y: f64, z: f64) -> Self {
        let (a, b, c) = Self::euler_matrices(x, y, z);
        a * b * c
    }

    /// Create a rotation from Euler angles (radians) as `Rz * Ry * Rx`: the
    /// X rotation is applied to a vector first.
    pub fn from_euler_zyx(x: f64, y: f64, z: f64) -> Self {
        let (a, b, c) = Self::euler_matrices(x, y, z);
        c * b * a
    }

    /// Get the rowed components of this matrix.
    #[rustfmt::skip]
    pub fn rowed_components(self) -> [[f64; 4]; 4] {
        [
            [self.m00, self.m01, self.m02, self.x],
            [self.m10, self.m11, self.m12, self.y],
            [self.m20, self.m21, self.m22, self.z],
            [0., 0., 0., 1.],
        ]
    }

    pub fn transform_point(&self, p: Point3) -> Point3 {
        Point3::new(
            self.m00 * p.x + self.m01 * p.y + self.m02 * p.z + self.x,
            self.m10 * p.x + self.m11 * p.y + self.m12 * p.z + self.y,
            self.m20 * p.x + self.m21 * p.y + self.m22 * p.z + self.z,
        )
    }

    pub fn transform_vector(&self, v: Vector3) -> Vector3 {
        Vector3::new(
            self.m00 * v.x + self.m01 * v.y + self.m02 * v.z,
            self.m10 * v.x + self.m11 * v.y + self.m12 * v.z,
            self.m20 * v.x + self.m21 * v.y + self.m22 * v.z,
        )
    }

    /// Map an object-space normal to world space, where `self` is the
    /// world-to-object matrix. Normals transform by the inverse transpose, so
    /// this multiplies by the transpose of the linear part. The result is not
    /// normalized.
    pub fn transform_normal(&self, n: Vector3) -> Vector3 {
        Vector3::new(
            self.m00 * n.x + self.m10 * n.y + self.m20 * n.z,
            self.m01 * n.x + self.m11 * n.y + self.m21 * n.z,
            self.m02 * n.x + self.m12 * n.y + self.m22 * n.z,
        )
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self {
            x: 0.,
            y: 0.,
            z: 0.,
            m00: 1.,
            m01: 0.,
            m02: 0.,
            m10: 0.,
            m11: 1.,
            m12: 0.,
            m20: 0.,
            m21: 0.,
            m22: 1.,
        }
    }
}

impl Mul for Matrix {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        let a = self.rowed_components();
        let b = rhs.rowed_components();
        let mut o = [[0.; 4]; 4];

        for i in 0..4 {
            for j in 0..4 {
                for k in 0..4 {
                    o[i][j] += a[i][k] * b[k][j];
                }
            }
        }

        Self {
            x: o[0][3],
            y: o[1][3],
            z: o[2][3],
            m00: o[0][0],
            m01: o[0][1],
            m02: o[0][2],
            m10: o[1][0],
            m11: o[1][1],
            m12: o[1][2],
            m20: o[2][0],
            m21: o[2][1],
            m22: o[2][2],
        }
    }
}
