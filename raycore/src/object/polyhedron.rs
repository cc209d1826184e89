use crate::{
    math::{Point3, Ray, Vector3},
    scene::EPSILON,
};

use super::{Hit, Intersect};

/// A half-space `a x + b y + c z + d <= 0`, stored with a unit outward normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalfSpace {
    pub normal: Vector3,
    pub d: f64,
}

impl HalfSpace {
    /// Normalizes `(a, b, c)`, scaling `d` to match.
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        let normal = Vector3::new(a, b, c);
        let len = normal.magnitude();
        Self {
            normal: normal / len,
            d: d / len,
        }
    }

    /// Positive outside, negative inside.
    pub fn signed_distance(&self, p: Point3) -> f64 {
        self.normal.dot(p.to_vector()) + self.d
    }
}

/// A convex polyhedron, the intersection of a set of half-spaces.
#[derive(Debug, Clone, Default)]
pub struct Polyhedron {
    pub faces: Vec<HalfSpace>,
}

impl Polyhedron {
    pub fn new(faces: Vec<HalfSpace>) -> Self {
        Self { faces }
    }
}

impl Intersect for Polyhedron {
    fn intersect(&self, ray: &Ray, max_t: f64) -> Option<Hit> {
        // entering and exiting parameters, with the faces that set them
        let (mut t0, mut t1) = (0., f64::INFINITY);
        let (mut n0, mut n1) = (Vector3::default(), Vector3::default());

        for face in self.faces.iter() {
            let dn = ray.direction.dot(face.normal);
            let vd = face.signed_distance(ray.origin);

            if dn.abs() <= EPSILON {
                // parallel: either entirely outside this face or never crossing it
                if vd > EPSILON {
                    return None;
                }
                continue;
            }

            let t = -vd / dn;
            if dn > 0. {
                if t < t1 {
                    t1 = t;
                    n1 = face.normal;
                }
            } else if t > t0 {
                t0 = t;
                n0 = face.normal;
            }
        }

        if t1 < t0 {
            return None;
        }

        if t0 > EPSILON {
            (t0 < max_t).then(|| Hit::new(t0, n0, false))
        } else if t1 > EPSILON && t1.is_finite() && t1 < max_t {
            Some(Hit::new(t1, -n1, true))
        } else {
            None
        }
    }
}
