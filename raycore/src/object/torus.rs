use crate::{
    math::{poly, Ray, Vector3},
    scene::EPSILON,
};

use super::{Hit, Intersect};

/// A torus around the object-space Y axis, centered on the origin.
#[derive(Debug, Clone)]
pub struct Torus {
    /// Distance from the center to the middle of the tube.
    pub radius: f64,

    /// Radius of the tube.
    pub thickness: f64,
}

impl Torus {
    pub fn new(radius: f64, thickness: f64) -> Self {
        Self { radius, thickness }
    }

    /// The gradient of the implicit surface at `p`, normalized.
    fn normal_at(&self, p: Vector3) -> Vector3 {
        let r2 = self.radius * self.radius;
        let sum = p.dot(p);
        let param = r2 + self.thickness * self.thickness;

        Vector3::new(
            p.x * (sum - param),
            p.y * (sum - param + 2. * r2),
            p.z * (sum - param),
        )
        .normalize()
    }
}

impl Intersect for Torus {
    fn intersect(&self, ray: &Ray, max_t: f64) -> Option<Hit> {
        // solve along a unit direction, then scale back to the caller's t
        let len = ray.direction.magnitude();
        if len < EPSILON {
            return None;
        }
        let d = ray.direction / len;
        let o = ray.origin.to_vector();

        let r2 = self.radius * self.radius;
        let four_r2 = 4. * r2;
        let e = o.dot(o) - r2 - self.thickness * self.thickness;
        let f = o.dot(d);

        let roots = poly::solve_quartic([
            e * e - four_r2 * (self.thickness * self.thickness - o.y * o.y),
            4. * f * e + 2. * four_r2 * o.y * d.y,
            2. * e + 4. * f * f + four_r2 * d.y * d.y,
            4. * f,
            1.,
        ]);

        let s = roots
            .into_iter()
            .filter(|s| s / len > EPSILON && s / len < max_t)
            .fold(f64::INFINITY, f64::min);
        if !s.is_finite() {
            return None;
        }

        let normal = self.normal_at(o + d * s);
        let inside = normal.dot(d) > 0.;
        Some(Hit::new(s / len, if inside { -normal } else { normal }, inside))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Point3;

    #[test]
    fn hits_outer_rim() {
        let torus = Torus::new(2., 0.5);
        let ray = Ray::new(Point3::new(0., 0., 5.), Vector3::new(0., 0., -1.));
        let hit = torus.intersect(&ray, f64::INFINITY).unwrap();

        assert!((hit.t - 2.5).abs() < 1e-6);
        assert!((hit.normal - Vector3::new(0., 0., 1.)).magnitude() < 1e-6);
        assert!(!hit.inside);
    }

    #[test]
    fn hits_top_of_tube() {
        let torus = Torus::new(2., 0.5);
        let ray = Ray::new(Point3::new(2., 5., 0.), Vector3::new(0., -1., 0.));
        let hit = torus.intersect(&ray, f64::INFINITY).unwrap();

        assert!((hit.t - 4.5).abs() < 1e-6);
        assert!((hit.normal - Vector3::up()).magnitude() < 1e-6);
    }

    #[test]
    fn unnormalized_direction_keeps_t_consistent() {
        let torus = Torus::new(2., 0.5);
        let ray = Ray::new(Point3::new(0., 0., 5.), Vector3::new(0., 0., -2.));
        let hit = torus.intersect(&ray, f64::INFINITY).unwrap();
        assert!((hit.t - 1.25).abs() < 1e-6);
    }

    #[test]
    fn passes_through_hole() {
        let torus = Torus::new(2., 0.5);
        let ray = Ray::new(Point3::new(0., 5., 0.), Vector3::new(0., -1., 0.));
        assert!(torus.intersect(&ray, f64::INFINITY).is_none());
    }

    #[test]
    fn inside_tube_faces_the_ray() {
        let torus = Torus::new(2., 0.5);
        let ray = Ray::new(Point3::new(2., 0., 0.), Vector3::new(1., 0., 0.));
        let hit = torus.intersect(&ray, f64::INFINITY).unwrap();

        assert!((hit.t - 0.5).abs() < 1e-6);
        assert!(hit.inside);
        assert!(hit.normal.dot(ray.direction) < 0.);
    }
}
