use crate::{
    math::{poly, Ray},
    scene::EPSILON,
};

use super::{Hit, Intersect};

/// A sphere centered on its object-space origin. World position comes from
/// the owning object's transform.
#[derive(Debug, Clone)]
pub struct Sphere {
    pub radius: f64,
}

impl Sphere {
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }
}

impl Intersect for Sphere {
    /// The normal is always the outward one. `inside` is set when only the
    /// far root is in range, and it is left to the caller to flip the normal.
    fn intersect(&self, ray: &Ray, max_t: f64) -> Option<Hit> {
        let e = ray.origin.to_vector();
        let d = ray.direction;

        let roots = poly::solve_quadratic([e.dot(e) - self.radius * self.radius, 2. * d.dot(e), d.dot(d)]);
        if roots.len() < 2 {
            return None;
        }

        let (t0, t1) = (roots[0].min(roots[1]), roots[0].max(roots[1]));
        let (t, inside) = if t0 > EPSILON && t0 < max_t {
            (t0, false)
        } else if t1 > EPSILON && t1 < max_t {
            (t1, true)
        } else {
            return None;
        };

        Some(Hit::new(t, ray.along(t).to_vector().normalize(), inside))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{Point3, Vector3};

    #[test]
    fn hits_front_surface() {
        let sphere = Sphere::new(1.);
        let ray = Ray::new(Point3::new(0., 0., 5.), Vector3::new(0., 0., -1.));
        let hit = sphere.intersect(&ray, f64::INFINITY).unwrap();

        assert!((hit.t - 4.).abs() < 1e-9);
        assert!((hit.normal - Vector3::new(0., 0., 1.)).magnitude() < 1e-9);
        assert!(!hit.inside);
    }

    #[test]
    fn inside_hit_reports_far_root() {
        let sphere = Sphere::new(2.);
        let ray = Ray::new(Point3::origin(), Vector3::new(1., 0., 0.));
        let hit = sphere.intersect(&ray, f64::INFINITY).unwrap();

        assert!((hit.t - 2.).abs() < 1e-9);
        assert!(hit.inside);
        assert!((hit.normal - Vector3::new(1., 0., 0.)).magnitude() < 1e-9);
    }

    #[test]
    fn tiny_sphere_is_hit() {
        let sphere = Sphere::new(1e-5);
        let ray = Ray::new(Point3::new(0., 0., 1.), Vector3::new(0., 0., -1.));
        let hit = sphere.intersect(&ray, f64::INFINITY).unwrap();

        assert!((hit.t - (1. - 1e-5)).abs() < 1e-9);
        assert!(!hit.inside);
    }

    #[test]
    fn misses() {
        let sphere = Sphere::new(1.);
        let offset = Ray::new(Point3::new(0., 2., 5.), Vector3::new(0., 0., -1.));
        assert!(sphere.intersect(&offset, f64::INFINITY).is_none());

        let behind = Ray::new(Point3::new(0., 0., 5.), Vector3::new(0., 0., 1.));
        assert!(sphere.intersect(&behind, f64::INFINITY).is_none());
    }
}
