use crate::{
    math::{poly, Ray, Vector3},
    scene::EPSILON,
};

use super::{Hit, Intersect};

/// A capped cylinder around the object-space Y axis, spanning `bottom..=top`.
#[derive(Debug, Clone)]
pub struct Cylinder {
    pub radius: f64,
    pub bottom: f64,
    pub top: f64,
}

impl Cylinder {
    pub fn new(radius: f64, bottom: f64, top: f64) -> Self {
        Self {
            radius,
            bottom: bottom.min(top),
            top: top.max(bottom),
        }
    }

    fn lateral(&self, ray: &Ray, max_t: f64) -> Option<(f64, Vector3)> {
        let (o, d) = (ray.origin, ray.direction);
        let mut roots = poly::solve_quadratic([
            o.x * o.x + o.z * o.z - self.radius * self.radius,
            2. * (o.x * d.x + o.z * d.z),
            d.x * d.x + d.z * d.z,
        ]);
        roots.sort_by(|a, b| a.total_cmp(b));

        roots.into_iter().find_map(|t| {
            let p = ray.along(t);
            (t > EPSILON && t < max_t && p.y >= self.bottom && p.y <= self.top)
                .then(|| (t, Vector3::new(p.x / self.radius, 0., p.z / self.radius)))
        })
    }

    fn caps(&self, ray: &Ray, max_t: f64) -> Option<(f64, Vector3)> {
        if ray.direction.y.abs() <= EPSILON {
            return None;
        }

        [(self.bottom, -Vector3::up()), (self.top, Vector3::up())]
            .into_iter()
            .filter_map(|(y, normal)| {
                let t = (y - ray.origin.y) / ray.direction.y;
                let p = ray.along(t);
                (t > EPSILON && t < max_t && p.x * p.x + p.z * p.z <= self.radius * self.radius)
                    .then(|| (t, normal))
            })
            .min_by(|a, b| a.0.total_cmp(&b.0))
    }
}

impl Intersect for Cylinder {
    fn intersect(&self, ray: &Ray, max_t: f64) -> Option<Hit> {
        let (t, normal) = match (self.lateral(ray, max_t), self.caps(ray, max_t)) {
            (Some(a), Some(b)) => {
                if a.0 <= b.0 {
                    a
                } else {
                    b
                }
            }
            (a, b) => a.or(b)?,
        };

        let inside = normal.dot(ray.direction) > 0.;
        Some(Hit::new(t, if inside { -normal } else { normal }, inside))
    }
}
