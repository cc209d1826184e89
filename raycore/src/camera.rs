use rand::Rng;

use crate::{
    math::{Point2, Point3, Ray, Vector3},
    sampler::Sampler,
    scene::EPSILON,
};

/// A Camera object. Represents a viewable area that a scene can be rendered to.
///
/// The basis follows the usual convention: `u` points right, `v` up and `w`
/// backward, away from the look-at point. The view plane sits at the
/// look-at distance, so `fovy` spans the full image height there.
#[derive(Clone, Debug)]
pub struct Camera {
    pub vw: usize,
    pub vh: usize,
    pub position: Point3,
    pub look_at: Point3,
    pub up: Vector3,

    /// Vertical field of view, in degrees.
    pub fovy: f64,

    /// Radius of the thin lens. Zero gives a pinhole.
    pub lens_radius: f64,

    /// Distance to the plane in perfect focus.
    pub focal_distance: f64,

    /// Pixel and lens samples, present when more than one primary ray is
    /// traced per pixel.
    sampler: Option<Sampler>,

    u: Vector3,
    v: Vector3,
    w: Vector3,
    view_distance: f64,
    pixel_size: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(
            Point3::origin(),
            Point3::new(0., 0., -1.),
            Vector3::up(),
            60.,
            800,
            600,
        )
    }
}

impl Camera {
    pub fn new(position: Point3, look_at: Point3, up: Vector3, fovy: f64, vw: usize, vh: usize) -> Self {
        let mut camera = Self {
            vw,
            vh,
            position,
            look_at,
            up,
            fovy,
            lens_radius: 0.,
            focal_distance: 1.,
            sampler: None,
            u: Vector3::default(),
            v: Vector3::default(),
            w: Vector3::default(),
            view_distance: 0.,
            pixel_size: 0.,
        };
        camera.compute_basis();
        camera
    }

    /// Recompute the orthonormal basis and view plane. Needed after any of
    /// the public placement fields or the resolution change.
    pub fn compute_basis(&mut self) {
        let forward = self.position - self.look_at;
        self.view_distance = forward.magnitude();
        if self.view_distance < EPSILON {
            log::warn!("camera position and look-at point coincide");
        }

        self.w = forward.normalize();
        self.u = self.up.cross(self.w).normalize();
        self.v = self.w.cross(self.u);
        if self.u.magnitude_squared().is_nan() {
            log::warn!("camera up vector is parallel to the view direction");
        }

        let height = 2. * self.view_distance * (self.fovy.to_radians() * 0.5).tan();
        self.pixel_size = height / self.vh.max(1) as f64;
    }

    pub fn set_resolution(&mut self, vw: usize, vh: usize) {
        self.vw = vw;
        self.vh = vh;
        self.compute_basis();
    }

    /// Trace `num_samples` jittered thin-lens rays per pixel instead of a
    /// single pinhole ray.
    pub fn set_samples<R: Rng>(&mut self, num_samples: usize, num_sets: usize, rng: &mut R) {
        self.sampler = (num_samples > 1).then(|| {
            let mut sampler = Sampler::with_rng(num_samples, num_sets, rng);
            sampler.map_to_unit_disk();
            sampler
        });
    }

    /// Primary rays per pixel.
    pub fn samples(&self) -> usize {
        self.sampler.as_ref().map_or(1, Sampler::num_samples)
    }

    pub fn sampler(&self) -> Option<&Sampler> {
        self.sampler.as_ref()
    }

    /// The `(u, v, w)` basis.
    pub fn basis(&self) -> (Vector3, Vector3, Vector3) {
        (self.u, self.v, self.w)
    }

    /// The view-plane coordinates of a point inside pixel `(x, y)`, where the
    /// top-left of the image is (0, 0) and `jitter` is in the unit square.
    fn view_plane(&self, x: usize, y: usize, jitter: Point2) -> (f64, f64) {
        let s = self.pixel_size;
        (
            s * (x as f64 - self.vw as f64 * 0.5 + jitter.x),
            s * (self.vh as f64 * 0.5 - y as f64 - jitter.y),
        )
    }

    /// The pinhole ray through the center of pixel `(x, y)`.
    pub fn primary_ray(&self, x: usize, y: usize) -> Ray {
        let (px, py) = self.view_plane(x, y, Point2::new(0.5, 0.5));
        let dir = self.u * px + self.v * py - self.w * self.view_distance;
        Ray::new(self.position, dir.normalize())
    }

    /// A thin-lens ray through pixel `(x, y)`. `lens` is a unit disk sample
    /// and is scaled by the lens radius.
    pub fn lens_ray(&self, x: usize, y: usize, jitter: Point2, lens: Point2) -> Ray {
        let (px, py) = self.view_plane(x, y, jitter);
        let (lx, ly) = (lens.x * self.lens_radius, lens.y * self.lens_radius);
        let f = self.focal_distance;
        let scale = f / self.view_distance;

        let dir = self.u * (px * scale - lx) + self.v * (py * scale - ly) - self.w * f;
        let origin = self.position + self.u * lx + self.v * ly;
        Ray::new(origin, dir.normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::new(
            Point3::new(0., 0., 5.),
            Point3::origin(),
            Vector3::up(),
            60.,
            9,
            9,
        )
    }

    #[test]
    fn basis_is_orthonormal() {
        let (u, v, w) = camera().basis();
        for (a, b) in [(u, v), (v, w), (w, u)] {
            assert!(a.dot(b).abs() < 1e-12);
        }
        assert!((u - Vector3::new(1., 0., 0.)).magnitude() < 1e-12);
        assert!((v - Vector3::up()).magnitude() < 1e-12);
        assert!((w - Vector3::new(0., 0., 1.)).magnitude() < 1e-12);
    }

    #[test]
    fn center_pixel_looks_at_target() {
        let ray = camera().primary_ray(4, 4);
        assert_eq!(ray.origin, Point3::new(0., 0., 5.));
        assert!((ray.direction - Vector3::new(0., 0., -1.)).magnitude() < 1e-12);
    }

    #[test]
    fn image_top_is_world_up() {
        let c = camera();
        assert!(c.primary_ray(4, 0).direction.y > 0.);
        assert!(c.primary_ray(0, 4).direction.x < 0.);

        // the top edge of the image spans half the field of view
        let half = (c.vh as f64 * 0.5 - 0.5) / (c.vh as f64 * 0.5) * 30f64.to_radians().tan();
        let d = c.primary_ray(4, 0).direction;
        assert!((d.y / -d.z - half).abs() < 1e-9);
    }

    #[test]
    fn lens_rays_converge_on_the_focal_plane() {
        let mut c = camera();
        c.lens_radius = 0.5;
        c.focal_distance = 3.;
        let (_, _, w) = c.basis();

        let focus = |lens: Point2| {
            let ray = c.lens_ray(2, 6, Point2::new(0.25, 0.75), lens);
            let t = c.focal_distance / -ray.direction.dot(w);
            ray.along(t)
        };

        let a = focus(Point2::new(0., 0.));
        let b = focus(Point2::new(0.8, -0.3));
        assert!((a - b).magnitude() < 1e-9);
    }

    #[test]
    fn sample_counts() {
        let mut c = camera();
        assert_eq!(c.samples(), 1);

        c.set_samples(16, 3, &mut rand::thread_rng());
        assert_eq!(c.samples(), 16);

        c.set_samples(1, 3, &mut rand::thread_rng());
        assert!(c.sampler().is_none());
    }

    #[test]
    fn pinhole_lens_matches_primary_ray() {
        let c = camera();
        let lens = c.lens_ray(1, 7, Point2::new(0.5, 0.5), Point2::new(0.3, 0.3));
        let primary = c.primary_ray(1, 7);
        assert!((lens.direction - primary.direction).magnitude() < 1e-12);
        assert_eq!(lens.origin, primary.origin);
    }
}
