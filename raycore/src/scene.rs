use std::{path::Path, time::Instant};

use rayon::prelude::*;

use crate::{
    camera::Camera,
    lighting::Light,
    material::{Color, Material, Texture},
    math::{transmission_direction, Point2, Point3, Ray, Vector3},
    object::{Intersect, Object},
    sampler::{SampleStream, DEFAULT_SETS},
};

/// A very small value, close to zero, to prevent weird overlapping.
pub const EPSILON: f64 = 0.000001;

/// How area lights pick their sample points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightSampling {
    /// Every shading evaluation draws new points.
    Fresh,

    /// Every shading evaluation within a pixel replays the same points.
    PerPixel,
}

impl Default for LightSampling {
    fn default() -> Self {
        Self::Fresh
    }
}

/// Scene options. Defaults are provided.
#[derive(Debug, Clone)]
pub struct SceneOptions {
    /// The maximum number of bounces a ray can reflect/refract from an initial ray.
    pub max_depth: u32,

    pub light_sampling: LightSampling,

    /// Sets built per sampler.
    pub sample_sets: usize,

    /// Seed for every per-row sample stream. Equal seeds give equal images.
    pub seed: u64,
}

impl Default for SceneOptions {
    fn default() -> Self {
        Self {
            max_depth: 4,
            light_sampling: LightSampling::default(),
            sample_sets: DEFAULT_SETS,
            seed: 0,
        }
    }
}

/// The nearest surface a ray struck, resolved in world space.
#[derive(Debug, Clone)]
pub struct Intersection<'a> {
    pub t: f64,
    pub point: Point3,
    /// Faces against the incoming ray.
    pub normal: Vector3,
    /// Texture color at `point`.
    pub color: Color,
    pub object: &'a Object,
    pub inside: bool,
}

/// Per-worker draw state: one stream per area light and two for the camera.
pub struct TraceContext<'a> {
    seed: u64,
    lights: Vec<Option<SampleStream<'a>>>,
    pinned: Vec<usize>,
    pixel: Option<SampleStream<'a>>,
    lens: Option<SampleStream<'a>>,
}

impl<'a> TraceContext<'a> {
    pub fn new(scene: &'a Scene, seed: u64) -> Self {
        let lights = scene
            .lights
            .iter()
            .enumerate()
            .map(|(i, light)| light.sampler().map(|s| s.stream(mix_seed(seed, i as u64 + 2))))
            .collect::<Vec<_>>();
        let camera = scene.camera.sampler();

        Self {
            seed,
            pinned: vec![0; lights.len()],
            lights,
            pixel: camera.map(|s| s.stream(mix_seed(seed, 0))),
            lens: camera.map(|s| s.stream(mix_seed(seed, 1))),
        }
    }

    /// Choose the light sample sets a pixel replays under
    /// [`LightSampling::PerPixel`].
    fn begin_pixel(&mut self) {
        for (pinned, stream) in self.pinned.iter_mut().zip(self.lights.iter_mut()) {
            if let Some(stream) = stream {
                *pinned = stream.random_set();
            }
        }
    }

    fn camera_sample(&mut self) -> (Point2, Point2) {
        match (self.pixel.as_mut(), self.lens.as_mut()) {
            (Some(pixel), Some(lens)) => (pixel.next_square(), lens.next_disk()),
            _ => (Point2::new(0.5, 0.5), Point2::default()),
        }
    }
}

/// splitmix64 finalizer over a seed and a stream index.
fn mix_seed(seed: u64, index: u64) -> u64 {
    let mut z = seed ^ index.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// A scene, which contains a list of objects, lights, and a camera to render from.
pub struct Scene {
    pub camera: Camera,

    /// Color of the ambient light, which is also what escaping rays see.
    pub ambient: Color,

    pub lights: Vec<Light>,
    pub textures: Vec<Texture>,
    pub materials: Vec<Material>,
    pub objects: Vec<Object>,
    pub options: SceneOptions,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            camera: Camera::default(),
            ambient: Color::black(),
            lights: Vec::new(),
            textures: Vec::new(),
            materials: Vec::new(),
            objects: Vec::new(),
            options: SceneOptions::default(),
        }
    }
}

impl Scene {
    /// Move every object to its position at time `dt`.
    pub fn update_transforms(&mut self, dt: f64) {
        for object in self.objects.iter_mut() {
            object.update_transform(dt);
            log::debug!(
                "{} {} at {:?}",
                object.shape.kind(),
                object.id,
                object.transform.position()
            );
        }
    }

    /// The material of an object. Out-of-range indices wrap.
    pub fn material_of(&self, object: &Object) -> Material {
        if self.materials.is_empty() {
            return Material::default();
        }
        self.materials[object.material % self.materials.len()].clone()
    }

    /// The texture color of an object at a world-space point. Out-of-range
    /// indices wrap.
    pub fn texture_at(&self, object: &Object, point: Point3) -> Color {
        if self.textures.is_empty() {
            return Color::white();
        }
        self.textures[object.texture % self.textures.len()].at(point)
    }

    /// Find the nearest object struck by a ray before `max_t`, skipping the
    /// object with id `excluded`.
    pub fn intersect(&self, ray: &Ray, max_t: f64, excluded: Option<usize>) -> Option<Intersection<'_>> {
        let mut nearest = None;
        let mut limit = max_t;

        for object in self.objects.iter().filter(|o| Some(o.id) != excluded) {
            if let Some(hit) = object.intersect(ray, limit) {
                limit = hit.t;
                nearest = Some((object, hit));
            }
        }

        let (object, hit) = nearest?;
        let point = ray.along(hit.t);

        // spheres report the outward normal even from inside
        let normal = if object.is_sphere() && hit.inside {
            -hit.normal
        } else {
            hit.normal
        };

        Some(Intersection {
            t: hit.t,
            point,
            normal,
            color: self.texture_at(object, point),
            object,
            inside: hit.inside,
        })
    }

    /// Whether anything but `excluded` lies on the ray before `max_t`.
    pub fn occluded(&self, ray: &Ray, max_t: f64, excluded: Option<usize>) -> bool {
        self.objects
            .iter()
            .filter(|o| Some(o.id) != excluded)
            .any(|o| o.intersect(ray, max_t).is_some())
    }

    /// Trace out a ray, getting its color. `depth` is the number of
    /// reflection and transmission bounces still allowed.
    pub fn trace(&self, ray: &Ray, depth: u32, excluded: Option<usize>, ctx: &mut TraceContext) -> Color {
        let hit = match self.intersect(ray, f64::INFINITY, excluded) {
            Some(hit) => hit,
            None => return self.ambient,
        };
        let material = self.material_of(hit.object);

        // calculate light influences
        let ambient = self.ambient * material.ambient;
        let mut diffuse = Color::black();
        let mut specular = Color::black();
        for (i, light) in self.lights.iter().enumerate() {
            let shading = match self.options.light_sampling {
                LightSampling::Fresh => light.shading(ray, &hit, &material, self, ctx.lights[i].as_mut()),
                LightSampling::PerPixel => {
                    let mut replay = light.sampler().map(|s| s.replay(ctx.pinned[i], ctx.seed));
                    light.shading(ray, &hit, &material, self, replay.as_mut())
                }
            };
            diffuse += shading.diffuse;
            specular += shading.specular;
        }

        let mut color = hit.color * (ambient + diffuse) + specular;
        if depth == 0 {
            return color;
        }

        if material.reflective > 0. {
            let reflected = ray.reflect(hit.point, hit.normal);
            color += self.trace(&reflected, depth - 1, Some(hit.object.id), ctx) * material.reflective;
        }

        if material.transmissive > 0. {
            // invert the ratio when leaving the object
            let ratio = if hit.inside {
                material.ior
            } else {
                1. / material.ior
            };

            if let Some(dir) = transmission_direction(ratio, ray.direction, hit.normal) {
                let transmitted = Ray::new(hit.point, dir);
                color += self.trace(&transmitted, depth - 1, Some(hit.object.id), ctx) * material.transmissive;
            }
        }

        color
    }

    /// Trace out a pixel, where top-left of the image is (0, 0). The result
    /// is not clamped.
    pub fn trace_pixel(&self, x: usize, y: usize, ctx: &mut TraceContext) -> Color {
        ctx.begin_pixel();

        let depth = self.options.max_depth;
        let n = self.camera.samples();
        if n <= 1 {
            return self.trace(&self.camera.primary_ray(x, y), depth, None, ctx);
        }

        let mut color = Color::black();
        for _ in 0..n {
            let (jitter, lens) = ctx.camera_sample();
            color += self.trace(&self.camera.lens_ray(x, y, jitter, lens), depth, None, ctx);
        }
        color / n as f64
    }

    /// Render the image out as a list of clamped Colors, row by row.
    pub fn render(&self) -> Vec<Color> {
        let (vw, vh) = (self.camera.vw, self.camera.vh);
        let mut pixels = vec![Color::black(); vw * vh];
        if vw == 0 {
            return pixels;
        }

        let start = Instant::now();
        pixels.par_chunks_mut(vw).enumerate().for_each(|(y, row)| {
            let mut ctx = TraceContext::new(self, mix_seed(self.options.seed, y as u64));
            for (x, pixel) in row.iter_mut().enumerate() {
                *pixel = self.trace_pixel(x, y, &mut ctx).clamp();
            }
            log::debug!("row {} of {} done", y + 1, vh);
        });

        log::info!(
            "rendered {}x{} at {} sample(s) per pixel in {:.2?}",
            vw,
            vh,
            self.camera.samples(),
            start.elapsed()
        );
        pixels
    }

    /// Move the objects to time `dt`, then render.
    pub fn compute(&mut self, dt: f64) -> Vec<Color> {
        self.update_transforms(dt);
        self.render()
    }

    /// Render the image out to the desired save file. The format follows the
    /// file extension.
    pub fn render_to<P: AsRef<Path>>(&self, path: P) -> Result<(), image::ImageError> {
        let rendered = self.render();

        // spit out an image
        let mut imgbuf: image::RgbImage =
            image::ImageBuffer::new(self.camera.vw as u32, self.camera.vh as u32);

        for (i, color) in rendered.into_iter().enumerate() {
            imgbuf.put_pixel(
                (i % self.camera.vw) as u32,
                (i / self.camera.vw) as u32,
                color.into(),
            );
        }

        imgbuf.save(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        lighting::{AreaShape, Attenuation},
        object::{Shape, Sphere, Transform},
    };

    fn sphere(id: usize, center: Point3, radius: f64, material: usize) -> Object {
        Object::new(id, Shape::Sphere(Sphere::new(radius)), 0, material)
            .with_transform(Transform::at(center))
    }

    fn lit_sphere_scene() -> Scene {
        Scene {
            camera: Camera::new(
                Point3::new(0., 0., 5.),
                Point3::origin(),
                Vector3::up(),
                60.,
                9,
                9,
            ),
            lights: vec![Light::point(
                Point3::new(2., 2., 5.),
                Color::white(),
                Attenuation::new(1., 0., 0.),
            )],
            textures: vec![Texture::Solid(Color::white())],
            materials: vec![Material {
                ambient: 0.,
                diffuse: 1.,
                ..Default::default()
            }],
            objects: vec![sphere(0, Point3::origin(), 1., 0)],
            ..Default::default()
        }
    }

    #[test]
    fn missed_ray_returns_ambient() {
        let scene = Scene {
            ambient: Color::new(0.1, 0.2, 0.3),
            ..Default::default()
        };
        let mut ctx = TraceContext::new(&scene, 0);
        let ray = Ray::new(Point3::origin(), Vector3::new(0., 0., -1.));
        assert_eq!(scene.trace(&ray, 4, None, &mut ctx), Color::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn nearest_hit_wins_and_exclusion_skips() {
        let scene = Scene {
            objects: vec![
                sphere(0, Point3::new(0., 0., -10.), 1., 0),
                sphere(1, Point3::new(0., 0., -5.), 1., 0),
            ],
            ..Default::default()
        };
        let ray = Ray::new(Point3::origin(), Vector3::new(0., 0., -1.));

        let hit = scene.intersect(&ray, f64::INFINITY, None).unwrap();
        assert_eq!(hit.object.id, 1);
        assert!((hit.t - 4.).abs() < 1e-9);

        let hit = scene.intersect(&ray, f64::INFINITY, Some(1)).unwrap();
        assert_eq!(hit.object.id, 0);
        assert!(scene.intersect(&ray, 3.5, None).is_none());
    }

    #[test]
    fn inside_sphere_normal_faces_the_ray() {
        let scene = Scene {
            objects: vec![sphere(0, Point3::origin(), 2., 0)],
            ..Default::default()
        };
        let ray = Ray::new(Point3::origin(), Vector3::new(0., 1., 0.));
        let hit = scene.intersect(&ray, f64::INFINITY, None).unwrap();

        assert!(hit.inside);
        assert!((hit.normal - Vector3::new(0., -1., 0.)).magnitude() < 1e-9);
    }

    #[test]
    fn trace_adds_attenuated_diffuse_and_specular() {
        let scene = Scene {
            ambient: Color::new(0.2, 0.2, 0.2),
            lights: vec![Light::point(
                Point3::new(4., 0., 5.),
                Color::white(),
                Attenuation::new(1., 0., 1. / 32.),
            )],
            textures: vec![Texture::Solid(Color::new(1., 0.5, 0.))],
            materials: vec![Material {
                ambient: 0.5,
                diffuse: 0.5,
                specular: 0.25,
                shininess: 2.,
                ..Default::default()
            }],
            objects: vec![sphere(0, Point3::origin(), 1., 0)],
            ..Default::default()
        };
        let mut ctx = TraceContext::new(&scene, 0);
        let ray = Ray::new(Point3::new(0., 0., 5.), Vector3::new(0., 0., -1.));

        // the light is 45 degrees off the normal and attenuated by half
        let ambient = 0.2 * 0.5;
        let diffuse = 0.5 * std::f64::consts::FRAC_1_SQRT_2 * 0.5;
        let specular = 0.5 * (22.5f64.to_radians().cos()).powi(2) * 0.25;

        let color = scene.trace(&ray, 4, None, &mut ctx);
        assert!((color.r - (ambient + diffuse + specular)).abs() < 1e-9, "{:?}", color);
        assert!((color.g - (0.5 * (ambient + diffuse) + specular)).abs() < 1e-9, "{:?}", color);
        assert!((color.b - specular).abs() < 1e-9, "{:?}", color);
    }

    #[test]
    fn zero_depth_never_recurses() {
        let scene = Scene {
            ambient: Color::new(0.3, 0.3, 0.3),
            textures: vec![Texture::Solid(Color::white())],
            materials: vec![Material {
                ambient: 0.,
                diffuse: 0.,
                reflective: 1.,
                ..Default::default()
            }],
            objects: vec![sphere(0, Point3::new(0., 0., -5.), 1., 0)],
            ..Default::default()
        };
        let mut ctx = TraceContext::new(&scene, 0);
        let ray = Ray::new(Point3::origin(), Vector3::new(0., 0., -1.));

        assert_eq!(scene.trace(&ray, 0, None, &mut ctx), Color::black());

        // one bounce escapes back toward the camera and sees the ambient color
        let bounced = scene.trace(&ray, 1, None, &mut ctx);
        assert!((bounced.r - 0.3).abs() < 1e-9);
    }

    #[test]
    fn matched_index_transmits_the_background() {
        let scene = Scene {
            ambient: Color::new(0.5, 0.25, 0.),
            textures: vec![Texture::Solid(Color::white())],
            materials: vec![Material {
                ambient: 0.,
                diffuse: 0.,
                transmissive: 1.,
                ior: 1.,
                ..Default::default()
            }],
            objects: vec![sphere(0, Point3::new(0., 0., -5.), 1., 0)],
            ..Default::default()
        };
        let mut ctx = TraceContext::new(&scene, 0);
        let ray = Ray::new(Point3::origin(), Vector3::new(0., 0., -1.));

        let color = scene.trace(&ray, 2, None, &mut ctx);
        assert!((color.r - 0.5).abs() < 1e-9 && (color.g - 0.25).abs() < 1e-9);
    }

    #[test]
    fn shadow_rays_see_blockers() {
        let mut scene = lit_sphere_scene();
        let up = Ray::new(Point3::new(0., 0., 1.), Vector3::new(0., 0., 1.));
        assert!(!scene.occluded(&up, 4., Some(0)));

        scene.objects.push(sphere(1, Point3::new(0., 0., 3.), 0.5, 0));
        assert!(scene.occluded(&up, 4., Some(0)));
        // the blocker starts 1.5 units along the ray
        assert!(!scene.occluded(&up, 1.4, Some(0)));
    }

    #[test]
    fn lit_sphere_is_brighter_at_center() {
        let scene = lit_sphere_scene();
        let pixels = scene.render();
        let at = |x: usize, y: usize| pixels[y * 9 + x];

        let center = at(4, 4);
        assert!(center.luminance() > 0.);
        for corner in [at(0, 0), at(8, 0), at(0, 8), at(8, 8)] {
            assert_eq!(corner, Color::black());
            assert!(center.luminance() > corner.luminance());
        }
    }

    #[test]
    fn renders_are_deterministic_per_seed() {
        for policy in [LightSampling::Fresh, LightSampling::PerPixel] {
            let mut scene = lit_sphere_scene();
            scene.options.light_sampling = policy;
            scene.options.seed = 42;
            scene.lights = vec![Light::area(
                Point3::new(2., 2., 5.),
                Color::white(),
                Attenuation::default(),
                AreaShape::Disk,
                9,
                1.,
                4,
                &mut rand::thread_rng(),
            )];
            scene.camera.set_samples(4, 4, &mut rand::thread_rng());

            assert_eq!(scene.render(), scene.render());
        }
    }

    #[test]
    fn compute_applies_transforms() {
        let mut scene = lit_sphere_scene();
        scene.objects[0].transform.acceleration = Vector3::new(100., 0., 0.);

        let pixels = scene.compute(1.);
        assert!(pixels.iter().all(|&p| p == Color::black()));
    }
}
