mod area;

use rand::Rng;

use crate::{
    material::{Color, Material},
    math::{Point3, Ray},
    sampler::{SampleStream, Sampler},
    scene::{Intersection, Scene, EPSILON},
};

pub use area::*;

/// Distance falloff `1 / (constant + linear d + quadratic d^2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Attenuation {
    pub constant: f64,
    pub linear: f64,
    pub quadratic: f64,
}

impl Default for Attenuation {
    fn default() -> Self {
        Self {
            constant: 1.,
            linear: 0.,
            quadratic: 0.,
        }
    }
}

impl Attenuation {
    pub fn new(constant: f64, linear: f64, quadratic: f64) -> Self {
        Self {
            constant,
            linear,
            quadratic,
        }
    }

    pub fn factor(&self, dist: f64) -> f64 {
        1. / (self.constant + self.linear * dist + self.quadratic * dist * dist).max(EPSILON)
    }
}

/// The result of a light's influence on a ray intersection, already weighted
/// by the surface material.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LightShading {
    pub diffuse: Color,
    pub specular: Color,
}

/// A point light, or an area light when it carries a sampler spread over an
/// [`AreaShape`].
#[derive(Clone, Debug)]
pub struct Light {
    /// The center of this light.
    pub position: Point3,

    /// The color of this light.
    pub color: Color,

    pub attenuation: Attenuation,

    pub area_shape: AreaShape,

    /// Radius of a disk, sphere or hemisphere, or side of a square.
    pub area_size: f64,

    sampler: Option<Sampler>,
}

impl Light {
    pub fn point(position: Point3, color: Color, attenuation: Attenuation) -> Self {
        Self {
            position,
            color,
            attenuation,
            area_shape: AreaShape::None,
            area_size: 0.,
            sampler: None,
        }
    }

    /// An area light. A shape of [`AreaShape::None`] gives a point light.
    #[allow(clippy::too_many_arguments)]
    pub fn area<R: Rng>(
        position: Point3,
        color: Color,
        attenuation: Attenuation,
        shape: AreaShape,
        num_samples: usize,
        size: f64,
        num_sets: usize,
        rng: &mut R,
    ) -> Self {
        let mut light = Self::point(position, color, attenuation);
        if shape == AreaShape::None {
            return light;
        }

        let mut sampler = Sampler::with_rng(num_samples, num_sets, rng);
        shape.prepare(&mut sampler);

        light.area_shape = shape;
        light.area_size = size;
        light.sampler = Some(sampler);
        light
    }

    pub fn sampler(&self) -> Option<&Sampler> {
        self.sampler.as_ref()
    }

    /// Sample points drawn per shading evaluation.
    pub fn num_samples(&self) -> usize {
        self.sampler.as_ref().map_or(1, Sampler::num_samples)
    }

    /// The next point on the light. Point lights, or calls without a stream,
    /// always give the center.
    pub fn sample_point(&self, stream: Option<&mut SampleStream>) -> Point3 {
        match stream {
            Some(stream) if self.sampler.is_some() => {
                self.position + self.area_shape.offset(stream, self.area_size)
            }
            _ => self.position,
        }
    }

    /// Diffuse and specular light arriving at `hit` from this light, shadowed
    /// by every other object in the scene.
    pub fn shading(
        &self,
        ray: &Ray,
        hit: &Intersection,
        material: &Material,
        scene: &Scene,
        mut stream: Option<&mut SampleStream>,
    ) -> LightShading {
        let n = self.num_samples();
        let mut shading = LightShading::default();

        for _ in 0..n {
            // vector pointing from hit to the light sample
            let lvec = self.sample_point(stream.as_deref_mut()) - hit.point;

            // calculate distance and normalize, all at once
            let dist = lvec.magnitude();
            if dist < EPSILON {
                continue;
            }
            let lvec = lvec / dist;

            // apply shadowing
            let shadow_ray = Ray::new(hit.point, lvec);
            if scene.occluded(&shadow_ray, dist, Some(hit.object.id)) {
                continue;
            }

            let light = self.color * (self.attenuation.factor(dist) / n as f64);

            let diffuse = hit.normal.dot(lvec).max(0.);
            shading.diffuse += light * (diffuse * material.diffuse);

            if material.specular > 0. {
                let halfway_dir = (lvec - ray.direction).normalize();
                let specular = hit.normal.dot(halfway_dir).max(0.).powf(material.shininess);
                shading.specular += light * (specular * material.specular);
            }
        }

        shading
    }
}
