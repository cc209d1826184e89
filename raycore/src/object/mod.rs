mod cylinder;
mod polyhedron;
mod sphere;
mod torus;
mod transform;

use crate::math::{Ray, Vector3};

pub use cylinder::*;
pub use polyhedron::*;
pub use sphere::*;
pub use torus::*;
pub use transform::*;

/// The result of a ray intersection.
#[derive(Clone, Debug, PartialEq)]
pub struct Hit {
    /// Distance along the ray, in units of the ray's direction vector.
    pub t: f64,
    pub normal: Vector3,
    /// Set when the ray started inside the shape.
    pub inside: bool,
}

impl Hit {
    pub fn new(t: f64, normal: Vector3, inside: bool) -> Self {
        Self { t, normal, inside }
    }
}

/// A trait that represents any type that can be intersected by a Ray.
pub trait Intersect {
    /// Find the nearest intersection with `t` in `(EPSILON, max_t)`, if any.
    fn intersect(&self, ray: &Ray, max_t: f64) -> Option<Hit>;
}

/// The closed set of primitive shapes, each defined in its own object space.
#[derive(Debug, Clone)]
pub enum Shape {
    Sphere(Sphere),
    Polyhedron(Polyhedron),
    Torus(Torus),
    Cylinder(Cylinder),
}

impl Shape {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Sphere(_) => "sphere",
            Self::Polyhedron(_) => "polyhedron",
            Self::Torus(_) => "torus",
            Self::Cylinder(_) => "cylinder",
        }
    }
}

impl Intersect for Shape {
    fn intersect(&self, ray: &Ray, max_t: f64) -> Option<Hit> {
        match self {
            Self::Sphere(s) => s.intersect(ray, max_t),
            Self::Polyhedron(p) => p.intersect(ray, max_t),
            Self::Torus(t) => t.intersect(ray, max_t),
            Self::Cylinder(c) => c.intersect(ray, max_t),
        }
    }
}

/// A primitive instance placed in the scene.
#[derive(Debug, Clone)]
pub struct Object {
    /// Identity used to keep secondary rays from re-hitting this object.
    pub id: usize,
    pub shape: Shape,
    pub transform: Transform,
    /// Index into the scene's textures.
    pub texture: usize,
    /// Index into the scene's materials.
    pub material: usize,
}

impl Object {
    pub fn new(id: usize, shape: Shape, texture: usize, material: usize) -> Self {
        Self {
            id,
            shape,
            transform: Transform::default(),
            texture,
            material,
        }
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn is_sphere(&self) -> bool {
        matches!(self.shape, Shape::Sphere(_))
    }

    /// Advance the object along its acceleration by `dt` and rebuild its
    /// world-to-object matrix.
    pub fn update_transform(&mut self, dt: f64) {
        self.transform.update(dt);
    }
}

impl Intersect for Object {
    /// Intersect in object space and bring the normal back to world space.
    fn intersect(&self, ray: &Ray, max_t: f64) -> Option<Hit> {
        let inverse = self.transform.inverse();
        let hit = self.shape.intersect(&ray.transform(&inverse), max_t)?;

        Some(Hit {
            normal: inverse.transform_normal(hit.normal).normalize(),
            ..hit
        })
    }
}
