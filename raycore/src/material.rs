use std::ops::{Add, AddAssign, Div, Mul};

use crate::math::Point3;

/// A linear RGB color. Channels are unbounded while light is accumulated and
/// only clamped when a pixel is written out.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub fn white() -> Self {
        Self::new(1., 1., 1.)
    }

    pub fn black() -> Self {
        Self::new(0., 0., 0.)
    }

    /// Instantiate a new Color.
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Instantiate a new Color from 8-bit channels.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f64 / 255., g as f64 / 255., b as f64 / 255.)
    }

    /// Clamp every channel to [0, 1].
    pub fn clamp(self) -> Self {
        Self {
            r: self.r.clamp(0., 1.),
            g: self.g.clamp(0., 1.),
            b: self.b.clamp(0., 1.),
        }
    }

    /// Mean of the three channels.
    pub fn luminance(self) -> f64 {
        (self.r + self.g + self.b) / 3.
    }

    pub fn to_rgb8(self) -> [u8; 3] {
        let c = self.clamp();
        [
            (c.r * 255.).round() as u8,
            (c.g * 255.).round() as u8,
            (c.b * 255.).round() as u8,
        ]
    }
}

impl From<image::Rgb<u8>> for Color {
    fn from(rgb: image::Rgb<u8>) -> Self {
        Self::from_rgb8(rgb.0[0], rgb.0[1], rgb.0[2])
    }
}

impl From<Color> for image::Rgb<u8> {
    fn from(color: Color) -> Self {
        image::Rgb(color.to_rgb8())
    }
}

impl Add for Color {
    type Output = Color;

    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}

impl AddAssign for Color {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Mul for Color {
    type Output = Color;

    fn mul(self, rhs: Self) -> Self::Output {
        Self::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b)
    }
}

impl Mul<f64> for Color {
    type Output = Color;

    fn mul(self, rhs: f64) -> Self::Output {
        Self::new(self.r * rhs, self.g * rhs, self.b * rhs)
    }
}

impl Div<f64> for Color {
    type Output = Color;

    fn div(self, rhs: f64) -> Self::Output {
        Self::new(self.r / rhs, self.g / rhs, self.b / rhs)
    }
}

/// A projection plane `a x + b y + c z + d` used to derive one texture coordinate.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TexturePlane {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl TexturePlane {
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self { a, b, c, d }
    }

    pub fn eval(&self, p: Point3) -> f64 {
        self.a * p.x + self.b * p.y + self.c * p.z + self.d
    }
}

/// A texture for a material.
#[derive(Clone, Debug)]
pub enum Texture {
    /// A texture that is just a solid color.
    Solid(Color),

    /// A 3D checkerboard of cubes of side `scale`, alternating two colors.
    Checker {
        scale: f64,
        color1: Color,
        color2: Color,
    },

    /// An image projected onto the surface by two planes: `p0` gives the
    /// column coordinate and `p1` the row coordinate. Lookups wrap around.
    Map {
        image: image::RgbImage,
        p0: TexturePlane,
        p1: TexturePlane,
    },
}

impl Texture {
    /// The color of this texture at a world-space point.
    pub fn at(&self, p: Point3) -> Color {
        match self {
            Self::Solid(color) => *color,
            Self::Checker {
                scale,
                color1,
                color2,
            } => {
                let pattern = (p.x / scale).floor() + (p.y / scale).floor() + (p.z / scale).floor();
                if (pattern as i64).rem_euclid(2) == 1 {
                    *color2
                } else {
                    *color1
                }
            }
            Self::Map { image, p0, p1 } => {
                let (w, h) = (image.width() as i64, image.height() as i64);
                if w == 0 || h == 0 {
                    return Color::black();
                }

                let s = p0.eval(p);
                let r = p1.eval(p);
                let row = ((r * h as f64).floor() as i64).rem_euclid(h);
                let col = ((s * w as f64).floor() as i64).rem_euclid(w);
                (*image.get_pixel(col as u32, row as u32)).into()
            }
        }
    }
}

/// The Phong-style shading coefficients of a surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Weight of the scene's ambient light.
    pub ambient: f64,

    /// Weight of Lambertian reflection from lights.
    pub diffuse: f64,

    /// Weight of the specular highlight.
    pub specular: f64,

    /// Exponent of the specular highlight. Higher is tighter.
    pub shininess: f64,

    /// Weight of the mirror-reflected ray.
    pub reflective: f64,

    /// Weight of the transmitted (refracted) ray.
    pub transmissive: f64,

    /// The index of refraction of this material.
    pub ior: f64,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            ambient: 0.2,
            diffuse: 0.8,
            specular: 0.,
            shininess: 32.,
            reflective: 0.,
            transmissive: 0.,
            ior: 1.,
        }
    }
}
