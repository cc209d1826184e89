use crate::{
    math::Vector3,
    sampler::{SampleStream, Sampler},
};

/// The surface an area light spreads its sample points over, centered on
/// the light's position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaShape {
    /// A plain point light.
    None,

    /// A square of side `size` in the XY plane.
    Square,

    /// A disk of radius `size` in the XY plane.
    Disk,

    /// A sphere of radius `size`.
    Sphere,

    /// The +Z half of a sphere of radius `size`.
    Hemisphere,
}

impl Default for AreaShape {
    fn default() -> Self {
        Self::None
    }
}

impl AreaShape {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "none" | "noarea" => Self::None,
            "square" => Self::Square,
            "disk" => Self::Disk,
            "sphere" => Self::Sphere,
            "hemisphere" => Self::Hemisphere,
            _ => return None,
        })
    }

    /// Build the mapped sample tables this shape draws from.
    pub fn prepare(&self, sampler: &mut Sampler) {
        match self {
            Self::None | Self::Square => {}
            Self::Disk => sampler.map_to_unit_disk(),
            Self::Sphere => sampler.map_to_sphere(),
            Self::Hemisphere => sampler.map_to_hemisphere(1.),
        }
    }

    /// The next offset from the light's center.
    pub fn offset(&self, stream: &mut SampleStream, size: f64) -> Vector3 {
        match self {
            Self::None => Vector3::default(),
            Self::Square => {
                let p = stream.next_square();
                Vector3::new((p.x - 0.5) * size, (p.y - 0.5) * size, 0.)
            }
            Self::Disk => {
                let p = stream.next_disk();
                Vector3::new(p.x * size, p.y * size, 0.)
            }
            Self::Sphere => stream.next_sphere() * size,
            Self::Hemisphere => stream.next_hemisphere() * size,
        }
    }
}
