use std::f64::consts::PI;

use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};

use crate::math::{Point2, Vector3};

/// The number of independent sample sets a sampler builds unless told otherwise.
pub const DEFAULT_SETS: usize = 83;

/// A multi-jittered sampler. It precomputes `num_sets` sets of `num_samples`
/// points on the unit square, stratified both on a `k x k` grid and on the
/// `n x n` fine grid (one sample per fine row and column), and optionally maps
/// them onto a disk, hemisphere or sphere.
///
/// The tables are immutable once built, so a single sampler can be shared by
/// every render worker. Each worker draws through its own [`SampleStream`].
#[derive(Debug, Clone)]
pub struct Sampler {
    num_samples: usize,
    num_sets: usize,
    samples: Vec<Point2>,
    shuffled_indices: Vec<usize>,
    disk_samples: Vec<Point2>,
    hemisphere_samples: Vec<Vector3>,
    sphere_samples: Vec<Vector3>,
}

impl Sampler {
    /// Build a sampler with the given random generator.
    ///
    /// `num_samples` should be a perfect square; other counts are rounded down
    /// to the nearest one (and at least 1).
    pub fn with_rng<R: Rng>(num_samples: usize, num_sets: usize, rng: &mut R) -> Self {
        let k = ((num_samples as f64).sqrt().floor() as usize).max(1);
        if k * k != num_samples {
            log::warn!(
                "sample count {} is not a perfect square, using {}",
                num_samples,
                k * k
            );
        }

        let mut sampler = Self {
            num_samples: k * k,
            num_sets: num_sets.max(1),
            samples: Vec::new(),
            shuffled_indices: Vec::new(),
            disk_samples: Vec::new(),
            hemisphere_samples: Vec::new(),
            sphere_samples: Vec::new(),
        };

        sampler.generate_samples(k, rng);
        sampler.setup_shuffled_indices(rng);
        sampler
    }

    pub fn num_samples(&self) -> usize {
        self.num_samples
    }

    pub fn num_sets(&self) -> usize {
        self.num_sets
    }

    fn generate_samples<R: Rng>(&mut self, k: usize, rng: &mut R) {
        let n = self.num_samples;
        let cell = 1. / n as f64;

        self.samples = vec![Point2::default(); n * self.num_sets];

        // initial pattern: sample (i, j) sits in coarse column i and coarse row j
        for p in 0..self.num_sets {
            let base = p * n;
            for i in 0..k {
                for j in 0..k {
                    self.samples[base + i * k + j] = Point2::new(
                        ((i * k + j) as f64 + rng.gen::<f64>()) * cell,
                        ((j * k + i) as f64 + rng.gen::<f64>()) * cell,
                    );
                }
            }
        }

        // shuffle x coordinates within each coarse column
        for p in 0..self.num_sets {
            let base = p * n;
            for i in 0..k {
                for j in 0..k {
                    let swap = rng.gen_range(j..k);
                    let t = self.samples[base + i * k + j].x;
                    self.samples[base + i * k + j].x = self.samples[base + i * k + swap].x;
                    self.samples[base + i * k + swap].x = t;
                }
            }
        }

        // shuffle y coordinates within each coarse row
        for p in 0..self.num_sets {
            let base = p * n;
            for i in 0..k {
                for j in 0..k {
                    let swap = rng.gen_range(j..k);
                    let t = self.samples[base + j * k + i].y;
                    self.samples[base + j * k + i].y = self.samples[base + swap * k + i].y;
                    self.samples[base + swap * k + i].y = t;
                }
            }
        }
    }

    fn setup_shuffled_indices<R: Rng>(&mut self, rng: &mut R) {
        let mut indices = (0..self.num_samples).collect::<Vec<_>>();
        self.shuffled_indices = Vec::with_capacity(self.num_samples * self.num_sets);

        for _ in 0..self.num_sets {
            indices.shuffle(rng);
            self.shuffled_indices.extend_from_slice(&indices);
        }
    }

    /// Map the square samples onto the unit disk with the concentric mapping.
    pub fn map_to_unit_disk(&mut self) {
        self.disk_samples = self
            .samples
            .iter()
            .map(|s| {
                let sx = 2. * s.x - 1.;
                let sy = 2. * s.y - 1.;

                let (r, phi) = if sx > -sy {
                    if sx > sy {
                        (sx, sy / sx)
                    } else {
                        (sy, 2. - sx / sy)
                    }
                } else if sx < sy {
                    (-sx, 4. + sy / sx)
                } else if sy != 0. {
                    (-sy, 6. - sx / sy)
                } else {
                    (-sy, 0.)
                };

                let phi = phi * PI / 4.;
                Point2::new(r * phi.cos(), r * phi.sin())
            })
            .collect();
    }

    /// Map the square samples onto the +Z unit hemisphere, with density
    /// proportional to `cos(theta)^e`.
    pub fn map_to_hemisphere(&mut self, e: f64) {
        self.hemisphere_samples = self
            .samples
            .iter()
            .map(|s| {
                let (sin_phi, cos_phi) = (2. * PI * s.x).sin_cos();
                let cos_theta = (1. - s.y).powf(1. / (e + 1.));
                let sin_theta = (1. - cos_theta * cos_theta).max(0.).sqrt();
                Vector3::new(sin_theta * cos_phi, sin_theta * sin_phi, cos_theta)
            })
            .collect();
    }

    /// Map the square samples uniformly onto the unit sphere.
    pub fn map_to_sphere(&mut self) {
        self.sphere_samples = self
            .samples
            .iter()
            .map(|s| {
                let z = 1. - 2. * s.x;
                let r = (1. - z * z).max(0.).sqrt();
                let (sin_phi, cos_phi) = (2. * PI * s.y).sin_cos();
                Vector3::new(r * cos_phi, r * sin_phi, z)
            })
            .collect();
    }

    fn slot(&self, set: usize, index: usize) -> usize {
        let base = (set % self.num_sets) * self.num_samples;
        base + self.shuffled_indices[base + index % self.num_samples]
    }

    /// The `index`th sample of set `set` on the unit square.
    pub fn square(&self, set: usize, index: usize) -> Point2 {
        self.samples[self.slot(set, index)]
    }

    /// The `index`th sample of set `set` on the unit disk.
    ///
    /// Panics if [`Sampler::map_to_unit_disk`] has not been called.
    pub fn disk(&self, set: usize, index: usize) -> Point2 {
        self.disk_samples[self.slot(set, index)]
    }

    /// Panics if [`Sampler::map_to_hemisphere`] has not been called.
    pub fn hemisphere(&self, set: usize, index: usize) -> Vector3 {
        self.hemisphere_samples[self.slot(set, index)]
    }

    /// Panics if [`Sampler::map_to_sphere`] has not been called.
    pub fn sphere(&self, set: usize, index: usize) -> Vector3 {
        self.sphere_samples[self.slot(set, index)]
    }

    /// A draw cursor that picks a random set every `num_samples` draws.
    pub fn stream(&self, seed: u64) -> SampleStream<'_> {
        SampleStream {
            sampler: self,
            rng: StdRng::seed_from_u64(seed),
            count: 0,
            set: 0,
            pinned: None,
        }
    }

    /// A draw cursor whose first `num_samples` draws come from `set`, in order.
    pub fn replay(&self, set: usize, seed: u64) -> SampleStream<'_> {
        SampleStream {
            pinned: Some(set % self.num_sets),
            ..self.stream(seed)
        }
    }
}

/// Per-worker cursor over a [`Sampler`]'s tables.
#[derive(Debug, Clone)]
pub struct SampleStream<'a> {
    sampler: &'a Sampler,
    rng: StdRng,
    count: usize,
    set: usize,
    pinned: Option<usize>,
}

impl<'a> SampleStream<'a> {
    fn advance(&mut self) -> (usize, usize) {
        let n = self.sampler.num_samples;
        if self.count % n == 0 {
            self.set = match self.pinned.take() {
                Some(set) => set,
                None => self.rng.gen_range(0..self.sampler.num_sets),
            };
        }
        let index = self.count % n;
        self.count += 1;
        (self.set, index)
    }

    /// A random set index, for callers that want to replay a set later.
    pub fn random_set(&mut self) -> usize {
        self.rng.gen_range(0..self.sampler.num_sets)
    }

    pub fn next_square(&mut self) -> Point2 {
        let (set, index) = self.advance();
        self.sampler.square(set, index)
    }

    pub fn next_disk(&mut self) -> Point2 {
        let (set, index) = self.advance();
        self.sampler.disk(set, index)
    }

    pub fn next_hemisphere(&mut self) -> Vector3 {
        let (set, index) = self.advance();
        self.sampler.hemisphere(set, index)
    }

    pub fn next_sphere(&mut self) -> Vector3 {
        let (set, index) = self.advance();
        self.sampler.sphere(set, index)
    }
}
