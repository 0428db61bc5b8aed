//! Seeded gradient noise for the tile noise channels.
//!
//! 2D Perlin noise with octave (fBm) layering. Permutation tables are
//! shuffled with `ChaCha8Rng` so a seed yields the same field everywhere.

use std::collections::BTreeMap;
use std::fmt;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::position::Position;
use crate::random::RandomStream;

/// Eight unit-ish gradient directions.
const GRAD2: [[f64; 2]; 8] = [
    [1.0, 0.0],
    [-1.0, 0.0],
    [0.0, 1.0],
    [0.0, -1.0],
    [0.707, 0.707],
    [-0.707, 0.707],
    [0.707, -0.707],
    [-0.707, -0.707],
];

#[inline]
fn fade(t: f64) -> f64 {
    t * t * t * (t * (t * 6.0 - 15.0) + 10.0)
}

#[inline]
fn lerp(t: f64, a: f64, b: f64) -> f64 {
    a + t * (b - a)
}

/// Single-octave 2D Perlin noise.
pub struct PerlinNoise {
    perm: [u8; 512],
}

impl PerlinNoise {
    pub fn new(seed: u64) -> Self {
        let mut table: Vec<u8> = (0..=255).collect();
        table.shuffle(&mut ChaCha8Rng::seed_from_u64(seed));

        let mut perm = [0u8; 512];
        perm[..256].copy_from_slice(&table);
        perm[256..].copy_from_slice(&table);
        Self { perm }
    }

    #[inline]
    fn gradient(&self, x: i64, y: i64) -> [f64; 2] {
        let xi = (x & 255) as usize;
        let yi = (y & 255) as usize;
        GRAD2[self.perm[self.perm[xi] as usize + yi] as usize % GRAD2.len()]
    }

    /// Noise at `(x, y)`, roughly in `[-1, 1]`. Zero on integer lattice points.
    pub fn noise(&self, x: f64, y: f64) -> f64 {
        let x0 = x.floor();
        let y0 = y.floor();
        let (xf, yf) = (x - x0, y - y0);
        let (xi, yi) = (x0 as i64, y0 as i64);

        let dot = |gx: i64, gy: i64, dx: f64, dy: f64| {
            let g = self.gradient(gx, gy);
            g[0] * dx + g[1] * dy
        };

        let (xn, yn) = (xi.wrapping_add(1), yi.wrapping_add(1));
        let d00 = dot(xi, yi, xf, yf);
        let d10 = dot(xn, yi, xf - 1.0, yf);
        let d01 = dot(xi, yn, xf, yf - 1.0);
        let d11 = dot(xn, yn, xf - 1.0, yf - 1.0);

        let u = fade(xf);
        let v = fade(yf);
        lerp(v, lerp(u, d00, d10), lerp(u, d01, d11))
    }
}

/// Several Perlin layers at doubling frequency and halving amplitude.
pub struct OctaveNoise {
    octaves: Vec<PerlinNoise>,
}

impl OctaveNoise {
    /// Each octave is seeded with `seed + i`.
    pub fn new(seed: u64, octave_count: usize) -> Self {
        let octaves = (0..octave_count.max(1))
            .map(|i| PerlinNoise::new(seed.wrapping_add(i as u64)))
            .collect();
        Self { octaves }
    }

    /// Normalized fBm sample, roughly in `[-1, 1]`.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let mut value = 0.0;
        let mut amplitude = 1.0;
        let mut frequency = 1.0;
        let mut total_amplitude = 0.0;
        for octave in &self.octaves {
            value += octave.noise(x * frequency, y * frequency) * amplitude;
            total_amplitude += amplitude;
            amplitude *= 0.5;
            frequency *= 2.0;
        }
        value / total_amplitude
    }
}

/// The named noise fields sampled for every chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseChannel {
    Height,
    Temperature,
    Precipitation,
    Hostility,
    Population,
}

impl NoiseChannel {
    pub const ALL: [NoiseChannel; 5] = [
        Self::Height,
        Self::Temperature,
        Self::Precipitation,
        Self::Hostility,
        Self::Population,
    ];

    pub fn id(self) -> &'static str {
        match self {
            Self::Height => "height",
            Self::Temperature => "temperature",
            Self::Precipitation => "precipitation",
            Self::Hostility => "hostility",
            Self::Population => "population",
        }
    }

    /// Accepts the id in any case (`"height"`, `"HEIGHT"`).
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|channel| channel.id().eq_ignore_ascii_case(id))
    }

    /// World units per noise unit. Deliberately not a divisor of the chunk
    /// size so chunk bases never land on the lattice, where Perlin is zero.
    fn wavelength(self) -> f64 {
        match self {
            Self::Height => 61.7,
            Self::Temperature => 143.3,
            Self::Precipitation => 97.1,
            Self::Hostility => 53.9,
            Self::Population => 79.3,
        }
    }

    fn octaves(self) -> usize {
        match self {
            Self::Height => 4,
            Self::Temperature | Self::Precipitation => 2,
            Self::Hostility | Self::Population => 3,
        }
    }
}

impl fmt::Display for NoiseChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// One seed per noise channel. May be partial after loading a damaged save.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoiseSeeds {
    seeds: BTreeMap<NoiseChannel, u64>,
}

impl NoiseSeeds {
    /// Draw a seed for every channel, in channel order.
    pub fn generate(random: &mut RandomStream) -> Self {
        let mut seeds = Self::default();
        seeds.fill_missing(random);
        seeds
    }

    pub fn get(&self, channel: NoiseChannel) -> Option<u64> {
        self.seeds.get(&channel).copied()
    }

    pub fn insert(&mut self, channel: NoiseChannel, seed: u64) {
        self.seeds.insert(channel, seed);
    }

    pub fn iter(&self) -> impl Iterator<Item = (NoiseChannel, u64)> + '_ {
        self.seeds.iter().map(|(&channel, &seed)| (channel, seed))
    }

    pub fn missing(&self) -> Vec<NoiseChannel> {
        NoiseChannel::ALL
            .into_iter()
            .filter(|channel| !self.seeds.contains_key(channel))
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing().is_empty()
    }

    /// Draw seeds for the missing channels. Returns how many were drawn.
    pub fn fill_missing(&mut self, random: &mut RandomStream) -> usize {
        let missing = self.missing();
        for &channel in &missing {
            self.seeds.insert(channel, random.next_u64());
        }
        missing.len()
    }
}

/// Samples every noise channel of a save.
pub struct NoiseSampler {
    channels: BTreeMap<NoiseChannel, OctaveNoise>,
}

impl NoiseSampler {
    /// Channels without a seed use seed 0.
    pub fn new(seeds: &NoiseSeeds) -> Self {
        let channels = NoiseChannel::ALL
            .into_iter()
            .map(|channel| {
                let seed = seeds.get(channel).unwrap_or(0);
                (channel, OctaveNoise::new(seed, channel.octaves()))
            })
            .collect();
        Self { channels }
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Channel value at `position`, in `[0, 1]`.
    pub fn sample(&self, channel: NoiseChannel, position: Position) -> f64 {
        let Some(noise) = self.channels.get(&channel) else {
            return 0.0;
        };
        let wavelength = channel.wavelength();
        let raw = noise.sample(position.x as f64 / wavelength, position.y as f64 / wavelength);
        ((raw + 1.0) / 2.0).clamp(0.0, 1.0)
    }

    /// All channel values at `position`, in channel order.
    pub fn sample_all(&self, position: Position) -> Vec<(NoiseChannel, f64)> {
        self.channels
            .keys()
            .map(|&channel| (channel, self.sample(channel, position)))
            .collect()
    }
}
