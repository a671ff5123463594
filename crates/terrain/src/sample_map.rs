//! Fixed-size arrays of scalar noise samples.
//!
//! Sample maps are generated once per session from sub-seeds and shipped to
//! the worker by value inside the init message. Lookups wrap periodically in
//! every axis, so a map of any size backs an unbounded field.

use bitcode::{Decode, Encode};
use fastnoise_lite::{FastNoiseLite, FractalType, NoiseType};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Base frequency of the cliff noise, in samples.
const GRID_NOISE_FREQUENCY: f32 = 1.0 / 24.0;
const GRID_NOISE_OCTAVES: i32 = 4;
const GRID_NOISE_GAIN: f32 = 0.5;
const GRID_NOISE_LACUNARITY: f32 = 2.0;

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub enum SampleMap {
    /// One-dimensional samples.
    Line { values: Vec<f32> },
    /// Two-dimensional samples, row-major (`values[row * width + col]`).
    Grid {
        width: usize,
        height: usize,
        values: Vec<f32>,
    },
}

impl SampleMap {
    pub fn line(values: Vec<f32>) -> Self {
        SampleMap::Line { values }
    }

    /// Build a grid map. Panics if `values.len() != width * height`.
    pub fn grid(width: usize, height: usize, values: Vec<f32>) -> Self {
        assert_eq!(
            values.len(),
            width * height,
            "grid sample map needs width * height values"
        );
        SampleMap::Grid {
            width,
            height,
            values,
        }
    }

    /// `len` uniform samples in `[0, 1)`.
    pub fn randomized_line(len: usize, seed: u32) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed as u64);
        SampleMap::line((0..len).map(|_| rng.gen::<f32>()).collect())
    }

    /// Tileable fBm noise normalized to `[0, 1]`.
    pub fn noise_grid(width: usize, height: usize, seed: u32) -> Self {
        let mut noise = FastNoiseLite::with_seed(seed as i32);
        noise.set_noise_type(Some(NoiseType::OpenSimplex2));
        noise.set_frequency(Some(GRID_NOISE_FREQUENCY));
        noise.set_fractal_type(Some(FractalType::FBm));
        noise.set_fractal_octaves(Some(GRID_NOISE_OCTAVES));
        noise.set_fractal_gain(Some(GRID_NOISE_GAIN));
        noise.set_fractal_lacunarity(Some(GRID_NOISE_LACUNARITY));

        let w = width as f32;
        let h = height as f32;
        let mut values = Vec::with_capacity(width * height);
        for row in 0..height {
            for col in 0..width {
                let x = col as f32;
                let y = row as f32;
                // Blend four offset copies so opposite edges meet.
                let blended = noise.get_noise_2d(x, y) * (w - x) * (h - y)
                    + noise.get_noise_2d(x - w, y) * x * (h - y)
                    + noise.get_noise_2d(x - w, y - h) * x * y
                    + noise.get_noise_2d(x, y - h) * (w - x) * y;
                values.push(blended / (w * h));
            }
        }
        normalize(&mut values);
        SampleMap::grid(width, height, values)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SampleMap::Line { .. } => "line",
            SampleMap::Grid { .. } => "grid",
        }
    }

    pub fn len(&self) -> usize {
        self.values().len()
    }

    pub fn is_empty(&self) -> bool {
        self.values().is_empty()
    }

    pub fn values(&self) -> &[f32] {
        match self {
            SampleMap::Line { values } | SampleMap::Grid { values, .. } => values,
        }
    }

    /// `(width, height)`; a line is `(len, 1)`.
    pub fn dimensions(&self) -> (usize, usize) {
        match self {
            SampleMap::Line { values } => (values.len(), 1),
            SampleMap::Grid { width, height, .. } => (*width, *height),
        }
    }

    /// Wrapped lookup. Lines ignore `row`.
    pub fn sample(&self, col: i64, row: i64) -> f32 {
        let (width, height) = self.dimensions();
        let c = col.rem_euclid(width as i64) as usize;
        let r = row.rem_euclid(height as i64) as usize;
        self.values()[r * width + c]
    }
}

/// Rescale values in place to span `[0, 1]`. A constant map becomes all zero.
pub fn normalize(values: &mut [f32]) {
    let (min, max) = values
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = max - min;
    for v in values.iter_mut() {
        *v = if span > f32::EPSILON {
            (*v - min) / span
        } else {
            0.0
        };
    }
}
