//! Master seed chain.
//!
//! Every sub-generator (road map, cliff map, brush, rocks) is seeded from one
//! master `ChaCha8Rng` so their patterns are uncorrelated yet reproducible
//! from a single value. Seeding each sub-generator from the clock instead
//! would give them all the same seed at startup.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Scale applied to a unit draw to produce an integer seed.
pub const SEED_MODULUS: f64 = u32::MAX as f64;

/// Uniform draw in `[lo, hi)`.
///
/// Written out rather than using `gen_range` so that a collapsed range
/// (`lo == hi`) yields `lo` instead of panicking, and every call consumes
/// exactly one value from the stream.
#[inline]
pub fn uniform(rng: &mut impl Rng, lo: f64, hi: f64) -> f64 {
    lo + (hi - lo) * rng.gen::<f64>()
}

/// Derives independent sub-seeds from one master seed.
pub struct SeedChain {
    master: u64,
    rng: ChaCha8Rng,
}

impl SeedChain {
    pub fn new(master: u64) -> Self {
        Self {
            master,
            rng: ChaCha8Rng::seed_from_u64(master),
        }
    }

    /// Master seed taken from the system clock.
    pub fn from_entropy() -> Self {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or_default();
        Self::new(nanos)
    }

    pub fn master(&self) -> u64 {
        self.master
    }

    /// Draw the next sub-seed.
    pub fn next_seed(&mut self) -> u32 {
        (self.rng.gen::<f64>() * SEED_MODULUS).round() as u32
    }
}
