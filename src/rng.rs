//! Injected randomness
//!
//! Every random draw in the pipeline goes through [`RandomSource`], so a
//! seeded generator makes selection fully reproducible.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Uniform source in [0, 1)
pub trait RandomSource {
    fn next_unit(&mut self) -> f64;
}

impl<R: RngCore> RandomSource for R {
    fn next_unit(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

/// Adapter for a plain `FnMut() -> f64` generator.
///
/// Values outside [0, 1) are pulled back into range.
pub struct FnRandom<F>(pub F);

impl<F: FnMut() -> f64> RandomSource for FnRandom<F> {
    fn next_unit(&mut self) -> f64 {
        to_unit((self.0)())
    }
}

/// Deterministic generator for tests and reproducible sessions
pub fn seeded(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

fn to_unit(value: f64) -> f64 {
    if !value.is_finite() || value <= 0.0 {
        0.0
    } else if value >= 1.0 {
        1.0 - f64::EPSILON
    } else {
        value
    }
}
