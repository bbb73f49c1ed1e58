//! Deterministic input generation for concrete candidate screening

use crate::ir::Divisor;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Configuration for random input generation
#[derive(Debug, Clone)]
pub struct RandomInputConfig {
    /// Number of random inputs to generate
    pub count: usize,
    /// Seed for the generator; a fixed seed keeps screening reproducible
    pub seed: u64,
}

impl Default for RandomInputConfig {
    fn default() -> Self {
        RandomInputConfig {
            count: 32,
            seed: 0x5eed,
        }
    }
}

/// Generate uniformly random W-bit inputs
pub fn generate_random_inputs(config: &RandomInputConfig, divisor: Divisor) -> Vec<u64> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mask = divisor.width().mask();
    (0..config.count)
        .map(|_| rng.random::<u64>() & mask)
        .collect()
}

/// Inputs around the places where multiply-shift replacements usually break:
/// the domain edges and the neighbourhood of multiples of the divisor.
pub fn generate_edge_case_inputs(divisor: Divisor) -> Vec<u64> {
    let max = divisor.width().max_value();
    let d = divisor.value();

    let mut inputs = vec![0, 1, d - 1, d, d.saturating_add(1), max, max - 1];

    // Largest multiple of d in range, and its neighbours
    let top_multiple = max - max % d;
    inputs.extend([top_multiple, top_multiple.saturating_sub(1)]);

    // Half-domain boundary
    let half = max / 2;
    inputs.extend([half, half + 1]);

    inputs.retain(|&x| x <= max);
    inputs.sort_unstable();
    inputs.dedup();
    inputs
}

/// Edge cases first, then random samples
pub fn generate_screening_inputs(config: &RandomInputConfig, divisor: Divisor) -> Vec<u64> {
    let mut inputs = generate_edge_case_inputs(divisor);
    inputs.extend(generate_random_inputs(config, divisor));
    inputs
}
