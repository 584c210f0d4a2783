//! String seeds and the generators derived from them.
//!
//! Every seeded component owns its own generator built from the seed string,
//! so repeated or concurrent calls never share random state.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Folds a seed string into a 64-bit value (FNV-1a).
///
/// Stable across platforms and releases, unlike `std`'s default hasher.
pub fn seed_from_str(seed: &str) -> u64 {
    seed.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
    })
}

/// Creates a fresh generator for the given seed string.
pub fn rng_from_seed(seed: &str) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed_from_str(seed))
}

/// Derives the integer seed used by the gradient-noise primitive.
pub fn noise_seed(seed: &str) -> i32 {
    rng_from_seed(seed).random::<i32>()
}
