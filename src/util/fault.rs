//! Simulated upsets
//!
//! Flips a random arena bit so the detection path can be exercised without
//! waiting for a cosmic ray.

use rand::Rng;
use tracing::info;

use crate::arena::BitArena;

/// With probability `probability`, set one uniformly chosen bit.
///
/// Returns the flipped index. Empty arenas are never touched.
pub fn maybe_flip_bit<R: Rng + ?Sized>(
    arena: &mut BitArena,
    probability: f64,
    rng: &mut R,
) -> Option<usize> {
    if arena.is_empty() || !rng.gen_bool(probability.clamp(0.0, 1.0)) {
        return None;
    }
    let index = rng.gen_range(0..arena.len());
    arena.inject_fault(index);
    info!(index, "simulated upset");
    Some(index)
}
