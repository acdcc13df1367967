//! Thread-local random source for per-call augmentation draws.
//!
//! Every random parameter of the training path (resize side, crop offset,
//! flip draws) is pulled from here at call time. A worker thread that was
//! seeded with [`init_worker_rng`] produces a reproducible sequence; an
//! unseeded thread falls back to `rand::rng()`.

use rand::distr::uniform::{SampleRange, SampleUniform};
use rand::rngs::StdRng;
use rand::Rng as _;
use rand::SeedableRng;
use std::cell::RefCell;

thread_local! {
    /// Thread-local worker ID, set by [`init_worker_rng`].
    ///
    /// Attached to the draw events in the crop, flip and resize-side
    /// selection; preprocessing never branches on it.
    pub static WORKER_ID: RefCell<usize> = RefCell::new(0);

    /// Thread-local RNG for deterministic randomness in workers
    pub static WORKER_RNG: RefCell<Option<StdRng>> = RefCell::new(None);
}

/// Initialize the calling thread's RNG from worker_id, epoch, and base seed.
/// Seed formula: base_seed + (epoch << 32) + worker_id
pub fn init_worker_rng(worker_id: usize, epoch: usize, base_seed: u64) {
    let seed = base_seed
        .wrapping_add((epoch as u64) << 32)
        .wrapping_add(worker_id as u64);
    WORKER_ID.with(|id| *id.borrow_mut() = worker_id);
    WORKER_RNG.with(|rng| {
        *rng.borrow_mut() = Some(StdRng::seed_from_u64(seed));
    });
    tracing::debug!(worker_id, epoch, seed, "seeded worker rng");
}

/// Drop the calling thread's seeded RNG so later draws use `rand::rng()`.
pub fn clear_worker_rng() {
    WORKER_RNG.with(|rng| *rng.borrow_mut() = None);
}

/// Returns the worker ID recorded for the calling thread.
pub fn worker_id() -> usize {
    WORKER_ID.with(|id| *id.borrow())
}

/// Uniform draw from `range` using the worker RNG, or thread_rng if unseeded.
///
/// Panics if `range` is empty; callers validate bounds first.
pub fn worker_gen_range<T, R>(range: R) -> T
where
    T: SampleUniform,
    R: SampleRange<T>,
{
    WORKER_RNG.with(|rng| {
        let mut rng_ref = rng.borrow_mut();
        match rng_ref.as_mut() {
            Some(rng) => rng.random_range(range),
            None => rand::rng().random_range(range),
        }
    })
}

/// Uniform `f64` in `[0, 1)`.
pub fn worker_gen_f64() -> f64 {
    WORKER_RNG.with(|rng| {
        let mut rng_ref = rng.borrow_mut();
        match rng_ref.as_mut() {
            Some(rng) => rng.random::<f64>(),
            None => rand::rng().random::<f64>(),
        }
    })
}
