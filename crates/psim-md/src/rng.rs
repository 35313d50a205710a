//! Injectable randomness for the dividend estimate and fallback quotes.
//!
//! The quote layer never reaches for a global generator; it is handed an
//! `Arc<dyn RandomSource>`. Production uses [`SplitMix64`] (seeded or from
//! fresh entropy); tests use [`ConstantSource`] to pin exact values.
//!
//! Concurrent work that must stay reproducible takes its own stream via
//! [`RandomSource::fork`] instead of drawing from the shared source.

use std::sync::atomic::{AtomicU64, Ordering};

/// Source of uniform draws in `[0, 1)`.
///
/// `&self` receivers so one source can be shared across concurrent fetches.
pub trait RandomSource: Send + Sync {
    fn next_unit(&self) -> f64;

    /// Uniform draw in `[lo, hi)` (or exactly `lo` when `lo == hi`).
    fn uniform(&self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_unit()
    }

    /// Independent source for stream `stream`.
    ///
    /// Depends only on how `self` was created and on `stream`, never on draws
    /// already taken from `self`.
    fn fork(&self, stream: u64) -> Box<dyn RandomSource>;
}

const GOLDEN_GAMMA: u64 = 0x9e37_79b9_7f4a_7c15;

/// Lock-free SplitMix64.
///
/// Each draw advances the state with a single `fetch_add`, so concurrent
/// callers never observe the same output twice.
#[derive(Debug)]
pub struct SplitMix64 {
    seed: u64,
    state: AtomicU64,
}

impl SplitMix64 {
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed,
            state: AtomicU64::new(seed),
        }
    }

    /// Seed from a fresh v4 UUID.
    pub fn from_entropy() -> Self {
        let bits = uuid::Uuid::new_v4().as_u128();
        Self::seeded((bits as u64) ^ ((bits >> 64) as u64))
    }

    pub fn next_u64(&self) -> u64 {
        let mut z = self
            .state
            .fetch_add(GOLDEN_GAMMA, Ordering::Relaxed)
            .wrapping_add(GOLDEN_GAMMA);
        mix64(z)
    }
}

fn mix64(mut z: u64) -> u64 {
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

impl RandomSource for SplitMix64 {
    fn next_unit(&self) -> f64 {
        // top 53 bits -> [0, 1)
        (self.next_u64() >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    fn fork(&self, stream: u64) -> Box<dyn RandomSource> {
        let salt = mix64(stream.wrapping_add(1).wrapping_mul(GOLDEN_GAMMA));
        Box::new(SplitMix64::seeded(mix64(self.seed ^ salt)))
    }
}

/// Always returns the same draw. Values outside `[0, 1)` are clamped.
#[derive(Debug, Clone, Copy)]
pub struct ConstantSource(pub f64);

impl RandomSource for ConstantSource {
    fn next_unit(&self) -> f64 {
        if self.0.is_nan() {
            return 0.0;
        }
        self.0.clamp(0.0, 1.0 - f64::EPSILON)
    }

    fn fork(&self, _stream: u64) -> Box<dyn RandomSource> {
        Box::new(*self)
    }
}
