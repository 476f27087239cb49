//! Independent CSPRNG streams.
//!
//! Every operation that needs randomness draws a fresh `ChaCha20Rng` seeded
//! from the operating system, so no RNG state is shared between threads. A
//! failing OS source is fatal: callers get `RandomnessUnavailable` instead of
//! a weaker fallback.

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rand_core::{CryptoRng, OsRng, RngCore};
use zeroize::Zeroize;

use crate::error::{CryptoError, Result};

/// Fill `buf` from the OS random source.
pub fn fill_random(buf: &mut [u8]) -> Result<()> {
    OsRng.try_fill_bytes(buf).map_err(|e| {
        log::error!("OS random source failed: {}", e);
        CryptoError::RandomnessUnavailable
    })
}

/// Draw a fresh 32-byte seed from the OS random source.
pub fn random_seed() -> Result<[u8; 32]> {
    let mut seed = [0u8; 32];
    fill_random(&mut seed)?;
    Ok(seed)
}

/// ChaCha20 stream whose key schedule is scrubbed on drop.
///
/// `rand_chacha` keeps the seed in its state and offers no wiping, so the
/// state is overwritten with a zero-keyed stream when this drops.
pub struct SeededRng(ChaCha20Rng);

impl SeededRng {
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self(ChaCha20Rng::from_seed(*seed))
    }
}

impl RngCore for SeededRng {
    fn next_u32(&mut self) -> u32 {
        self.0.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> std::result::Result<(), rand_core::Error> {
        self.0.try_fill_bytes(dest)
    }
}

impl CryptoRng for SeededRng {}

impl Drop for SeededRng {
    fn drop(&mut self) {
        self.0 = ChaCha20Rng::from_seed([0u8; 32]);
        // Keep the overwrite from being optimized away as a dead store
        std::hint::black_box(&mut self.0);
    }
}

/// Create a new ChaCha20 stream seeded from the OS.
pub fn fresh_rng() -> Result<SeededRng> {
    let mut seed = random_seed()?;
    let rng = SeededRng::from_seed(&seed);
    seed.zeroize();
    Ok(rng)
}
