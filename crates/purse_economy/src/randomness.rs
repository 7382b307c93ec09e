//! # Randomness Sources
//!
//! The engines consume one uniform draw per weighted step. The source sits
//! behind [`Randomizer`] so the purse can be pointed at a VRF-backed oracle,
//! a seeded ChaCha stream, or a scripted sequence for replays.
//!
//! A draw may block (an oracle round trip). Engines take every draw they need
//! before mutating anything, so a failed draw aborts the request cleanly.

use alloy_primitives::Address;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::collections::VecDeque;

use crate::error::RandomnessError;

/// Produces uniform values in `[0, bound)`.
pub trait Randomizer: Send + Sync {
    /// Address identifying this source in the owner configuration surface.
    fn address(&self) -> Address;

    /// Draws the next value in `[0, bound)`.
    ///
    /// # Errors
    ///
    /// Returns [`RandomnessError`] if no value can be produced.
    fn next_below(&mut self, bound: u32) -> Result<u32, RandomnessError>;
}

/// ChaCha20 stream seeded from 32 bytes.
///
/// Feed it a VRF output or another 256-bit secret. Draws use rejection
/// sampling through [`Rng::gen_range`], so small bounds carry no modulo bias.
pub struct ChaChaRandomizer {
    address: Address,
    rng: ChaCha20Rng,
    draws: u64,
}

impl ChaChaRandomizer {
    /// Creates a source from a 256-bit seed.
    #[must_use]
    pub fn from_seed(address: Address, seed: [u8; 32]) -> Self {
        Self {
            address,
            rng: ChaCha20Rng::from_seed(seed),
            draws: 0,
        }
    }

    /// Creates a source from a 64-bit seed (NOT FOR PRODUCTION).
    #[must_use]
    pub fn seed_from_u64(address: Address, seed: u64) -> Self {
        Self {
            address,
            rng: ChaCha20Rng::seed_from_u64(seed),
            draws: 0,
        }
    }

    /// Number of values drawn so far.
    #[must_use]
    pub const fn draws(&self) -> u64 {
        self.draws
    }
}

impl Randomizer for ChaChaRandomizer {
    fn address(&self) -> Address {
        self.address
    }

    fn next_below(&mut self, bound: u32) -> Result<u32, RandomnessError> {
        if bound == 0 {
            return Err(RandomnessError::EmptyRange);
        }
        self.draws += 1;
        Ok(self.rng.gen_range(0..bound))
    }
}

impl std::fmt::Debug for ChaChaRandomizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never expose the stream state.
        f.debug_struct("ChaChaRandomizer")
            .field("address", &self.address)
            .field("rng", &"[REDACTED]")
            .field("draws", &self.draws)
            .finish()
    }
}

/// Replays a fixed sequence of draws.
///
/// Intended for tests and for replaying recorded oracle outputs.
#[derive(Clone, Debug)]
pub struct ScriptedRandomizer {
    address: Address,
    values: VecDeque<u32>,
}

impl ScriptedRandomizer {
    /// Creates a source that yields `values` in order.
    #[must_use]
    pub fn new(address: Address, values: impl IntoIterator<Item = u32>) -> Self {
        Self {
            address,
            values: values.into_iter().collect(),
        }
    }

    /// Number of values left.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl Randomizer for ScriptedRandomizer {
    fn address(&self) -> Address {
        self.address
    }

    fn next_below(&mut self, bound: u32) -> Result<u32, RandomnessError> {
        if bound == 0 {
            return Err(RandomnessError::EmptyRange);
        }
        let value = self.values.pop_front().ok_or(RandomnessError::Exhausted)?;
        if value >= bound {
            return Err(RandomnessError::OutOfRange { value, bound });
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chacha_is_deterministic_per_seed() {
        let address = Address::with_last_byte(7);
        let mut a = ChaChaRandomizer::from_seed(address, [42u8; 32]);
        let mut b = ChaChaRandomizer::from_seed(address, [42u8; 32]);

        for _ in 0..1000 {
            assert_eq!(a.next_below(100).unwrap(), b.next_below(100).unwrap());
        }
        assert_eq!(a.draws(), 1000);
    }

    #[test]
    fn test_chacha_differs_across_seeds() {
        let address = Address::with_last_byte(7);
        let mut a = ChaChaRandomizer::from_seed(address, [0u8; 32]);
        let mut b = ChaChaRandomizer::from_seed(address, [1u8; 32]);

        let different = (0..100)
            .filter(|_| a.next_below(100).unwrap() != b.next_below(100).unwrap())
            .count();
        assert!(different > 50, "seeds should diverge: {different}/100 differed");
    }

    #[test]
    fn test_chacha_stays_in_range() {
        let mut rng = ChaChaRandomizer::seed_from_u64(Address::ZERO, 9);
        let mut seen = [false; 100];

        for _ in 0..10_000 {
            let value = rng.next_below(100).unwrap();
            assert!(value < 100);
            seen[value as usize] = true;
        }
        assert!(seen.iter().all(|&s| s), "every bucket should be hit in 10k draws");
    }

    #[test]
    fn test_empty_range_rejected() {
        let mut rng = ChaChaRandomizer::seed_from_u64(Address::ZERO, 1);
        assert_eq!(rng.next_below(0), Err(RandomnessError::EmptyRange));
        assert_eq!(rng.draws(), 0);
    }

    #[test]
    fn test_scripted_replays_then_exhausts() {
        let mut rng = ScriptedRandomizer::new(Address::ZERO, [3, 99]);

        assert_eq!(rng.next_below(100), Ok(3));
        assert_eq!(rng.remaining(), 1);
        assert_eq!(rng.next_below(100), Ok(99));
        assert_eq!(rng.next_below(100), Err(RandomnessError::Exhausted));
    }

    #[test]
    fn test_scripted_out_of_range() {
        let mut rng = ScriptedRandomizer::new(Address::ZERO, [100]);
        assert_eq!(
            rng.next_below(100),
            Err(RandomnessError::OutOfRange { value: 100, bound: 100 })
        );
    }

    #[test]
    fn test_debug_redacts_stream() {
        let rng = ChaChaRandomizer::from_seed(Address::ZERO, [5u8; 32]);
        assert!(format!("{rng:?}").contains("REDACTED"));
    }
}
