//! Random keys and bytes.
//!
//! Encoders never call a random number generator directly; they go through a
//! [`RandomSource`] so tests can inject a seeded sequence.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;
use uuid::Uuid;

/// Lowest fake schema id written by the malformed encoder.
pub const MIN_FAKE_SCHEMA_ID: u8 = 1;
/// Highest fake schema id written by the malformed encoder.
pub const MAX_FAKE_SCHEMA_ID: u8 = 126;

pub trait RandomSource: Send + Sync {
    /// A fresh UUID-v4 in its textual form.
    fn generate_key(&self) -> String;

    /// A byte in `[MIN_FAKE_SCHEMA_ID, MAX_FAKE_SCHEMA_ID]`.
    fn schema_id_byte(&self) -> u8;

    fn coin_flip(&self) -> bool;
}

/// Thread-local OS-seeded randomness.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn generate_key(&self) -> String {
        Uuid::new_v4().to_string()
    }

    fn schema_id_byte(&self) -> u8 {
        rand::rng().random_range(MIN_FAKE_SCHEMA_ID..=MAX_FAKE_SCHEMA_ID)
    }

    fn coin_flip(&self) -> bool {
        rand::rng().random_bool(0.5)
    }
}

/// Deterministic randomness (same seed = same keys and bytes).
#[derive(Debug)]
pub struct SeededRandom {
    rng: Mutex<StdRng>,
}

impl SeededRandom {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut rng)
    }
}

impl RandomSource for SeededRandom {
    fn generate_key(&self) -> String {
        let mut bytes = [0u8; 16];
        self.with_rng(|rng| rng.fill(&mut bytes));
        uuid::Builder::from_random_bytes(bytes)
            .into_uuid()
            .to_string()
    }

    fn schema_id_byte(&self) -> u8 {
        self.with_rng(|rng| rng.random_range(MIN_FAKE_SCHEMA_ID..=MAX_FAKE_SCHEMA_ID))
    }

    fn coin_flip(&self) -> bool {
        self.with_rng(|rng| rng.random_bool(0.5))
    }
}
