//! Injectable entropy for index assignment
//!
//! Index draws must not be predictable by a single party: an oracle that
//! could anticipate its own indices, or a requester that could anticipate a
//! request's target index, could stack the majority vote. The default source
//! mixes an OS-random per-instance seed with the caller-supplied material and
//! a monotonic draw counter.

use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Source of oracle index draws
pub trait IndexSource: Send + Sync {
    /// Draw an index in [0, bound) from the given domain material
    fn draw(&self, material: &[u8], bound: u8) -> u8;
}

/// Default hash-based source
pub struct HashIndexSource {
    seed: [u8; 32],
    counter: AtomicU64,
}

impl HashIndexSource {
    /// Create a source with an OS-random seed
    pub fn new() -> Self {
        use rand::Rng;

        let mut seed = [0u8; 32];
        rand::thread_rng().fill(&mut seed[..]);
        Self::from_seed(seed)
    }

    /// Create a source with a fixed seed (reproducible draws)
    pub fn from_seed(seed: [u8; 32]) -> Self {
        Self {
            seed,
            counter: AtomicU64::new(0),
        }
    }
}

impl Default for HashIndexSource {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexSource for HashIndexSource {
    fn draw(&self, material: &[u8], bound: u8) -> u8 {
        let nonce = self.counter.fetch_add(1, Ordering::Relaxed);

        let mut hasher = Sha256::new();
        hasher.update(self.seed);
        hasher.update(nonce.to_be_bytes());
        hasher.update(material);
        let digest = hasher.finalize();

        let mut word = [0u8; 8];
        word.copy_from_slice(&digest[..8]);
        (u64::from_be_bytes(word) % u64::from(bound)) as u8
    }
}

/// Deterministic source cycling through a fixed sequence (test harnesses)
pub struct SequenceIndexSource {
    values: Vec<u8>,
    cursor: AtomicUsize,
}

impl SequenceIndexSource {
    /// Create a source that cycles through `values`
    pub fn new(values: Vec<u8>) -> Self {
        Self {
            values,
            cursor: AtomicUsize::new(0),
        }
    }
}

impl IndexSource for SequenceIndexSource {
    fn draw(&self, _material: &[u8], bound: u8) -> u8 {
        let at = self.cursor.fetch_add(1, Ordering::Relaxed);
        self.values[at % self.values.len()] % bound
    }
}
