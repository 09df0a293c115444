//! Transfer nonce
//!
//! A collision-avoidance tag so the bridge does not treat two identical
//! transfers in one block as duplicates. Not a chain sequence number.

use rand::Rng;

pub trait NonceProvider: Send + Sync {
    fn next_nonce(&self) -> u32;
}

/// Uniform random nonce in `0..bound`
#[derive(Debug, Clone, Copy)]
pub struct RandomNonce {
    bound: u32,
}

impl RandomNonce {
    /// Same range the bridge SDKs have always drawn from
    pub const DEFAULT_BOUND: u32 = 100_000;

    pub fn new(bound: u32) -> Self {
        Self {
            bound: bound.max(1),
        }
    }
}

impl Default for RandomNonce {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BOUND)
    }
}

impl NonceProvider for RandomNonce {
    fn next_nonce(&self) -> u32 {
        rand::thread_rng().gen_range(0..self.bound)
    }
}

/// Constant nonce for reproducible compositions
#[derive(Debug, Clone, Copy)]
pub struct FixedNonce(pub u32);

impl NonceProvider for FixedNonce {
    fn next_nonce(&self) -> u32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_nonce_in_range() {
        let provider = RandomNonce::new(10);
        for _ in 0..1000 {
            assert!(provider.next_nonce() < 10);
        }
    }

    #[test]
    fn test_zero_bound_clamped() {
        assert_eq!(RandomNonce::new(0).next_nonce(), 0);
    }

    #[test]
    fn test_fixed_nonce() {
        let provider = FixedNonce(42);
        assert_eq!(provider.next_nonce(), 42);
        assert_eq!(provider.next_nonce(), 42);
    }
}
