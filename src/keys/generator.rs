//! Uniform private key sampling from the operating system RNG.

use super::KeyPair;
use crate::error::AppResult;
use k256::SecretKey;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use tracing::trace;
use zeroize::Zeroizing;

/// Source of fresh private keys for the scan loop.
pub trait KeySource: Send + Sync {
    /// Produce a new compressed key pair. Errors are fatal for the caller.
    fn generate(&self) -> AppResult<KeyPair>;
}

/// Keyspace sampler backed by the OS entropy source.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeyGenerator;

impl KeyGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Rejection-sample a scalar in `[1, n)` from `rng`.
    ///
    /// Each attempt draws fresh bytes; an RNG error is returned as-is instead of
    /// falling back to another source.
    pub fn generate_with<R: RngCore + CryptoRng>(rng: &mut R) -> AppResult<KeyPair> {
        let mut bytes = Zeroizing::new([0u8; 32]);
        loop {
            rng.try_fill_bytes(&mut bytes[..])?;
            match SecretKey::from_slice(&bytes[..]) {
                Ok(secret) => return Ok(KeyPair::new(secret, true)),
                // Probability ~2^-128; resample
                Err(_) => trace!("Sampled scalar outside curve order, resampling"),
            }
        }
    }
}

impl KeySource for KeyGenerator {
    fn generate(&self) -> AppResult<KeyPair> {
        Self::generate_with(&mut OsRng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use std::collections::VecDeque;

    /// Replays scripted 32-byte blocks, then fails.
    struct ScriptedRng {
        blocks: VecDeque<[u8; 32]>,
    }

    impl RngCore for ScriptedRng {
        fn next_u32(&mut self) -> u32 {
            unimplemented!()
        }

        fn next_u64(&mut self) -> u64 {
            unimplemented!()
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            self.try_fill_bytes(dest).unwrap()
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            match self.blocks.pop_front() {
                Some(block) => {
                    dest.copy_from_slice(&block);
                    Ok(())
                }
                None => Err(rand::Error::new("entropy exhausted")),
            }
        }
    }

    impl CryptoRng for ScriptedRng {}

    #[test]
    fn test_generates_distinct_keys() {
        let generator = KeyGenerator::new();
        let a = generator.generate().unwrap();
        let b = generator.generate().unwrap();
        assert!(a.is_compressed());
        assert_ne!(a.secret_bytes(), b.secret_bytes());
    }

    #[test]
    fn test_resamples_invalid_scalars() {
        let mut valid = [0u8; 32];
        valid[31] = 7;
        let mut rng = ScriptedRng {
            blocks: VecDeque::from(vec![[0u8; 32], [0xff; 32], valid]),
        };

        let key = KeyGenerator::generate_with(&mut rng).unwrap();
        assert_eq!(key.secret_bytes(), valid);
        assert!(rng.blocks.is_empty());
    }

    #[test]
    fn test_entropy_failure_is_fatal() {
        let mut rng = ScriptedRng {
            blocks: VecDeque::from(vec![[0u8; 32]]),
        };

        let err = KeyGenerator::generate_with(&mut rng).unwrap_err();
        assert!(matches!(err, AppError::Entropy(_)));
    }
}
