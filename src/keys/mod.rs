//! Private key sampling and WIF encoding.

pub mod generator;
pub mod wif;

pub use generator::{KeyGenerator, KeySource};
pub use wif::{decode_wif, encode_wif, DecodedWif};

use crate::error::{AppError, AppResult};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::SecretKey;

/// A secp256k1 private key together with the public key encoding it is used with.
///
/// The compressed and uncompressed views of one key share the scalar; only the
/// serialized public key (33 vs 65 bytes) and the WIF suffix differ.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyPair {
    secret: SecretKey,
    compressed: bool,
}

impl KeyPair {
    pub fn new(secret: SecretKey, compressed: bool) -> Self {
        Self { secret, compressed }
    }

    /// Build a key pair from raw scalar bytes, rejecting zero and values >= n.
    pub fn from_bytes(bytes: &[u8], compressed: bool) -> AppResult<Self> {
        let secret = SecretKey::from_slice(bytes)
            .map_err(|_| AppError::InvalidKey("scalar out of range".to_string()))?;
        Ok(Self::new(secret, compressed))
    }

    /// Same private key, other public key encoding.
    pub fn with_compression(&self, compressed: bool) -> Self {
        Self {
            secret: self.secret.clone(),
            compressed,
        }
    }

    pub fn is_compressed(&self) -> bool {
        self.compressed
    }

    /// Big-endian scalar bytes.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret.to_bytes().into()
    }

    /// SEC1 public key, 33 bytes when compressed, 65 otherwise.
    pub fn public_key_bytes(&self) -> Vec<u8> {
        self.secret
            .public_key()
            .to_encoded_point(self.compressed)
            .as_bytes()
            .to_vec()
    }
}

impl std::fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyPair")
            .field("compressed", &self.compressed)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_one() -> [u8; 32] {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        bytes
    }

    #[test]
    fn test_public_key_encodings() {
        let key = KeyPair::from_bytes(&key_one(), true).unwrap();
        let compressed = key.public_key_bytes();
        assert_eq!(
            hex::encode(&compressed),
            "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
        );

        let uncompressed = key.with_compression(false).public_key_bytes();
        assert_eq!(uncompressed.len(), 65);
        assert_eq!(uncompressed[0], 0x04);
        assert_eq!(&uncompressed[1..33], &compressed[1..]);
    }

    #[test]
    fn test_rejects_out_of_range_scalars() {
        assert!(KeyPair::from_bytes(&[0u8; 32], true).is_err());
        assert!(KeyPair::from_bytes(&[0xff; 32], true).is_err());

        // Curve order n itself is invalid
        let order =
            hex::decode("fffffffffffffffffffffffffffffffebaaedce6af48a03bbfd25e8cd0364141")
                .unwrap();
        assert!(KeyPair::from_bytes(&order, true).is_err());
    }

    #[test]
    fn test_compression_views_share_secret() {
        let key = KeyPair::from_bytes(&key_one(), true).unwrap();
        let other = key.with_compression(false);
        assert_eq!(key.secret_bytes(), other.secret_bytes());
        assert!(key.is_compressed());
        assert!(!other.is_compressed());
        assert_ne!(key, other);
    }

    #[test]
    fn test_debug_hides_secret() {
        let key = KeyPair::from_bytes(&key_one(), true).unwrap();
        let rendered = format!("{:?}", key);
        assert!(!rendered.contains("0000000000000001"));
    }
}
