//! Hashes, scripts and text encodings shared by the address formats.

use crate::error::{AppError, AppResult};
use bech32::{ToBase32, Variant};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

const OP_2: u8 = 0x52;
const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xac;
const OP_CHECKMULTISIG: u8 = 0xae;

const WITNESS_VERSION_0: u8 = 0;

/// HASH160 = RIPEMD160(SHA256(data))
#[inline]
pub fn hash160(data: &[u8]) -> [u8; 20] {
    let sha = Sha256::digest(data);
    Ripemd160::digest(sha).into()
}

#[inline]
pub fn sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// `OP_DUP OP_HASH160 <20> OP_EQUALVERIFY OP_CHECKSIG`
pub fn p2pkh_script(pubkey_hash: &[u8; 20]) -> Vec<u8> {
    let mut script = Vec::with_capacity(25);
    script.extend_from_slice(&[OP_DUP, OP_HASH160, 0x14]);
    script.extend_from_slice(pubkey_hash);
    script.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
    script
}

/// `OP_2 <pk> <pk> OP_2 OP_CHECKMULTISIG`, the same key in both slots.
pub fn duplicate_key_multisig_script(pubkey: &[u8]) -> Vec<u8> {
    let mut script = Vec::with_capacity(3 + 2 * (pubkey.len() + 1));
    script.push(OP_2);
    for _ in 0..2 {
        script.push(pubkey.len() as u8);
        script.extend_from_slice(pubkey);
    }
    script.extend_from_slice(&[OP_2, OP_CHECKMULTISIG]);
    script
}

/// Base58Check(version || payload)
pub fn base58check(version: u8, payload: &[u8]) -> String {
    let mut data = Vec::with_capacity(1 + payload.len());
    data.push(version);
    data.extend_from_slice(payload);
    bs58::encode(data).with_check().into_string()
}

/// Version 0 witness program, Bech32 encoded.
pub fn segwit_v0(hrp: &str, program: &[u8]) -> AppResult<String> {
    let mut data = vec![bech32::u5::try_from_u8(WITNESS_VERSION_0)
        .map_err(|e| AppError::AddressEncoding(e.to_string()))?];
    data.extend(program.to_base32());
    bech32::encode(hrp, data, Variant::Bech32).map_err(|e| AppError::AddressEncoding(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bech32::FromBase32;

    const GENERATOR_PUBKEY: &str =
        "0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798";

    #[test]
    fn test_hash160_of_generator() {
        let pubkey = hex::decode(GENERATOR_PUBKEY).unwrap();
        assert_eq!(
            hex::encode(hash160(&pubkey)),
            "751e76e8199196d454941c45d1b3a323f1433bd6"
        );
    }

    #[test]
    fn test_p2pkh_script_layout() {
        let hash = [0x11u8; 20];
        let script = p2pkh_script(&hash);
        assert_eq!(script.len(), 25);
        assert_eq!(&script[..3], &[0x76, 0xa9, 0x14]);
        assert_eq!(&script[3..23], &hash);
        assert_eq!(&script[23..], &[0x88, 0xac]);
    }

    #[test]
    fn test_multisig_script_layout() {
        let pubkey = hex::decode(GENERATOR_PUBKEY).unwrap();
        let script = duplicate_key_multisig_script(&pubkey);
        assert_eq!(script.len(), 71);
        assert_eq!(script[0], 0x52);
        assert_eq!(script[1], 0x21);
        assert_eq!(&script[2..35], pubkey.as_slice());
        assert_eq!(script[35], 0x21);
        assert_eq!(&script[36..69], pubkey.as_slice());
        assert_eq!(&script[69..], &[0x52, 0xae]);
    }

    #[test]
    fn test_base58check_leading_zero_version() {
        let address = base58check(0x00, &[0u8; 20]);
        assert_eq!(address, "1111111111111111111114oLvT2");
    }

    #[test]
    fn test_segwit_v0_known_vector() {
        let program = hex::decode("751e76e8199196d454941c45d1b3a323f1433bd6").unwrap();
        let address = segwit_v0("bc", &program).unwrap();
        assert_eq!(address, "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4");

        let (hrp, data, variant) = bech32::decode(&address).unwrap();
        assert_eq!(hrp, "bc");
        assert_eq!(variant, Variant::Bech32);
        assert_eq!(data[0].to_u8(), 0);
        assert_eq!(Vec::<u8>::from_base32(&data[1..]).unwrap(), program);
    }
}
