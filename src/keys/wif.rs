//! Wallet Import Format: `Base58Check(version || scalar [|| 0x01])`.

use super::KeyPair;
use crate::error::{AppError, AppResult};
use crate::network::Network;
use zeroize::Zeroizing;

/// Suffix byte marking a key used with its compressed public key
const COMPRESSED_FLAG: u8 = 0x01;

/// Result of decoding a WIF string.
#[derive(Debug, Clone)]
pub struct DecodedWif {
    pub network: Network,
    pub key: KeyPair,
}

/// Encode a key as WIF; the compression flag comes from the key pair.
pub fn encode_wif(key: &KeyPair, network: Network) -> String {
    let mut payload = Zeroizing::new(Vec::with_capacity(34));
    payload.push(network.wif_version());
    payload.extend_from_slice(&key.secret_bytes());
    if key.is_compressed() {
        payload.push(COMPRESSED_FLAG);
    }
    bs58::encode(payload.as_slice()).with_check().into_string()
}

/// Decode a WIF string, verifying checksum, version and length.
pub fn decode_wif(wif: &str) -> AppResult<DecodedWif> {
    let data = Zeroizing::new(
        bs58::decode(wif)
            .with_check(None)
            .into_vec()
            .map_err(|e| AppError::invalid_wif(e.to_string()))?,
    );

    let (version, body) = data
        .split_first()
        .ok_or_else(|| AppError::invalid_wif("empty payload"))?;
    let network = Network::from_wif_version(*version)
        .ok_or_else(|| AppError::invalid_wif(format!("unknown version byte 0x{:02x}", version)))?;

    let (scalar, compressed) = match body.len() {
        32 => (body, false),
        33 if body[32] == COMPRESSED_FLAG => (&body[..32], true),
        33 => return Err(AppError::invalid_wif("bad compression flag")),
        n => return Err(AppError::invalid_wif(format!("unexpected payload length {}", n))),
    };

    Ok(DecodedWif {
        network,
        key: KeyPair::from_bytes(scalar, compressed)?,
    })
}
