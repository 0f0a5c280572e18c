//! Multi-format address derivation.
//!
//! Every enabled format is derived from one private key:
//! - P2PKH: Legacy addresses from the compressed and uncompressed public key
//! - P2WPKH: Native SegWit Bech32 (bc1q...)
//! - P2SH: script hash of the P2PKH script for the compressed key (3...)
//! - P2WSH: witness script hash of a 2-of-2 multisig repeating the compressed key

pub mod encoding;

use crate::error::AppResult;
use crate::keys::{encode_wif, KeyPair};
use crate::network::Network;
use encoding::{base58check, duplicate_key_multisig_script, hash160, p2pkh_script, segwit_v0, sha256};
use serde::{Deserialize, Serialize};

/// Supported address encodings, declared in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressFormat {
    P2pkhCompressed,
    P2pkhUncompressed,
    P2wpkh,
    P2sh,
    P2wsh,
}

impl AddressFormat {
    pub const ALL: [AddressFormat; 5] = [
        Self::P2pkhCompressed,
        Self::P2pkhUncompressed,
        Self::P2wpkh,
        Self::P2sh,
        Self::P2wsh,
    ];

    /// Whether the format is built from the compressed public key.
    pub fn uses_compressed_key(self) -> bool {
        !matches!(self, Self::P2pkhUncompressed)
    }
}

/// One derived address with the WIF of the key that controls it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressRecord {
    pub format: AddressFormat,
    pub address: String,
    pub wif: String,
}

/// Derives the enabled address formats for a key.
#[derive(Debug, Clone)]
pub struct AddressDeriver {
    network: Network,
    formats: Vec<AddressFormat>,
}

impl AddressDeriver {
    /// Formats are reordered into emission order and deduplicated.
    pub fn new(network: Network, enabled: &[AddressFormat]) -> Self {
        let mut formats = enabled.to_vec();
        formats.sort();
        formats.dedup();
        Self { network, formats }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    pub fn formats(&self) -> &[AddressFormat] {
        &self.formats
    }

    /// Records for the enabled formats that match the key's compression flag.
    pub fn derive(&self, key: &KeyPair) -> AppResult<Vec<AddressRecord>> {
        self.derive_formats(
            key,
            self.formats
                .iter()
                .copied()
                .filter(|format| format.uses_compressed_key() == key.is_compressed()),
        )
    }

    /// Records for every enabled format, using both views of the key.
    pub fn derive_all(&self, key: &KeyPair) -> AppResult<Vec<AddressRecord>> {
        self.derive_formats(key, self.formats.iter().copied())
    }

    /// Derive a single format; the key view is chosen by the format.
    pub fn derive_format(&self, key: &KeyPair, format: AddressFormat) -> AppResult<AddressRecord> {
        let view = key.with_compression(format.uses_compressed_key());
        Ok(AddressRecord {
            format,
            address: self.encode_address(format, &view.public_key_bytes())?,
            wif: encode_wif(&view, self.network),
        })
    }

    /// Public key and WIF are computed once per key view.
    fn derive_formats(
        &self,
        key: &KeyPair,
        formats: impl Iterator<Item = AddressFormat>,
    ) -> AppResult<Vec<AddressRecord>> {
        let mut views: [Option<(Vec<u8>, String)>; 2] = [None, None];
        formats
            .map(|format| {
                let compressed = format.uses_compressed_key();
                let (pubkey, wif) = views[compressed as usize].get_or_insert_with(|| {
                    let view = key.with_compression(compressed);
                    (view.public_key_bytes(), encode_wif(&view, self.network))
                });
                Ok(AddressRecord {
                    format,
                    address: self.encode_address(format, pubkey)?,
                    wif: wif.clone(),
                })
            })
            .collect()
    }

    fn encode_address(&self, format: AddressFormat, pubkey: &[u8]) -> AppResult<String> {
        let address = match format {
            AddressFormat::P2pkhCompressed | AddressFormat::P2pkhUncompressed => {
                base58check(self.network.p2pkh_version(), &hash160(pubkey))
            }
            AddressFormat::P2wpkh => segwit_v0(self.network.bech32_hrp(), &hash160(pubkey))?,
            AddressFormat::P2sh => {
                let redeem = p2pkh_script(&hash160(pubkey));
                base58check(self.network.p2sh_version(), &hash160(&redeem))
            }
            AddressFormat::P2wsh => {
                let witness = duplicate_key_multisig_script(pubkey);
                segwit_v0(self.network.bech32_hrp(), &sha256(&witness))?
            }
        };
        Ok(address)
    }
}

impl Default for AddressDeriver {
    fn default() -> Self {
        Self::new(Network::Bitcoin, &AddressFormat::ALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{decode_wif, KeyGenerator, KeySource};

    fn key_one() -> KeyPair {
        let mut bytes = [0u8; 32];
        bytes[31] = 1;
        KeyPair::from_bytes(&bytes, true).unwrap()
    }

    fn find(records: &[AddressRecord], format: AddressFormat) -> &AddressRecord {
        records.iter().find(|r| r.format == format).unwrap()
    }

    #[test]
    fn test_known_addresses_for_key_one() {
        let records = AddressDeriver::default().derive_all(&key_one()).unwrap();

        let compressed = find(&records, AddressFormat::P2pkhCompressed);
        assert_eq!(compressed.address, "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH");
        assert_eq!(
            compressed.wif,
            "KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWn"
        );

        let uncompressed = find(&records, AddressFormat::P2pkhUncompressed);
        assert_eq!(uncompressed.address, "1EHNa6Q4Jz2uvNExL497mE43ikXhwF6kZm");
        assert_eq!(
            uncompressed.wif,
            "5HpHagT65TZzG1PH3CSu63k8DbpvD8s5ip4nEB3kEsreAnchuDf"
        );

        let bech32 = find(&records, AddressFormat::P2wpkh);
        assert_eq!(bech32.address, "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4");
        assert_eq!(bech32.wif, compressed.wif);
    }

    #[test]
    fn test_script_formats_shape() {
        let key = key_one();
        let records = AddressDeriver::default().derive_all(&key).unwrap();

        let p2sh = find(&records, AddressFormat::P2sh);
        assert_eq!(p2sh.address, "3LRW7jeCvQCRdPF8S3yUCfRAx4eqXFmdcr");
        let decoded = bs58::decode(&p2sh.address).with_check(Some(0x05)).into_vec().unwrap();
        let redeem = p2pkh_script(&hash160(&key.public_key_bytes()));
        assert_eq!(&decoded[1..], &hash160(&redeem));

        let p2wsh = find(&records, AddressFormat::P2wsh);
        assert_eq!(
            p2wsh.address,
            "bc1q6u2vmx3gr9a85ewve4m6yzfcr98acpv3qyz5txhx49c4jxxxcsyqy9crte"
        );
        // 32-byte programs give 62-character mainnet addresses
        assert_eq!(p2wsh.address.len(), 62);
        assert_eq!(p2wsh.wif, p2sh.wif);
    }

    #[test]
    fn test_emission_order_follows_format_order() {
        let deriver = AddressDeriver::new(
            Network::Bitcoin,
            &[
                AddressFormat::P2wsh,
                AddressFormat::P2pkhUncompressed,
                AddressFormat::P2pkhCompressed,
                AddressFormat::P2wsh,
            ],
        );
        assert_eq!(
            deriver.formats(),
            &[
                AddressFormat::P2pkhCompressed,
                AddressFormat::P2pkhUncompressed,
                AddressFormat::P2wsh,
            ]
        );
        let formats: Vec<_> = deriver
            .derive_all(&key_one())
            .unwrap()
            .into_iter()
            .map(|r| r.format)
            .collect();
        assert_eq!(
            formats,
            vec![
                AddressFormat::P2pkhCompressed,
                AddressFormat::P2pkhUncompressed,
                AddressFormat::P2wsh,
            ]
        );
    }

    #[test]
    fn test_derive_splits_by_compression() {
        let deriver = AddressDeriver::default();
        let key = key_one();

        let compressed = deriver.derive(&key).unwrap();
        assert_eq!(compressed.len(), 4);
        assert!(compressed.iter().all(|r| r.format.uses_compressed_key()));

        let uncompressed = deriver.derive(&key.with_compression(false)).unwrap();
        assert_eq!(uncompressed.len(), 1);
        assert_eq!(uncompressed[0].format, AddressFormat::P2pkhUncompressed);
    }

    #[test]
    fn test_testnet_prefixes() {
        let deriver = AddressDeriver::new(Network::Testnet, &AddressFormat::ALL);
        let records = deriver.derive_all(&key_one()).unwrap();
        assert!(find(&records, AddressFormat::P2pkhCompressed).address.starts_with(['m', 'n']));
        assert!(find(&records, AddressFormat::P2sh).address.starts_with('2'));
        assert!(find(&records, AddressFormat::P2wpkh).address.starts_with("tb1q"));
    }

    #[test]
    fn test_wif_round_trip_reproduces_address() {
        let deriver = AddressDeriver::default();
        let key = KeyGenerator::new().generate().unwrap();

        for record in deriver.derive_all(&key).unwrap() {
            let decoded = decode_wif(&record.wif).unwrap();
            assert_eq!(decoded.key.is_compressed(), record.format.uses_compressed_key());
            let again = deriver.derive_format(&decoded.key, record.format).unwrap();
            assert_eq!(again, record);
        }
    }
}
