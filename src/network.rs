use serde::{Deserialize, Serialize};

/// Chain parameters that select version bytes and the Bech32 prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Network {
    #[default]
    Bitcoin,
    Testnet,
}

impl Network {
    /// Base58Check version byte for public-key-hash addresses
    pub fn p2pkh_version(self) -> u8 {
        match self {
            Self::Bitcoin => 0x00,
            Self::Testnet => 0x6f,
        }
    }

    /// Base58Check version byte for script-hash addresses
    pub fn p2sh_version(self) -> u8 {
        match self {
            Self::Bitcoin => 0x05,
            Self::Testnet => 0xc4,
        }
    }

    /// WIF version byte
    pub fn wif_version(self) -> u8 {
        match self {
            Self::Bitcoin => 0x80,
            Self::Testnet => 0xef,
        }
    }

    /// Human-readable part of segwit addresses
    pub fn bech32_hrp(self) -> &'static str {
        match self {
            Self::Bitcoin => "bc",
            Self::Testnet => "tb",
        }
    }

    pub fn from_wif_version(version: u8) -> Option<Self> {
        match version {
            0x80 => Some(Self::Bitcoin),
            0xef => Some(Self::Testnet),
            _ => None,
        }
    }
}
