use crate::address::{AddressFormat, AddressRecord};
use crate::store::BalanceLookupResult;
use serde::{Deserialize, Serialize};

/// Message sent to the client for every derived address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum ScanEvent {
    /// Address present in the store
    Found(AddressReport),
    /// Address not present (or store unavailable)
    Generated(AddressReport),
    /// The scan loop ended on a fatal error
    Error(ErrorReport),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressReport {
    pub address: String,
    pub wif_key: String,
    pub format: AddressFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<i64>,
    pub total_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub message: String,
}

impl ScanEvent {
    pub fn from_lookup(record: AddressRecord, lookup: BalanceLookupResult, total_count: u64) -> Self {
        let report = AddressReport {
            address: record.address,
            wif_key: record.wif,
            format: record.format,
            balance: lookup.balance,
            total_count,
        };
        if report.balance.is_some() {
            Self::Found(report)
        } else {
            Self::Generated(report)
        }
    }

    pub fn error<S: Into<String>>(message: S) -> Self {
        Self::Error(ErrorReport {
            message: message.into(),
        })
    }

    /// Report payload for address events.
    pub fn report(&self) -> Option<&AddressReport> {
        match self {
            Self::Found(report) | Self::Generated(report) => Some(report),
            Self::Error(_) => None,
        }
    }

    pub fn total_count(&self) -> Option<u64> {
        self.report().map(|r| r.total_count)
    }
}
