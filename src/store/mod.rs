//! Read-only address/balance store.
//!
//! The store is populated by an external process. Scan sessions only ever
//! issue point lookups, and a store that is missing, failing or slow reads
//! as empty.

pub mod memory;
pub mod sql;

pub use memory::MemoryLookupStore;
pub use sql::{connect_store_in_background, SqlLookupStore};

use crate::error::AppResult;
use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// A failing backend is reported at warn level once per this many
/// consecutive failures; the rest go to debug.
const FAILURE_WARN_INTERVAL: u64 = 1000;

/// Outcome of one lookup. `balance` is `None` when the address is absent,
/// which differs from a stored balance of zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceLookupResult {
    pub address: String,
    pub balance: Option<i64>,
}

impl BalanceLookupResult {
    pub fn not_found(address: &str) -> Self {
        Self {
            address: address.to_string(),
            balance: None,
        }
    }

    pub fn is_found(&self) -> bool {
        self.balance.is_some()
    }
}

/// Point lookup by exact address string.
#[async_trait]
pub trait LookupStore: Send + Sync {
    /// Balance stored for `address`, `Ok(None)` when absent.
    async fn balance(&self, address: &str) -> AppResult<Option<i64>>;
}

/// Handle shared by every session.
///
/// Holds no backend until one is attached; lookups time out after
/// `lookup_timeout` and any failure degrades to "not found".
pub struct SharedLookupStore {
    backend: RwLock<Option<Arc<dyn LookupStore>>>,
    lookup_timeout: Duration,
    failures: AtomicU64,
}

impl SharedLookupStore {
    pub fn new(lookup_timeout: Duration) -> Self {
        Self {
            backend: RwLock::new(None),
            lookup_timeout,
            failures: AtomicU64::new(0),
        }
    }

    /// Handle with a backend already attached.
    pub fn with_backend(backend: Arc<dyn LookupStore>, lookup_timeout: Duration) -> Self {
        Self {
            backend: RwLock::new(Some(backend)),
            lookup_timeout,
            failures: AtomicU64::new(0),
        }
    }

    /// Attach (or replace) the backend.
    pub async fn attach(&self, backend: Arc<dyn LookupStore>) {
        *self.backend.write().await = Some(backend);
    }

    pub async fn is_available(&self) -> bool {
        self.backend.read().await.is_some()
    }

    /// Failed or timed-out lookups since the last successful one.
    pub fn consecutive_failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Look up an address, treating unavailability as "not found".
    pub async fn lookup(&self, address: &str) -> BalanceLookupResult {
        let backend = match self.backend.read().await.as_ref() {
            Some(backend) => backend.clone(),
            None => return BalanceLookupResult::not_found(address),
        };

        match tokio::time::timeout(self.lookup_timeout, backend.balance(address)).await {
            Ok(Ok(balance)) => {
                let failed = self.failures.swap(0, Ordering::Relaxed);
                if failed > 0 {
                    info!("Lookups recovered after {} failures", failed);
                }
                BalanceLookupResult {
                    address: address.to_string(),
                    balance,
                }
            }
            Ok(Err(e)) => {
                self.record_failure(format_args!("Lookup failed for {}: {}", address, e));
                BalanceLookupResult::not_found(address)
            }
            Err(_) => {
                self.record_failure(format_args!(
                    "Lookup for {} exceeded {}ms, treating as not found",
                    address,
                    self.lookup_timeout.as_millis()
                ));
                BalanceLookupResult::not_found(address)
            }
        }
    }

    fn record_failure(&self, message: std::fmt::Arguments<'_>) {
        let previous = self.failures.fetch_add(1, Ordering::Relaxed);
        if previous % FAILURE_WARN_INTERVAL == 0 {
            warn!("{} ({} consecutive failures)", message, previous + 1);
        } else {
            debug!("{}", message);
        }
    }
}

impl std::fmt::Debug for SharedLookupStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedLookupStore")
            .field("lookup_timeout", &self.lookup_timeout)
            .finish_non_exhaustive()
    }
}
