//! The generate → derive → lookup → report pipeline and its per-client sessions.

pub mod command;
pub mod events;
pub mod session;

pub use command::ControlCommand;
pub use events::{AddressReport, ScanEvent};
pub use session::{ScanSession, SessionPhase, SessionState, DEFAULT_STOP_GRACE};

use crate::address::AddressDeriver;
use crate::config::ScanConfig;
use crate::keys::{KeyGenerator, KeySource};
use crate::store::SharedLookupStore;
use std::sync::Arc;

/// Read-only collaborators shared by every session.
pub struct ScanContext {
    pub keys: Arc<dyn KeySource>,
    pub deriver: AddressDeriver,
    pub store: Arc<SharedLookupStore>,
}

impl ScanContext {
    pub fn new(keys: Arc<dyn KeySource>, deriver: AddressDeriver, store: Arc<SharedLookupStore>) -> Self {
        Self {
            keys,
            deriver,
            store,
        }
    }

    /// Context with the OS key generator and the configured formats.
    pub fn from_config(config: &ScanConfig, store: Arc<SharedLookupStore>) -> Self {
        Self::new(
            Arc::new(KeyGenerator::new()),
            AddressDeriver::new(config.network, &config.enabled_formats),
            store,
        )
    }
}

impl std::fmt::Debug for ScanContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanContext")
            .field("deriver", &self.deriver)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}
