use super::LookupStore;
use crate::error::AppResult;
use async_trait::async_trait;
use dashmap::DashMap;

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryLookupStore {
    balances: DashMap<String, i64>,
}

impl MemoryLookupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, address: &str, balance: i64) {
        self.balances.insert(address.to_string(), balance);
    }
}

#[async_trait]
impl LookupStore for MemoryLookupStore {
    async fn balance(&self, address: &str) -> AppResult<Option<i64>> {
        Ok(self.balances.get(address).map(|entry| *entry.value()))
    }
}
