//! Shareholder registry: the pre-loaded register of holders eligible for
//! the rights issue. Records arrive through the registrar's batch import
//! and are read-only to the submission workflow.

pub mod import;

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::submissions::StoreError;

/// One registrar-imported holder. `holdings_after` is the registrar's own
/// post-rights figure; it is not recomputed when a holder later renounces
/// part of their entitlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shareholder {
    pub id: i64,
    pub reg_account_number: String,
    pub chn: Option<String>,
    pub name: String,
    pub holdings: i64,
    pub rights_issue: i64,
    pub holdings_after: i64,
}

/// Lookup contract used to validate that a submission corresponds to a
/// known holder and to denormalize holdings onto the submission row.
#[async_trait]
pub trait ShareholderDirectory: Send + Sync {
    async fn find_by_reg_account(&self, reg: &str) -> Result<Option<Shareholder>, StoreError>;

    async fn find_by_chn(&self, chn: &str) -> Result<Option<Shareholder>, StoreError>;

    async fn count(&self) -> Result<u64, StoreError>;
}

/// In-memory directory for tests and databaseless development runs.
#[derive(Default, Clone)]
pub struct InMemoryShareholderDirectory {
    holders: Arc<Mutex<Vec<Shareholder>>>,
}

impl InMemoryShareholderDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the register with a batch of imported records, assigning ids
    /// in import order.
    pub fn load(&self, records: Vec<import::ShareholderRecord>) {
        let mut holders = self.holders.lock().expect("registry mutex poisoned");
        holders.clear();
        holders.extend(records.into_iter().enumerate().map(|(index, record)| {
            record.into_shareholder(index as i64 + 1)
        }));
    }
}

#[async_trait]
impl ShareholderDirectory for InMemoryShareholderDirectory {
    async fn find_by_reg_account(&self, reg: &str) -> Result<Option<Shareholder>, StoreError> {
        let holders = self.holders.lock().expect("registry mutex poisoned");
        Ok(holders
            .iter()
            .find(|holder| holder.reg_account_number == reg)
            .cloned())
    }

    async fn find_by_chn(&self, chn: &str) -> Result<Option<Shareholder>, StoreError> {
        let holders = self.holders.lock().expect("registry mutex poisoned");
        Ok(holders
            .iter()
            .find(|holder| holder.chn.as_deref() == Some(chn))
            .cloned())
    }

    async fn count(&self) -> Result<u64, StoreError> {
        let holders = self.holders.lock().expect("registry mutex poisoned");
        Ok(holders.len() as u64)
    }
}
