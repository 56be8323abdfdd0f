//! Persistent store seam
//!
//! Flat key/value records per domain object. Last writer wins; the bridge
//! serves a single local operator.

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::error::BridgeResult;
use crate::types::VaultIdentity;

// =============================================================================
// Records
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Default,
    Pending,
    Success,
    Error,
}

/// A transaction as seen by the dApp that requested it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub id: String,
    pub chain: String,
    pub from: String,
    pub to: Option<String>,
    pub amount: Option<u128>,
    pub status: RecordStatus,
    pub session_id: Option<String>,
    pub tx_hash: Option<String>,
    pub error: Option<String>,
    /// Unix seconds of the last status change
    pub updated_at: i64,
}

impl TransactionRecord {
    pub fn new(id: impl Into<String>, chain: impl Into<String>, from: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            chain: chain.into(),
            from: from.into(),
            to: None,
            amount: None,
            status: RecordStatus::Default,
            session_id: None,
            tx_hash: None,
            error: None,
            updated_at: Utc::now().timestamp(),
        }
    }

    pub fn set_status(&mut self, status: RecordStatus) {
        self.status = status;
        self.updated_at = Utc::now().timestamp();
    }
}

/// The request currently awaiting operator consent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveRequest {
    pub transaction_id: String,
    pub chain: String,
    pub session_id: Option<String>,
    pub created_at: i64,
}

// =============================================================================
// Store
// =============================================================================

#[async_trait]
pub trait Store: Send + Sync {
    async fn get_vault(&self, public_key_ecdsa: &str) -> BridgeResult<Option<VaultIdentity>>;
    async fn put_vault(&self, vault: VaultIdentity) -> BridgeResult<()>;
    async fn get_transaction(&self, id: &str) -> BridgeResult<Option<TransactionRecord>>;
    async fn put_transaction(&self, record: TransactionRecord) -> BridgeResult<()>;
    async fn get_active_request(&self) -> BridgeResult<Option<ActiveRequest>>;
    async fn put_active_request(&self, request: Option<ActiveRequest>) -> BridgeResult<()>;
}

#[derive(Default)]
struct Tables {
    vaults: HashMap<String, VaultIdentity>,
    transactions: HashMap<String, TransactionRecord>,
    active_request: Option<ActiveRequest>,
}

/// In-process store
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn transactions(&self) -> Vec<TransactionRecord> {
        self.tables.read().await.transactions.values().cloned().collect()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_vault(&self, public_key_ecdsa: &str) -> BridgeResult<Option<VaultIdentity>> {
        Ok(self.tables.read().await.vaults.get(public_key_ecdsa).cloned())
    }

    async fn put_vault(&self, vault: VaultIdentity) -> BridgeResult<()> {
        self.tables
            .write()
            .await
            .vaults
            .insert(vault.public_key_ecdsa.clone(), vault);
        Ok(())
    }

    async fn get_transaction(&self, id: &str) -> BridgeResult<Option<TransactionRecord>> {
        Ok(self.tables.read().await.transactions.get(id).cloned())
    }

    async fn put_transaction(&self, record: TransactionRecord) -> BridgeResult<()> {
        self.tables
            .write()
            .await
            .transactions
            .insert(record.id.clone(), record);
        Ok(())
    }

    async fn get_active_request(&self) -> BridgeResult<Option<ActiveRequest>> {
        Ok(self.tables.read().await.active_request.clone())
    }

    async fn put_active_request(&self, request: Option<ActiveRequest>) -> BridgeResult<()> {
        self.tables.write().await.active_request = request;
        Ok(())
    }
}
