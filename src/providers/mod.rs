//! Chain RPC and indexer collaborators
//!
//! Payload builders only see these traits. The HTTP implementations map
//! every failure to `ErrorCode::TransientNetwork`.

pub mod blockchair;
pub mod cosmos_rest;
pub mod evm_rpc;
pub mod selector;
pub mod thornode;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, BridgeResult};
use crate::types::UnspentOutput;

pub use blockchair::BlockchairIndexer;
pub use cosmos_rest::{CosmosRestClient, TendermintStatusClient};
pub use evm_rpc::{EvmJsonRpc, UnconfiguredEvmRpc};
pub use selector::FourByteSelectorLookup;
pub use thornode::ThornodeFeeRate;

/// Fee market snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeData {
    pub gas_price: u128,
    /// Absent when the node does not expose `eth_maxPriorityFeePerGas`
    pub priority_fee: Option<u128>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub account_number: u64,
    pub sequence: u64,
}

#[async_trait]
pub trait EvmRpc: Send + Sync {
    /// Pending transaction count of `address`
    async fn transaction_count(&self, address: &str) -> BridgeResult<u64>;
    async fn fee_data(&self) -> BridgeResult<FeeData>;
}

#[async_trait]
pub trait SelectorLookup: Send + Sync {
    async fn is_known_selector(&self, selector: [u8; 4]) -> BridgeResult<bool>;
}

#[async_trait]
pub trait UtxoIndexer: Send + Sync {
    async fn unspent_outputs(&self, address: &str) -> BridgeResult<Vec<UnspentOutput>>;
    /// Suggested fee in satoshis per byte
    async fn suggested_byte_fee(&self) -> BridgeResult<u64>;
}

#[async_trait]
pub trait CosmosAccounts: Send + Sync {
    async fn account(&self, address: &str) -> BridgeResult<AccountInfo>;
}

#[async_trait]
pub trait ThorchainFeeRate: Send + Sync {
    /// Native network fee in base units
    async fn native_fee(&self) -> BridgeResult<u64>;
}

#[async_trait]
pub trait ChainIdLookup: Send + Sync {
    async fn current_chain_id(&self) -> BridgeResult<String>;
}

/// Parse `"0x…"` quantities returned by JSON-RPC
pub fn parse_hex_quantity(raw: &str) -> BridgeResult<u128> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    if digits.is_empty() {
        return Ok(0);
    }
    u128::from_str_radix(digits, 16)
        .map_err(|_| BridgeError::transient_network("Malformed hex quantity").with_details(raw.to_string()))
}

/// Parse decimal strings used by Cosmos-family REST APIs
pub fn parse_decimal_u64(raw: &str, field: &str) -> BridgeResult<u64> {
    raw.trim()
        .parse()
        .map_err(|_| BridgeError::transient_network(format!("Malformed {}", field)).with_details(raw.to_string()))
}
