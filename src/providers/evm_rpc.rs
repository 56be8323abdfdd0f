//! EVM JSON-RPC client

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use super::{parse_hex_quantity, EvmRpc, FeeData};
use crate::error::{BridgeError, BridgeResult};
use crate::utils::HttpClient;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

pub struct EvmJsonRpc {
    http: HttpClient,
    url: String,
}

impl EvmJsonRpc {
    pub fn new(http: HttpClient, url: impl Into<String>) -> Self {
        Self { http, url: url.into() }
    }

    async fn call(&self, method: &str, params: Value) -> BridgeResult<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        });
        let response: RpcResponse = self.http.post_json(&self.url, &body).await?;

        if let Some(err) = response.error {
            return Err(BridgeError::transient_network(format!("{} failed: {}", method, err.message))
                .with_details(format!("rpc code {}", err.code)));
        }
        response
            .result
            .ok_or_else(|| BridgeError::transient_network(format!("{} returned no result", method)))
    }

    async fn call_quantity(&self, method: &str, params: Value) -> BridgeResult<u128> {
        let value = self.call(method, params).await?;
        let raw = value
            .as_str()
            .ok_or_else(|| BridgeError::transient_network(format!("{} returned a non-string", method)))?;
        parse_hex_quantity(raw)
    }
}

#[async_trait]
impl EvmRpc for EvmJsonRpc {
    async fn transaction_count(&self, address: &str) -> BridgeResult<u64> {
        let count = self
            .call_quantity("eth_getTransactionCount", json!([address, "pending"]))
            .await?;
        u64::try_from(count).map_err(|_| BridgeError::transient_network("Nonce out of range"))
    }

    async fn fee_data(&self) -> BridgeResult<FeeData> {
        let gas_price = self.call_quantity("eth_gasPrice", json!([])).await?;

        // Not every node implements it; absence falls back to the gas price
        let priority_fee = match self.call_quantity("eth_maxPriorityFeePerGas", json!([])).await {
            Ok(fee) => Some(fee),
            Err(e) if e.message.contains("eth_maxPriorityFeePerGas failed") => {
                debug!(error = %e, "priority fee not reported");
                None
            }
            Err(e) => return Err(e),
        };

        Ok(FeeData { gas_price, priority_fee })
    }
}

/// Stand-in for an EVM chain with no RPC configured; every call is a config error
pub struct UnconfiguredEvmRpc {
    chain_id: u64,
}

impl UnconfiguredEvmRpc {
    pub fn new(chain_id: u64) -> Self {
        Self { chain_id }
    }

    fn missing(&self) -> BridgeError {
        BridgeError::config(format!("No rpc endpoint configured for EVM chain {}", self.chain_id))
            .with_details("set chains.\"<chain id>\".rpc or evm_fallback_rpc")
    }
}

#[async_trait]
impl EvmRpc for UnconfiguredEvmRpc {
    async fn transaction_count(&self, _address: &str) -> BridgeResult<u64> {
        Err(self.missing())
    }

    async fn fee_data(&self) -> BridgeResult<FeeData> {
        Err(self.missing())
    }
}
