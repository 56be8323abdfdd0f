//! Cosmos SDK REST and Tendermint RPC clients

use async_trait::async_trait;
use serde::Deserialize;

use super::{parse_decimal_u64, AccountInfo, ChainIdLookup, CosmosAccounts};
use crate::error::{BridgeError, BridgeResult};
use crate::utils::http::join_url;
use crate::utils::HttpClient;

#[derive(Debug, Deserialize)]
struct AccountResponse {
    account: RawAccount,
}

/// Plain accounts carry the fields inline, vesting accounts nest them
#[derive(Debug, Deserialize)]
struct RawAccount {
    account_number: Option<String>,
    sequence: Option<String>,
    base_account: Option<Box<RawAccount>>,
    base_vesting_account: Option<Box<RawAccount>>,
}

impl RawAccount {
    fn resolve(&self) -> Option<(&str, &str)> {
        if let Some(number) = self.account_number.as_deref() {
            return Some((number, self.sequence.as_deref().unwrap_or("0")));
        }
        self.base_account
            .as_deref()
            .and_then(RawAccount::resolve)
            .or_else(|| self.base_vesting_account.as_deref().and_then(RawAccount::resolve))
    }
}

pub struct CosmosRestClient {
    http: HttpClient,
    base_url: String,
}

impl CosmosRestClient {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl CosmosAccounts for CosmosRestClient {
    async fn account(&self, address: &str) -> BridgeResult<AccountInfo> {
        let url = join_url(&self.base_url, &format!("cosmos/auth/v1beta1/accounts/{}", address));
        let response: AccountResponse = self.http.get_json(&url).await?;
        account_info(&response.account)
    }
}

fn account_info(account: &RawAccount) -> BridgeResult<AccountInfo> {
    let (number, sequence) = account
        .resolve()
        .ok_or_else(|| BridgeError::transient_network("Account response has no account_number"))?;
    Ok(AccountInfo {
        account_number: parse_decimal_u64(number, "account_number")?,
        sequence: parse_decimal_u64(sequence, "sequence")?,
    })
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    result: StatusResult,
}

#[derive(Debug, Deserialize)]
struct StatusResult {
    node_info: NodeInfo,
}

#[derive(Debug, Deserialize)]
struct NodeInfo {
    network: String,
}

/// Reads the live chain id from a Tendermint `/status` endpoint
pub struct TendermintStatusClient {
    http: HttpClient,
    rpc_url: String,
}

impl TendermintStatusClient {
    pub fn new(http: HttpClient, rpc_url: impl Into<String>) -> Self {
        Self {
            http,
            rpc_url: rpc_url.into(),
        }
    }
}

#[async_trait]
impl ChainIdLookup for TendermintStatusClient {
    async fn current_chain_id(&self) -> BridgeResult<String> {
        let response: StatusResponse = self.http.get_json(&join_url(&self.rpc_url, "status")).await?;
        Ok(response.result.node_info.network)
    }
}
