//! Blockchair indexer for UTXO chains

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

use super::UtxoIndexer;
use crate::error::{BridgeError, BridgeResult};
use crate::types::UnspentOutput;
use crate::utils::http::join_url;
use crate::utils::HttpClient;

#[derive(Debug, Deserialize)]
struct DashboardResponse {
    data: HashMap<String, AddressDashboard>,
}

#[derive(Debug, Deserialize)]
struct AddressDashboard {
    #[serde(default)]
    utxo: Vec<BlockchairUtxo>,
}

#[derive(Debug, Deserialize)]
struct BlockchairUtxo {
    transaction_hash: String,
    index: u32,
    value: u64,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    data: ChainStats,
}

#[derive(Debug, Deserialize)]
struct ChainStats {
    suggested_transaction_fee_per_byte_sat: u64,
}

pub struct BlockchairIndexer {
    http: HttpClient,
    base_url: String,
    slug: String,
}

impl BlockchairIndexer {
    pub fn new(http: HttpClient, base_url: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            slug: slug.into(),
        }
    }
}

#[async_trait]
impl UtxoIndexer for BlockchairIndexer {
    async fn unspent_outputs(&self, address: &str) -> BridgeResult<Vec<UnspentOutput>> {
        let url = join_url(
            &self.base_url,
            &format!("{}/dashboards/address/{}?state=latest", self.slug, address),
        );
        let response: DashboardResponse = self.http.get_json(&url).await?;
        Ok(unspent_from_dashboard(response, address))
    }

    async fn suggested_byte_fee(&self) -> BridgeResult<u64> {
        let url = join_url(&self.base_url, &format!("{}/stats", self.slug));
        let response: StatsResponse = self.http.get_json(&url).await?;
        if response.data.suggested_transaction_fee_per_byte_sat == 0 {
            return Err(BridgeError::transient_network("Indexer suggested a zero byte fee"));
        }
        Ok(response.data.suggested_transaction_fee_per_byte_sat)
    }
}

fn unspent_from_dashboard(mut response: DashboardResponse, address: &str) -> Vec<UnspentOutput> {
    // Blockchair keys the dashboard by the address as given, sometimes lowercased
    let dashboard = response
        .data
        .remove(address)
        .or_else(|| response.data.remove(&address.to_lowercase()));

    dashboard
        .map(|d| {
            d.utxo
                .into_iter()
                .map(|u| UnspentOutput {
                    txid: u.transaction_hash,
                    vout: u.index,
                    value: u.value,
                })
                .collect()
        })
        .unwrap_or_default()
}
