//! Contract-call selector lookup
//!
//! Well-known selectors resolve locally; anything else is checked against
//! the 4byte signature directory.

use async_trait::async_trait;
use serde::Deserialize;

use super::SelectorLookup;
use crate::error::BridgeResult;
use crate::signing::abi::KnownSelectors;
use crate::utils::http::join_url;
use crate::utils::HttpClient;

#[derive(Debug, Deserialize)]
struct SignatureListing {
    count: u64,
}

pub struct FourByteSelectorLookup {
    http: HttpClient,
    base_url: String,
}

impl FourByteSelectorLookup {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl SelectorLookup for FourByteSelectorLookup {
    async fn is_known_selector(&self, selector: [u8; 4]) -> BridgeResult<bool> {
        if KnownSelectors::contains(&selector) {
            return Ok(true);
        }
        let url = join_url(
            &self.base_url,
            &format!("api/v1/signatures/?hex_signature=0x{}", hex::encode(selector)),
        );
        let listing: SignatureListing = self.http.get_json(&url).await?;
        Ok(listing.count > 0)
    }
}

/// Offline lookup against the built-in selector list only
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticSelectorLookup;

#[async_trait]
impl SelectorLookup for StaticSelectorLookup {
    async fn is_known_selector(&self, selector: [u8; 4]) -> BridgeResult<bool> {
        Ok(KnownSelectors::contains(&selector))
    }
}
