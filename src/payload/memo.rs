//! Memo classification for opaque intent data

use tracing::warn;

use crate::providers::SelectorLookup;
use crate::signing::abi::selector_of;
use crate::types::Memo;

/// Classify EVM call data.
///
/// Bytes starting with a known contract-call selector stay raw. Otherwise a
/// valid UTF-8 string becomes a text memo and anything else stays raw. A
/// failed selector lookup counts as "unknown selector".
pub async fn classify(data: &[u8], selectors: &dyn SelectorLookup) -> Memo {
    if let Some(selector) = selector_of(data) {
        match selectors.is_known_selector(selector).await {
            Ok(true) => return Memo::Raw(data.to_vec()),
            Ok(false) => {}
            Err(e) => warn!(selector = %hex::encode(selector), error = %e, "selector lookup failed"),
        }
    }
    decode_text(data)
}

/// UTF-8 text when possible, raw bytes otherwise
pub fn decode_text(data: &[u8]) -> Memo {
    match std::str::from_utf8(data) {
        Ok(text) => Memo::Text(text.to_string()),
        Err(_) => Memo::Raw(data.to_vec()),
    }
}

/// Optional data to optional memo; empty data carries no memo
pub fn from_optional(data: Option<&[u8]>) -> Option<Memo> {
    data.filter(|d| !d.is_empty()).map(decode_text)
}
