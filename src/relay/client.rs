//! Remote relay coordination service

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::error::{BridgeError, BridgeResult};
use crate::types::{Signature, SignatureSet};
use crate::utils::http::join_url;
use crate::utils::logging::redact_hash;
use crate::utils::HttpClient;

/// Outcome of a completion poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Completion {
    Ready(SignatureSet),
    NotFound,
}

#[async_trait]
pub trait RelayClient: Send + Sync {
    async fn register_session(&self, session_id: &str, party: &str) -> BridgeResult<()>;
    async fn list_participants(&self, session_id: &str) -> BridgeResult<Vec<String>>;
    /// Lock the participant set
    async fn start_session(&self, session_id: &str, parties: &[String]) -> BridgeResult<()>;
    /// Not-found means "not ready yet"; any error is terminal
    async fn get_completion(&self, session_id: &str, message_hash: &str) -> BridgeResult<Completion>;
}

pub struct HttpRelayClient {
    http: HttpClient,
    base_url: String,
}

impl HttpRelayClient {
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl RelayClient for HttpRelayClient {
    async fn register_session(&self, session_id: &str, party: &str) -> BridgeResult<()> {
        let url = join_url(&self.base_url, session_id);
        self.http.post_json_unit(&url, &[party]).await
    }

    async fn list_participants(&self, session_id: &str) -> BridgeResult<Vec<String>> {
        let url = join_url(&self.base_url, session_id);
        Ok(self.http.get_optional_json(&url).await?.unwrap_or_default())
    }

    async fn start_session(&self, session_id: &str, parties: &[String]) -> BridgeResult<()> {
        let url = join_url(&self.base_url, &format!("start/{}", session_id));
        self.http.post_json_unit(&url, parties).await
    }

    async fn get_completion(&self, session_id: &str, message_hash: &str) -> BridgeResult<Completion> {
        let url = join_url(&self.base_url, &format!("complete/{}/keysign", session_id));
        let response = self
            .http
            .client()
            .get(&url)
            .header("message_id", message_hash)
            .send()
            .await
            .map_err(|e| BridgeError::relay_terminal(format!("Completion request failed: {}", e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!(hash = %redact_hash(message_hash), "completion not ready");
                Ok(Completion::NotFound)
            }
            status if status.is_success() => {
                let body: Value = response
                    .json()
                    .await
                    .map_err(|e| BridgeError::relay_terminal(format!("Malformed completion body: {}", e)))?;
                parse_completion(&body, message_hash).map(Completion::Ready)
            }
            status => Err(BridgeError::relay_terminal(format!("Relay answered HTTP {}", status.as_u16()))),
        }
    }
}

/// Accepts either `{hash: signature, …}` or a bare signature object for
/// the requested hash.
pub fn parse_completion(body: &Value, message_hash: &str) -> BridgeResult<SignatureSet> {
    let object = body
        .as_object()
        .ok_or_else(|| BridgeError::relay_terminal("Completion body is not an object"))?;

    let mut set = SignatureSet::new();
    if object.contains_key("r") || object.contains_key("signature") {
        set.insert(message_hash.to_lowercase(), parse_signature(body)?);
        return Ok(set);
    }
    for (hash, value) in object {
        set.insert(hash.trim_start_matches("0x").to_lowercase(), parse_signature(value)?);
    }
    if set.is_empty() {
        return Err(BridgeError::relay_terminal("Completion body carries no signatures"));
    }
    Ok(set)
}

fn parse_signature(value: &Value) -> BridgeResult<Signature> {
    if let Some(r) = value.get("r").and_then(Value::as_str) {
        let s = value
            .get("s")
            .and_then(Value::as_str)
            .ok_or_else(|| BridgeError::relay_terminal("Signature is missing `s`"))?;
        return Ok(Signature::Ecdsa {
            r: scalar(r)?,
            s: scalar(s)?,
            recovery_id: recovery_id(value.get("recovery_id"))?,
        });
    }
    if let Some(blob) = value.get("signature").and_then(Value::as_str) {
        let blob = hex::decode(blob.trim_start_matches("0x"))
            .map_err(|e| BridgeError::relay_terminal(format!("Signature blob is not hex: {}", e)))?;
        return Ok(Signature::Message { blob });
    }
    Err(BridgeError::relay_terminal("Unrecognized signature shape"))
}

/// 32-byte big-endian scalar, left-padded
fn scalar(raw: &str) -> BridgeResult<[u8; 32]> {
    let bytes = hex::decode(raw.trim_start_matches("0x"))
        .map_err(|e| BridgeError::relay_terminal(format!("Signature scalar is not hex: {}", e)))?;
    if bytes.len() > 32 {
        return Err(BridgeError::relay_terminal("Signature scalar exceeds 32 bytes"));
    }
    let mut out = [0u8; 32];
    out[32 - bytes.len()..].copy_from_slice(&bytes);
    Ok(out)
}

fn recovery_id(value: Option<&Value>) -> BridgeResult<u8> {
    let parsed = match value {
        None | Some(Value::Null) => Some(0),
        Some(Value::Number(n)) => n.as_u64().and_then(|v| u8::try_from(v).ok()),
        Some(Value::String(s)) => u8::from_str_radix(s.trim_start_matches("0x"), 16).ok(),
        Some(_) => None,
    };
    parsed.ok_or_else(|| BridgeError::relay_terminal("Malformed recovery id"))
}
