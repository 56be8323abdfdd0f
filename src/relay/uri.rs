//! Shareable keysign URI
//!
//! `{scheme}://{host}?type={kind}&vault={ecdsa_pubkey}&jsonData={base64 json}`
//! where the JSON is a [`KeysignMessage`] carrying the encrypted
//! [`SessionPayload`].

use base64::Engine;
use serde::{Deserialize, Serialize};

use super::crypto::SessionKey;
use crate::error::{BridgeError, BridgeResult};
use crate::types::SigningPayload;

pub const SIGN_TRANSACTION: &str = "SignTransaction";
pub const SIGN_MESSAGE: &str = "SignMessage";

/// Raw message to be signed by the vault
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomMessagePayload {
    pub method: String,
    pub message: String,
    pub chain: String,
}

/// What the co-signers are asked to sign
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SessionPayload {
    Keysign(SigningPayload),
    CustomMessage(CustomMessagePayload),
}

impl SessionPayload {
    pub fn uri_kind(&self) -> &'static str {
        match self {
            SessionPayload::Keysign(_) => SIGN_TRANSACTION,
            SessionPayload::CustomMessage(_) => SIGN_MESSAGE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeysignMessage {
    pub session_id: String,
    pub service_name: String,
    pub encryption_key_hex: String,
    pub use_relay: bool,
    /// Base64 of nonce-prefixed ciphertext
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKeysignUri {
    pub kind: String,
    pub vault_public_key: String,
    pub message: KeysignMessage,
}

/// Encrypt `payload` under `key` into a keysign message
pub fn seal(payload: &SessionPayload, session_id: &str, key: &SessionKey, service_name: &str) -> BridgeResult<KeysignMessage> {
    let plaintext = serde_json::to_vec(payload)?;
    let sealed = key.encrypt(&plaintext)?;
    Ok(KeysignMessage {
        session_id: session_id.to_string(),
        service_name: service_name.to_string(),
        encryption_key_hex: key.to_hex().to_string(),
        use_relay: true,
        payload: base64::engine::general_purpose::STANDARD.encode(sealed),
    })
}

pub fn build_keysign_uri(
    scheme: &str,
    host: &str,
    kind: &str,
    vault_public_key: &str,
    message: &KeysignMessage,
) -> BridgeResult<String> {
    let json = serde_json::to_vec(message)?;
    let encoded = base64::engine::general_purpose::STANDARD.encode(json);
    Ok(format!(
        "{}://{}?type={}&vault={}&jsonData={}",
        scheme,
        host,
        kind,
        urlencoding::encode(vault_public_key),
        urlencoding::encode(&encoded)
    ))
}

pub fn parse_keysign_uri(uri: &str) -> BridgeResult<ParsedKeysignUri> {
    let parsed = url::Url::parse(uri.trim()).map_err(|e| BridgeError::malformed_intent(format!("Invalid URI: {}", e)))?;

    let mut kind = None;
    let mut vault = None;
    let mut json_data = None;
    for (name, value) in parsed.query_pairs() {
        match name.as_ref() {
            "type" => kind = Some(value.into_owned()),
            "vault" => vault = Some(value.into_owned()),
            "jsonData" => json_data = Some(value.into_owned()),
            _ => {}
        }
    }

    let missing = |field: &str| BridgeError::malformed_intent(format!("URI is missing `{}`", field));
    let json_data = json_data.ok_or_else(|| missing("jsonData"))?;
    let json = base64::engine::general_purpose::STANDARD
        .decode(json_data.as_bytes())
        .map_err(|e| BridgeError::malformed_intent(format!("jsonData is not base64: {}", e)))?;

    Ok(ParsedKeysignUri {
        kind: kind.ok_or_else(|| missing("type"))?,
        vault_public_key: vault.ok_or_else(|| missing("vault"))?,
        message: serde_json::from_slice(&json)?,
    })
}

/// Parse a URI and decrypt its payload with the embedded key
pub fn open_keysign_uri(uri: &str) -> BridgeResult<(ParsedKeysignUri, SessionPayload)> {
    let parsed = parse_keysign_uri(uri)?;
    let key = SessionKey::from_hex(&parsed.message.encryption_key_hex)?;
    let sealed = base64::engine::general_purpose::STANDARD
        .decode(parsed.message.payload.as_bytes())
        .map_err(|e| BridgeError::crypto_error(format!("Payload is not base64: {}", e)))?;
    let payload = serde_json::from_slice(&key.decrypt(&sealed)?)?;
    Ok((parsed, payload))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    fn custom() -> SessionPayload {
        SessionPayload::CustomMessage(CustomMessagePayload {
            method: "personal_sign".to_string(),
            message: "Sign in to example.org".to_string(),
            chain: "Ethereum".to_string(),
        })
    }

    #[test]
    fn test_uri_roundtrip() {
        let key = SessionKey::generate();
        let message = seal(&custom(), "session-1", &key, "VaultBridge").unwrap();
        let uri = build_keysign_uri("vultisig", "vultisig.com", SIGN_MESSAGE, "02abcd", &message).unwrap();
        assert!(uri.starts_with("vultisig://vultisig.com?type=SignMessage&vault=02abcd&jsonData="));

        let (parsed, payload) = open_keysign_uri(&uri).unwrap();
        assert_eq!(parsed.kind, SIGN_MESSAGE);
        assert_eq!(parsed.vault_public_key, "02abcd");
        assert_eq!(parsed.message, message);
        assert!(parsed.message.use_relay);
        assert_eq!(payload, custom());
    }

    #[test]
    fn test_payload_is_encrypted() {
        let key = SessionKey::generate();
        let message = seal(&custom(), "s", &key, "VaultBridge").unwrap();
        let raw = base64::engine::general_purpose::STANDARD.decode(&message.payload).unwrap();
        assert!(!String::from_utf8_lossy(&raw).contains("example.org"));
    }

    #[test]
    fn test_missing_json_data() {
        let err = parse_keysign_uri("vultisig://vultisig.com?type=SignTransaction&vault=02").unwrap_err();
        assert_eq!(err.code, ErrorCode::MalformedIntent);
    }

    #[test]
    fn test_uri_kind() {
        assert_eq!(custom().uri_kind(), SIGN_MESSAGE);
    }
}
