//! Unified error types for the signing bridge
//!
//! Every pipeline stage reports failures through [`BridgeError`] so the
//! request dispatcher can surface them verbatim to the originating dApp.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Main error type for all bridge operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<String>,
}

impl BridgeError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    // Convenience constructors
    pub fn transient_network(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::TransientNetwork, msg)
    }

    pub fn unsupported_chain(chain: impl fmt::Display) -> Self {
        Self::new(ErrorCode::UnsupportedChain, format!("Unsupported chain: {}", chain))
    }

    pub fn malformed_intent(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::MalformedIntent, msg)
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Encoding, msg)
    }

    pub fn relay_terminal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::RelayTerminal, msg)
    }

    pub fn abandoned(session_id: &str) -> Self {
        Self::new(ErrorCode::Abandoned, "Signing session abandoned by operator")
            .with_details(format!("session {}", session_id))
    }

    pub fn crypto_error(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Crypto, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Config, msg)
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Storage, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Internal, msg)
    }

    /// Operator cancellation is a terminal outcome, not a failure.
    pub fn is_abandoned(&self) -> bool {
        self.code == ErrorCode::Abandoned
    }
}

impl fmt::Display for BridgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for BridgeError {}

/// Error codes for categorization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // Pipeline taxonomy
    TransientNetwork,
    UnsupportedChain,
    MalformedIntent,
    Encoding,
    RelayTerminal,
    Abandoned,

    // Ambient
    Crypto,
    Config,
    Storage,
    Json,
    Hex,
    Internal,
}

/// Result type alias for bridge operations
pub type BridgeResult<T> = Result<T, BridgeError>;

// Conversions from common error types

impl From<serde_json::Error> for BridgeError {
    fn from(e: serde_json::Error) -> Self {
        BridgeError::new(ErrorCode::Json, e.to_string())
    }
}

impl From<hex::FromHexError> for BridgeError {
    fn from(e: hex::FromHexError) -> Self {
        BridgeError::new(ErrorCode::Hex, e.to_string())
    }
}

impl From<std::io::Error> for BridgeError {
    fn from(e: std::io::Error) -> Self {
        BridgeError::new(ErrorCode::Internal, e.to_string())
    }
}

impl From<reqwest::Error> for BridgeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            BridgeError::transient_network("Request timed out")
        } else if e.is_connect() {
            BridgeError::transient_network("Connection failed")
        } else {
            BridgeError::transient_network(e.to_string())
        }
    }
}

impl From<bincode::Error> for BridgeError {
    fn from(e: bincode::Error) -> Self {
        BridgeError::encoding(format!("Wire decoding failed: {}", e))
    }
}

impl From<url::ParseError> for BridgeError {
    fn from(e: url::ParseError) -> Self {
        BridgeError::config(format!("Invalid URL: {}", e))
    }
}
