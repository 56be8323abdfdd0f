//! Transaction Signing Primitives
//!
//! Chain-native serialization used by the in-process wire encoding engine:
//! - `preimage`: unsigned transaction layouts and the hashes to sign
//! - `compiler`: assembling unsigned transactions plus signatures
//! - `rlp` / `abi`: EVM encoding helpers

pub mod abi;
pub mod compiler;
pub mod preimage;
pub mod rlp;

/// Failures inside the signing primitives
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Invalid transaction format: {0}")]
    InvalidTransaction(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid input index: {0}")]
    InvalidInputIndex(usize),

    #[error("Encoding error: {0}")]
    EncodingError(String),

    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    #[error("Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    #[error("{family} engine cannot handle {input} input")]
    FamilyMismatch { family: String, input: String },
}

pub type EngineResult<T> = Result<T, EngineError>;

impl From<bincode::Error> for EngineError {
    fn from(e: bincode::Error) -> Self {
        EngineError::EncodingError(e.to_string())
    }
}

pub use compiler::{compile_bitcoin_transaction, compile_cosmos_transaction, compile_ethereum_transaction};
