//! Transaction Finalizer
//!
//! Joins a pre-sign artifact with the co-signers' signatures. EVM envelopes
//! are rebuilt locally from the payload; UTXO and Cosmos-family containers go
//! through the engine's compile entry point. Nothing is broadcast from here.

pub mod compiled;
pub mod custom_message;
pub mod evm;

use crate::error::{BridgeError, BridgeResult};
use crate::signing::EngineError;
use crate::types::{Signature, SignatureSet};

pub use compiled::finalize_compiled;
pub use custom_message::{custom_message_hash, eip191_hash, message_bytes, signature_hex};
pub use evm::finalize_evm;

/// Signature for `hash`, looked up by lowercase hex
pub fn signature_for<'a>(signatures: &'a SignatureSet, hash: &[u8; 32]) -> BridgeResult<&'a Signature> {
    let key = hex::encode(hash);
    signatures
        .get(&key)
        .ok_or_else(|| BridgeError::relay_terminal("Relay returned no signature for a required hash").with_details(key))
}

/// `(r, s, recovery_id)` of an ECDSA signature
pub(crate) fn ecdsa_parts(signature: &Signature) -> BridgeResult<(&[u8; 32], &[u8; 32], u8)> {
    match signature {
        Signature::Ecdsa { r, s, recovery_id } => Ok((r, s, *recovery_id)),
        Signature::Message { .. } => Err(BridgeError::relay_terminal(
            "Expected an ECDSA signature, relay returned a message blob",
        )),
    }
}

pub(crate) fn engine_failure(err: EngineError) -> BridgeError {
    BridgeError::encoding(err.to_string())
}
