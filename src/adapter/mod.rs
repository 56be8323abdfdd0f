//! Wire Adapter
//!
//! Converts a canonical [`SigningPayload`](crate::types::SigningPayload) into
//! the structured input a [`WireEncodingEngine`] expects and asks the engine
//! for the hashes to sign. Nothing here hashes on its own.

pub mod address;
pub mod cosmos;
pub mod evm;
pub mod utxo;

use tracing::{debug, warn};

use crate::engine::{SigningInput, WireEncodingEngine};
use crate::error::{BridgeError, BridgeResult};
use crate::types::{ChainFamily, PreSignArtifact};
use crate::utils::logging::redact_hash;

pub use cosmos::{cosmos_signing_input, resolve_chain_id, thorchain_signing_input};
pub use evm::evm_signing_input;
pub use utxo::utxo_signing_input;

/// Ask the engine for wire bytes and signing hashes
pub fn pre_sign(engine: &dyn WireEncodingEngine, family: ChainFamily, input: &SigningInput) -> BridgeResult<PreSignArtifact> {
    let output = engine.compute_signing_hashes(family, input);

    if !output.error_message.is_empty() {
        warn!(%family, error = %output.error_message, "engine rejected signing input");
        return Err(BridgeError::encoding(output.error_message).with_details(format!("family: {}", family)));
    }
    if output.hashes.is_empty() {
        return Err(BridgeError::encoding("Engine returned no signing hashes")
            .with_details(format!("family: {}", family)));
    }

    let artifact = PreSignArtifact {
        family,
        wire_bytes: output.wire_bytes,
        signing_hashes: output.hashes,
    };
    debug!(
        %family,
        hashes = artifact.signing_hashes.len(),
        first = %artifact.primary_hash_hex().map(|h| redact_hash(&h)).unwrap_or_default(),
        "pre-sign artifact built"
    );
    Ok(artifact)
}
