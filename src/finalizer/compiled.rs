//! UTXO and Cosmos-family finalization through the engine

use tracing::info;

use super::{ecdsa_parts, signature_for};
use crate::engine::WireEncodingEngine;
use crate::error::{BridgeError, BridgeResult};
use crate::signing::preimage::cosmos::sha256;
use crate::types::{ChainFamily, FinalizedTransaction, PreSignArtifact, SignatureSet, SigningPayload};

/// Compile the artifact's wire bytes with one signature per signing hash.
pub fn finalize_compiled(
    engine: &dyn WireEncodingEngine,
    signatures: &SignatureSet,
    artifact: &PreSignArtifact,
    payload: &SigningPayload,
) -> BridgeResult<FinalizedTransaction> {
    let family = artifact.family;
    if family == ChainFamily::Evm {
        return Err(BridgeError::internal("EVM transactions are finalized from the payload"));
    }

    let encoded = artifact
        .signing_hashes
        .iter()
        .map(|hash| -> BridgeResult<Vec<u8>> {
            let (r, s, _) = ecdsa_parts(signature_for(signatures, hash)?)?;
            let mut compact = [0u8; 64];
            compact[..32].copy_from_slice(r);
            compact[32..].copy_from_slice(s);
            match family {
                ChainFamily::Utxo => der_signature(&compact),
                _ => Ok(compact.to_vec()),
            }
        })
        .collect::<BridgeResult<Vec<_>>>()?;

    let public_key = payload.public_key_bytes()?;
    let output = engine.compile_with_signatures(family, &artifact.wire_bytes, &encoded, &[public_key]);
    if !output.error_message.is_empty() {
        return Err(BridgeError::encoding(output.error_message).with_details(format!("family: {}", family)));
    }

    let tx_hash = match family {
        ChainFamily::Utxo => utxo_txid(&output.encoded)?,
        _ => hex::encode_upper(sha256(&output.encoded)),
    };
    info!(chain = %payload.coin.chain, %family, tx_hash = %tx_hash, "transaction finalized");

    Ok(FinalizedTransaction {
        tx_hash,
        raw_bytes: Some(output.encoded),
    })
}

/// Low-S DER encoding expected by UTXO script interpreters
fn der_signature(compact: &[u8; 64]) -> BridgeResult<Vec<u8>> {
    let mut signature = secp256k1::ecdsa::Signature::from_compact(compact)
        .map_err(|e| BridgeError::relay_terminal(format!("Malformed ECDSA signature: {}", e)))?;
    signature.normalize_s();
    Ok(signature.serialize_der().to_vec())
}

/// Display-order txid; excludes witness data
fn utxo_txid(raw: &[u8]) -> BridgeResult<String> {
    let tx: bitcoin::Transaction = bitcoin::consensus::deserialize(raw)
        .map_err(|e| BridgeError::encoding(format!("Engine produced an unparsable transaction: {}", e)))?;
    Ok(tx.compute_txid().to_string())
}
