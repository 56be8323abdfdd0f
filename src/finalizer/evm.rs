//! EVM finalization: local envelope rebuild

use tracing::info;

use super::{ecdsa_parts, engine_failure, signature_for};
use crate::adapter::evm_signing_input;
use crate::engine::native::ethereum_transaction;
use crate::engine::SigningInput;
use crate::error::{BridgeError, BridgeResult};
use crate::signing::compiler::compile_ethereum_transaction;
use crate::signing::preimage::get_ethereum_signing_hash;
use crate::types::{FinalizedTransaction, PreSignArtifact, SignatureSet, SigningPayload};

/// Rebuild the signed EIP-1559 envelope from the payload fields and hash it.
///
/// The rebuilt unsigned envelope must match the artifact byte for byte, so
/// a signature can never be attached to a different transaction.
pub fn finalize_evm(
    signatures: &SignatureSet,
    artifact: &PreSignArtifact,
    payload: &SigningPayload,
    chain_id: u64,
) -> BridgeResult<FinalizedTransaction> {
    let SigningInput::Ethereum(input) = evm_signing_input(payload, chain_id)? else {
        return Err(BridgeError::internal("EVM adapter produced a non-EVM input"));
    };
    let tx = ethereum_transaction(&input).map_err(engine_failure)?;
    tx.check_envelope(&artifact.wire_bytes).map_err(engine_failure)?;

    let expected = artifact
        .signing_hashes
        .first()
        .ok_or_else(|| BridgeError::encoding("Artifact carries no signing hash"))?;
    if get_ethereum_signing_hash(&tx).map_err(engine_failure)? != *expected {
        return Err(BridgeError::encoding("Payload does not match the signed artifact"));
    }

    let (r, s, recovery_id) = ecdsa_parts(signature_for(signatures, expected)?)?;
    let compiled = compile_ethereum_transaction(&tx, r, s, recovery_id).map_err(engine_failure)?;

    let tx_hash = format!("0x{}", hex::encode(compiled.tx_hash));
    info!(chain = %payload.coin.chain, tx_hash = %tx_hash, "EVM transaction finalized");
    Ok(FinalizedTransaction {
        tx_hash,
        raw_bytes: Some(compiled.raw_tx),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::pre_sign;
    use crate::engine::NativeEngine;
    use crate::error::ErrorCode;
    use crate::signing::preimage::ethereum::keccak256;
    use crate::types::{BlockchainSpecific, ChainFamily, Coin, EvmParams, Signature};
    use secp256k1::{Message, Secp256k1, SecretKey};

    fn payload() -> SigningPayload {
        SigningPayload {
            coin: Coin {
                family: ChainFamily::Evm,
                chain: "Ethereum".to_string(),
                ticker: "ETH".to_string(),
                decimals: 18,
                address: "0x0000000000000000000000000000000000000001".to_string(),
                hex_public_key: String::new(),
                is_native: true,
                contract_address: None,
            },
            to_address: "0x000000000000000000000000000000000000dEaD".to_string(),
            to_amount: 1_000_000_000_000_000_000,
            memo: None,
            blockchain_specific: BlockchainSpecific::Evm(EvmParams {
                nonce: 5,
                gas_limit: 600_000,
                max_fee_per_gas_wei: 50_000_000_000,
                priority_fee_wei: 1_000_000_000,
            }),
            vault_public_key_ecdsa: String::new(),
            vault_local_party_id: String::new(),
        }
    }

    fn sign(hash: &[u8; 32]) -> Signature {
        let secp = Secp256k1::new();
        let key = SecretKey::from_slice(&[0x42; 32]).unwrap();
        let (recovery_id, compact) = secp
            .sign_ecdsa_recoverable(&Message::from_digest(*hash), &key)
            .serialize_compact();
        let mut r = [0u8; 32];
        let mut s = [0u8; 32];
        r.copy_from_slice(&compact[..32]);
        s.copy_from_slice(&compact[32..]);
        Signature::Ecdsa {
            r,
            s,
            recovery_id: recovery_id.to_i32() as u8,
        }
    }

    fn artifact(payload: &SigningPayload) -> PreSignArtifact {
        let input = evm_signing_input(payload, 1).unwrap();
        pre_sign(&NativeEngine::new(), ChainFamily::Evm, &input).unwrap()
    }

    #[test]
    fn test_round_trip_hash_format() {
        let payload = payload();
        let artifact = artifact(&payload);
        let mut signatures = SignatureSet::new();
        signatures.insert(hex::encode(artifact.signing_hashes[0]), sign(&artifact.signing_hashes[0]));

        let finalized = finalize_evm(&signatures, &artifact, &payload, 1).unwrap();
        assert_eq!(finalized.tx_hash.len(), 66);
        assert!(finalized.tx_hash.starts_with("0x"));

        let raw = finalized.raw_bytes.unwrap();
        assert_eq!(raw[0], 0x02);
        assert_eq!(finalized.tx_hash, format!("0x{}", hex::encode(keccak256(&raw))));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let payload = payload();
        let artifact = artifact(&payload);
        let mut signatures = SignatureSet::new();
        signatures.insert(hex::encode(artifact.signing_hashes[0]), sign(&artifact.signing_hashes[0]));

        let mut tampered = payload.clone();
        tampered.to_amount += 1;
        let err = finalize_evm(&signatures, &artifact, &tampered, 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::Encoding);
    }

    #[test]
    fn test_missing_signature() {
        let payload = payload();
        let artifact = artifact(&payload);
        let err = finalize_evm(&SignatureSet::new(), &artifact, &payload, 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::RelayTerminal);
    }
}
