//! Transaction Compiler
//!
//! Compiles external signatures back into complete, broadcast-ready transactions.

use crate::signing::preimage::bitcoin::{
    write_outpoint, write_outputs, write_var_int, BitcoinInputType, BitcoinSigHashType,
    UnsignedBitcoinTransaction,
};
use crate::signing::preimage::cosmos::{encode_tx_raw, sha256, CosmosTxParts};
use crate::signing::preimage::ethereum::{keccak256, UnsignedEthereumTransaction};
use crate::signing::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

/// Compiled Bitcoin-family transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledBitcoinTransaction {
    /// Raw transaction bytes (ready to broadcast)
    pub raw_tx: Vec<u8>,
    /// Virtual size in vbytes
    pub vsize: usize,
}

/// Compiled EIP-1559 transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledEthereumTransaction {
    /// Typed signed envelope
    pub raw_tx: Vec<u8>,
    /// keccak256 of the signed envelope
    pub tx_hash: [u8; 32],
}

/// Compiled Cosmos transaction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledCosmosTransaction {
    /// Protobuf-encoded TxRaw
    pub raw_tx: Vec<u8>,
    /// sha256 of the TxRaw bytes
    pub tx_hash: [u8; 32],
}

/// Compile a Bitcoin-family transaction with DER signatures (no sighash byte)
///
/// `public_keys` holds either one key per input or a single key shared by
/// every input.
pub fn compile_bitcoin_transaction(
    tx: &UnsignedBitcoinTransaction,
    sighash_type: BitcoinSigHashType,
    signatures: &[Vec<u8>],
    public_keys: &[Vec<u8>],
) -> EngineResult<CompiledBitcoinTransaction> {
    if signatures.len() != tx.inputs.len() {
        return Err(EngineError::InvalidSignature(format!(
            "Expected {} signatures, got {}",
            tx.inputs.len(),
            signatures.len()
        )));
    }
    if public_keys.len() != 1 && public_keys.len() != tx.inputs.len() {
        return Err(EngineError::InvalidSignature(format!(
            "Expected 1 or {} public keys, got {}",
            tx.inputs.len(),
            public_keys.len()
        )));
    }

    let has_witness = tx.has_witness();
    let mut raw_tx = Vec::new();
    let mut witness_data = Vec::new();

    raw_tx.extend_from_slice(&tx.version.to_le_bytes());
    if has_witness {
        raw_tx.push(0x00); // marker
        raw_tx.push(0x01); // flag
    }

    write_var_int(tx.inputs.len() as u64, &mut raw_tx);
    for (i, input) in tx.inputs.iter().enumerate() {
        let public_key = if public_keys.len() == 1 { &public_keys[0] } else { &public_keys[i] };
        let sig = sig_with_hash_type(&signatures[i], sighash_type)?;

        write_outpoint(input, &mut raw_tx);

        match input.input_type {
            BitcoinInputType::P2PKH => {
                // <sig> <pubkey>
                let mut script_sig = Vec::new();
                push_data(&sig, &mut script_sig);
                push_data(public_key, &mut script_sig);
                write_var_int(script_sig.len() as u64, &mut raw_tx);
                raw_tx.extend_from_slice(&script_sig);
                if has_witness {
                    witness_data.push(0x00);
                }
            }
            BitcoinInputType::P2WPKH => {
                // Empty scriptSig, 2-item witness
                raw_tx.push(0x00);
                witness_data.push(0x02);
                write_var_int(sig.len() as u64, &mut witness_data);
                witness_data.extend_from_slice(&sig);
                write_var_int(public_key.len() as u64, &mut witness_data);
                witness_data.extend_from_slice(public_key);
            }
        }

        raw_tx.extend_from_slice(&input.sequence.to_le_bytes());
    }

    write_outputs(&tx.outputs, &mut raw_tx);

    if has_witness {
        raw_tx.extend_from_slice(&witness_data);
    }
    raw_tx.extend_from_slice(&tx.locktime.to_le_bytes());

    let base_size = raw_tx.len() - if has_witness { witness_data.len() + 2 } else { 0 };
    let total_size = raw_tx.len();
    let vsize = (base_size * 3 + total_size + 3) / 4;

    Ok(CompiledBitcoinTransaction { raw_tx, vsize })
}

fn sig_with_hash_type(der: &[u8], sighash_type: BitcoinSigHashType) -> EngineResult<Vec<u8>> {
    if der.len() < 8 || der.len() > 72 || der[0] != 0x30 {
        return Err(EngineError::InvalidSignature("expected DER-encoded ECDSA signature".to_string()));
    }
    let mut sig = der.to_vec();
    sig.push(sighash_type.to_byte());
    Ok(sig)
}

fn push_data(data: &[u8], script: &mut Vec<u8>) {
    // Signatures and keys are always below OP_PUSHDATA1
    script.push(data.len() as u8);
    script.extend_from_slice(data);
}

/// Compile an EIP-1559 transaction with an external `{r, s, recovery_id}` signature
pub fn compile_ethereum_transaction(
    tx: &UnsignedEthereumTransaction,
    r: &[u8; 32],
    s: &[u8; 32],
    recovery_id: u8,
) -> EngineResult<CompiledEthereumTransaction> {
    // Typed transactions carry yParity, accept legacy 27/28 as well
    let y_parity = match recovery_id {
        0 | 1 => recovery_id,
        27 | 28 => recovery_id - 27,
        other => {
            return Err(EngineError::InvalidSignature(format!("invalid recovery id {}", other)));
        }
    };

    let raw_tx = tx.signed_envelope(r, s, y_parity);
    let tx_hash = keccak256(&raw_tx);
    Ok(CompiledEthereumTransaction { raw_tx, tx_hash })
}

/// Compile a Cosmos transaction with 64-byte compact signatures
pub fn compile_cosmos_transaction(
    parts: &CosmosTxParts,
    signatures: &[Vec<u8>],
) -> EngineResult<CompiledCosmosTransaction> {
    if signatures.is_empty() {
        return Err(EngineError::InvalidSignature("no signatures supplied".to_string()));
    }
    if let Some(bad) = signatures.iter().find(|s| s.len() != 64) {
        return Err(EngineError::InvalidSignature(format!(
            "Cosmos signatures must be 64 bytes, got {}",
            bad.len()
        )));
    }

    let raw_tx = encode_tx_raw(parts, signatures);
    let tx_hash = sha256(&raw_tx);
    Ok(CompiledCosmosTransaction { raw_tx, tx_hash })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signing::preimage::bitcoin::{p2pkh_script, BitcoinInput, BitcoinOutput};

    fn der_sig() -> Vec<u8> {
        let mut der = vec![0x30, 0x44, 0x02, 0x20];
        der.extend_from_slice(&[0x11; 32]);
        der.extend_from_slice(&[0x02, 0x20]);
        der.extend_from_slice(&[0x22; 32]);
        der
    }

    fn sample_tx(input_type: BitcoinInputType) -> UnsignedBitcoinTransaction {
        UnsignedBitcoinTransaction {
            version: 2,
            inputs: vec![BitcoinInput {
                txid: [0xab; 32],
                vout: 0,
                script_code: p2pkh_script(&[0x11; 20]),
                value: 100_000,
                sequence: 0xffff_ffff,
                input_type,
            }],
            outputs: vec![BitcoinOutput {
                value: 90_000,
                script_pubkey: p2pkh_script(&[0x22; 20]),
            }],
            locktime: 0,
        }
    }

    #[test]
    fn test_segwit_framing() {
        let tx = sample_tx(BitcoinInputType::P2WPKH);
        let compiled = compile_bitcoin_transaction(
            &tx,
            BitcoinSigHashType::All,
            &[der_sig()],
            &[vec![0x02; 33]],
        )
        .unwrap();

        assert_eq!(&compiled.raw_tx[4..6], &[0x00, 0x01]);
        assert!(compiled.vsize < compiled.raw_tx.len());
    }

    #[test]
    fn test_legacy_framing_appends_hash_type() {
        let tx = sample_tx(BitcoinInputType::P2PKH);
        let compiled = compile_bitcoin_transaction(
            &tx,
            BitcoinSigHashType::AllForkId,
            &[der_sig()],
            &[vec![0x02; 33]],
        )
        .unwrap();

        assert_eq!(compiled.vsize, compiled.raw_tx.len());
        let sig_end = 4 + 1 + 36 + 1 + 1 + der_sig().len();
        assert_eq!(compiled.raw_tx[sig_end], 0x41);
    }

    #[test]
    fn test_signature_count_mismatch() {
        let tx = sample_tx(BitcoinInputType::P2WPKH);
        let result = compile_bitcoin_transaction(&tx, BitcoinSigHashType::All, &[], &[vec![0x02; 33]]);
        assert!(matches!(result, Err(EngineError::InvalidSignature(_))));
    }

    #[test]
    fn test_ethereum_recovery_id_normalized() {
        let tx = UnsignedEthereumTransaction {
            chain_id: 1,
            nonce: 0,
            max_priority_fee_per_gas: 1,
            max_fee_per_gas: 2,
            gas_limit: 21_000,
            to: Some([0x01; 20]),
            value: vec![1],
            data: vec![],
        };
        let a = compile_ethereum_transaction(&tx, &[1; 32], &[2; 32], 1).unwrap();
        let b = compile_ethereum_transaction(&tx, &[1; 32], &[2; 32], 28).unwrap();
        assert_eq!(a.tx_hash, b.tx_hash);
        assert!(compile_ethereum_transaction(&tx, &[1; 32], &[2; 32], 5).is_err());
    }

    #[test]
    fn test_cosmos_signature_length_checked() {
        let parts = CosmosTxParts {
            body_bytes: vec![1],
            auth_info_bytes: vec![2],
        };
        assert!(compile_cosmos_transaction(&parts, &[vec![0; 65]]).is_err());
        let compiled = compile_cosmos_transaction(&parts, &[vec![0; 64]]).unwrap();
        assert_eq!(compiled.tx_hash, sha256(&compiled.raw_tx));
    }
}
