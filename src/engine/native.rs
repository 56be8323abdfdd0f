//! In-process wire encoding engine
//!
//! Built on `crate::signing`: EIP-1559 RLP for EVM, largest-first coin
//! selection plus BIP-143/legacy sighashes for UTXO chains, and protobuf
//! `SignDoc`/`TxRaw` envelopes for Cosmos and Thorchain messages.

use serde::{Deserialize, Serialize};

use super::{
    BitcoinSigningInput, CompiledOutput, CosmosMessage, CosmosSigningInput, EthereumSigningInput,
    EthereumTransfer, PreSigningOutput, SigningInput, WireEncodingEngine,
};
use crate::signing::abi::erc20_transfer_calldata;
use crate::signing::compiler::{compile_bitcoin_transaction, compile_cosmos_transaction};
use crate::signing::preimage::bitcoin::{
    classify_locking_script, get_bitcoin_sighashes, BitcoinInput, BitcoinOutput, BitcoinSigHashType,
    UnsignedBitcoinTransaction,
};
use crate::signing::preimage::cosmos::{
    encode_msg_send, encode_thorchain_msg_deposit, encode_thorchain_msg_send, encode_tx_parts,
    get_cosmos_sign_doc_hash, CosmosFee, CosmosTxParts, UnsignedCosmosTransaction,
};
use crate::signing::preimage::ethereum::{get_ethereum_signing_hash, UnsignedEthereumTransaction};
use crate::signing::{EngineError, EngineResult};
use crate::types::ChainFamily;

/// Largest OP_RETURN payload relayed by standard nodes
const MAX_OP_RETURN_LEN: usize = 80;

/// Opaque UTXO wire bytes
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UtxoWire {
    sighash_type: BitcoinSigHashType,
    tx: UnsignedBitcoinTransaction,
}

/// Reference engine running in-process
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeEngine;

impl NativeEngine {
    pub fn new() -> Self {
        Self
    }

    fn pre_sign(&self, family: ChainFamily, input: &SigningInput) -> EngineResult<(Vec<u8>, Vec<[u8; 32]>)> {
        match (family, input) {
            (ChainFamily::Evm, SigningInput::Ethereum(input)) => {
                let tx = ethereum_transaction(input)?;
                let hash = get_ethereum_signing_hash(&tx)?;
                Ok((tx.unsigned_envelope(), vec![hash]))
            }
            (ChainFamily::Utxo, SigningInput::Bitcoin(input)) => {
                let wire = plan_utxo_transaction(input)?;
                let hashes = get_bitcoin_sighashes(&wire.tx, wire.sighash_type)?;
                Ok((bincode::serialize(&wire)?, hashes))
            }
            (ChainFamily::CosmosSdk | ChainFamily::ThorchainLike, SigningInput::Cosmos(input)) => {
                let tx = cosmos_transaction(input);
                let parts = encode_tx_parts(&tx)?;
                let hash = get_cosmos_sign_doc_hash(&tx, &parts);
                Ok((bincode::serialize(&parts)?, vec![hash]))
            }
            (family, input) => Err(EngineError::FamilyMismatch {
                family: family.to_string(),
                input: input.kind().to_string(),
            }),
        }
    }

    fn compile(
        &self,
        family: ChainFamily,
        wire_bytes: &[u8],
        signatures: &[Vec<u8>],
        public_keys: &[Vec<u8>],
    ) -> EngineResult<Vec<u8>> {
        match family {
            ChainFamily::Utxo => {
                let wire: UtxoWire = bincode::deserialize(wire_bytes)?;
                let compiled =
                    compile_bitcoin_transaction(&wire.tx, wire.sighash_type, signatures, public_keys)?;
                Ok(compiled.raw_tx)
            }
            ChainFamily::CosmosSdk | ChainFamily::ThorchainLike => {
                let parts: CosmosTxParts = bincode::deserialize(wire_bytes)?;
                Ok(compile_cosmos_transaction(&parts, signatures)?.raw_tx)
            }
            ChainFamily::Evm => Err(EngineError::InvalidTransaction(
                "EVM envelopes are assembled from the payload, not compiled".to_string(),
            )),
        }
    }
}

impl WireEncodingEngine for NativeEngine {
    fn compute_signing_hashes(&self, family: ChainFamily, input: &SigningInput) -> PreSigningOutput {
        match self.pre_sign(family, input) {
            Ok((wire_bytes, hashes)) => PreSigningOutput {
                wire_bytes,
                hashes,
                error_message: String::new(),
            },
            Err(e) => PreSigningOutput::failed(e.to_string()),
        }
    }

    fn compile_with_signatures(
        &self,
        family: ChainFamily,
        wire_bytes: &[u8],
        signatures: &[Vec<u8>],
        public_keys: &[Vec<u8>],
    ) -> CompiledOutput {
        match self.compile(family, wire_bytes, signatures, public_keys) {
            Ok(encoded) => CompiledOutput {
                encoded,
                error_message: String::new(),
            },
            Err(e) => CompiledOutput::failed(e.to_string()),
        }
    }
}

// =============================================================================
// EVM
// =============================================================================

/// Structured EIP-1559 input to the unsigned transaction
pub fn ethereum_transaction(input: &EthereumSigningInput) -> EngineResult<UnsignedEthereumTransaction> {
    let (value, data) = match &input.transfer {
        EthereumTransfer::Transfer { amount, data } => (amount.clone(), data.clone()),
        EthereumTransfer::Erc20Transfer { to, amount } => {
            (Vec::new(), erc20_transfer_calldata(&parse_evm_address(to)?, amount)?)
        }
    };

    Ok(UnsignedEthereumTransaction {
        chain_id: be_to_u64(&input.chain_id, "chain_id")?,
        nonce: be_to_u64(&input.nonce, "nonce")?,
        max_priority_fee_per_gas: be_to_u128(&input.max_inclusion_fee_per_gas, "max_inclusion_fee_per_gas")?,
        max_fee_per_gas: be_to_u128(&input.max_fee_per_gas, "max_fee_per_gas")?,
        gas_limit: be_to_u64(&input.gas_limit, "gas_limit")?,
        to: Some(parse_evm_address(&input.to_address)?),
        value,
        data,
    })
}

pub fn parse_evm_address(address: &str) -> EngineResult<[u8; 20]> {
    let stripped = address
        .strip_prefix("0x")
        .or_else(|| address.strip_prefix("0X"))
        .unwrap_or(address);
    let bytes = hex::decode(stripped)
        .map_err(|e| EngineError::EncodingError(format!("invalid address {}: {}", address, e)))?;
    bytes
        .try_into()
        .map_err(|_| EngineError::EncodingError(format!("address {} is not 20 bytes", address)))
}

fn significant(bytes: &[u8]) -> &[u8] {
    &bytes[bytes.iter().take_while(|&&b| b == 0).count()..]
}

fn be_to_u64(bytes: &[u8], field: &str) -> EngineResult<u64> {
    let bytes = significant(bytes);
    if bytes.len() > 8 {
        return Err(EngineError::EncodingError(format!("{} overflows u64", field)));
    }
    Ok(bytes.iter().fold(0u64, |acc, b| acc << 8 | *b as u64))
}

fn be_to_u128(bytes: &[u8], field: &str) -> EngineResult<u128> {
    let bytes = significant(bytes);
    if bytes.len() > 16 {
        return Err(EngineError::EncodingError(format!("{} overflows u128", field)));
    }
    Ok(bytes.iter().fold(0u128, |acc, b| acc << 8 | *b as u128))
}

// =============================================================================
// UTXO
// =============================================================================

fn plan_utxo_transaction(input: &BitcoinSigningInput) -> EngineResult<UtxoWire> {
    let sighash_type = BitcoinSigHashType::from_u32(input.hash_type).ok_or_else(|| {
        EngineError::InvalidTransaction(format!("unsupported sighash type {:#x}", input.hash_type))
    })?;
    if input.amount < input.dust_threshold {
        return Err(EngineError::InvalidTransaction(format!(
            "amount {} is below dust threshold {}",
            input.amount, input.dust_threshold
        )));
    }
    if input.utxos.is_empty() {
        return Err(EngineError::InsufficientFunds {
            needed: input.amount,
            available: 0,
        });
    }

    let mut outputs = vec![BitcoinOutput {
        value: input.amount,
        script_pubkey: input.to_script.clone(),
    }];
    if let Some(memo) = &input.op_return {
        outputs.push(BitcoinOutput {
            value: 0,
            script_pubkey: op_return_script(memo)?,
        });
    }
    let change = BitcoinOutput {
        value: 0,
        script_pubkey: input.change_script.clone(),
    };

    // Largest-first selection
    let mut candidates = input.utxos.clone();
    candidates.sort_by(|a, b| b.amount.cmp(&a.amount));

    let mut selected = Vec::new();
    let mut total: u64 = 0;
    for utxo in candidates {
        let (kind, script_code) = classify_locking_script(&utxo.script)?;
        total = total.saturating_add(utxo.amount);
        selected.push(BitcoinInput {
            txid: utxo.txid,
            vout: utxo.vout,
            script_code,
            value: utxo.amount,
            sequence: utxo.sequence,
            input_type: kind,
        });
        if total >= input.amount.saturating_add(estimate_fee(input.byte_fee, &selected, &outputs)) {
            break;
        }
    }

    let fee_without_change = estimate_fee(input.byte_fee, &selected, &outputs);
    let needed = input.amount.saturating_add(fee_without_change);
    if total < needed {
        return Err(EngineError::InsufficientFunds { needed, available: total });
    }

    let mut with_change = outputs.clone();
    with_change.insert(1, change);
    let fee_with_change = estimate_fee(input.byte_fee, &selected, &with_change);
    let change_value = total
        .saturating_sub(input.amount)
        .saturating_sub(fee_with_change);
    if change_value >= input.dust_threshold {
        with_change[1].value = change_value;
        outputs = with_change;
    }

    Ok(UtxoWire {
        sighash_type,
        tx: UnsignedBitcoinTransaction {
            version: if sighash_type.is_fork_id() { 1 } else { 2 },
            inputs: selected,
            outputs,
            locktime: 0,
        },
    })
}

/// `byte_fee * estimated vsize`
fn estimate_fee(byte_fee: u64, inputs: &[BitcoinInput], outputs: &[BitcoinOutput]) -> u64 {
    let segwit = inputs.iter().any(|i| i.input_type.is_segwit());
    // version + locktime + counts, plus marker/flag for segwit
    let mut vbytes: u64 = if segwit { 11 } else { 10 };
    for input in inputs {
        vbytes += if input.input_type.is_segwit() { 68 } else { 148 };
    }
    for output in outputs {
        vbytes += 9 + output.script_pubkey.len() as u64;
    }
    byte_fee.saturating_mul(vbytes)
}

fn op_return_script(memo: &[u8]) -> EngineResult<Vec<u8>> {
    if memo.len() > MAX_OP_RETURN_LEN {
        return Err(EngineError::EncodingError(format!(
            "memo is {} bytes, OP_RETURN allows {}",
            memo.len(),
            MAX_OP_RETURN_LEN
        )));
    }
    let mut script = vec![0x6a];
    if memo.len() >= 0x4c {
        script.push(0x4c); // OP_PUSHDATA1
    }
    script.push(memo.len() as u8);
    script.extend_from_slice(memo);
    Ok(script)
}

// =============================================================================
// Cosmos
// =============================================================================

fn cosmos_transaction(input: &CosmosSigningInput) -> UnsignedCosmosTransaction {
    let messages = input
        .messages
        .iter()
        .map(|msg| match msg {
            CosmosMessage::Send {
                from_address,
                to_address,
                amounts,
            } => encode_msg_send(from_address, to_address, amounts),
            CosmosMessage::ThorchainSend {
                from_address,
                to_address,
                amounts,
            } => encode_thorchain_msg_send(from_address, to_address, amounts),
            CosmosMessage::ThorchainDeposit { coins, memo, signer } => {
                encode_thorchain_msg_deposit(coins, memo, signer)
            }
        })
        .collect();

    UnsignedCosmosTransaction {
        chain_id: input.chain_id.clone(),
        messages,
        fee: CosmosFee {
            amount: input.fee_amounts.clone(),
            gas: input.gas,
        },
        memo: input.memo.clone(),
        account_number: input.account_number,
        sequence: input.sequence,
        public_key: input.public_key.clone(),
    }
}
