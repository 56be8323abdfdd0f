//! Ethereum Pre-Image Hashing
//!
//! Generates signing hashes for EIP-1559 (type 0x02) fee market transactions.

use crate::signing::rlp;
use crate::signing::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use tiny_keccak::{Hasher, Keccak};

/// EIP-2718 envelope type for fee market transactions
pub const EIP1559_TX_TYPE: u8 = 0x02;

/// Unsigned EIP-1559 transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedEthereumTransaction {
    /// Chain ID
    pub chain_id: u64,
    /// Sender nonce
    pub nonce: u64,
    /// Max priority fee per gas
    pub max_priority_fee_per_gas: u128,
    /// Max fee per gas
    pub max_fee_per_gas: u128,
    /// Gas limit
    pub gas_limit: u64,
    /// Recipient address (None for contract creation)
    pub to: Option<[u8; 20]>,
    /// Value in wei, big-endian
    pub value: Vec<u8>,
    /// Transaction data
    pub data: Vec<u8>,
}

impl UnsignedEthereumTransaction {
    /// RLP field list shared by the unsigned and signed envelopes
    fn rlp_fields(&self) -> Vec<Vec<u8>> {
        vec![
            rlp::encode_u64(self.chain_id),
            rlp::encode_u64(self.nonce),
            rlp::encode_u128(self.max_priority_fee_per_gas),
            rlp::encode_u128(self.max_fee_per_gas),
            rlp::encode_u64(self.gas_limit),
            rlp::encode_address(self.to),
            rlp::encode_uint_bytes(&self.value),
            rlp::encode_bytes(&self.data),
            // Empty access list
            rlp::encode_list(&[]),
        ]
    }

    /// `0x02 || rlp([chainId, nonce, maxPriorityFeePerGas, maxFeePerGas, gasLimit, to, value, data, accessList])`
    pub fn unsigned_envelope(&self) -> Vec<u8> {
        let mut typed = vec![EIP1559_TX_TYPE];
        typed.extend_from_slice(&rlp::encode_list(&self.rlp_fields()));
        typed
    }

    /// Same fields followed by `yParity, r, s`
    pub fn signed_envelope(&self, r: &[u8; 32], s: &[u8; 32], y_parity: u8) -> Vec<u8> {
        let mut items = self.rlp_fields();
        items.push(rlp::encode_u64(y_parity as u64));
        items.push(rlp::encode_uint_bytes(r));
        items.push(rlp::encode_uint_bytes(s));

        let mut typed = vec![EIP1559_TX_TYPE];
        typed.extend_from_slice(&rlp::encode_list(&items));
        typed
    }

    /// Verify that `envelope` is exactly the unsigned encoding of these fields
    pub fn check_envelope(&self, envelope: &[u8]) -> EngineResult<()> {
        if envelope != self.unsigned_envelope().as_slice() {
            return Err(EngineError::InvalidTransaction(
                "unsigned envelope does not match transaction fields".to_string(),
            ));
        }
        Ok(())
    }
}

/// Get the signing hash for an EIP-1559 transaction
pub fn get_ethereum_signing_hash(tx: &UnsignedEthereumTransaction) -> EngineResult<[u8; 32]> {
    if tx.value.len() > 32 {
        return Err(EngineError::EncodingError("value exceeds uint256".to_string()));
    }
    if tx.max_priority_fee_per_gas > tx.max_fee_per_gas {
        return Err(EngineError::InvalidTransaction(format!(
            "priority fee {} exceeds max fee {}",
            tx.max_priority_fee_per_gas, tx.max_fee_per_gas
        )));
    }
    Ok(keccak256(&tx.unsigned_envelope()))
}

pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak::v256();
    let mut output = [0u8; 32];
    hasher.update(data);
    hasher.finalize(&mut output);
    output
}
