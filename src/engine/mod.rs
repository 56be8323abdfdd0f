//! Wire Encoding Engine seam
//!
//! The pipeline hands structured, chain-native inputs to an engine that knows
//! how to serialize them, which hashes need signing, and how to compile the
//! signed result. Engines report failure through a non-empty `error_message`
//! rather than a Rust error, mirroring foreign signing libraries.

pub mod native;

use serde::{Deserialize, Serialize};

use crate::signing::preimage::cosmos::{CosmosCoin, ThorchainCoin};
use crate::types::ChainFamily;

pub use native::NativeEngine;

// =============================================================================
// Structured inputs
// =============================================================================

/// EVM transfer body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EthereumTransfer {
    /// Native value transfer with optional calldata
    Transfer { amount: Vec<u8>, data: Vec<u8> },
    /// ERC-20 `transfer(to, amount)`; the envelope goes to the token contract
    Erc20Transfer { to: String, amount: Vec<u8> },
}

/// EIP-1559 input; numeric fields are big-endian byte strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EthereumSigningInput {
    pub chain_id: Vec<u8>,
    pub nonce: Vec<u8>,
    pub gas_limit: Vec<u8>,
    pub max_fee_per_gas: Vec<u8>,
    pub max_inclusion_fee_per_gas: Vec<u8>,
    /// Recipient for native transfers, contract for token transfers
    pub to_address: String,
    pub transfer: EthereumTransfer,
}

/// Spendable output with the script that locks it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoInput {
    /// Display-order transaction id
    pub txid: [u8; 32],
    pub vout: u32,
    pub amount: u64,
    pub script: Vec<u8>,
    pub sequence: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitcoinSigningInput {
    pub hash_type: u32,
    pub amount: u64,
    pub byte_fee: u64,
    pub to_script: Vec<u8>,
    pub change_script: Vec<u8>,
    pub dust_threshold: u64,
    pub utxos: Vec<UtxoInput>,
    /// Payload for an OP_RETURN output
    pub op_return: Option<Vec<u8>>,
}

/// One outgoing Cosmos-family message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CosmosMessage {
    /// `/cosmos.bank.v1beta1.MsgSend`
    Send {
        from_address: String,
        to_address: String,
        amounts: Vec<CosmosCoin>,
    },
    /// `/types.MsgSend` with decoded account bytes
    ThorchainSend {
        from_address: Vec<u8>,
        to_address: Vec<u8>,
        amounts: Vec<CosmosCoin>,
    },
    /// `/types.MsgDeposit`
    ThorchainDeposit {
        coins: Vec<ThorchainCoin>,
        memo: String,
        signer: Vec<u8>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CosmosSigningInput {
    pub chain_id: String,
    pub account_number: u64,
    pub sequence: u64,
    pub memo: String,
    pub fee_amounts: Vec<CosmosCoin>,
    pub gas: u64,
    pub public_key: Vec<u8>,
    pub messages: Vec<CosmosMessage>,
}

/// Structured input handed to the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SigningInput {
    Ethereum(EthereumSigningInput),
    Bitcoin(BitcoinSigningInput),
    Cosmos(CosmosSigningInput),
}

impl SigningInput {
    pub fn kind(&self) -> &'static str {
        match self {
            SigningInput::Ethereum(_) => "ethereum",
            SigningInput::Bitcoin(_) => "bitcoin",
            SigningInput::Cosmos(_) => "cosmos",
        }
    }
}

// =============================================================================
// Outputs
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreSigningOutput {
    pub wire_bytes: Vec<u8>,
    pub hashes: Vec<[u8; 32]>,
    pub error_message: String,
}

impl PreSigningOutput {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error_message: message.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledOutput {
    pub encoded: Vec<u8>,
    pub error_message: String,
}

impl CompiledOutput {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            error_message: message.into(),
            ..Default::default()
        }
    }
}

/// External cryptographic library serializing and compiling transactions
pub trait WireEncodingEngine: Send + Sync {
    fn compute_signing_hashes(&self, family: ChainFamily, input: &SigningInput) -> PreSigningOutput;

    fn compile_with_signatures(
        &self,
        family: ChainFamily,
        wire_bytes: &[u8],
        signatures: &[Vec<u8>],
        public_keys: &[Vec<u8>],
    ) -> CompiledOutput;
}

/// Big-endian bytes of an unsigned integer, leading zeros stripped
pub fn be_bytes(value: u128) -> Vec<u8> {
    let bytes = value.to_be_bytes();
    let leading_zeros = bytes.iter().take_while(|&&b| b == 0).count();
    bytes[leading_zeros..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_be_bytes() {
        assert_eq!(be_bytes(0), Vec::<u8>::new());
        assert_eq!(be_bytes(1), vec![1]);
        assert_eq!(be_bytes(0x0100), vec![1, 0]);
    }

    #[test]
    fn test_failed_outputs_carry_message() {
        assert_eq!(PreSigningOutput::failed("boom").error_message, "boom");
        assert!(CompiledOutput::failed("bad").encoded.is_empty());
    }
}
