//! Shared types for the signing pipeline

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::error::{BridgeError, BridgeResult};

// =============================================================================
// Chain identity
// =============================================================================

/// Group of chains sharing transaction and address encoding conventions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainFamily {
    Evm,
    Utxo,
    CosmosSdk,
    ThorchainLike,
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ChainFamily::Evm => "EVM",
            ChainFamily::Utxo => "UTXO",
            ChainFamily::CosmosSdk => "Cosmos-SDK",
            ChainFamily::ThorchainLike => "Thorchain-like",
        };
        write!(f, "{}", name)
    }
}

/// Immutable description of an asset on a chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDescriptor {
    pub family: ChainFamily,
    pub chain: String,
    pub ticker: String,
    pub decimals: u8,
    pub is_native: bool,
    /// Token contract, only set when `is_native` is false
    pub contract_address: Option<String>,
}

impl ChainDescriptor {
    /// Token on the same chain as this native descriptor
    pub fn token(&self, ticker: &str, decimals: u8, contract_address: &str) -> Self {
        Self {
            family: self.family,
            chain: self.chain.clone(),
            ticker: ticker.to_string(),
            decimals,
            is_native: false,
            contract_address: Some(contract_address.to_string()),
        }
    }
}

/// Vault public material, owned by the persistent store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VaultIdentity {
    pub name: String,
    /// Hex-encoded compressed secp256k1 key
    pub public_key_ecdsa: String,
    pub public_key_eddsa: String,
    pub hex_chain_code: String,
    pub local_party_id: String,
    /// Chain name -> hex-encoded derived public key
    #[serde(default)]
    pub derived_keys: HashMap<String, String>,
}

impl VaultIdentity {
    /// Derived key for a chain, falling back to the root ECDSA key
    pub fn public_key_for(&self, chain: &str) -> &str {
        self.derived_keys
            .get(chain)
            .map(String::as_str)
            .unwrap_or(&self.public_key_ecdsa)
    }
}

/// A wallet-style request, consumed once by the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionIntent {
    pub from: String,
    pub to: Option<String>,
    /// Amount in the asset's smallest unit
    pub amount: Option<u128>,
    pub data: Option<Vec<u8>>,
    #[serde(default)]
    pub is_deposit: bool,
    pub chain: ChainDescriptor,
}

// =============================================================================
// Signing payload
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coin {
    pub family: ChainFamily,
    pub chain: String,
    pub ticker: String,
    pub decimals: u8,
    pub address: String,
    pub hex_public_key: String,
    pub is_native: bool,
    pub contract_address: Option<String>,
}

/// Memo carried alongside the transfer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Memo {
    Text(String),
    Raw(Vec<u8>),
}

impl Memo {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Memo::Text(text) => text.as_bytes(),
            Memo::Raw(bytes) => bytes,
        }
    }

    /// Memo as a string, hex-encoding raw bytes
    pub fn to_text(&self) -> String {
        match self {
            Memo::Text(text) => text.clone(),
            Memo::Raw(bytes) => format!("0x{}", hex::encode(bytes)),
        }
    }
}

/// Unspent output as reported by an indexer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentOutput {
    /// Transaction id in display (big-endian) hex
    pub txid: String,
    pub vout: u32,
    pub value: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvmParams {
    pub nonce: u64,
    pub gas_limit: u64,
    pub max_fee_per_gas_wei: u128,
    pub priority_fee_wei: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UtxoParams {
    pub unspent_inputs: Vec<UnspentOutput>,
    pub byte_fee: u64,
    pub change_address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CosmosMessageKind {
    BankSend,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CosmosParams {
    pub account_number: u64,
    pub sequence: u64,
    pub gas_units: u64,
    pub message_kind: CosmosMessageKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThorchainParams {
    pub account_number: u64,
    pub sequence: u64,
    pub is_deposit: bool,
    pub fee_units: u64,
}

/// Family-tagged chain state gathered by the payload builder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "family", rename_all = "snake_case")]
pub enum BlockchainSpecific {
    Evm(EvmParams),
    Utxo(UtxoParams),
    Cosmos(CosmosParams),
    Thorchain(ThorchainParams),
}

impl BlockchainSpecific {
    pub fn family(&self) -> ChainFamily {
        match self {
            BlockchainSpecific::Evm(_) => ChainFamily::Evm,
            BlockchainSpecific::Utxo(_) => ChainFamily::Utxo,
            BlockchainSpecific::Cosmos(_) => ChainFamily::CosmosSdk,
            BlockchainSpecific::Thorchain(_) => ChainFamily::ThorchainLike,
        }
    }
}

/// Canonical, family-tagged transaction description prior to wire encoding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningPayload {
    pub coin: Coin,
    pub to_address: String,
    pub to_amount: u128,
    pub memo: Option<Memo>,
    pub blockchain_specific: BlockchainSpecific,
    pub vault_public_key_ecdsa: String,
    pub vault_local_party_id: String,
}

impl SigningPayload {
    /// Variant tag must match the coin's family
    pub fn validate(&self) -> BridgeResult<()> {
        if self.blockchain_specific.family() != self.coin.family {
            return Err(BridgeError::internal(format!(
                "{} payload carries {} chain state",
                self.coin.family,
                self.blockchain_specific.family()
            )));
        }
        Ok(())
    }

    /// Compressed public key bytes for the sending coin
    pub fn public_key_bytes(&self) -> BridgeResult<Vec<u8>> {
        let bytes = hex::decode(self.coin.hex_public_key.trim_start_matches("0x"))?;
        if bytes.len() != 33 {
            return Err(BridgeError::malformed_intent(format!(
                "Expected 33-byte compressed public key, got {} bytes",
                bytes.len()
            )));
        }
        Ok(bytes)
    }
}

// =============================================================================
// Signing artifacts
// =============================================================================

/// Unsigned wire bytes plus the ordered hashes that must be signed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreSignArtifact {
    pub family: ChainFamily,
    pub wire_bytes: Vec<u8>,
    pub signing_hashes: Vec<[u8; 32]>,
}

impl PreSignArtifact {
    /// Hex of the first hash, used as the relay completion key
    pub fn primary_hash_hex(&self) -> Option<String> {
        self.signing_hashes.first().map(hex::encode)
    }

    pub fn hash_hexes(&self) -> Vec<String> {
        self.signing_hashes.iter().map(hex::encode).collect()
    }
}

/// Signature returned by the co-signing parties
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Signature {
    Ecdsa {
        r: [u8; 32],
        s: [u8; 32],
        recovery_id: u8,
    },
    Message { blob: Vec<u8> },
}

impl Signature {
    /// 64-byte `r || s`
    pub fn compact(&self) -> Option<[u8; 64]> {
        match self {
            Signature::Ecdsa { r, s, .. } => {
                let mut out = [0u8; 64];
                out[..32].copy_from_slice(r);
                out[32..].copy_from_slice(s);
                Some(out)
            }
            Signature::Message { .. } => None,
        }
    }
}

/// Signatures keyed by lowercase hex of the signed hash
pub type SignatureSet = BTreeMap<String, Signature>;

/// Final transaction identity and, where rebuilt locally, the signed bytes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalizedTransaction {
    pub tx_hash: String,
    pub raw_bytes: Option<Vec<u8>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_payload() -> SigningPayload {
        SigningPayload {
            coin: Coin {
                family: ChainFamily::Evm,
                chain: "Ethereum".to_string(),
                ticker: "ETH".to_string(),
                decimals: 18,
                address: "0x0000000000000000000000000000000000000001".to_string(),
                hex_public_key: format!("02{}", "11".repeat(32)),
                is_native: true,
                contract_address: None,
            },
            to_address: "0x0000000000000000000000000000000000000002".to_string(),
            to_amount: 1,
            memo: None,
            blockchain_specific: BlockchainSpecific::Evm(EvmParams {
                nonce: 0,
                gas_limit: 600_000,
                max_fee_per_gas_wei: 1,
                priority_fee_wei: 1,
            }),
            vault_public_key_ecdsa: String::new(),
            vault_local_party_id: String::new(),
        }
    }

    #[test]
    fn test_payload_family_mismatch() {
        let mut payload = sample_payload();
        assert!(payload.validate().is_ok());

        payload.blockchain_specific = BlockchainSpecific::Cosmos(CosmosParams {
            account_number: 1,
            sequence: 1,
            gas_units: 200_000,
            message_kind: CosmosMessageKind::BankSend,
        });
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_public_key_length_checked() {
        let mut payload = sample_payload();
        assert_eq!(payload.public_key_bytes().unwrap().len(), 33);

        payload.coin.hex_public_key = "0203".to_string();
        assert!(payload.public_key_bytes().is_err());
    }

    #[test]
    fn test_vault_key_fallback() {
        let mut vault = VaultIdentity {
            public_key_ecdsa: "root".to_string(),
            ..Default::default()
        };
        assert_eq!(vault.public_key_for("Bitcoin"), "root");

        vault.derived_keys.insert("Bitcoin".to_string(), "derived".to_string());
        assert_eq!(vault.public_key_for("Bitcoin"), "derived");
    }

    #[test]
    fn test_memo_text_roundtrip() {
        assert_eq!(Memo::Text("hi".into()).as_bytes(), b"hi");
        assert_eq!(Memo::Raw(vec![0xab]).to_text(), "0xab");
    }
}
