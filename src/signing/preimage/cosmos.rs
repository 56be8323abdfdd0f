//! Cosmos Pre-Image Hashing
//!
//! Generates SIGN_MODE_DIRECT sign doc hashes for Cosmos SDK transactions,
//! including the Thorchain-style `/types.MsgSend` and `/types.MsgDeposit`
//! messages.

use crate::signing::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

pub const MSG_SEND_TYPE_URL: &str = "/cosmos.bank.v1beta1.MsgSend";
pub const THORCHAIN_MSG_SEND_TYPE_URL: &str = "/types.MsgSend";
pub const THORCHAIN_MSG_DEPOSIT_TYPE_URL: &str = "/types.MsgDeposit";
const SECP256K1_PUBKEY_TYPE_URL: &str = "/cosmos.crypto.secp256k1.PubKey";
const SIGN_MODE_DIRECT: u64 = 1;

/// Cosmos coin denomination and amount
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CosmosCoin {
    /// Denomination (e.g., "uatom", "rune")
    pub denom: String,
    /// Amount as string (to handle large values)
    pub amount: String,
}

/// Cosmos fee specification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CosmosFee {
    pub amount: Vec<CosmosCoin>,
    pub gas: u64,
}

/// Protobuf `Any`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CosmosAny {
    pub type_url: String,
    pub value: Vec<u8>,
}

/// Thorchain `common.Asset`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThorchainAsset {
    pub chain: String,
    pub symbol: String,
    pub ticker: String,
    pub synth: bool,
}

/// Thorchain `common.Coin`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThorchainCoin {
    pub asset: ThorchainAsset,
    pub amount: String,
    pub decimals: i64,
}

/// Unsigned Cosmos transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedCosmosTransaction {
    pub chain_id: String,
    pub messages: Vec<CosmosAny>,
    pub fee: CosmosFee,
    pub memo: String,
    pub account_number: u64,
    pub sequence: u64,
    /// Compressed secp256k1 key
    pub public_key: Vec<u8>,
}

/// Serialized `TxBody` and `AuthInfo`, the parts shared by `SignDoc` and `TxRaw`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CosmosTxParts {
    pub body_bytes: Vec<u8>,
    pub auth_info_bytes: Vec<u8>,
}

/// Encode body and auth info for a transaction
pub fn encode_tx_parts(tx: &UnsignedCosmosTransaction) -> EngineResult<CosmosTxParts> {
    if tx.messages.is_empty() {
        return Err(EngineError::InvalidTransaction("transaction has no messages".to_string()));
    }
    if tx.chain_id.is_empty() {
        return Err(EngineError::MissingField("chain_id".to_string()));
    }
    if tx.public_key.len() != 33 {
        return Err(EngineError::InvalidTransaction(format!(
            "expected 33-byte public key, got {}",
            tx.public_key.len()
        )));
    }

    Ok(CosmosTxParts {
        body_bytes: encode_tx_body(tx),
        auth_info_bytes: encode_auth_info(tx),
    })
}

/// `sha256(SignDoc{body_bytes, auth_info_bytes, chain_id, account_number})`
pub fn get_cosmos_sign_doc_hash(
    tx: &UnsignedCosmosTransaction,
    parts: &CosmosTxParts,
) -> [u8; 32] {
    let mut sign_doc = Vec::new();
    write_bytes_field(1, &parts.body_bytes, &mut sign_doc);
    write_bytes_field(2, &parts.auth_info_bytes, &mut sign_doc);
    write_bytes_field(3, tx.chain_id.as_bytes(), &mut sign_doc);
    write_varint_field(4, tx.account_number, &mut sign_doc);
    sha256(&sign_doc)
}

/// `TxRaw{body_bytes, auth_info_bytes, signatures}`
pub fn encode_tx_raw(parts: &CosmosTxParts, signatures: &[Vec<u8>]) -> Vec<u8> {
    let mut tx_raw = Vec::new();
    write_bytes_field(1, &parts.body_bytes, &mut tx_raw);
    write_bytes_field(2, &parts.auth_info_bytes, &mut tx_raw);
    for signature in signatures {
        write_bytes_field(3, signature, &mut tx_raw);
    }
    tx_raw
}

// =============================================================================
// Messages
// =============================================================================

/// `/cosmos.bank.v1beta1.MsgSend`
pub fn encode_msg_send(from: &str, to: &str, amounts: &[CosmosCoin]) -> CosmosAny {
    let mut value = Vec::new();
    write_bytes_field(1, from.as_bytes(), &mut value);
    write_bytes_field(2, to.as_bytes(), &mut value);
    for coin in amounts {
        write_bytes_field(3, &encode_coin(coin), &mut value);
    }
    CosmosAny {
        type_url: MSG_SEND_TYPE_URL.to_string(),
        value,
    }
}

/// `/types.MsgSend`, addresses as raw account bytes
pub fn encode_thorchain_msg_send(from: &[u8], to: &[u8], amounts: &[CosmosCoin]) -> CosmosAny {
    let mut value = Vec::new();
    write_bytes_field(1, from, &mut value);
    write_bytes_field(2, to, &mut value);
    for coin in amounts {
        write_bytes_field(3, &encode_coin(coin), &mut value);
    }
    CosmosAny {
        type_url: THORCHAIN_MSG_SEND_TYPE_URL.to_string(),
        value,
    }
}

/// `/types.MsgDeposit{coins, memo, signer}`
pub fn encode_thorchain_msg_deposit(coins: &[ThorchainCoin], memo: &str, signer: &[u8]) -> CosmosAny {
    let mut value = Vec::new();
    for coin in coins {
        let mut asset = Vec::new();
        write_bytes_field(1, coin.asset.chain.as_bytes(), &mut asset);
        write_bytes_field(2, coin.asset.symbol.as_bytes(), &mut asset);
        write_bytes_field(3, coin.asset.ticker.as_bytes(), &mut asset);
        if coin.asset.synth {
            write_varint_field(4, 1, &mut asset);
        }

        let mut encoded = Vec::new();
        write_bytes_field(1, &asset, &mut encoded);
        write_bytes_field(2, coin.amount.as_bytes(), &mut encoded);
        write_varint_field(3, coin.decimals as u64, &mut encoded);

        write_bytes_field(1, &encoded, &mut value);
    }
    write_bytes_field(2, memo.as_bytes(), &mut value);
    write_bytes_field(3, signer, &mut value);
    CosmosAny {
        type_url: THORCHAIN_MSG_DEPOSIT_TYPE_URL.to_string(),
        value,
    }
}

fn encode_coin(coin: &CosmosCoin) -> Vec<u8> {
    let mut out = Vec::new();
    write_bytes_field(1, coin.denom.as_bytes(), &mut out);
    write_bytes_field(2, coin.amount.as_bytes(), &mut out);
    out
}

// =============================================================================
// Envelope encoding
// =============================================================================

/// Encode TxBody protobuf
fn encode_tx_body(tx: &UnsignedCosmosTransaction) -> Vec<u8> {
    let mut body = Vec::new();

    // Field 1: messages (repeated Any)
    for msg in &tx.messages {
        write_bytes_field(1, &encode_any(&msg.type_url, &msg.value), &mut body);
    }

    // Field 2: memo
    write_bytes_field(2, tx.memo.as_bytes(), &mut body);

    body
}

/// Encode AuthInfo protobuf
fn encode_auth_info(tx: &UnsignedCosmosTransaction) -> Vec<u8> {
    let mut auth_info = Vec::new();
    write_bytes_field(1, &encode_signer_info(tx), &mut auth_info);
    write_bytes_field(2, &encode_fee(&tx.fee), &mut auth_info);
    auth_info
}

/// Encode SignerInfo protobuf
fn encode_signer_info(tx: &UnsignedCosmosTransaction) -> Vec<u8> {
    let mut signer_info = Vec::new();

    // Field 1: public_key (Any wrapping PubKey{key})
    let mut pk_proto = Vec::new();
    write_bytes_field(1, &tx.public_key, &mut pk_proto);
    write_bytes_field(1, &encode_any(SECP256K1_PUBKEY_TYPE_URL, &pk_proto), &mut signer_info);

    // Field 2: mode_info { single { mode: SIGN_MODE_DIRECT } }
    let mut single = Vec::new();
    write_varint_field(1, SIGN_MODE_DIRECT, &mut single);
    let mut mode_info = Vec::new();
    write_bytes_field(1, &single, &mut mode_info);
    write_bytes_field(2, &mode_info, &mut signer_info);

    // Field 3: sequence
    write_varint_field(3, tx.sequence, &mut signer_info);

    signer_info
}

/// Encode Fee protobuf
fn encode_fee(fee: &CosmosFee) -> Vec<u8> {
    let mut out = Vec::new();
    for coin in &fee.amount {
        write_bytes_field(1, &encode_coin(coin), &mut out);
    }
    write_varint_field(2, fee.gas, &mut out);
    out
}

fn encode_any(type_url: &str, value: &[u8]) -> Vec<u8> {
    let mut any = Vec::new();
    write_bytes_field(1, type_url.as_bytes(), &mut any);
    write_bytes_field(2, value, &mut any);
    any
}

/// Length-delimited field; proto3 omits empty values
fn write_bytes_field(field: u64, bytes: &[u8], buf: &mut Vec<u8>) {
    if bytes.is_empty() {
        return;
    }
    encode_varint(field << 3 | 2, buf);
    encode_varint(bytes.len() as u64, buf);
    buf.extend_from_slice(bytes);
}

/// Varint field; proto3 omits zero
fn write_varint_field(field: u64, value: u64, buf: &mut Vec<u8>) {
    if value == 0 {
        return;
    }
    encode_varint(field << 3, buf);
    encode_varint(value, buf);
}

/// Encode varint (protobuf base 128 varint)
pub fn encode_varint(mut value: u64, buf: &mut Vec<u8>) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}
