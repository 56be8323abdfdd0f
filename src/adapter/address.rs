//! Address decoding for the wire adapters
//!
//! Turns the address strings carried by a payload into the byte forms the
//! engine needs: 20-byte EVM addresses, UTXO locking scripts and bech32
//! account bytes. Malformed addresses are `ErrorCode::MalformedIntent`.

use bech32::{FromBase32, Variant};
use bitcoin::hashes::{hash160, sha256d, Hash};
use bitcoin::opcodes::all::OP_PUSHNUM_1;
use bitcoin::script::Builder;
use bitcoin::{PubkeyHash, ScriptBuf, ScriptHash, WPubkeyHash, WScriptHash};

use crate::chains::table::{UtxoProfile, UtxoScriptKind};
use crate::error::{BridgeError, BridgeResult};

const CASHADDR_CHARSET: &[u8] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Decode a `0x`-prefixed 20-byte hex address
pub fn evm_address(address: &str) -> BridgeResult<[u8; 20]> {
    let trimmed = address.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| invalid(address, "missing 0x prefix"))?;
    let bytes = hex::decode(digits).map_err(|_| invalid(address, "not hex"))?;
    bytes.try_into().map_err(|_| invalid(address, "not 20 bytes"))
}

/// Locking script paying to `address` on a UTXO chain
pub fn utxo_script(address: &str, profile: &UtxoProfile) -> BridgeResult<Vec<u8>> {
    let trimmed = address.trim();
    let lower = trimmed.to_lowercase();

    if let Some(hrp) = profile.bech32_hrp {
        if lower.starts_with(&format!("{}1", hrp)) {
            return segwit_script(&lower, hrp);
        }
    }
    if let Some(prefix) = profile.cash_addr_prefix {
        let qualified = if lower.contains(':') {
            lower.clone()
        } else {
            format!("{}:{}", prefix, lower)
        };
        if qualified.starts_with(&format!("{}:", prefix)) && !looks_like_base58(trimmed) {
            return cash_address_script(&qualified, prefix);
        }
    }
    base58_script(trimmed, profile)
}

/// Script locking outputs to the holder of `public_key`
pub fn own_script(public_key: &[u8], profile: &UtxoProfile) -> Vec<u8> {
    let hash = hash160::Hash::hash(public_key).to_byte_array();
    match profile.script {
        UtxoScriptKind::SegwitV0 => p2wpkh(&hash),
        UtxoScriptKind::Legacy => p2pkh(&hash),
    }
}

/// 20-byte account for a bech32 Cosmos-family address
pub fn bech32_account(address: &str, hrp: &str) -> BridgeResult<Vec<u8>> {
    let (decoded_hrp, data, _variant) =
        bech32::decode(address.trim()).map_err(|e| invalid(address, &e.to_string()))?;
    if decoded_hrp != hrp {
        return Err(invalid(address, &format!("expected prefix {}", hrp)));
    }
    let bytes = Vec::<u8>::from_base32(&data).map_err(|e| invalid(address, &e.to_string()))?;
    if bytes.len() != 20 {
        return Err(invalid(address, "account is not 20 bytes"));
    }
    Ok(bytes)
}

/// CashAddr for a pubkey hash, `prefix:q…`
pub fn cash_address(prefix: &str, pubkey_hash: &[u8; 20]) -> String {
    let mut payload = vec![0u8];
    payload.extend_from_slice(pubkey_hash);
    let data = convert_bits(&payload, 8, 5, true);

    let mut values = prefix_values(prefix);
    values.extend_from_slice(&data);
    values.extend_from_slice(&[0u8; 8]);
    let checksum = polymod(&values) ^ 1;

    let mut encoded: String = data.iter().map(|&b| CASHADDR_CHARSET[b as usize] as char).collect();
    for i in 0..8 {
        let value = ((checksum >> (5 * (7 - i))) & 0x1f) as usize;
        encoded.push(CASHADDR_CHARSET[value] as char);
    }
    format!("{}:{}", prefix, encoded)
}

fn segwit_script(address: &str, hrp: &str) -> BridgeResult<Vec<u8>> {
    let (decoded_hrp, data, variant) = bech32::decode(address).map_err(|e| invalid(address, &e.to_string()))?;
    if decoded_hrp != hrp || data.is_empty() {
        return Err(invalid(address, "wrong network"));
    }
    let version = data[0].to_u8();
    let program = Vec::<u8>::from_base32(&data[1..]).map_err(|e| invalid(address, &e.to_string()))?;

    let script = match (version, variant, program.len()) {
        (0, Variant::Bech32, 20) => ScriptBuf::new_p2wpkh(&WPubkeyHash::from_byte_array(fixed(address, &program)?)),
        (0, Variant::Bech32, 32) => ScriptBuf::new_p2wsh(&WScriptHash::from_byte_array(fixed(address, &program)?)),
        (1, Variant::Bech32m, 32) => Builder::new()
            .push_opcode(OP_PUSHNUM_1)
            .push_slice(fixed::<32>(address, &program)?)
            .into_script(),
        _ => return Err(invalid(address, "unsupported witness program")),
    };
    Ok(script.into_bytes())
}

fn base58_script(address: &str, profile: &UtxoProfile) -> BridgeResult<Vec<u8>> {
    let decoded = bs58::decode(address)
        .into_vec()
        .map_err(|_| invalid(address, "not base58"))?;
    if decoded.len() != 25 {
        return Err(invalid(address, "wrong length"));
    }
    let (payload, checksum) = decoded.split_at(21);
    if sha256d::Hash::hash(payload).to_byte_array()[..4] != *checksum {
        return Err(invalid(address, "bad checksum"));
    }

    let hash = fixed(address, &payload[1..])?;
    match payload[0] {
        v if v == profile.p2pkh_version => Ok(p2pkh(&hash)),
        v if v == profile.p2sh_version => Ok(p2sh(&hash)),
        v => Err(invalid(address, &format!("unknown version byte {:#04x}", v))),
    }
}

fn cash_address_script(address: &str, prefix: &str) -> BridgeResult<Vec<u8>> {
    let body = &address[prefix.len() + 1..];
    let data = body
        .bytes()
        .map(|c| {
            CASHADDR_CHARSET
                .iter()
                .position(|&x| x == c)
                .map(|p| p as u8)
                .ok_or_else(|| invalid(address, "invalid character"))
        })
        .collect::<BridgeResult<Vec<u8>>>()?;
    if data.len() < 9 {
        return Err(invalid(address, "too short"));
    }

    let mut values = prefix_values(prefix);
    values.extend_from_slice(&data);
    if polymod(&values) != 1 {
        return Err(invalid(address, "bad checksum"));
    }

    let payload = convert_bits(&data[..data.len() - 8], 5, 8, false);
    if payload.len() != 21 {
        return Err(invalid(address, "unsupported hash size"));
    }
    let hash = fixed(address, &payload[1..])?;
    match payload[0] >> 3 {
        0 => Ok(p2pkh(&hash)),
        1 => Ok(p2sh(&hash)),
        _ => Err(invalid(address, "unknown address type")),
    }
}

fn looks_like_base58(address: &str) -> bool {
    matches!(address.chars().next(), Some('1') | Some('3'))
}

fn p2pkh(hash: &[u8; 20]) -> Vec<u8> {
    ScriptBuf::new_p2pkh(&PubkeyHash::from_byte_array(*hash)).into_bytes()
}

fn p2sh(hash: &[u8; 20]) -> Vec<u8> {
    ScriptBuf::new_p2sh(&ScriptHash::from_byte_array(*hash)).into_bytes()
}

fn p2wpkh(hash: &[u8; 20]) -> Vec<u8> {
    ScriptBuf::new_p2wpkh(&WPubkeyHash::from_byte_array(*hash)).into_bytes()
}

fn fixed<const N: usize>(address: &str, bytes: &[u8]) -> BridgeResult<[u8; N]> {
    bytes.try_into().map_err(|_| invalid(address, "unexpected hash length"))
}

fn prefix_values(prefix: &str) -> Vec<u8> {
    let mut values: Vec<u8> = prefix.bytes().map(|c| c & 0x1f).collect();
    values.push(0);
    values
}

fn convert_bits(data: &[u8], from_bits: u32, to_bits: u32, pad: bool) -> Vec<u8> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut result = Vec::new();
    let max_value = (1u32 << to_bits) - 1;

    for &value in data {
        acc = (acc << from_bits) | value as u32;
        bits += from_bits;
        while bits >= to_bits {
            bits -= to_bits;
            result.push(((acc >> bits) & max_value) as u8);
        }
    }
    if pad && bits > 0 {
        result.push(((acc << (to_bits - bits)) & max_value) as u8);
    }
    result
}

/// CashAddr BCH-code checksum
fn polymod(values: &[u8]) -> u64 {
    const GENERATORS: [u64; 5] = [0x98f2bc8e61, 0x79b76d99e2, 0xf33e5fb3c4, 0xae2eabe2a8, 0x1e4f43e470];

    let mut c: u64 = 1;
    for &v in values {
        let c0 = c >> 35;
        c = ((c & 0x07ffffffff) << 5) ^ v as u64;
        for (i, &gen) in GENERATORS.iter().enumerate() {
            if (c0 >> i) & 1 != 0 {
                c ^= gen;
            }
        }
    }
    c
}

fn invalid(address: &str, reason: &str) -> BridgeError {
    BridgeError::malformed_intent(format!("Invalid address: {}", reason)).with_details(address.to_string())
}
