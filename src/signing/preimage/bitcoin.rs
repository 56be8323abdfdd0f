//! Bitcoin-family Pre-Image Hashing
//!
//! Generates sighashes for UTXO transaction inputs.
//! Supports legacy P2PKH, BIP-143 SegWit v0, and the BIP-143 style
//! fork-id digest used by Bitcoin Cash.

use crate::signing::{EngineError, EngineResult};
use bitcoin::hashes::{sha256d, Hash};
use serde::{Deserialize, Serialize};

/// Sighash flags produced by this engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BitcoinSigHashType {
    /// Sign all inputs and all outputs
    All = 0x01,
    /// SIGHASH_ALL | SIGHASH_FORKID (Bitcoin Cash replay protection)
    AllForkId = 0x41,
}

impl BitcoinSigHashType {
    pub fn to_byte(&self) -> u8 {
        *self as u8
    }

    pub fn from_u32(value: u32) -> Option<Self> {
        match value {
            0x01 => Some(Self::All),
            0x41 => Some(Self::AllForkId),
            _ => None,
        }
    }

    pub fn is_fork_id(&self) -> bool {
        (*self as u8) & 0x40 != 0
    }
}

/// Type of input being spent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BitcoinInputType {
    /// Legacy P2PKH
    P2PKH,
    /// Native SegWit P2WPKH
    P2WPKH,
}

impl BitcoinInputType {
    pub fn is_segwit(&self) -> bool {
        matches!(self, Self::P2WPKH)
    }
}

/// Transaction input for sighash calculation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitcoinInput {
    /// Previous transaction id, display (big-endian) order
    pub txid: [u8; 32],
    /// Output index in previous transaction
    pub vout: u32,
    /// Script code for signing (always the P2PKH form of the key hash)
    pub script_code: Vec<u8>,
    /// Value in satoshis
    pub value: u64,
    /// Sequence number
    pub sequence: u32,
    /// Input type
    pub input_type: BitcoinInputType,
}

/// Transaction output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BitcoinOutput {
    /// Value in satoshis
    pub value: u64,
    /// Output script (scriptPubKey)
    pub script_pubkey: Vec<u8>,
}

/// Unsigned transaction for pre-image generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedBitcoinTransaction {
    /// Transaction version
    pub version: i32,
    /// Transaction inputs
    pub inputs: Vec<BitcoinInput>,
    /// Transaction outputs
    pub outputs: Vec<BitcoinOutput>,
    /// Locktime
    pub locktime: u32,
}

impl UnsignedBitcoinTransaction {
    pub fn has_witness(&self) -> bool {
        self.inputs.iter().any(|i| i.input_type.is_segwit())
    }
}

/// Work out the input type and script code from the output's locking script
pub fn classify_locking_script(script: &[u8]) -> EngineResult<(BitcoinInputType, Vec<u8>)> {
    // OP_0 <20 bytes>
    if script.len() == 22 && script[0] == 0x00 && script[1] == 0x14 {
        return Ok((BitcoinInputType::P2WPKH, p2pkh_script(&script[2..22])));
    }
    // OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG
    if script.len() == 25
        && script[0] == 0x76
        && script[1] == 0xa9
        && script[2] == 0x14
        && script[23] == 0x88
        && script[24] == 0xac
    {
        return Ok((BitcoinInputType::P2PKH, script.to_vec()));
    }
    Err(EngineError::InvalidTransaction(format!(
        "unsupported locking script {}",
        hex::encode(script)
    )))
}

/// `OP_DUP OP_HASH160 <hash> OP_EQUALVERIFY OP_CHECKSIG`
pub fn p2pkh_script(pubkey_hash: &[u8]) -> Vec<u8> {
    let mut script = Vec::with_capacity(25);
    script.extend_from_slice(&[0x76, 0xa9, 0x14]);
    script.extend_from_slice(pubkey_hash);
    script.extend_from_slice(&[0x88, 0xac]);
    script
}

/// Get sighashes for all inputs, in input order
pub fn get_bitcoin_sighashes(
    tx: &UnsignedBitcoinTransaction,
    sighash_type: BitcoinSigHashType,
) -> EngineResult<Vec<[u8; 32]>> {
    if tx.inputs.is_empty() {
        return Err(EngineError::InvalidTransaction("transaction has no inputs".to_string()));
    }

    let mut hashes = Vec::with_capacity(tx.inputs.len());
    for (index, input) in tx.inputs.iter().enumerate() {
        let hash = if input.input_type.is_segwit() || sighash_type.is_fork_id() {
            get_bip143_sighash(tx, index, sighash_type)?
        } else {
            get_legacy_sighash(tx, index, sighash_type)?
        };
        hashes.push(hash);
    }
    Ok(hashes)
}

/// Calculate legacy (pre-SegWit) SIGHASH_ALL digest
fn get_legacy_sighash(
    tx: &UnsignedBitcoinTransaction,
    input_index: usize,
    sighash_type: BitcoinSigHashType,
) -> EngineResult<[u8; 32]> {
    if input_index >= tx.inputs.len() {
        return Err(EngineError::InvalidInputIndex(input_index));
    }

    let mut serialized = Vec::new();
    serialized.extend_from_slice(&tx.version.to_le_bytes());

    write_var_int(tx.inputs.len() as u64, &mut serialized);
    for (i, input) in tx.inputs.iter().enumerate() {
        write_outpoint(input, &mut serialized);

        // Script only for the input being signed
        if i == input_index {
            write_var_int(input.script_code.len() as u64, &mut serialized);
            serialized.extend_from_slice(&input.script_code);
        } else {
            serialized.push(0x00);
        }

        serialized.extend_from_slice(&input.sequence.to_le_bytes());
    }

    write_outputs(&tx.outputs, &mut serialized);
    serialized.extend_from_slice(&tx.locktime.to_le_bytes());
    serialized.extend_from_slice(&(sighash_type.to_byte() as u32).to_le_bytes());

    Ok(sha256d::Hash::hash(&serialized).to_byte_array())
}

/// Calculate BIP-143 digest (SegWit v0, or BCH with SIGHASH_FORKID)
fn get_bip143_sighash(
    tx: &UnsignedBitcoinTransaction,
    input_index: usize,
    sighash_type: BitcoinSigHashType,
) -> EngineResult<[u8; 32]> {
    let input = tx
        .inputs
        .get(input_index)
        .ok_or(EngineError::InvalidInputIndex(input_index))?;

    let mut prevouts = Vec::with_capacity(tx.inputs.len() * 36);
    let mut sequences = Vec::with_capacity(tx.inputs.len() * 4);
    for inp in &tx.inputs {
        write_outpoint(inp, &mut prevouts);
        sequences.extend_from_slice(&inp.sequence.to_le_bytes());
    }

    let mut outputs = Vec::new();
    for out in &tx.outputs {
        write_output(out, &mut outputs);
    }

    let mut serialized = Vec::new();
    // 1. version
    serialized.extend_from_slice(&tx.version.to_le_bytes());
    // 2. hashPrevouts
    serialized.extend_from_slice(&sha256d::Hash::hash(&prevouts).to_byte_array());
    // 3. hashSequence
    serialized.extend_from_slice(&sha256d::Hash::hash(&sequences).to_byte_array());
    // 4. outpoint
    write_outpoint(input, &mut serialized);
    // 5. scriptCode
    write_var_int(input.script_code.len() as u64, &mut serialized);
    serialized.extend_from_slice(&input.script_code);
    // 6. value
    serialized.extend_from_slice(&input.value.to_le_bytes());
    // 7. nSequence
    serialized.extend_from_slice(&input.sequence.to_le_bytes());
    // 8. hashOutputs
    serialized.extend_from_slice(&sha256d::Hash::hash(&outputs).to_byte_array());
    // 9. locktime
    serialized.extend_from_slice(&tx.locktime.to_le_bytes());
    // 10. sighash type
    serialized.extend_from_slice(&(sighash_type.to_byte() as u32).to_le_bytes());

    Ok(sha256d::Hash::hash(&serialized).to_byte_array())
}

/// txid (internal byte order) + vout
pub(crate) fn write_outpoint(input: &BitcoinInput, buf: &mut Vec<u8>) {
    let mut txid = input.txid;
    txid.reverse();
    buf.extend_from_slice(&txid);
    buf.extend_from_slice(&input.vout.to_le_bytes());
}

pub(crate) fn write_output(output: &BitcoinOutput, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&output.value.to_le_bytes());
    write_var_int(output.script_pubkey.len() as u64, buf);
    buf.extend_from_slice(&output.script_pubkey);
}

pub(crate) fn write_outputs(outputs: &[BitcoinOutput], buf: &mut Vec<u8>) {
    write_var_int(outputs.len() as u64, buf);
    for output in outputs {
        write_output(output, buf);
    }
}

/// Bitcoin CompactSize
pub fn write_var_int(value: u64, buf: &mut Vec<u8>) {
    if value < 0xfd {
        buf.push(value as u8);
    } else if value <= 0xffff {
        buf.push(0xfd);
        buf.extend_from_slice(&(value as u16).to_le_bytes());
    } else if value <= 0xffff_ffff {
        buf.push(0xfe);
        buf.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        buf.push(0xff);
        buf.extend_from_slice(&value.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tx(input_type: BitcoinInputType) -> UnsignedBitcoinTransaction {
        let script_code = p2pkh_script(&[0x11; 20]);
        UnsignedBitcoinTransaction {
            version: 2,
            inputs: vec![
                BitcoinInput {
                    txid: [0xab; 32],
                    vout: 0,
                    script_code: script_code.clone(),
                    value: 100_000,
                    sequence: 0xffff_fffd,
                    input_type,
                },
                BitcoinInput {
                    txid: [0xcd; 32],
                    vout: 1,
                    script_code,
                    value: 50_000,
                    sequence: 0xffff_fffd,
                    input_type,
                },
            ],
            outputs: vec![BitcoinOutput {
                value: 120_000,
                script_pubkey: vec![0x00, 0x14, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22,
                    0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22, 0x22],
            }],
            locktime: 0,
        }
    }

    #[test]
    fn test_one_hash_per_input() {
        let tx = sample_tx(BitcoinInputType::P2WPKH);
        let hashes = get_bitcoin_sighashes(&tx, BitcoinSigHashType::All).unwrap();
        assert_eq!(hashes.len(), 2);
        assert_ne!(hashes[0], hashes[1]);
    }

    #[test]
    fn test_fork_id_changes_digest() {
        let tx = sample_tx(BitcoinInputType::P2PKH);
        let legacy = get_bitcoin_sighashes(&tx, BitcoinSigHashType::All).unwrap();
        let fork_id = get_bitcoin_sighashes(&tx, BitcoinSigHashType::AllForkId).unwrap();
        assert_ne!(legacy[0], fork_id[0]);
    }

    #[test]
    fn test_empty_inputs_rejected() {
        let mut tx = sample_tx(BitcoinInputType::P2PKH);
        tx.inputs.clear();
        assert!(get_bitcoin_sighashes(&tx, BitcoinSigHashType::All).is_err());
    }

    #[test]
    fn test_classify_locking_script() {
        let mut p2wpkh = vec![0x00, 0x14];
        p2wpkh.extend_from_slice(&[0x33; 20]);
        let (kind, code) = classify_locking_script(&p2wpkh).unwrap();
        assert_eq!(kind, BitcoinInputType::P2WPKH);
        assert_eq!(code, p2pkh_script(&[0x33; 20]));

        let p2pkh = p2pkh_script(&[0x44; 20]);
        let (kind, code) = classify_locking_script(&p2pkh).unwrap();
        assert_eq!(kind, BitcoinInputType::P2PKH);
        assert_eq!(code, p2pkh);

        assert!(classify_locking_script(&[0x6a]).is_err());
    }

    #[test]
    fn test_write_var_int() {
        let mut buf = Vec::new();
        write_var_int(0xfc, &mut buf);
        assert_eq!(buf, vec![0xfc]);

        buf.clear();
        write_var_int(0xfd, &mut buf);
        assert_eq!(buf, vec![0xfd, 0xfd, 0x00]);

        buf.clear();
        write_var_int(0x1_0000, &mut buf);
        assert_eq!(buf, vec![0xfe, 0x00, 0x00, 0x01, 0x00]);
    }

    #[test]
    fn test_sighash_flags() {
        assert_eq!(BitcoinSigHashType::from_u32(0x41), Some(BitcoinSigHashType::AllForkId));
        assert!(BitcoinSigHashType::AllForkId.is_fork_id());
        assert!(!BitcoinSigHashType::All.is_fork_id());
        assert_eq!(BitcoinSigHashType::from_u32(0x02), None);
    }
}
