//! Personal-message signatures

use crate::signing::preimage::ethereum::keccak256;
use crate::types::Signature;

const EIP191_PREFIX: &str = "\x19Ethereum Signed Message:\n";

/// keccak256 of the EIP-191 prefixed message
pub fn eip191_hash(message: &[u8]) -> [u8; 32] {
    let mut prefixed = format!("{}{}", EIP191_PREFIX, message.len()).into_bytes();
    prefixed.extend_from_slice(message);
    keccak256(&prefixed)
}

/// Bytes a co-signer signs for a published message: `0x`-hex is decoded,
/// anything else is taken as UTF-8
pub fn message_bytes(message: &str) -> Vec<u8> {
    message
        .strip_prefix("0x")
        .and_then(|h| hex::decode(h).ok())
        .unwrap_or_else(|| message.as_bytes().to_vec())
}

/// Completion key for a published custom message
pub fn custom_message_hash(message: &str) -> [u8; 32] {
    eip191_hash(&message_bytes(message))
}

/// `0x`-hex of `r || s || v` with `v` in the 27/28 form, or the blob verbatim
pub fn signature_hex(signature: &Signature) -> String {
    match signature {
        Signature::Ecdsa { r, s, recovery_id } => {
            let v = if *recovery_id < 27 { recovery_id + 27 } else { *recovery_id };
            let mut bytes = Vec::with_capacity(65);
            bytes.extend_from_slice(r);
            bytes.extend_from_slice(s);
            bytes.push(v);
            format!("0x{}", hex::encode(bytes))
        }
        Signature::Message { blob } => format!("0x{}", hex::encode(blob)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eip191_hello_world() {
        assert_eq!(
            hex::encode(eip191_hash(b"hello world")),
            "d9eba16ed0ecae432b71fe008c98cc872bb4cc214d3220a36f365326cf807d68"
        );
    }

    #[test]
    fn test_message_bytes() {
        assert_eq!(message_bytes("0x6869"), b"hi");
        assert_eq!(message_bytes("hi"), b"hi");
        assert_eq!(message_bytes("0xnothex"), b"0xnothex");
    }

    #[test]
    fn test_hex_message_hashes_decoded_bytes() {
        assert_eq!(custom_message_hash("0x68656c6c6f20776f726c64"), eip191_hash(b"hello world"));
        assert_eq!(custom_message_hash("hello world"), eip191_hash(b"hello world"));
    }

    #[test]
    fn test_signature_hex() {
        let sig = Signature::Ecdsa {
            r: [1; 32],
            s: [2; 32],
            recovery_id: 1,
        };
        let hex = signature_hex(&sig);
        assert_eq!(hex.len(), 2 + 130);
        assert!(hex.ends_with("1c"));

        assert_eq!(signature_hex(&Signature::Message { blob: vec![0xab, 0xcd] }), "0xabcd");
    }
}
