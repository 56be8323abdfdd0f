//! Session payload encryption
//!
//! AES-256-GCM under a per-session random key. The 12-byte nonce is
//! prepended to the ciphertext.

#![allow(deprecated)] // GenericArray::from_slice deprecated in generic-array 1.x

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use rand::RngCore;
use zeroize::Zeroizing;

use crate::error::{BridgeError, BridgeResult};

const NONCE_LEN: usize = 12;

/// Symmetric session key, wiped on drop
#[derive(Clone)]
pub struct SessionKey(Zeroizing<[u8; 32]>);

impl SessionKey {
    pub fn generate() -> Self {
        let mut key = Zeroizing::new([0u8; 32]);
        OsRng.fill_bytes(&mut key[..]);
        Self(key)
    }

    pub fn from_hex(hex_key: &str) -> BridgeResult<Self> {
        let bytes = Zeroizing::new(hex::decode(hex_key)?);
        let mut key = Zeroizing::new([0u8; 32]);
        if bytes.len() != key.len() {
            return Err(BridgeError::crypto_error("Session key must be 32 bytes"));
        }
        key.copy_from_slice(&bytes);
        Ok(Self(key))
    }

    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(&self.0[..]))
    }

    pub fn encrypt(&self, plaintext: &[u8]) -> BridgeResult<Vec<u8>> {
        let cipher = Aes256Gcm::new_from_slice(&self.0[..])
            .map_err(|e| BridgeError::crypto_error(format!("Failed to create cipher: {}", e)))?;

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
            .map_err(|e| BridgeError::crypto_error(format!("Encryption failed: {}", e)))?;

        let mut out = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    pub fn decrypt(&self, sealed: &[u8]) -> BridgeResult<Vec<u8>> {
        if sealed.len() <= NONCE_LEN {
            return Err(BridgeError::crypto_error("Ciphertext too short"));
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let cipher = Aes256Gcm::new_from_slice(&self.0[..])
            .map_err(|e| BridgeError::crypto_error(format!("Failed to create cipher: {}", e)))?;

        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| BridgeError::crypto_error("Decryption failed - wrong key or corrupted payload"))
    }
}

impl std::fmt::Debug for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SessionKey([REDACTED])")
    }
}
