//! Passphrase-based encryption of individual entry values
//!
//! Only entry values are ever encrypted; group and entry names stay readable.
//! The default [`PassphraseCipher`] derives a 256-bit key with
//! PBKDF2-HMAC-SHA256 from the passphrase and a random per-value salt, then
//! seals the value with AES-256-GCM. The stored text is
//! `base64(salt || nonce || ciphertext)`.

use crate::error::{Result, StoreError};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::Sha256;
use std::fmt;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Iteration count used by [`PassphraseCipher::default`].
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// A symmetric, passphrase-keyed transformation of text.
pub trait Cipher: Send + Sync {
    fn protect(&self, plain_text: &str, passphrase: &str) -> Result<String>;

    fn reveal(&self, cipher_text: &str, passphrase: &str) -> Result<String>;
}

/// PBKDF2-HMAC-SHA256 key derivation with AES-256-GCM sealing.
#[derive(Clone, Debug)]
pub struct PassphraseCipher {
    iterations: u32,
}

impl Default for PassphraseCipher {
    fn default() -> Self {
        Self::new(DEFAULT_ITERATIONS)
    }
}

impl PassphraseCipher {
    pub fn new(iterations: u32) -> Self {
        Self {
            iterations: iterations.max(1),
        }
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    fn derive_key(&self, passphrase: &str, salt: &[u8]) -> Result<[u8; KEY_LEN]> {
        let mut key = [0u8; KEY_LEN];
        pbkdf2::pbkdf2::<hmac::Hmac<Sha256>>(passphrase.as_bytes(), salt, self.iterations, &mut key)
            .map_err(|e| StoreError::Cipher(format!("key derivation failed: {}", e)))?;
        Ok(key)
    }
}

impl Cipher for PassphraseCipher {
    fn protect(&self, plain_text: &str, passphrase: &str) -> Result<String> {
        let mut salt = [0u8; SALT_LEN];
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut salt);
        OsRng.fill_bytes(&mut nonce_bytes);

        let key = self.derive_key(passphrase, &salt)?;
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| StoreError::Cipher(format!("failed to create cipher: {}", e)))?;
        let sealed = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plain_text.as_bytes())
            .map_err(|e| StoreError::Cipher(format!("encryption failed: {}", e)))?;

        let mut payload = Vec::with_capacity(SALT_LEN + NONCE_LEN + sealed.len());
        payload.extend_from_slice(&salt);
        payload.extend_from_slice(&nonce_bytes);
        payload.extend_from_slice(&sealed);
        Ok(STANDARD.encode(payload))
    }

    fn reveal(&self, cipher_text: &str, passphrase: &str) -> Result<String> {
        let payload = STANDARD
            .decode(cipher_text.trim())
            .map_err(|e| StoreError::Cipher(format!("invalid cipher text: {}", e)))?;
        if payload.len() < SALT_LEN + NONCE_LEN {
            return Err(StoreError::Cipher("cipher text too short".to_string()));
        }

        let (salt, rest) = payload.split_at(SALT_LEN);
        let (nonce_bytes, sealed) = rest.split_at(NONCE_LEN);

        let key = self.derive_key(passphrase, salt)?;
        let cipher = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| StoreError::Cipher(format!("failed to create cipher: {}", e)))?;
        let plain = cipher
            .decrypt(Nonce::from_slice(nonce_bytes), sealed)
            .map_err(|e| StoreError::Cipher(format!("decryption failed: {}", e)))?;

        String::from_utf8(plain).map_err(|e| StoreError::Cipher(e.to_string()))
    }
}

/// The store-wide passphrase, kept sealed and only revealed when used.
///
/// The sealing key is random, generated once per key and never leaves
/// memory, so revealing costs a single AES-GCM open and no key derivation.
#[derive(Clone)]
pub struct CommonKey {
    key: [u8; KEY_LEN],
    nonce: [u8; NONCE_LEN],
    sealed: Vec<u8>,
}

impl fmt::Debug for CommonKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CommonKey(..)")
    }
}

impl CommonKey {
    pub fn seal(passphrase: &str) -> Result<Self> {
        let mut key = [0u8; KEY_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut key);
        OsRng.fill_bytes(&mut nonce);

        let sealed = Aes256Gcm::new_from_slice(&key)
            .map_err(|e| StoreError::Cipher(format!("failed to create cipher: {}", e)))?
            .encrypt(Nonce::from_slice(&nonce), passphrase.as_bytes())
            .map_err(|e| StoreError::Cipher(format!("encryption failed: {}", e)))?;

        Ok(Self { key, nonce, sealed })
    }

    pub fn reveal(&self) -> Result<String> {
        let plain = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|e| StoreError::Cipher(format!("failed to create cipher: {}", e)))?
            .decrypt(Nonce::from_slice(&self.nonce), self.sealed.as_slice())
            .map_err(|e| StoreError::Cipher(format!("decryption failed: {}", e)))?;

        String::from_utf8(plain).map_err(|e| StoreError::Cipher(e.to_string()))
    }
}
