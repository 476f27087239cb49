use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};

use crate::crypto::rng;
use crate::error::{invalid_length, CryptoError, Result};

/// AES-256 key length in bytes
pub const AEAD_KEY_BYTES: usize = 32;
/// GCM nonce length in bytes (96 bits)
pub const AEAD_NONCE_BYTES: usize = 12;
/// GCM authentication tag length in bytes
pub const AEAD_TAG_BYTES: usize = 16;

/// Output of [`seal`]: the random nonce and `ciphertext || tag`.
#[derive(Debug, Clone)]
pub struct Sealed {
    pub nonce: [u8; AEAD_NONCE_BYTES],
    pub ciphertext: Vec<u8>,
}

/// Encrypt `plaintext` with AES-256-GCM under a fresh random 96-bit nonce
///
/// # Arguments
/// * `key` - 32-byte encryption key
/// * `plaintext` - The message to encrypt
///
/// # Returns
/// Nonce and ciphertext with the 16-byte tag appended
pub fn seal(key: &[u8; AEAD_KEY_BYTES], plaintext: &[u8]) -> Result<Sealed> {
    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|_| invalid_length("AES-256 key", AEAD_KEY_BYTES, key.len()))?;

    // A randomness failure aborts encryption; nonces never come from a weaker source
    let mut nonce = [0u8; AEAD_NONCE_BYTES];
    rng::fill_random(&mut nonce)?;

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce), plaintext)
        .map_err(|_| CryptoError::PrimitiveUnavailable("AES-256-GCM encryption failed".into()))?;

    Ok(Sealed { nonce, ciphertext })
}

/// Decrypt and authenticate `ciphertext || tag`
///
/// Every authentication failure maps to the same
/// [`CryptoError::AuthenticationFailed`], whatever the cause.
pub fn open(key: &[u8; AEAD_KEY_BYTES], nonce: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>> {
    if nonce.len() != AEAD_NONCE_BYTES {
        return Err(invalid_length("AES-GCM nonce", AEAD_NONCE_BYTES, nonce.len()));
    }
    if ciphertext.len() < AEAD_TAG_BYTES {
        return Err(CryptoError::AuthenticationFailed);
    }

    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|_| invalid_length("AES-256 key", AEAD_KEY_BYTES, key.len()))?;

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| CryptoError::AuthenticationFailed)
}
