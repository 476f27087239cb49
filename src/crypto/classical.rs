//! Classical signature leg: ECDSA over NIST P-384 with SHA-384.
//!
//! Signatures use the fixed-size `r || s` encoding (96 bytes), and public
//! keys the uncompressed SEC1 point encoding (97 bytes).

use chrono::{DateTime, Utc};
use p384::ecdsa::signature::{Signer, Verifier};
use p384::ecdsa::{Signature, SigningKey, VerifyingKey};
use zeroize::Zeroize;

use crate::crypto::rng;
use crate::error::{invalid_length, CryptoError, Result};

/// Uncompressed SEC1 public key size in bytes
pub const P384_PUBLIC_KEY_BYTES: usize = 97;
/// Secret scalar size in bytes
pub const P384_SECRET_KEY_BYTES: usize = 48;
/// Fixed-size `r || s` signature in bytes
pub const P384_SIGNATURE_BYTES: usize = 96;

pub const CLASSICAL_ALGORITHM: &str = "ECDSA-P384";

/// ECDSA P-384 key pair. Immutable and not `Clone`; the scalar is zeroized
/// on drop.
pub struct ClassicalKeyPair {
    public_key: Vec<u8>,
    secret_key: Vec<u8>,
    created_at: DateTime<Utc>,
}

impl ClassicalKeyPair {
    pub(crate) fn from_parts(
        public_key: Vec<u8>,
        secret_key: Vec<u8>,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        if public_key.len() != P384_PUBLIC_KEY_BYTES {
            return Err(invalid_length(
                "P-384 public key",
                P384_PUBLIC_KEY_BYTES,
                public_key.len(),
            ));
        }
        if secret_key.len() != P384_SECRET_KEY_BYTES {
            return Err(invalid_length(
                "P-384 secret key",
                P384_SECRET_KEY_BYTES,
                secret_key.len(),
            ));
        }
        Ok(Self {
            public_key,
            secret_key,
            created_at,
        })
    }

    /// Uncompressed SEC1 point (97 bytes)
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub fn algorithm(&self) -> &'static str {
        CLASSICAL_ALGORITHM
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Raw secret scalar.
    ///
    /// Handle with care: this exposes secret key material.
    pub fn secret_key(&self) -> &[u8] {
        &self.secret_key
    }

    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        sign(&self.secret_key, message)
    }
}

impl Drop for ClassicalKeyPair {
    fn drop(&mut self) {
        self.secret_key.zeroize();
    }
}

impl std::fmt::Debug for ClassicalKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassicalKeyPair")
            .field("algorithm", &CLASSICAL_ALGORITHM)
            .field("public_key", &hex::encode(self.public_key.get(..8).unwrap_or(&[])))
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Generate a P-384 key pair
pub fn generate_keypair() -> Result<ClassicalKeyPair> {
    let mut rng = rng::fresh_rng()?;
    let signing_key = SigningKey::random(&mut rng);

    let public_key = signing_key
        .verifying_key()
        .to_encoded_point(false)
        .as_bytes()
        .to_vec();
    let mut scalar = signing_key.to_bytes();
    let secret_key = scalar.to_vec();
    scalar.as_mut_slice().zeroize();

    Ok(ClassicalKeyPair {
        public_key,
        secret_key,
        created_at: Utc::now(),
    })
}

/// Sign `message` with a raw P-384 secret scalar
pub fn sign(secret_key: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    if secret_key.len() != P384_SECRET_KEY_BYTES {
        return Err(invalid_length(
            "P-384 secret key",
            P384_SECRET_KEY_BYTES,
            secret_key.len(),
        ));
    }

    let signing_key = SigningKey::from_slice(secret_key)
        .map_err(|_| CryptoError::InvalidKeyMaterial("P-384 secret scalar out of range".into()))?;
    let signature: Signature = signing_key.sign(message);

    Ok(signature.to_bytes().to_vec())
}

/// Verify a P-384 signature. Malformed keys or signatures return `false`.
pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    if signature.len() != P384_SIGNATURE_BYTES {
        return false;
    }

    let verifying_key = match VerifyingKey::from_sec1_bytes(public_key) {
        Ok(k) => k,
        Err(_) => return false,
    };
    let sig = match Signature::from_slice(signature) {
        Ok(s) => s,
        Err(_) => return false,
    };

    verifying_key.verify(message, &sig).is_ok()
}
