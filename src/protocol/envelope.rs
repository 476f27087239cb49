//! Secure envelope: sign, then encrypt to the recipient's ML-KEM key.
//!
//! Send path: the payload is signed with the sender's ML-DSA-65 key
//! (contextual signature, `purpose = "secure-message"`), packaged with the
//! signature, and sealed with AES-256-GCM under a fresh ML-KEM-768 shared
//! secret. Receive path: decapsulate, decrypt, verify.
//!
//! Format `SECURE-MESSAGE-v1` uses the 32-byte KEM shared secret directly as
//! the AES-256 key (it is already uniformly random). Adding a KDF step would
//! change the format and needs a new version tag.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use zeroize::Zeroizing;

use crate::crypto::signing::{self, ContextualSignature, SignatureContext, SignatureKeyPair};
use crate::crypto::{aead, constant_time, kem, KemKeyPair};
use crate::error::{CryptoError, Result};

/// Envelope `type` tag
pub const ENVELOPE_TYPE: &str = "SECURE-MESSAGE-v1";
/// Envelope `algorithm` tag
pub const ENVELOPE_ALGORITHM: &str = "ML-KEM-768-AES-256-GCM";
/// Purpose bound into the sender's contextual signature
pub const ENVELOPE_PURPOSE: &str = "secure-message";

/// Wire envelope.
///
/// Shape: `{ kemCiphertext, encryptedData, nonce, algorithm, senderPublicKey, type }`
/// with every byte string encoded as an array of numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecureMessage {
    pub kem_ciphertext: Vec<u8>,
    /// AES-256-GCM ciphertext with the 16-byte tag appended
    pub encrypted_data: Vec<u8>,
    /// 12 bytes
    pub nonce: Vec<u8>,
    pub algorithm: String,
    /// Sender's ML-DSA-65 verifying key (1952 bytes)
    pub sender_public_key: Vec<u8>,
    #[serde(rename = "type")]
    pub message_type: String,
}

impl SecureMessage {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Result of opening an envelope.
///
/// `data` is returned even when `signature_valid` is false so that callers
/// can quarantine or log rejected messages. Check `signature_valid` before
/// trusting `data`.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenedMessage {
    pub data: Vec<u8>,
    pub signature_valid: bool,
    pub sender_public_key: Vec<u8>,
    /// ISO-8601 rendering of `timestamp`
    pub signed_at: String,
    /// Unix milliseconds signing time from the signed payload
    pub timestamp: i64,
    pub context: SignatureContext,
}

/// Plaintext sealed inside the envelope.
#[derive(Serialize, Deserialize)]
struct SignedPackage {
    data: Vec<u8>,
    signature: ContextualSignature,
}

fn envelope_context() -> SignatureContext {
    let mut ctx = SignatureContext::new();
    ctx.insert("purpose".to_string(), Value::from(ENVELOPE_PURPOSE));
    ctx
}

/// Package, encapsulate and encrypt an already-signed payload.
fn seal_package(
    data: &[u8],
    signature: ContextualSignature,
    sender_public_key: &[u8],
    recipient_kem_public_key: &[u8],
) -> Result<SecureMessage> {
    let package = SignedPackage {
        data: data.to_vec(),
        signature,
    };
    let plaintext = Zeroizing::new(serde_json::to_vec(&package)?);

    let encapsulation = kem::encapsulate(recipient_kem_public_key)?;
    let sealed = aead::seal(encapsulation.shared_secret.as_bytes(), &plaintext)?;

    Ok(SecureMessage {
        kem_ciphertext: encapsulation.ciphertext,
        encrypted_data: sealed.ciphertext,
        nonce: sealed.nonce.to_vec(),
        algorithm: ENVELOPE_ALGORITHM.to_string(),
        sender_public_key: sender_public_key.to_vec(),
        message_type: ENVELOPE_TYPE.to_string(),
    })
}

/// Sign `data` as `sender` and encrypt it to `recipient_kem_public_key`.
pub fn create_secure_message(
    sender: &SignatureKeyPair,
    data: &[u8],
    recipient_kem_public_key: &[u8],
) -> Result<SecureMessage> {
    let signature = sender.sign_with_context(data, envelope_context())?;
    let message = seal_package(data, signature, sender.public_key(), recipient_kem_public_key)?;

    log::debug!(
        "Created {} ({} bytes payload) for recipient {}",
        ENVELOPE_TYPE,
        data.len(),
        hex::encode(recipient_kem_public_key.get(..8).unwrap_or(&[]))
    );
    Ok(message)
}

/// Decrypt an envelope addressed to `recipient` and verify the sender's
/// signature.
///
/// # Errors
/// - `UnsupportedFormat` for unknown `type` / `algorithm` tags
/// - `InvalidKeyMaterial` for wrongly sized KEM ciphertext or nonce
/// - `AuthenticationFailed` for any decryption failure (wrong recipient,
///   tampered ciphertext, nonce or KEM ciphertext)
///
/// An invalid signature is *not* an error; see [`OpenedMessage`].
pub fn open_secure_message(recipient: &KemKeyPair, message: &SecureMessage) -> Result<OpenedMessage> {
    if message.message_type != ENVELOPE_TYPE {
        return Err(CryptoError::UnsupportedFormat(format!(
            "envelope type {:?}",
            message.message_type
        )));
    }
    if message.algorithm != ENVELOPE_ALGORITHM {
        return Err(CryptoError::UnsupportedFormat(format!(
            "envelope algorithm {:?}",
            message.algorithm
        )));
    }

    // Implicit rejection: a tampered KEM ciphertext yields an unrelated key
    // and surfaces below as the same authentication failure as anything else.
    let shared_secret = kem::decapsulate(recipient.secret_key(), &message.kem_ciphertext)?;

    let plaintext = match aead::open(
        shared_secret.as_bytes(),
        &message.nonce,
        &message.encrypted_data,
    ) {
        Ok(p) => Zeroizing::new(p),
        Err(e) => {
            if e == CryptoError::AuthenticationFailed {
                log::warn!("{} could not be decrypted", ENVELOPE_TYPE);
            }
            return Err(e);
        }
    };

    let package: SignedPackage = serde_json::from_slice(&plaintext)
        .map_err(|_| CryptoError::Serialization("malformed envelope package".into()))?;

    let verification = signing::verify_with_context(&message.sender_public_key, &package.signature);
    let message_matches =
        constant_time::eq_slices(&package.signature.payload.message, &package.data);
    let purpose_matches =
        verification.context.get("purpose") == Some(&Value::from(ENVELOPE_PURPOSE));

    let signature_valid = verification.valid && message_matches && purpose_matches;
    if !signature_valid {
        log::warn!(
            "{} from {} failed signature verification",
            ENVELOPE_TYPE,
            hex::encode(message.sender_public_key.get(..8).unwrap_or(&[]))
        );
    }

    Ok(OpenedMessage {
        data: package.data,
        signature_valid,
        sender_public_key: message.sender_public_key.clone(),
        signed_at: signing::iso_timestamp(verification.timestamp),
        timestamp: verification.timestamp,
        context: verification.context,
    })
}
