//! Post-Quantum Signatures: ML-DSA-65 (NIST FIPS 204)
//!
//! Key sizes (ML-DSA-65):
//! - Verifying key (public): 1952 bytes
//! - Signing key (secret):   4032 bytes
//! - Signature:              3309 bytes
//!
//! Signing is deterministic (FIPS 204 hedging disabled, empty context
//! string), so the same key and message always produce the same signature.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use ml_dsa::{
    EncodedSignature, EncodedSigningKey, EncodedVerifyingKey, KeyGen, MlDsa65, Signature,
    SigningKey, VerifyingKey,
};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::crypto::{canonical, rng};
use crate::error::{invalid_length, CryptoError, Result};

/// ML-DSA-65 verifying key (public) size in bytes
pub const MLDSA65_PK_BYTES: usize = 1952;
/// ML-DSA-65 signing key (secret) size in bytes
pub const MLDSA65_SK_BYTES: usize = 4032;
/// ML-DSA-65 signature size in bytes
pub const MLDSA65_SIG_BYTES: usize = 3309;

/// Algorithm tag carried by signature key pairs and contextual signatures
pub const SIGNATURE_ALGORITHM: &str = "ML-DSA-65";

/// ML-DSA-65 key pair. Immutable and not `Clone`; the secret half is
/// zeroized on drop.
pub struct SignatureKeyPair {
    /// Verifying key (1952 bytes)
    public_key: Vec<u8>,
    /// Signing key (4032 bytes)
    secret_key: Vec<u8>,
    created_at: DateTime<Utc>,
}

impl SignatureKeyPair {
    pub(crate) fn from_parts(
        public_key: Vec<u8>,
        secret_key: Vec<u8>,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        if public_key.len() != MLDSA65_PK_BYTES {
            return Err(invalid_length(
                "ML-DSA-65 public key",
                MLDSA65_PK_BYTES,
                public_key.len(),
            ));
        }
        if secret_key.len() != MLDSA65_SK_BYTES {
            return Err(invalid_length(
                "ML-DSA-65 secret key",
                MLDSA65_SK_BYTES,
                secret_key.len(),
            ));
        }
        Ok(Self {
            public_key,
            secret_key,
            created_at,
        })
    }

    /// Verifying key (1952 bytes)
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub fn algorithm(&self) -> &'static str {
        SIGNATURE_ALGORITHM
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Raw signing key.
    ///
    /// Handle with care: this exposes secret key material.
    pub fn secret_key(&self) -> &[u8] {
        &self.secret_key
    }

    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        sign(&self.secret_key, message)
    }

    pub fn sign_with_context(
        &self,
        message: &[u8],
        context: SignatureContext,
    ) -> Result<ContextualSignature> {
        sign_with_context(&self.secret_key, message, context)
    }
}

impl Drop for SignatureKeyPair {
    fn drop(&mut self) {
        self.secret_key.zeroize();
    }
}

impl std::fmt::Debug for SignatureKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureKeyPair")
            .field("algorithm", &SIGNATURE_ALGORITHM)
            .field("public_key", &hex::encode(self.public_key.get(..8).unwrap_or(&[])))
            .field("secret_key", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Generate a key pair from a 32-byte seed (deterministic)
pub fn generate_keypair_from_seed(seed: &[u8; 32]) -> SignatureKeyPair {
    let mut rng = rng::SeededRng::from_seed(seed);
    let kp = MlDsa65::key_gen(&mut rng);

    let mut sk_encoded = kp.signing_key().encode();
    let secret_key = sk_encoded.as_slice().to_vec();
    sk_encoded.as_mut_slice().zeroize();

    SignatureKeyPair {
        public_key: kp.verifying_key().encode().as_slice().to_vec(),
        secret_key,
        created_at: Utc::now(),
    }
}

/// Generate a key pair from the OS random source
pub fn generate_keypair() -> Result<SignatureKeyPair> {
    let mut seed = rng::random_seed()?;
    let keypair = generate_keypair_from_seed(&seed);
    seed.zeroize();

    log::debug!(
        "Generated {} key pair {}",
        SIGNATURE_ALGORITHM,
        hex::encode(&keypair.public_key[..8])
    );
    Ok(keypair)
}

/// Sign `message` with a raw ML-DSA-65 signing key
///
/// # Returns
/// 3309-byte signature
pub fn sign(secret_key: &[u8], message: &[u8]) -> Result<Vec<u8>> {
    if secret_key.len() != MLDSA65_SK_BYTES {
        return Err(invalid_length(
            "ML-DSA-65 secret key",
            MLDSA65_SK_BYTES,
            secret_key.len(),
        ));
    }

    let mut encoded = EncodedSigningKey::<MlDsa65>::try_from(secret_key)
        .map_err(|_| invalid_length("ML-DSA-65 secret key", MLDSA65_SK_BYTES, secret_key.len()))?;
    let signing_key = SigningKey::<MlDsa65>::decode(&encoded);
    encoded.as_mut_slice().zeroize();

    let signature = signing_key
        .sign_deterministic(message, &[])
        .map_err(|_| CryptoError::PrimitiveUnavailable("ML-DSA-65 signing failed".into()))?;

    Ok(signature.encode().as_slice().to_vec())
}

/// Verify an ML-DSA-65 signature
///
/// Malformed input (wrong lengths, undecodable signature) is an expected
/// adversarial case and simply returns `false`.
pub fn verify(public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
    if public_key.len() != MLDSA65_PK_BYTES || signature.len() != MLDSA65_SIG_BYTES {
        return false;
    }

    let pk_encoded = match EncodedVerifyingKey::<MlDsa65>::try_from(public_key) {
        Ok(e) => e,
        Err(_) => return false,
    };
    let verifying_key = VerifyingKey::<MlDsa65>::decode(&pk_encoded);

    let sig_encoded = match EncodedSignature::<MlDsa65>::try_from(signature) {
        Ok(e) => e,
        Err(_) => return false,
    };
    let sig = match Signature::<MlDsa65>::decode(&sig_encoded) {
        Some(s) => s,
        None => return false,
    };

    verifying_key.verify_with_context(message, &[], &sig)
}

// ---------------------------------------------------------------------------
// Contextual signatures
// ---------------------------------------------------------------------------

/// Free-form metadata bound into a contextual signature.
///
/// A sorted map; together with [`canonical`] encoding this keeps the signed
/// bytes independent of insertion order.
pub type SignatureContext = BTreeMap<String, serde_json::Value>;

/// The exact structure that gets canonically serialized and signed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedPayload {
    pub message: Vec<u8>,
    /// Unix milliseconds at signing time
    pub timestamp: i64,
    pub context: SignatureContext,
}

/// Signature over `{message, timestamp, context}`.
///
/// Wire shape: `{ payload, signature, algorithm, signedAt }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextualSignature {
    pub payload: SignedPayload,
    pub signature: Vec<u8>,
    pub algorithm: String,
    /// ISO-8601 rendering of `payload.timestamp`
    pub signed_at: String,
}

/// Outcome of [`verify_with_context`].
///
/// Timestamp and context are surfaced for caller-side policy (e.g. maximum
/// signature age); this module applies no such policy itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextVerification {
    pub valid: bool,
    pub timestamp: i64,
    pub context: SignatureContext,
}

pub(crate) fn iso_timestamp(timestamp_ms: i64) -> String {
    match Utc.timestamp_millis_opt(timestamp_ms).single() {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => String::new(),
    }
}

/// Sign `message` together with the current time and `context`.
pub fn sign_with_context(
    secret_key: &[u8],
    message: &[u8],
    context: SignatureContext,
) -> Result<ContextualSignature> {
    let timestamp = Utc::now().timestamp_millis();
    let payload = SignedPayload {
        message: message.to_vec(),
        timestamp,
        context,
    };

    let signed_bytes = canonical::to_canonical_vec(&payload)?;
    let signature = sign(secret_key, &signed_bytes)?;

    Ok(ContextualSignature {
        payload,
        signature,
        algorithm: SIGNATURE_ALGORITHM.to_string(),
        signed_at: iso_timestamp(timestamp),
    })
}

/// Re-serialize the embedded payload canonically and verify it.
///
/// `signed_at` sits outside the signed bytes, so it must render the signed
/// `payload.timestamp` exactly or the signature is rejected.
pub fn verify_with_context(public_key: &[u8], signed: &ContextualSignature) -> ContextVerification {
    let valid = if signed.algorithm != SIGNATURE_ALGORITHM {
        log::warn!("Contextual signature with unexpected algorithm tag rejected");
        false
    } else if signed.signed_at != iso_timestamp(signed.payload.timestamp) {
        log::warn!("Contextual signature with mismatched signedAt rejected");
        false
    } else {
        match canonical::to_canonical_vec(&signed.payload) {
            Ok(bytes) => verify(public_key, &bytes, &signed.signature),
            Err(_) => false,
        }
    };

    ContextVerification {
        valid,
        timestamp: signed.payload.timestamp,
        context: signed.payload.context.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn purpose(p: &str) -> SignatureContext {
        let mut ctx = SignatureContext::new();
        ctx.insert("purpose".to_string(), json!(p));
        ctx
    }

    #[test]
    fn test_keypair_sizes() {
        let kp = generate_keypair().unwrap();
        assert_eq!(kp.public_key().len(), MLDSA65_PK_BYTES);
        assert_eq!(kp.secret_key().len(), MLDSA65_SK_BYTES);
        assert_eq!(kp.algorithm(), "ML-DSA-65");
    }

    #[test]
    fn test_keypair_from_seed_deterministic() {
        let kp1 = generate_keypair_from_seed(&[42u8; 32]);
        let kp2 = generate_keypair_from_seed(&[42u8; 32]);
        assert_eq!(kp1.public_key(), kp2.public_key());
        assert_eq!(kp1.secret_key(), kp2.secret_key());
    }

    #[test]
    fn test_sign_verify() {
        let kp = generate_keypair().unwrap();
        let data = b"Test message for signing";

        let signature = kp.sign(data).unwrap();
        assert_eq!(signature.len(), MLDSA65_SIG_BYTES);
        assert!(verify(kp.public_key(), data, &signature));
    }

    #[test]
    fn test_signing_is_deterministic() {
        let kp = generate_keypair_from_seed(&[7u8; 32]);
        let s1 = kp.sign(b"same message").unwrap();
        let s2 = kp.sign(b"same message").unwrap();
        assert_eq!(s1, s2);
    }

    #[test]
    fn test_tampered_signature_rejected() {
        let kp = generate_keypair().unwrap();
        let data = b"Test message";
        let signature = kp.sign(data).unwrap();

        for idx in [0, MLDSA65_SIG_BYTES / 2, MLDSA65_SIG_BYTES - 1] {
            let mut bad = signature.clone();
            bad[idx] ^= 0x01;
            assert!(!verify(kp.public_key(), data, &bad), "flip at {} accepted", idx);
        }
    }

    #[test]
    fn test_wrong_message_or_key_rejected() {
        let kp = generate_keypair().unwrap();
        let other = generate_keypair().unwrap();
        let signature = kp.sign(b"original").unwrap();

        assert!(!verify(kp.public_key(), b"modified", &signature));
        assert!(!verify(other.public_key(), b"original", &signature));
    }

    #[test]
    fn test_length_mismatch_returns_false() {
        let kp = generate_keypair().unwrap();
        let signature = kp.sign(b"msg").unwrap();

        assert!(!verify(&kp.public_key()[..100], b"msg", &signature));
        assert!(!verify(kp.public_key(), b"msg", &signature[..3000]));
        assert!(!verify(&[], b"msg", &[]));
    }

    #[test]
    fn test_sign_rejects_bad_secret_length() {
        match sign(&[0u8; 32], b"msg") {
            Err(CryptoError::InvalidKeyMaterial(_)) => {}
            other => panic!("Expected InvalidKeyMaterial, got {:?}", other),
        }
    }

    #[test]
    fn test_contextual_roundtrip() {
        let kp = generate_keypair().unwrap();
        let signed = kp.sign_with_context(b"hello", purpose("secure-message")).unwrap();

        assert_eq!(signed.algorithm, "ML-DSA-65");
        assert_eq!(signed.signature.len(), MLDSA65_SIG_BYTES);
        assert!(signed.signed_at.ends_with('Z'));

        let result = verify_with_context(kp.public_key(), &signed);
        assert!(result.valid);
        assert_eq!(result.timestamp, signed.payload.timestamp);
        assert_eq!(result.context, purpose("secure-message"));
    }

    #[test]
    fn test_altered_context_rejected() {
        let kp = generate_keypair().unwrap();
        let mut signed = kp.sign_with_context(b"hello", purpose("secure-message")).unwrap();

        signed
            .payload
            .context
            .insert("purpose".to_string(), json!("payment-approval"));
        assert!(!verify_with_context(kp.public_key(), &signed).valid);
    }

    #[test]
    fn test_added_context_key_rejected() {
        let kp = generate_keypair().unwrap();
        let mut signed = kp.sign_with_context(b"hello", purpose("secure-message")).unwrap();

        signed
            .payload
            .context
            .insert("audience".to_string(), json!("mallory"));
        assert!(!verify_with_context(kp.public_key(), &signed).valid);
    }

    #[test]
    fn test_retimed_signature_rejected() {
        let kp = generate_keypair().unwrap();
        let mut signed = kp.sign_with_context(b"hello", purpose("secure-message")).unwrap();
        signed.payload.timestamp += 60_000;
        assert!(!verify_with_context(kp.public_key(), &signed).valid);
    }

    #[test]
    fn test_forged_signed_at_rejected() {
        let kp = generate_keypair().unwrap();
        let mut signed = kp.sign_with_context(b"hello", purpose("secure-message")).unwrap();
        signed.signed_at = "2099-01-01T00:00:00.000Z".to_string();

        let result = verify_with_context(kp.public_key(), &signed);
        assert!(!result.valid);
        // The signed timestamp is still reported for diagnostics
        assert_eq!(result.timestamp, signed.payload.timestamp);
    }

    #[test]
    fn test_wrong_algorithm_tag_rejected() {
        let kp = generate_keypair().unwrap();
        let mut signed = kp.sign_with_context(b"hello", purpose("secure-message")).unwrap();
        signed.algorithm = "ML-DSA-44".to_string();
        assert!(!verify_with_context(kp.public_key(), &signed).valid);
    }

    #[test]
    fn test_context_survives_json_roundtrip() {
        let kp = generate_keypair().unwrap();
        let mut ctx = purpose("secure-message");
        ctx.insert("nested".to_string(), json!({"z": 1, "a": [1, 2, 3]}));
        let signed = kp.sign_with_context(b"payload", ctx).unwrap();

        let wire = serde_json::to_string(&signed).unwrap();
        assert!(wire.contains("\"signedAt\""));
        assert!(wire.contains("\"payload\""));

        let parsed: ContextualSignature = serde_json::from_str(&wire).unwrap();
        assert!(verify_with_context(kp.public_key(), &parsed).valid);
    }

    #[test]
    fn test_iso_timestamp_format() {
        assert_eq!(iso_timestamp(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(iso_timestamp(1_700_000_000_123), "2023-11-14T22:13:20.123Z");
    }
}
