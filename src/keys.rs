//! Key lifecycle & serialization.
//!
//! Key pairs serialize to the plaintext shape
//! `{ publicKey: number[], secretKey: number[], algorithm, quantumSafe, created }`
//! (`created` in Unix milliseconds). Protecting the serialized secret at rest
//! is the caller's job.
//!
//! Import validates the algorithm tag, exact lengths, and that the public and
//! secret halves actually belong together, so a key pair never exists with
//! independently sourced halves.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::classical::{self, ClassicalKeyPair, CLASSICAL_ALGORITHM};
use crate::crypto::kem::{self, KemKeyPair, KEM_ALGORITHM};
use crate::crypto::signing::{self, SignatureKeyPair, SIGNATURE_ALGORITHM};
use crate::error::{CryptoError, Result};

const FINGERPRINT_CONTEXT: &str = "Shield-PQC-KeyFingerprint-v1";
const PAIR_CHECK: &[u8] = b"shield-pqc key pair consistency check";

/// Plaintext serialized key pair. Wiped on drop.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct SerializedKeyPair {
    pub public_key: Vec<u8>,
    pub secret_key: Vec<u8>,
    pub algorithm: String,
    pub quantum_safe: bool,
    /// Unix milliseconds
    pub created: i64,
}

impl SerializedKeyPair {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl std::fmt::Debug for SerializedKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerializedKeyPair")
            .field("algorithm", &self.algorithm)
            .field("public_key_len", &self.public_key.len())
            .field("secret_key", &"<redacted>")
            .field("created", &self.created)
            .finish()
    }
}

/// Public half of a key pair, safe to share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedPublicKey {
    pub public_key: Vec<u8>,
    pub algorithm: String,
    pub quantum_safe: bool,
    pub created: i64,
}

impl SerializedPublicKey {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn fingerprint(&self) -> String {
        fingerprint(&self.public_key)
    }
}

/// Everything a peer needs to send us envelopes and verify our signatures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyBundle {
    pub kem_public_key: Vec<u8>,
    pub signature_public_key: Vec<u8>,
    /// Fingerprint of the signature key, for out-of-band comparison
    pub fingerprint: String,
    pub created: i64,
}

impl PublicKeyBundle {
    pub fn new(kem: &KemKeyPair, sig: &SignatureKeyPair) -> Self {
        Self {
            kem_public_key: kem.public_key().to_vec(),
            signature_public_key: sig.public_key().to_vec(),
            fingerprint: fingerprint(sig.public_key()),
            created: sig.created_at().timestamp_millis(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Short, stable identifier for a public key (32 hex chars, BLAKE3-derived).
///
/// Used in logs and for human comparison; never reveals secret material.
pub fn fingerprint(public_key: &[u8]) -> String {
    let digest = blake3::derive_key(FINGERPRINT_CONTEXT, public_key);
    hex::encode(&digest[..16])
}

fn check_algorithm(serialized: &SerializedKeyPair, expected: &str) -> Result<()> {
    if serialized.algorithm != expected {
        return Err(CryptoError::UnsupportedFormat(format!(
            "expected {} key pair, got {:?}",
            expected, serialized.algorithm
        )));
    }
    Ok(())
}

fn created_at(created_ms: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(created_ms)
        .single()
        .ok_or_else(|| CryptoError::UnsupportedFormat("invalid creation timestamp".into()))
}

fn mismatched_pair(algorithm: &str) -> CryptoError {
    CryptoError::InvalidKeyMaterial(format!(
        "{} public and secret keys do not form a pair",
        algorithm
    ))
}

// ── ML-KEM-768 ──────────────────────────────────────────────────────────────

pub fn export_kem_keypair(keypair: &KemKeyPair) -> SerializedKeyPair {
    SerializedKeyPair {
        public_key: keypair.public_key().to_vec(),
        secret_key: keypair.secret_key().to_vec(),
        algorithm: KEM_ALGORITHM.to_string(),
        quantum_safe: true,
        created: keypair.created_at().timestamp_millis(),
    }
}

pub fn import_kem_keypair(serialized: &SerializedKeyPair) -> Result<KemKeyPair> {
    check_algorithm(serialized, KEM_ALGORITHM)?;
    let keypair = KemKeyPair::from_parts(
        serialized.public_key.clone(),
        serialized.secret_key.clone(),
        created_at(serialized.created)?,
    )?;

    let trial = kem::encapsulate(keypair.public_key())?;
    let recovered = kem::decapsulate(keypair.secret_key(), &trial.ciphertext)?;
    if recovered != trial.shared_secret {
        return Err(mismatched_pair(KEM_ALGORITHM));
    }

    log::debug!("Imported {} key pair {}", KEM_ALGORITHM, fingerprint(keypair.public_key()));
    Ok(keypair)
}

pub fn export_kem_public_key(keypair: &KemKeyPair) -> SerializedPublicKey {
    SerializedPublicKey {
        public_key: keypair.public_key().to_vec(),
        algorithm: KEM_ALGORITHM.to_string(),
        quantum_safe: true,
        created: keypair.created_at().timestamp_millis(),
    }
}

// ── ML-DSA-65 ───────────────────────────────────────────────────────────────

pub fn export_signature_keypair(keypair: &SignatureKeyPair) -> SerializedKeyPair {
    SerializedKeyPair {
        public_key: keypair.public_key().to_vec(),
        secret_key: keypair.secret_key().to_vec(),
        algorithm: SIGNATURE_ALGORITHM.to_string(),
        quantum_safe: true,
        created: keypair.created_at().timestamp_millis(),
    }
}

pub fn import_signature_keypair(serialized: &SerializedKeyPair) -> Result<SignatureKeyPair> {
    check_algorithm(serialized, SIGNATURE_ALGORITHM)?;
    let keypair = SignatureKeyPair::from_parts(
        serialized.public_key.clone(),
        serialized.secret_key.clone(),
        created_at(serialized.created)?,
    )?;

    let trial = keypair.sign(PAIR_CHECK)?;
    if !signing::verify(keypair.public_key(), PAIR_CHECK, &trial) {
        return Err(mismatched_pair(SIGNATURE_ALGORITHM));
    }

    log::debug!(
        "Imported {} key pair {}",
        SIGNATURE_ALGORITHM,
        fingerprint(keypair.public_key())
    );
    Ok(keypair)
}

pub fn export_signature_public_key(keypair: &SignatureKeyPair) -> SerializedPublicKey {
    SerializedPublicKey {
        public_key: keypair.public_key().to_vec(),
        algorithm: SIGNATURE_ALGORITHM.to_string(),
        quantum_safe: true,
        created: keypair.created_at().timestamp_millis(),
    }
}

// ── ECDSA P-384 (classical hybrid leg) ──────────────────────────────────────

pub fn export_classical_keypair(keypair: &ClassicalKeyPair) -> SerializedKeyPair {
    SerializedKeyPair {
        public_key: keypair.public_key().to_vec(),
        secret_key: keypair.secret_key().to_vec(),
        algorithm: CLASSICAL_ALGORITHM.to_string(),
        quantum_safe: false,
        created: keypair.created_at().timestamp_millis(),
    }
}

pub fn import_classical_keypair(serialized: &SerializedKeyPair) -> Result<ClassicalKeyPair> {
    check_algorithm(serialized, CLASSICAL_ALGORITHM)?;
    let keypair = ClassicalKeyPair::from_parts(
        serialized.public_key.clone(),
        serialized.secret_key.clone(),
        created_at(serialized.created)?,
    )?;

    let trial = keypair.sign(PAIR_CHECK)?;
    if !classical::verify(keypair.public_key(), PAIR_CHECK, &trial) {
        return Err(mismatched_pair(CLASSICAL_ALGORITHM));
    }

    Ok(keypair)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::kem::{MLKEM768_DK_BYTES, MLKEM768_EK_BYTES};
    use crate::crypto::signing::{MLDSA65_PK_BYTES, MLDSA65_SK_BYTES};

    #[test]
    fn test_kem_export_import_roundtrip() {
        let kp = kem::generate_keypair().unwrap();
        let serialized = export_kem_keypair(&kp);
        assert_eq!(serialized.public_key.len(), MLKEM768_EK_BYTES);
        assert_eq!(serialized.secret_key.len(), MLKEM768_DK_BYTES);
        assert_eq!(serialized.algorithm, "ML-KEM-768");
        assert!(serialized.quantum_safe);

        let json = serialized.to_json().unwrap();
        let restored = import_kem_keypair(&SerializedKeyPair::from_json(&json).unwrap()).unwrap();
        assert_eq!(restored.public_key(), kp.public_key());
        assert_eq!(restored.secret_key(), kp.secret_key());
        assert_eq!(
            restored.created_at().timestamp_millis(),
            kp.created_at().timestamp_millis()
        );

        // Restored key still decapsulates for the original public key
        let enc = kem::encapsulate(kp.public_key()).unwrap();
        assert_eq!(
            kem::decapsulate(restored.secret_key(), &enc.ciphertext).unwrap(),
            enc.shared_secret
        );
    }

    #[test]
    fn test_signature_export_import_roundtrip() {
        let kp = signing::generate_keypair().unwrap();
        let serialized = export_signature_keypair(&kp);
        assert_eq!(serialized.public_key.len(), MLDSA65_PK_BYTES);
        assert_eq!(serialized.secret_key.len(), MLDSA65_SK_BYTES);

        let restored = import_signature_keypair(&serialized).unwrap();
        let sig = restored.sign(b"after restore").unwrap();
        assert!(signing::verify(kp.public_key(), b"after restore", &sig));
    }

    #[test]
    fn test_classical_export_import_roundtrip() {
        let kp = classical::generate_keypair().unwrap();
        let serialized = export_classical_keypair(&kp);
        assert!(!serialized.quantum_safe);
        assert_eq!(serialized.algorithm, "ECDSA-P384");

        let restored = import_classical_keypair(&serialized).unwrap();
        let sig = restored.sign(b"m").unwrap();
        assert!(classical::verify(kp.public_key(), b"m", &sig));
    }

    #[test]
    fn test_wire_shape() {
        let kp = signing::generate_keypair().unwrap();
        let value = serde_json::to_value(export_signature_keypair(&kp)).unwrap();
        for field in ["publicKey", "secretKey", "algorithm", "quantumSafe", "created"] {
            assert!(value.get(field).is_some(), "missing {}", field);
        }
        assert!(value["publicKey"].as_array().unwrap().iter().all(|b| b.as_u64().unwrap() <= 255));
        assert!(value["created"].is_i64());
    }

    #[test]
    fn test_import_rejects_wrong_algorithm() {
        let kp = kem::generate_keypair().unwrap();
        let serialized = export_kem_keypair(&kp);
        match import_signature_keypair(&serialized) {
            Err(CryptoError::UnsupportedFormat(_)) => {}
            other => panic!("Expected UnsupportedFormat, got {:?}", other),
        }
    }

    #[test]
    fn test_import_rejects_wrong_lengths() {
        let kp = kem::generate_keypair().unwrap();
        let mut serialized = export_kem_keypair(&kp);
        serialized.secret_key.truncate(100);
        match import_kem_keypair(&serialized) {
            Err(CryptoError::InvalidKeyMaterial(_)) => {}
            other => panic!("Expected InvalidKeyMaterial, got {:?}", other),
        }
    }

    #[test]
    fn test_import_rejects_mismatched_halves() {
        let a = kem::generate_keypair().unwrap();
        let b = kem::generate_keypair().unwrap();
        let mut serialized = export_kem_keypair(&a);
        serialized.public_key = b.public_key().to_vec();
        assert!(matches!(
            import_kem_keypair(&serialized),
            Err(CryptoError::InvalidKeyMaterial(_))
        ));

        let a = signing::generate_keypair().unwrap();
        let b = signing::generate_keypair().unwrap();
        let mut serialized = export_signature_keypair(&a);
        serialized.public_key = b.public_key().to_vec();
        assert!(matches!(
            import_signature_keypair(&serialized),
            Err(CryptoError::InvalidKeyMaterial(_))
        ));
    }

    #[test]
    fn test_public_key_extraction() {
        let kem_kp = kem::generate_keypair().unwrap();
        let sig_kp = signing::generate_keypair().unwrap();

        let kem_pub = export_kem_public_key(&kem_kp);
        assert_eq!(kem_pub.public_key, kem_kp.public_key());
        let json = kem_pub.to_json().unwrap();
        assert!(!json.contains("secretKey"));

        let sig_pub = export_signature_public_key(&sig_kp);
        assert_eq!(sig_pub.fingerprint(), fingerprint(sig_kp.public_key()));

        let bundle = PublicKeyBundle::new(&kem_kp, &sig_kp);
        let parsed = PublicKeyBundle::from_json(&bundle.to_json().unwrap()).unwrap();
        assert_eq!(parsed, bundle);
        assert_eq!(parsed.fingerprint.len(), 32);
    }

    #[test]
    fn test_fingerprint_stable_and_distinct() {
        assert_eq!(fingerprint(b"key-a"), fingerprint(b"key-a"));
        assert_ne!(fingerprint(b"key-a"), fingerprint(b"key-b"));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let kp = kem::generate_keypair().unwrap();
        let dbg = format!("{:?}", export_kem_keypair(&kp));
        assert!(dbg.contains("<redacted>"));
    }
}
