//! Capability query and start-up self test.
//!
//! `get_capabilities` describes the cryptographic profile compiled into this
//! crate so callers can size buffers and log what is in effect.
//! `check_availability` proves the primitives actually work before any real
//! key material is touched.

use serde::Serialize;

use crate::crypto::aead::{self, AEAD_KEY_BYTES, AEAD_NONCE_BYTES, AEAD_TAG_BYTES};
use crate::crypto::classical::{
    CLASSICAL_ALGORITHM, P384_PUBLIC_KEY_BYTES, P384_SECRET_KEY_BYTES, P384_SIGNATURE_BYTES,
};
use crate::crypto::hybrid::HYBRID_ALGORITHM;
use crate::crypto::kem::{
    self, KEM_ALGORITHM, MLKEM768_CT_BYTES, MLKEM768_DK_BYTES, MLKEM768_EK_BYTES,
    SHARED_SECRET_BYTES,
};
use crate::crypto::signing::{
    self, MLDSA65_PK_BYTES, MLDSA65_SIG_BYTES, MLDSA65_SK_BYTES, SIGNATURE_ALGORITHM,
};
use crate::error::{CryptoError, Result};
use crate::protocol::{ENVELOPE_ALGORITHM, ENVELOPE_TYPE};

/// NIST post-quantum security category of ML-KEM-768 / ML-DSA-65
pub const NIST_SECURITY_LEVEL: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KemCapabilities {
    pub algorithm: &'static str,
    pub standard: &'static str,
    pub public_key_bytes: usize,
    pub secret_key_bytes: usize,
    pub ciphertext_bytes: usize,
    pub shared_secret_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureCapabilities {
    pub algorithm: &'static str,
    pub standard: &'static str,
    pub public_key_bytes: usize,
    pub secret_key_bytes: usize,
    pub signature_bytes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeCapabilities {
    #[serde(rename = "type")]
    pub message_type: &'static str,
    pub algorithm: &'static str,
    pub key_bytes: usize,
    pub nonce_bytes: usize,
    pub tag_bytes: usize,
}

/// Static description of the cryptographic profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub quantum_safe: bool,
    pub nist_security_level: u8,
    pub kem: KemCapabilities,
    pub signature: SignatureCapabilities,
    /// Classical leg of hybrid signatures
    pub classical: SignatureCapabilities,
    pub hybrid_algorithm: &'static str,
    pub envelope: EnvelopeCapabilities,
}

pub fn get_capabilities() -> Capabilities {
    Capabilities {
        quantum_safe: true,
        nist_security_level: NIST_SECURITY_LEVEL,
        kem: KemCapabilities {
            algorithm: KEM_ALGORITHM,
            standard: "FIPS 203",
            public_key_bytes: MLKEM768_EK_BYTES,
            secret_key_bytes: MLKEM768_DK_BYTES,
            ciphertext_bytes: MLKEM768_CT_BYTES,
            shared_secret_bytes: SHARED_SECRET_BYTES,
        },
        signature: SignatureCapabilities {
            algorithm: SIGNATURE_ALGORITHM,
            standard: "FIPS 204",
            public_key_bytes: MLDSA65_PK_BYTES,
            secret_key_bytes: MLDSA65_SK_BYTES,
            signature_bytes: MLDSA65_SIG_BYTES,
        },
        classical: SignatureCapabilities {
            algorithm: CLASSICAL_ALGORITHM,
            standard: "FIPS 186-5",
            public_key_bytes: P384_PUBLIC_KEY_BYTES,
            secret_key_bytes: P384_SECRET_KEY_BYTES,
            signature_bytes: P384_SIGNATURE_BYTES,
        },
        hybrid_algorithm: HYBRID_ALGORITHM,
        envelope: EnvelopeCapabilities {
            message_type: ENVELOPE_TYPE,
            algorithm: ENVELOPE_ALGORITHM,
            key_bytes: AEAD_KEY_BYTES,
            nonce_bytes: AEAD_NONCE_BYTES,
            tag_bytes: AEAD_TAG_BYTES,
        },
    }
}

/// Run a known-answer style self test over every primitive.
///
/// Any failure is reported once as [`CryptoError::PrimitiveUnavailable`];
/// retrying cannot succeed without a working build, so callers should abort.
pub fn check_availability() -> Result<()> {
    match self_test() {
        Ok(()) => {
            log::debug!(
                "Self test passed ({} / {} / {})",
                KEM_ALGORITHM,
                SIGNATURE_ALGORITHM,
                ENVELOPE_ALGORITHM
            );
            Ok(())
        }
        Err(reason) => {
            log::error!("Cryptographic self test failed: {}", reason);
            Err(CryptoError::PrimitiveUnavailable(reason))
        }
    }
}

fn self_test() -> std::result::Result<(), String> {
    const SAMPLE: &[u8] = b"shield-pqc self test";

    // KEM
    let kem_kp = kem::generate_keypair().map_err(|e| format!("{} keygen: {}", KEM_ALGORITHM, e))?;
    let enc = kem::encapsulate(kem_kp.public_key())
        .map_err(|e| format!("{} encapsulate: {}", KEM_ALGORITHM, e))?;
    let dec = kem::decapsulate(kem_kp.secret_key(), &enc.ciphertext)
        .map_err(|e| format!("{} decapsulate: {}", KEM_ALGORITHM, e))?;
    if dec != enc.shared_secret {
        return Err(format!("{} shared secrets disagree", KEM_ALGORITHM));
    }

    // Signatures
    let sig_kp = signing::generate_keypair()
        .map_err(|e| format!("{} keygen: {}", SIGNATURE_ALGORITHM, e))?;
    let signature = sig_kp
        .sign(SAMPLE)
        .map_err(|e| format!("{} sign: {}", SIGNATURE_ALGORITHM, e))?;
    if !signing::verify(sig_kp.public_key(), SAMPLE, &signature) {
        return Err(format!("{} rejected a valid signature", SIGNATURE_ALGORITHM));
    }
    if signing::verify(sig_kp.public_key(), b"not the sample", &signature) {
        return Err(format!("{} accepted a wrong message", SIGNATURE_ALGORITHM));
    }

    // AEAD keyed by the KEM secret, as the envelope does
    let sealed = aead::seal(dec.as_bytes(), SAMPLE).map_err(|e| format!("AES-256-GCM seal: {}", e))?;
    let opened = aead::open(enc.shared_secret.as_bytes(), &sealed.nonce, &sealed.ciphertext)
        .map_err(|e| format!("AES-256-GCM open: {}", e))?;
    if opened != SAMPLE {
        return Err("AES-256-GCM round trip mismatch".into());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capabilities_profile() {
        let caps = get_capabilities();
        assert!(caps.quantum_safe);
        assert_eq!(caps.nist_security_level, 3);

        assert_eq!(caps.kem.algorithm, "ML-KEM-768");
        assert_eq!(caps.kem.standard, "FIPS 203");
        assert_eq!(caps.kem.public_key_bytes, 1184);
        assert_eq!(caps.kem.secret_key_bytes, 2400);
        assert_eq!(caps.kem.ciphertext_bytes, 1088);
        assert_eq!(caps.kem.shared_secret_bytes, 32);

        assert_eq!(caps.signature.algorithm, "ML-DSA-65");
        assert_eq!(caps.signature.standard, "FIPS 204");
        assert_eq!(caps.signature.public_key_bytes, 1952);
        assert_eq!(caps.signature.secret_key_bytes, 4032);
        assert_eq!(caps.signature.signature_bytes, 3309);

        assert_eq!(caps.envelope.nonce_bytes, 12);
        assert_eq!(caps.hybrid_algorithm, "HYBRID-ML-DSA-65-ECDSA-P384");
    }

    #[test]
    fn test_sizes_match_generated_material() {
        let caps = get_capabilities();
        let kem_kp = kem::generate_keypair().unwrap();
        let enc = kem::encapsulate(kem_kp.public_key()).unwrap();
        assert_eq!(kem_kp.public_key().len(), caps.kem.public_key_bytes);
        assert_eq!(enc.ciphertext.len(), caps.kem.ciphertext_bytes);

        let sig_kp = signing::generate_keypair().unwrap();
        assert_eq!(sig_kp.sign(b"x").unwrap().len(), caps.signature.signature_bytes);
    }

    #[test]
    fn test_capabilities_json() {
        let json = serde_json::to_value(get_capabilities()).unwrap();
        assert_eq!(json["nistSecurityLevel"], 3);
        assert_eq!(json["kem"]["ciphertextBytes"], 1088);
        assert_eq!(json["envelope"]["type"], "SECURE-MESSAGE-v1");
    }

    #[test]
    fn test_check_availability() {
        assert!(check_availability().is_ok());
    }
}
