//! Hybrid signatures: ML-DSA-65 + ECDSA P-384
//!
//! Both schemes sign the same message bytes independently. A hybrid signature
//! is valid only if *both* legs verify (conjunction, not fallback), so it stays
//! unforgeable as long as either the lattice or the elliptic-curve assumption
//! holds.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::crypto::{classical, signing};
use crate::error::Result;

pub const HYBRID_ALGORITHM: &str = "HYBRID-ML-DSA-65-ECDSA-P384";

/// Composite signature.
///
/// Wire shape: `{ dilithiumSignature, ecdsaSignature, algorithm, quantumSafe,
/// classicalSafe, signedAt }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HybridSignature {
    /// ML-DSA-65 leg (3309 bytes)
    #[serde(rename = "dilithiumSignature")]
    pub pqc_signature: Vec<u8>,
    /// ECDSA P-384 leg (96 bytes, `r || s`)
    #[serde(rename = "ecdsaSignature")]
    pub classical_signature: Vec<u8>,
    pub algorithm: String,
    pub quantum_safe: bool,
    pub classical_safe: bool,
    /// Unix milliseconds
    pub signed_at: i64,
}

/// Per-leg diagnostic result. `valid` is the logical AND of both legs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HybridVerification {
    pub valid: bool,
    pub pqc_valid: bool,
    pub classical_valid: bool,
}

/// Sign `message` with both schemes.
pub fn hybrid_sign(
    pqc_secret_key: &[u8],
    classical_secret_key: &[u8],
    message: &[u8],
) -> Result<HybridSignature> {
    let pqc_signature = signing::sign(pqc_secret_key, message)?;
    let classical_signature = classical::sign(classical_secret_key, message)?;

    Ok(HybridSignature {
        pqc_signature,
        classical_signature,
        algorithm: HYBRID_ALGORITHM.to_string(),
        quantum_safe: true,
        classical_safe: true,
        signed_at: Utc::now().timestamp_millis(),
    })
}

/// Verify both legs of a hybrid signature.
///
/// Never errors: a malformed leg evaluates to `false` and the other leg is
/// still checked, so the caller always gets a complete diagnostic. A wrong
/// algorithm tag or a cleared `quantumSafe` / `classicalSafe` flag makes the
/// whole signature invalid.
pub fn hybrid_verify(
    pqc_public_key: &[u8],
    classical_public_key: &[u8],
    message: &[u8],
    signature: &HybridSignature,
) -> HybridVerification {
    let pqc_valid = signing::verify(pqc_public_key, message, &signature.pqc_signature);
    let classical_valid =
        classical::verify(classical_public_key, message, &signature.classical_signature);
    let tag_valid = signature.algorithm == HYBRID_ALGORITHM;
    let flags_valid = signature.quantum_safe && signature.classical_safe;

    if !tag_valid {
        log::warn!("Hybrid signature with unexpected algorithm tag rejected");
    }
    if !flags_valid {
        log::warn!("Hybrid signature with cleared safety flags rejected");
    }

    HybridVerification {
        valid: tag_valid && flags_valid && pqc_valid && classical_valid,
        pqc_valid,
        classical_valid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::classical::ClassicalKeyPair;
    use crate::crypto::signing::SignatureKeyPair;

    struct Signer {
        pqc: SignatureKeyPair,
        ecdsa: ClassicalKeyPair,
    }

    fn signer() -> Signer {
        Signer {
            pqc: signing::generate_keypair().unwrap(),
            ecdsa: classical::generate_keypair().unwrap(),
        }
    }

    #[test]
    fn test_hybrid_roundtrip() {
        let s = signer();
        let sig = hybrid_sign(s.pqc.secret_key(), s.ecdsa.secret_key(), b"transfer 10").unwrap();

        assert_eq!(sig.algorithm, HYBRID_ALGORITHM);
        assert!(sig.quantum_safe && sig.classical_safe);

        let result = hybrid_verify(s.pqc.public_key(), s.ecdsa.public_key(), b"transfer 10", &sig);
        assert_eq!(
            result,
            HybridVerification {
                valid: true,
                pqc_valid: true,
                classical_valid: true
            }
        );
    }

    #[test]
    fn test_conjunction_truth_table() {
        let s = signer();
        let forger = signer();
        let msg = b"conjunction";

        let good = hybrid_sign(s.pqc.secret_key(), s.ecdsa.secret_key(), msg).unwrap();
        let forged = hybrid_sign(forger.pqc.secret_key(), forger.ecdsa.secret_key(), msg).unwrap();

        for pqc_ok in [true, false] {
            for classical_ok in [true, false] {
                let mut sig = good.clone();
                if !pqc_ok {
                    sig.pqc_signature = forged.pqc_signature.clone();
                }
                if !classical_ok {
                    sig.classical_signature = forged.classical_signature.clone();
                }

                let r = hybrid_verify(s.pqc.public_key(), s.ecdsa.public_key(), msg, &sig);
                assert_eq!(r.pqc_valid, pqc_ok);
                assert_eq!(r.classical_valid, classical_ok);
                assert_eq!(r.valid, pqc_ok && classical_ok);
            }
        }
    }

    #[test]
    fn test_malformed_leg_fails_closed() {
        let s = signer();
        let mut sig = hybrid_sign(s.pqc.secret_key(), s.ecdsa.secret_key(), b"m").unwrap();
        sig.classical_signature.truncate(10);

        let r = hybrid_verify(s.pqc.public_key(), s.ecdsa.public_key(), b"m", &sig);
        assert!(r.pqc_valid);
        assert!(!r.classical_valid);
        assert!(!r.valid);

        sig.pqc_signature.clear();
        let r = hybrid_verify(s.pqc.public_key(), s.ecdsa.public_key(), b"m", &sig);
        assert!(!r.pqc_valid);
        assert!(!r.valid);
    }

    #[test]
    fn test_wrong_algorithm_tag_invalid() {
        let s = signer();
        let mut sig = hybrid_sign(s.pqc.secret_key(), s.ecdsa.secret_key(), b"m").unwrap();
        sig.algorithm = "HYBRID-ML-DSA-44-ED25519".to_string();

        let r = hybrid_verify(s.pqc.public_key(), s.ecdsa.public_key(), b"m", &sig);
        assert!(r.pqc_valid && r.classical_valid);
        assert!(!r.valid);
    }

    #[test]
    fn test_cleared_safety_flags_invalid() {
        let s = signer();
        let good = hybrid_sign(s.pqc.secret_key(), s.ecdsa.secret_key(), b"m").unwrap();

        for (quantum_safe, classical_safe) in [(false, true), (true, false), (false, false)] {
            let mut sig = good.clone();
            sig.quantum_safe = quantum_safe;
            sig.classical_safe = classical_safe;

            let r = hybrid_verify(s.pqc.public_key(), s.ecdsa.public_key(), b"m", &sig);
            assert!(r.pqc_valid && r.classical_valid);
            assert!(!r.valid);
        }
    }

    #[test]
    fn test_wire_field_names() {
        let s = signer();
        let sig = hybrid_sign(s.pqc.secret_key(), s.ecdsa.secret_key(), b"m").unwrap();
        let wire = serde_json::to_value(&sig).unwrap();

        for field in [
            "dilithiumSignature",
            "ecdsaSignature",
            "algorithm",
            "quantumSafe",
            "classicalSafe",
            "signedAt",
        ] {
            assert!(wire.get(field).is_some(), "missing {}", field);
        }
        assert_eq!(wire["dilithiumSignature"].as_array().unwrap().len(), 3309);

        let parsed: HybridSignature = serde_json::from_value(wire).unwrap();
        assert_eq!(parsed, sig);
    }
}
