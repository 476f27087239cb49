//! Explicit suite object.
//!
//! A `Suite` is constructed once by the application (running the start-up
//! self test) and passed to whatever needs cryptography. It optionally owns
//! the local identity: an ML-KEM-768 pair for receiving envelopes and an
//! ML-DSA-65 pair for signing. There is no global state.

use serde::{Deserialize, Serialize};

use crate::capabilities::{self, Capabilities};
use crate::crypto::aead::AEAD_TAG_BYTES;
use crate::crypto::hybrid::{self, HybridSignature, HybridVerification};
use crate::crypto::kem::{self, KemKeyPair};
use crate::crypto::signing::{
    self, ContextVerification, ContextualSignature, SignatureContext, SignatureKeyPair,
};
use crate::error::{CryptoError, Result};
use crate::keys::{self, PublicKeyBundle, SerializedKeyPair};
use crate::protocol::{self, OpenedMessage, SecureMessage};

/// Fixed allowance for the signed package around the payload
/// (signature, context, timestamps, JSON punctuation).
const PACKAGE_OVERHEAD_BYTES: usize = 64 * 1024;

// ── Configuration ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SuiteConfig {
    /// Run `check_availability` when the suite is built.
    pub self_test: bool,
    /// Largest payload accepted by `seal`, and largest payload `open` will
    /// return.
    pub max_payload_bytes: usize,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            self_test: true,
            max_payload_bytes: 16 * 1024 * 1024, // 16 MiB
        }
    }
}

impl SuiteConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ── Identity ────────────────────────────────────────────────────────────────

/// Local identity. Secrets are zeroized when the identity is dropped.
#[derive(Debug)]
pub struct Identity {
    pub kem: KemKeyPair,
    pub signature: SignatureKeyPair,
}

impl Identity {
    pub fn generate() -> Result<Self> {
        Ok(Self {
            kem: kem::generate_keypair()?,
            signature: signing::generate_keypair()?,
        })
    }

    pub fn public_bundle(&self) -> PublicKeyBundle {
        PublicKeyBundle::new(&self.kem, &self.signature)
    }
}

/// Plaintext serialized identity, for the caller to protect at rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedIdentity {
    pub kem: SerializedKeyPair,
    pub signature: SerializedKeyPair,
}

// ── Suite ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct Suite {
    config: SuiteConfig,
    identity: Option<Identity>,
}

impl Suite {
    pub fn new(config: SuiteConfig) -> Result<Self> {
        if config.self_test {
            capabilities::check_availability()?;
        }
        log::info!(
            "Suite ready (max payload {} bytes, self test {})",
            config.max_payload_bytes,
            if config.self_test { "passed" } else { "skipped" }
        );
        Ok(Self {
            config,
            identity: None,
        })
    }

    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    pub fn capabilities(&self) -> Capabilities {
        capabilities::get_capabilities()
    }

    pub fn has_identity(&self) -> bool {
        self.identity.is_some()
    }

    pub fn identity(&self) -> Result<&Identity> {
        self.identity
            .as_ref()
            .ok_or(CryptoError::NotInitialized("no identity generated or loaded"))
    }

    // ── Identity lifecycle ──

    /// Generate a fresh identity, replacing (and wiping) any existing one.
    pub fn generate_identity(&mut self) -> Result<PublicKeyBundle> {
        let identity = Identity::generate()?;
        let bundle = identity.public_bundle();
        log::info!("Generated identity {}", bundle.fingerprint);
        self.identity = Some(identity);
        Ok(bundle)
    }

    /// Replace the current identity with a new one. The old secrets are
    /// zeroized as the old key pairs drop.
    pub fn rotate_identity(&mut self) -> Result<PublicKeyBundle> {
        let previous = self.identity()?.public_bundle().fingerprint;
        let identity = Identity::generate()?;
        let bundle = identity.public_bundle();
        self.identity = Some(identity);
        log::info!("Rotated identity {} -> {}", previous, bundle.fingerprint);
        Ok(bundle)
    }

    /// Load a previously exported identity. Both pairs are fully validated.
    pub fn load_identity(&mut self, serialized: &SerializedIdentity) -> Result<PublicKeyBundle> {
        let identity = Identity {
            kem: keys::import_kem_keypair(&serialized.kem)?,
            signature: keys::import_signature_keypair(&serialized.signature)?,
        };
        let bundle = identity.public_bundle();
        log::info!("Loaded identity {}", bundle.fingerprint);
        self.identity = Some(identity);
        Ok(bundle)
    }

    pub fn export_identity(&self) -> Result<SerializedIdentity> {
        let identity = self.identity()?;
        Ok(SerializedIdentity {
            kem: keys::export_kem_keypair(&identity.kem),
            signature: keys::export_signature_keypair(&identity.signature),
        })
    }

    pub fn public_bundle(&self) -> Result<PublicKeyBundle> {
        Ok(self.identity()?.public_bundle())
    }

    // ── Envelopes ──

    /// Sign with the local identity and encrypt to `recipient_kem_public_key`.
    pub fn seal(&self, data: &[u8], recipient_kem_public_key: &[u8]) -> Result<SecureMessage> {
        self.check_payload(data.len())?;
        let identity = self.identity()?;
        protocol::create_secure_message(&identity.signature, data, recipient_kem_public_key)
    }

    /// Decrypt an envelope addressed to the local identity.
    pub fn open(&self, message: &SecureMessage) -> Result<OpenedMessage> {
        let identity = self.identity()?;

        // The package carries the payload twice (data + signed message),
        // each byte serialized as up to four JSON characters.
        let max_envelope = self
            .config
            .max_payload_bytes
            .saturating_mul(8)
            .saturating_add(PACKAGE_OVERHEAD_BYTES + AEAD_TAG_BYTES);
        if message.encrypted_data.len() > max_envelope {
            log::warn!(
                "Rejected oversized envelope ({} bytes)",
                message.encrypted_data.len()
            );
            return Err(CryptoError::InvalidKeyMaterial(format!(
                "envelope exceeds {} bytes",
                max_envelope
            )));
        }

        let opened = protocol::open_secure_message(&identity.kem, message)?;
        self.check_payload(opened.data.len())?;
        Ok(opened)
    }

    // ── Signatures ──

    pub fn sign(&self, message: &[u8]) -> Result<Vec<u8>> {
        self.identity()?.signature.sign(message)
    }

    pub fn sign_with_context(
        &self,
        message: &[u8],
        context: SignatureContext,
    ) -> Result<ContextualSignature> {
        self.identity()?.signature.sign_with_context(message, context)
    }

    pub fn verify(&self, public_key: &[u8], message: &[u8], signature: &[u8]) -> bool {
        signing::verify(public_key, message, signature)
    }

    pub fn verify_with_context(
        &self,
        public_key: &[u8],
        signed: &ContextualSignature,
    ) -> ContextVerification {
        signing::verify_with_context(public_key, signed)
    }

    pub fn hybrid_verify(
        &self,
        pqc_public_key: &[u8],
        classical_public_key: &[u8],
        message: &[u8],
        signature: &HybridSignature,
    ) -> HybridVerification {
        hybrid::hybrid_verify(pqc_public_key, classical_public_key, message, signature)
    }

    fn check_payload(&self, len: usize) -> Result<()> {
        if len > self.config.max_payload_bytes {
            log::warn!("Rejected oversized payload ({} bytes)", len);
            return Err(CryptoError::InvalidKeyMaterial(format!(
                "payload exceeds {} bytes",
                self.config.max_payload_bytes
            )));
        }
        Ok(())
    }
}
