//! # Shield PQC
//!
//! **Hybrid post-quantum key exchange, signatures and secure-message envelopes.**
//!
//! Shield PQC composes audited RustCrypto primitives into a small messaging
//! suite:
//!
//! - **Key encapsulation** with ML-KEM-768 (NIST FIPS 203)
//! - **Digital signatures** with ML-DSA-65 (NIST FIPS 204), including
//!   contextual signatures that bind a timestamp and metadata
//! - **Hybrid signatures** (ML-DSA-65 + ECDSA P-384) that verify only if both
//!   legs verify
//! - **Secure envelopes**: sign-then-encrypt messages using an ML-KEM shared
//!   secret as an AES-256-GCM key
//! - **Key lifecycle**: generation, plaintext export/import, public-key sharing
//!
//! ## Quick Start
//!
//! ```rust
//! use shield_pqc::{create_secure_message, open_secure_message};
//! use shield_pqc::crypto::{kem, signing};
//!
//! let alice_sig = signing::generate_keypair().unwrap();
//! let bob_kem = kem::generate_keypair().unwrap();
//!
//! let envelope = create_secure_message(&alice_sig, b"hello", bob_kem.public_key()).unwrap();
//! let opened = open_secure_message(&bob_kem, &envelope).unwrap();
//!
//! assert!(opened.signature_valid);
//! assert_eq!(opened.data, b"hello");
//! ```
//!
//! ## Architecture
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`crypto`] | ML-KEM, ML-DSA, ECDSA P-384, hybrid composer, AES-GCM, canonical JSON |
//! | [`protocol`] | The `SECURE-MESSAGE-v1` envelope |
//! | [`keys`] | Key-pair export/import and public-key bundles |
//! | [`capabilities`] | Static algorithm profile and start-up self test |
//! | [`suite`] | `Suite` object holding configuration and the local identity |
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `std` | Yes | Standard library support |
//! | `wasm` | No | WebAssembly support (`getrandom/js`) |

// Crate-level lint configuration (suppress stylistic warnings that don't affect correctness).
// Security-relevant lints (unsafe, unchecked, etc.) remain enforced.
#![allow(
    clippy::empty_line_after_doc_comments,
    clippy::doc_lazy_continuation,
    clippy::too_many_arguments,
    clippy::type_complexity
)]

// ── Public modules ──────────────────────────────────────────────────────────

/// Crate-wide error taxonomy.
pub mod error;

/// Cryptographic building blocks: KEM, signatures, hybrid composer, AEAD.
pub mod crypto;

/// Secure-message envelope format.
pub mod protocol;

/// Key-pair serialization and public-key sharing.
pub mod keys;

/// Algorithm profile and availability self test.
pub mod capabilities;

/// Explicit suite object (configuration + local identity).
pub mod suite;

// ── Re-exports for convenience ──────────────────────────────────────────────

pub use error::{CryptoError, Result};

pub use crypto::{
    hybrid_sign, hybrid_verify, ClassicalKeyPair, ContextVerification, ContextualSignature,
    HybridSignature, HybridVerification, KemEncapsulation, KemKeyPair, SharedSecret,
    SignatureContext, SignatureKeyPair,
};

pub use protocol::{create_secure_message, open_secure_message, OpenedMessage, SecureMessage};

pub use keys::{PublicKeyBundle, SerializedKeyPair, SerializedPublicKey};

pub use capabilities::{check_availability, get_capabilities, Capabilities};

pub use suite::{Identity, SerializedIdentity, Suite, SuiteConfig};

// ── Library metadata ────────────────────────────────────────────────────────

/// Shield PQC version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Returns the library version string.
pub fn version() -> &'static str {
    VERSION
}

// ── Tests ───────────────────────────────────────────────────────────────────
