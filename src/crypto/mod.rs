pub mod aead;
pub mod canonical;
pub mod classical;
pub mod constant_time;
pub mod hybrid;
pub mod kem;
pub mod rng;
pub mod signing;

pub use aead::{open as aead_open, seal as aead_seal, AEAD_KEY_BYTES, AEAD_NONCE_BYTES};
pub use classical::ClassicalKeyPair;
pub use hybrid::{hybrid_sign, hybrid_verify, HybridSignature, HybridVerification};
pub use kem::{KemEncapsulation, KemKeyPair, SharedSecret};
pub use signing::{
    sign_with_context, verify_with_context, ContextVerification, ContextualSignature,
    SignatureContext, SignatureKeyPair, SignedPayload,
};
