//! Post-Quantum Key Encapsulation: ML-KEM-768 (NIST FIPS 203)
//!
//! Thin wrapper over the RustCrypto `ml-kem` crate. Keys and ciphertexts
//! cross this module boundary as raw byte strings so they can be stored and
//! shipped in the plaintext serialization formats of [`crate::keys`] and
//! [`crate::protocol`].
//!
//! Key sizes (ML-KEM-768):
//! - Encapsulation key (public):  1184 bytes
//! - Decapsulation key (secret):  2400 bytes
//! - Ciphertext:                  1088 bytes
//! - Shared secret:               32 bytes
//!
//! Decapsulation uses the FIPS 203 implicit-rejection path: a tampered
//! ciphertext of the right length yields a pseudorandom secret instead of an
//! error, so there is no success/failure signal to build an oracle from.

use chrono::{DateTime, Utc};
use ml_kem::kem::{Decapsulate, DecapsulationKey, Encapsulate, EncapsulationKey};
use ml_kem::{Encoded, EncodedSizeUser, KemCore, MlKem768, MlKem768Params};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::crypto::{constant_time, rng};
use crate::error::{invalid_length, CryptoError, Result};

/// ML-KEM-768 encapsulation key (public) size in bytes
pub const MLKEM768_EK_BYTES: usize = 1184;
/// ML-KEM-768 decapsulation key (secret) size in bytes
pub const MLKEM768_DK_BYTES: usize = 2400;
/// ML-KEM-768 ciphertext size in bytes
pub const MLKEM768_CT_BYTES: usize = 1088;
/// Shared secret size in bytes
pub const SHARED_SECRET_BYTES: usize = 32;

/// Algorithm tag carried by KEM key pairs
pub const KEM_ALGORITHM: &str = "ML-KEM-768";

/// 32-byte secret agreed through encapsulation. Wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SharedSecret([u8; SHARED_SECRET_BYTES]);

impl SharedSecret {
    /// Move a 32-byte secret out of `source`, wiping the source.
    fn take(source: &mut [u8]) -> Self {
        let mut secret = SharedSecret([0u8; SHARED_SECRET_BYTES]);
        secret.0.copy_from_slice(source);
        source.zeroize();
        secret
    }

    pub fn as_bytes(&self) -> &[u8; SHARED_SECRET_BYTES] {
        &self.0
    }
}

impl PartialEq for SharedSecret {
    fn eq(&self, other: &Self) -> bool {
        constant_time::eq_32(&self.0, &other.0)
    }
}

impl Eq for SharedSecret {}

impl std::fmt::Debug for SharedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SharedSecret(<redacted>)")
    }
}

/// ML-KEM-768 key pair.
///
/// Immutable once created. Not `Clone`: the secret half lives in exactly one
/// place and is zeroized when the pair is dropped (rotation or teardown).
pub struct KemKeyPair {
    /// Encapsulation key (1184 bytes)
    public_key: Vec<u8>,
    /// Decapsulation key (2400 bytes)
    secret_key: Vec<u8>,
    created_at: DateTime<Utc>,
}

impl KemKeyPair {
    /// Assemble a key pair from raw parts after checking lengths.
    pub(crate) fn from_parts(
        public_key: Vec<u8>,
        secret_key: Vec<u8>,
        created_at: DateTime<Utc>,
    ) -> Result<Self> {
        if public_key.len() != MLKEM768_EK_BYTES {
            return Err(invalid_length(
                "ML-KEM-768 public key",
                MLKEM768_EK_BYTES,
                public_key.len(),
            ));
        }
        if secret_key.len() != MLKEM768_DK_BYTES {
            return Err(invalid_length(
                "ML-KEM-768 secret key",
                MLKEM768_DK_BYTES,
                secret_key.len(),
            ));
        }
        Ok(Self {
            public_key,
            secret_key,
            created_at,
        })
    }

    /// Encapsulation key (1184 bytes)
    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub fn algorithm(&self) -> &'static str {
        KEM_ALGORITHM
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Raw decapsulation key.
    ///
    /// Handle with care: this exposes secret key material.
    pub fn secret_key(&self) -> &[u8] {
        &self.secret_key
    }
}

impl Drop for KemKeyPair {
    fn drop(&mut self) {
        self.secret_key.zeroize();
    }
}

impl std::fmt::Debug for KemKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KemKeyPair")
            .field("algorithm", &KEM_ALGORITHM)
            .field("public_key", &hex::encode(self.public_key.get(..8).unwrap_or(&[])))
            .field("secret_key", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Result of encapsulating against a public key.
#[derive(Debug)]
pub struct KemEncapsulation {
    /// ML-KEM-768 ciphertext (1088 bytes), sent to the key holder
    pub ciphertext: Vec<u8>,
    /// Secret known only to the encapsulator and the key holder
    pub shared_secret: SharedSecret,
}

/// Generate a key pair from a 32-byte seed (deterministic)
pub fn generate_keypair_from_seed(seed: &[u8; 32]) -> KemKeyPair {
    let mut rng = rng::SeededRng::from_seed(seed);
    let (dk, ek) = MlKem768::generate(&mut rng);

    let mut dk_bytes = dk.as_bytes();
    let secret_key = dk_bytes.to_vec();
    dk_bytes.as_mut_slice().zeroize();

    KemKeyPair {
        public_key: ek.as_bytes().to_vec(),
        secret_key,
        created_at: Utc::now(),
    }
}

/// Generate a key pair from the OS random source
pub fn generate_keypair() -> Result<KemKeyPair> {
    let mut seed = rng::random_seed()?;
    let keypair = generate_keypair_from_seed(&seed);
    seed.zeroize();

    log::debug!(
        "Generated {} key pair {}",
        KEM_ALGORITHM,
        hex::encode(&keypair.public_key[..8])
    );
    Ok(keypair)
}

/// Encapsulate a fresh shared secret against `public_key`.
///
/// Every call draws new randomness, so two encapsulations against the same
/// key produce unrelated ciphertexts and secrets.
pub fn encapsulate(public_key: &[u8]) -> Result<KemEncapsulation> {
    if public_key.len() != MLKEM768_EK_BYTES {
        return Err(invalid_length(
            "ML-KEM-768 public key",
            MLKEM768_EK_BYTES,
            public_key.len(),
        ));
    }

    let ek_encoded = Encoded::<EncapsulationKey<MlKem768Params>>::try_from(public_key)
        .map_err(|_| invalid_length("ML-KEM-768 public key", MLKEM768_EK_BYTES, public_key.len()))?;
    let ek = EncapsulationKey::<MlKem768Params>::from_bytes(&ek_encoded);

    let mut rng = rng::fresh_rng()?;
    let (ct, mut ss) = ek
        .encapsulate(&mut rng)
        .map_err(|_| CryptoError::PrimitiveUnavailable("ML-KEM-768 encapsulation failed".into()))?;

    Ok(KemEncapsulation {
        ciphertext: ct.iter().copied().collect(),
        shared_secret: SharedSecret::take(ss.as_mut_slice()),
    })
}

/// Recover the shared secret carried by `ciphertext`.
///
/// Only length mismatches are reported as errors (lengths are public). A
/// well-sized but tampered ciphertext decapsulates to a pseudorandom secret
/// that is stable for that exact input.
pub fn decapsulate(secret_key: &[u8], ciphertext: &[u8]) -> Result<SharedSecret> {
    if secret_key.len() != MLKEM768_DK_BYTES {
        return Err(invalid_length(
            "ML-KEM-768 secret key",
            MLKEM768_DK_BYTES,
            secret_key.len(),
        ));
    }
    if ciphertext.len() != MLKEM768_CT_BYTES {
        return Err(invalid_length(
            "ML-KEM-768 ciphertext",
            MLKEM768_CT_BYTES,
            ciphertext.len(),
        ));
    }

    let mut dk_encoded = Encoded::<DecapsulationKey<MlKem768Params>>::try_from(secret_key)
        .map_err(|_| invalid_length("ML-KEM-768 secret key", MLKEM768_DK_BYTES, secret_key.len()))?;
    let dk = DecapsulationKey::<MlKem768Params>::from_bytes(&dk_encoded);
    dk_encoded.as_mut_slice().zeroize();

    let ct = ml_kem::Ciphertext::<MlKem768>::try_from(ciphertext)
        .map_err(|_| invalid_length("ML-KEM-768 ciphertext", MLKEM768_CT_BYTES, ciphertext.len()))?;

    let mut ss = dk
        .decapsulate(&ct)
        .map_err(|_| CryptoError::PrimitiveUnavailable("ML-KEM-768 decapsulation failed".into()))?;

    Ok(SharedSecret::take(ss.as_mut_slice()))
}
