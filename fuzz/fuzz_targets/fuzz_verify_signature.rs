#![no_main]
use libfuzzer_sys::fuzz_target;
use shield_pqc::crypto::{classical, signing};
use shield_pqc::{hybrid_verify, ContextualSignature, HybridSignature};

fuzz_target!(|data: &[u8]| {
    let signer = signing::generate_keypair_from_seed(&[3u8; 32]);

    // Raw signature bytes
    assert!(
        !signing::verify(signer.public_key(), b"fuzz", data),
        "Arbitrary bytes must not verify"
    );
    let _ = signing::verify(data, b"fuzz", data);
    let _ = classical::verify(data, b"fuzz", data);

    // Contextual and hybrid wire forms
    if let Ok(json) = std::str::from_utf8(data) {
        if let Ok(signed) = serde_json::from_str::<ContextualSignature>(json) {
            let _ = signing::verify_with_context(signer.public_key(), &signed);
        }
        if let Ok(sig) = serde_json::from_str::<HybridSignature>(json) {
            let r = hybrid_verify(signer.public_key(), data, b"fuzz", &sig);
            if r.valid {
                assert!(r.pqc_valid && r.classical_valid);
            }
        }
    }
});
