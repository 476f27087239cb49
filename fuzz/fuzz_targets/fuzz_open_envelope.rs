#![no_main]
use libfuzzer_sys::fuzz_target;
use shield_pqc::crypto::kem;
use shield_pqc::{open_secure_message, SecureMessage};

fuzz_target!(|data: &[u8]| {
    let recipient = kem::generate_keypair_from_seed(&[7u8; 32]);

    // Arbitrary JSON must never panic the parser
    if let Ok(json) = std::str::from_utf8(data) {
        if let Ok(message) = SecureMessage::from_json(json) {
            let _ = open_secure_message(&recipient, &message);
        }
    }

    // Well-formed tags, fuzzed body: must fail cleanly, never decrypt
    if data.len() < 12 {
        return;
    }
    let message = SecureMessage {
        kem_ciphertext: data.iter().cycle().take(kem::MLKEM768_CT_BYTES).copied().collect(),
        encrypted_data: data[12..].to_vec(),
        nonce: data[..12].to_vec(),
        algorithm: shield_pqc::protocol::ENVELOPE_ALGORITHM.to_string(),
        sender_public_key: data.to_vec(),
        message_type: shield_pqc::protocol::ENVELOPE_TYPE.to_string(),
    };
    assert!(
        open_secure_message(&recipient, &message).is_err(),
        "Forged envelope must not open"
    );
});
