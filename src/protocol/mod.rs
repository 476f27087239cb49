//! Message formats built on top of [`crate::crypto`].

pub mod envelope;

pub use envelope::{
    create_secure_message, open_secure_message, OpenedMessage, SecureMessage, ENVELOPE_ALGORITHM,
    ENVELOPE_PURPOSE, ENVELOPE_TYPE,
};
