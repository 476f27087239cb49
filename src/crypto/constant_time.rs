//! Constant-time comparison for sensitive values (secrets, messages, tags).
//! Use for all comparisons that could leak through timing side channels.

use subtle::ConstantTimeEq;

/// Constant-time equality for 32-byte arrays (e.g. shared secrets).
#[inline(always)]
pub fn eq_32(a: &[u8; 32], b: &[u8; 32]) -> bool {
    a.ct_eq(b).into()
}

/// Constant-time equality for slices.
///
/// Length is treated as public: slices of different lengths compare unequal
/// immediately.
#[inline(always)]
pub fn eq_slices(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
