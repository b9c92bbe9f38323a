//! Ethereum address syntax checks.

/// Length of a `0x`-prefixed 20-byte address.
const ADDRESS_LEN: usize = 42;

/// Returns `true` if `address` is `0x` followed by exactly 40 hex digits.
///
/// Only the lowercase `0x` prefix is accepted. Digits may be any case; no
/// EIP-55 checksum is enforced.
#[must_use]
pub fn is_valid_address(address: &str) -> bool {
    if address.len() != ADDRESS_LEN {
        return false;
    }
    match address.strip_prefix("0x") {
        Some(digits) => hex::decode(digits).is_ok(),
        None => false,
    }
}

/// Canonical cache key for an address (lowercased).
#[must_use]
pub fn normalize_address(address: &str) -> String {
    address.to_ascii_lowercase()
}
