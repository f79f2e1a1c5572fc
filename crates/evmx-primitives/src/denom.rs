//! Denomination grammar and IBC voucher denominations.
//!
//! A denomination names a fungible token inside the chain's own state
//! (`stake`, `uatom`, `ibc/27A6…`). The grammar below is the lowest common
//! denominator accepted across the ecosystem: 3 to 128 characters, starting
//! with an ASCII letter, continuing with letters, digits or `/ : . _ -`.

use alloy_primitives::{hex, keccak256};

/// Minimum length of a valid denomination.
pub const MIN_DENOM_LEN: usize = 3;
/// Maximum length of a valid denomination.
pub const MAX_DENOM_LEN: usize = 128;

/// Prefix of voucher denominations minted for tokens received over IBC.
pub const IBC_DENOM_PREFIX: &str = "ibc/";

/// Errors raised while validating a denomination.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DenomError {
    /// The denomination is shorter than [`MIN_DENOM_LEN`] or longer than
    /// [`MAX_DENOM_LEN`].
    #[error("invalid denom length {len}, expected {MIN_DENOM_LEN}..={MAX_DENOM_LEN}")]
    InvalidLength {
        /// Length of the rejected denomination.
        len: usize,
    },
    /// The first character is not an ASCII letter.
    #[error("denom {denom:?} must start with an ASCII letter")]
    InvalidStart {
        /// The rejected denomination.
        denom: String,
    },
    /// A character outside the allowed set appeared after the first.
    #[error("denom {denom:?} contains invalid character {ch:?}")]
    InvalidCharacter {
        /// The rejected denomination.
        denom: String,
        /// First offending character.
        ch: char,
    },
}

/// Validates `denom` against the denomination grammar.
pub fn validate_denom(denom: &str) -> Result<(), DenomError> {
    let len = denom.len();
    if !(MIN_DENOM_LEN..=MAX_DENOM_LEN).contains(&len) {
        return Err(DenomError::InvalidLength { len });
    }
    let mut chars = denom.chars();
    // Length check above guarantees at least one character.
    if let Some(first) = chars.next() {
        if !first.is_ascii_alphabetic() {
            return Err(DenomError::InvalidStart { denom: denom.to_owned() });
        }
    }
    for ch in chars {
        if !is_denom_char(ch) {
            return Err(DenomError::InvalidCharacter { denom: denom.to_owned(), ch });
        }
    }
    Ok(())
}

const fn is_denom_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || matches!(ch, '/' | ':' | '.' | '_' | '-')
}

/// Returns the voucher denomination for `base_denom` transferred through
/// `port`/`channel`: `ibc/` followed by the uppercase hex of the trace hash.
///
/// The hash function is local policy, not wire protocol; only stability
/// within one deployment matters.
pub fn ibc_voucher_denom(port: &str, channel: &str, base_denom: &str) -> String {
    let trace = format!("{port}/{channel}/{base_denom}");
    let hash = keccak256(trace.as_bytes());
    format!("{IBC_DENOM_PREFIX}{}", hex::encode_upper(hash))
}
