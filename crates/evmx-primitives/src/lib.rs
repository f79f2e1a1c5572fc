//! Coin and denomination primitives shared by the evmx state layer and
//! precompiles.

pub mod coin;
pub mod denom;

pub use coin::{Coin, CoinError};
pub use denom::{ibc_voucher_denom, validate_denom, DenomError, MAX_DENOM_LEN, MIN_DENOM_LEN};
