//! Classified errors for the state layer.

use crate::gas::OutOfGasError;
use alloy_primitives::U256;
use evmx_primitives::CoinError;

/// Errors returned by keeper capabilities.
///
/// Every variant is a value-level failure the dispatch layer can classify;
/// keepers never panic on bad input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StateError {
    /// An account cannot cover a requested amount.
    #[error("insufficient balance of {denom}: {available} available, {requested} requested")]
    InsufficientBalance {
        /// Denomination of the shortfall.
        denom: String,
        /// Balance actually held.
        available: U256,
        /// Amount requested.
        requested: U256,
    },
    /// The caller holds no sufficient authorization for the operation.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// The referenced transfer channel does not exist.
    #[error("unknown channel {port}/{channel}")]
    UnknownChannel {
        /// Port identifier.
        port: String,
        /// Channel identifier.
        channel: String,
    },
    /// Coin construction or arithmetic failed.
    #[error(transparent)]
    Coin(#[from] CoinError),
    /// The chain-state gas meter ran out.
    #[error(transparent)]
    OutOfGas(#[from] OutOfGasError),
    /// A request was malformed in some other way.
    #[error("{0}")]
    InvalidRequest(String),
}

impl StateError {
    /// Shorthand for [`StateError::InvalidRequest`].
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }
}
