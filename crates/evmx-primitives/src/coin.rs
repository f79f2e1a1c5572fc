//! Denominated token amounts.

use crate::denom::{validate_denom, DenomError};
use alloy_primitives::U256;
use std::fmt;

/// A single token amount: a denomination plus a 256-bit quantity.
///
/// Amounts are unsigned; all arithmetic is checked and fails with a typed
/// error instead of wrapping.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Coin {
    /// Denomination of the token.
    pub denom: String,
    /// Amount in the denomination's base unit.
    pub amount: U256,
}

/// Errors raised by [`Coin`] construction and arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoinError {
    /// The denomination does not satisfy the denomination grammar.
    #[error(transparent)]
    Denom(#[from] DenomError),
    /// Adding two amounts overflowed 256 bits.
    #[error("amount overflow adding {rhs} to {lhs}")]
    AmountOverflow {
        /// Left operand.
        lhs: U256,
        /// Right operand.
        rhs: U256,
    },
    /// Subtracting would produce a negative amount.
    #[error("insufficient amount: cannot subtract {rhs} from {lhs}")]
    InsufficientAmount {
        /// Amount subtracted from.
        lhs: U256,
        /// Amount subtracted.
        rhs: U256,
    },
    /// Two coins of different denominations were combined.
    #[error("denom mismatch: {lhs} vs {rhs}")]
    DenomMismatch {
        /// Denomination of the left coin.
        lhs: String,
        /// Denomination of the right coin.
        rhs: String,
    },
}

impl Coin {
    /// Creates a coin after validating the denomination.
    pub fn new(denom: impl Into<String>, amount: U256) -> Result<Self, CoinError> {
        let denom = denom.into();
        validate_denom(&denom)?;
        Ok(Self { denom, amount })
    }

    /// Returns true when the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.amount.is_zero()
    }

    /// Returns a coin with `other.amount` added, checked.
    pub fn checked_add(&self, other: &Self) -> Result<Self, CoinError> {
        self.require_same_denom(other)?;
        let amount = self
            .amount
            .checked_add(other.amount)
            .ok_or(CoinError::AmountOverflow { lhs: self.amount, rhs: other.amount })?;
        Ok(Self { denom: self.denom.clone(), amount })
    }

    /// Returns a coin with `other.amount` subtracted, checked.
    pub fn checked_sub(&self, other: &Self) -> Result<Self, CoinError> {
        self.require_same_denom(other)?;
        let amount = self
            .amount
            .checked_sub(other.amount)
            .ok_or(CoinError::InsufficientAmount { lhs: self.amount, rhs: other.amount })?;
        Ok(Self { denom: self.denom.clone(), amount })
    }

    fn require_same_denom(&self, other: &Self) -> Result<(), CoinError> {
        if self.denom == other.denom {
            Ok(())
        } else {
            Err(CoinError::DenomMismatch {
                lhs: self.denom.clone(),
                rhs: other.denom.clone(),
            })
        }
    }
}

impl fmt::Display for Coin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}
