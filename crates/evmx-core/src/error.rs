//! Error classification for precompile construction and execution.
//!
//! Per-call failures are values the VM can revert on; only
//! [`ConstructionError`] is fatal, and only at startup, before the
//! offending contract is ever registered.

use alloy_primitives::Address;
use evmx_state::{OutOfGasError, StateError};

/// A classified per-call failure.
///
/// Returned to the VM integrator, which decides whether it reverts the
/// call, the transaction, or neither. Nothing here is a fault: every
/// variant is an expected outcome of running attacker-controlled input.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PrecompileError {
    /// The input's selector does not name a registered method.
    #[error("unknown method: {0}")]
    UnknownMethod(String),
    /// A state-mutating method was invoked under a static call.
    #[error("write protection: method {0} cannot run in a read-only context")]
    ReadOnlyViolation(String),
    /// A non-payable method received a call value.
    #[error("method {0} does not accept a call value")]
    NonPayable(String),
    /// The input bytes do not decode against the method's parameter types.
    #[error("argument decoding failed for {method}: {reason}")]
    ArgumentDecode {
        /// Method whose arguments failed to decode.
        method: String,
        /// Decoder failure description.
        reason: String,
    },
    /// A handler-level domain rule rejected the call.
    #[error("{0}")]
    BusinessRule(String),
    /// Metered consumption exceeded what the VM frame can pay for.
    #[error("out of gas")]
    OutOfGas,
    /// A panic crossed the handler boundary; produced only by the
    /// [`run_precompiled_contract`](crate::run_precompiled_contract) guard.
    #[error("internal precompile fault: {0}")]
    Internal(String),
}

impl PrecompileError {
    /// Shorthand for [`PrecompileError::BusinessRule`].
    pub fn business(msg: impl Into<String>) -> Self {
        Self::BusinessRule(msg.into())
    }
}

impl From<StateError> for PrecompileError {
    fn from(err: StateError) -> Self {
        match err {
            StateError::OutOfGas(_) => Self::OutOfGas,
            other => Self::BusinessRule(other.to_string()),
        }
    }
}

impl From<OutOfGasError> for PrecompileError {
    fn from(_: OutOfGasError) -> Self {
        Self::OutOfGas
    }
}

/// A fatal startup failure: the contract cannot be built, so it is never
/// registered and the process should refuse to come up.
#[derive(Debug, thiserror::Error)]
pub enum ConstructionError {
    /// The interface description is not valid ABI JSON.
    #[error("invalid interface description: {0}")]
    InvalidAbi(#[from] serde_json::Error),
    /// The interface description declares no callable functions.
    #[error("interface declares no callable functions")]
    EmptyInterface,
    /// Two declared functions share a selector.
    #[error("duplicate selector 0x{selector} shared by {existing} and {duplicate}")]
    DuplicateSelector {
        /// Hex of the colliding selector.
        selector: String,
        /// Signature already holding the selector.
        existing: String,
        /// Signature that collided with it.
        duplicate: String,
    },
    /// A declared parameter type cannot be resolved for decoding.
    #[error("unsupported type for parameter {param:?} of {method}: {reason}")]
    UnsupportedType {
        /// Method declaring the parameter.
        method: String,
        /// Parameter name as declared.
        param: String,
        /// Resolver failure description.
        reason: String,
    },
    /// Two precompiles were registered at the same reserved address.
    #[error("precompile address {0} is already registered")]
    DuplicateAddress(Address),
}
