//! Access-control gate, run after method resolution and before anything
//! touches arguments or state.
//!
//! Two cheap checks: a state-mutating method cannot run in a read-only
//! context, and a non-payable method cannot receive a call value. Both
//! reject by classification, never by panic, so a `STATICCALL` probe at
//! a transaction method costs the caller nothing but the call itself.

use crate::error::PrecompileError;
use crate::registry::MethodDescriptor;
use evmx_state::CallContext;

/// Checks `method` against the call's context flags.
pub fn authorize(method: &MethodDescriptor, ctx: &CallContext) -> Result<(), PrecompileError> {
    if method.is_transaction() && ctx.read_only() {
        tracing::debug!(
            target: "evmx::dispatch",
            method = method.name(),
            "rejected state-mutating method in read-only context"
        );
        return Err(PrecompileError::ReadOnlyViolation(method.name().to_owned()));
    }
    if !ctx.value().is_zero() && !method.payable() {
        tracing::debug!(
            target: "evmx::dispatch",
            method = method.name(),
            value = %ctx.value(),
            "rejected call value at non-payable method"
        );
        return Err(PrecompileError::NonPayable(method.name().to_owned()));
    }
    Ok(())
}
