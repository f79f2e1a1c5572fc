//! Gas estimation and settlement across the frame/meter boundary.
//!
//! Estimation answers [`StatefulPrecompile::required_gas`]
//! (crate::StatefulPrecompile::required_gas): a pre-flight eligibility
//! floor that deducts nothing. Settlement runs once, at successful call
//! exit, and deducts from the frame exactly what the call's meter
//! recorded since entry. The two are intentionally independent numbers;
//! only settlement moves gas.

use crate::error::PrecompileError;
use crate::precompile::CallFrame;
use crate::registry::MethodDescriptor;
use evmx_state::{CallContext, Gas, GasConfig};

/// Estimates the gas floor for calling `method` with `args_len` bytes of
/// arguments.
///
/// A `flat_override` (per-method policy, e.g. a query-only contract's
/// fixed tariff) wins outright. Otherwise the estimate derives from the
/// store tariff: write costs for transactions, read costs for queries,
/// flat plus per argument byte, saturating rather than overflowing.
pub fn estimate_gas(
    method: &MethodDescriptor,
    config: GasConfig,
    flat_override: Option<Gas>,
    args_len: usize,
) -> Gas {
    if let Some(flat) = flat_override {
        return flat;
    }
    let (flat, per_byte) = if method.is_transaction() {
        (config.write_cost_flat, config.write_cost_per_byte)
    } else {
        (config.read_cost_flat, config.read_cost_per_byte)
    };
    flat.saturating_add(per_byte.saturating_mul(args_len as Gas))
}

/// Settles a finished call: deducts the metered delta from the frame.
///
/// The delta is `consumed - initial_gas` from the call's own meter.
/// Both an inverted snapshot and a frame that cannot pay fail closed as
/// [`PrecompileError::OutOfGas`]; on success the deduction happens
/// exactly once and the delta is returned for the output's `gas_used`.
pub fn settle_gas(ctx: &CallContext, frame: &mut CallFrame) -> Result<Gas, PrecompileError> {
    let consumed = ctx.gas_meter().gas_consumed();
    let Some(delta) = consumed.checked_sub(ctx.initial_gas()) else {
        tracing::warn!(
            target: "evmx::dispatch",
            consumed,
            initial = ctx.initial_gas(),
            "meter below its entry snapshot at settlement; failing closed"
        );
        return Err(PrecompileError::OutOfGas);
    };
    if !frame.use_gas(delta) {
        tracing::debug!(
            target: "evmx::dispatch",
            delta,
            remaining = frame.gas_remaining(),
            "frame cannot pay the metered delta"
        );
        return Err(PrecompileError::OutOfGas);
    }
    Ok(delta)
}
