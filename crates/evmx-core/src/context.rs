//! Builds the per-call [`CallContext`] from a VM frame.

use crate::precompile::CallFrame;
use evmx_state::{CallContext, GasConfig};

/// Derives a fresh context for one call into a precompile.
///
/// The context's meter is capped at the frame's remaining gas, so chain
/// state work can never consume more than the frame could pay, and
/// `read_only` is the frame's own static flag OR-ed with static-ness
/// inherited from enclosing frames. Nothing is shared with any previous
/// call.
pub fn build_call_context(
    frame: &CallFrame,
    inherited_read_only: bool,
    kv_gas_config: GasConfig,
) -> CallContext {
    CallContext::new(
        frame.block(),
        frame.caller(),
        frame.value(),
        frame.is_static() || inherited_read_only,
        frame.gas_remaining(),
        kv_gas_config,
    )
}
