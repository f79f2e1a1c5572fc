//! The dispatch loop every precompile call walks.
//!
//! The path is fixed: eligibility check at entry, fresh context, selector
//! resolution, access gate, argument decode, handler execution, gas
//! settlement, exit with output and events. Handlers own only the
//! execution step; everything around it lives here so no contract can
//! skip a stage or reorder the gate behind a state access.
//!
//! Every failure on this path is a classified [`PrecompileError`] — a
//! panic escaping a handler is caught at the outermost boundary and
//! reported as [`PrecompileError::Internal`], never unwound into the VM.

use crate::context::build_call_context;
use crate::error::PrecompileError;
use crate::gate;
use crate::precompile::{CallFrame, PrecompileOutput, StatefulPrecompile};
use crate::registry::{MethodDescriptor, MethodRegistry};
use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{hex, Bytes};
use evmx_state::{CallContext, GasConfig};
use std::panic::{catch_unwind, AssertUnwindSafe};

/// A call that has passed setup, gate and decode, ready for its handler.
#[derive(Debug)]
pub struct Dispatch<'a> {
    ctx: CallContext,
    method: &'a MethodDescriptor,
    args: Vec<DynSolValue>,
}

impl<'a> Dispatch<'a> {
    /// The resolved method.
    pub fn method(&self) -> &'a MethodDescriptor {
        self.method
    }

    /// Decoded arguments, in declaration order.
    pub fn args(&self) -> &[DynSolValue] {
        &self.args
    }

    /// Read access to the call context.
    pub fn ctx(&self) -> &CallContext {
        &self.ctx
    }

    /// Mutable access to the call context.
    pub fn ctx_mut(&mut self) -> &mut CallContext {
        &mut self.ctx
    }

    /// Splits the dispatch for handler execution.
    pub fn into_parts(self) -> (CallContext, &'a MethodDescriptor, Vec<DynSolValue>) {
        (self.ctx, self.method, self.args)
    }
}

/// Runs setup, authorization and decode for one call.
///
/// On success the returned [`Dispatch`] holds a fresh context (meter
/// capped at the frame's remaining gas), the resolved method and its
/// decoded arguments. The gate runs before the decoder, so an
/// unauthorized call never gets its arguments parsed.
pub fn setup<'a>(
    registry: &'a MethodRegistry,
    frame: &CallFrame,
    inherited_read_only: bool,
    kv_gas_config: GasConfig,
) -> Result<Dispatch<'a>, PrecompileError> {
    // 1) Fresh context scoped to this frame; nothing survives from any
    //    previous call.
    let ctx = build_call_context(frame, inherited_read_only, kv_gas_config);

    // 2) Resolve the selector. Short or unknown input is a classified
    //    miss, never a slice panic.
    let input = frame.input();
    let method = registry
        .resolve(input)
        .ok_or_else(|| PrecompileError::UnknownMethod(selector_display(input)))?;

    // 3) Gate on mutability and payability before touching arguments.
    gate::authorize(method, &ctx)?;

    // 4) Decode arguments against the declared types.
    let args = method.abi_decode_input(&input[4..])?;

    tracing::debug!(
        target: "evmx::dispatch",
        method = method.name(),
        args = args.len(),
        gas_limit = ctx.gas_meter().limit(),
        read_only = ctx.read_only(),
        "dispatching precompile call"
    );
    Ok(Dispatch { ctx, method, args })
}

/// Settles a successful call and assembles its output.
///
/// Deducts the metered delta from the frame exactly once and drains the
/// context's event buffer into the output.
pub fn finish(
    mut ctx: CallContext,
    frame: &mut CallFrame,
    bytes: Bytes,
) -> Result<PrecompileOutput, PrecompileError> {
    let gas_used = crate::gas::settle_gas(&ctx, frame)?;
    tracing::debug!(
        target: "evmx::dispatch",
        gas_used,
        returned = bytes.len(),
        events = ctx.events().len(),
        "precompile call settled"
    );
    Ok(PrecompileOutput::new(gas_used, bytes).with_events(ctx.take_events()))
}

/// Outermost entry point for one call into `precompile`.
///
/// Aborts before execution when the frame cannot cover the precompile's
/// required-gas floor, deducting nothing. Wraps execution in a panic
/// boundary: whatever a handler does, the VM integrator sees a
/// `Result`, never an unwind.
pub fn run_precompiled_contract(
    precompile: &dyn StatefulPrecompile,
    frame: &mut CallFrame,
    read_only: bool,
) -> Result<PrecompileOutput, PrecompileError> {
    let required = precompile.required_gas(frame.input());
    if required > frame.gas_remaining() {
        tracing::debug!(
            target: "evmx::dispatch",
            address = %precompile.address(),
            required,
            remaining = frame.gas_remaining(),
            "call aborted below required-gas floor"
        );
        return Err(PrecompileError::OutOfGas);
    }

    match catch_unwind(AssertUnwindSafe(|| precompile.run(frame, read_only))) {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::warn!(
                target: "evmx::dispatch",
                address = %precompile.address(),
                message,
                "precompile panicked; classified as internal fault"
            );
            Err(PrecompileError::Internal(message.to_owned()))
        }
    }
}

fn selector_display(input: &[u8]) -> String {
    if input.len() < 4 {
        format!("input of {} bytes lacks a selector", input.len())
    } else {
        format!("selector 0x{}", hex::encode(&input[..4]))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "opaque panic payload"
    }
}
