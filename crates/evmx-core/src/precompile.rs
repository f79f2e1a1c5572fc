//! The contract between the VM integrator and a stateful precompile.
//!
//! A [`CallFrame`] is the integrator's view of one call: who called, with
//! what input, value and gas. A [`StatefulPrecompile`] consumes the frame
//! and answers with a [`PrecompileOutput`] or a classified
//! [`PrecompileError`](crate::PrecompileError); it never panics on frame
//! content and never touches gas beyond [`CallFrame::use_gas`].

use crate::error::PrecompileError;
use alloy_primitives::{Address, Bytes, U256};
use evmx_state::{BlockInfo, Event, Gas};

/// One VM call into a precompiled contract.
///
/// Gas here is the *frame's* remaining gas, shared with the rest of the
/// transaction; precompiles draw it down through [`CallFrame::use_gas`]
/// at settlement, not directly.
#[derive(Debug, Clone)]
pub struct CallFrame {
    caller: Address,
    target: Address,
    value: U256,
    input: Bytes,
    gas: Gas,
    is_static: bool,
    block: BlockInfo,
}

impl CallFrame {
    /// Creates a frame for a plain (non-static, zero-value) call.
    pub fn new(caller: Address, target: Address, input: Bytes, gas_limit: Gas) -> Self {
        Self {
            caller,
            target,
            value: U256::ZERO,
            input,
            gas: gas_limit,
            is_static: false,
            block: BlockInfo::default(),
        }
    }

    /// Attaches a call value.
    #[must_use]
    pub const fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }

    /// Marks the frame static (`STATICCALL`).
    #[must_use]
    pub const fn with_static(mut self, is_static: bool) -> Self {
        self.is_static = is_static;
        self
    }

    /// Pins the frame to a block.
    #[must_use]
    pub const fn at_block(mut self, block: BlockInfo) -> Self {
        self.block = block;
        self
    }

    /// Address that made the call.
    pub const fn caller(&self) -> Address {
        self.caller
    }

    /// Precompile address being called.
    pub const fn target(&self) -> Address {
        self.target
    }

    /// Value sent with the call.
    pub const fn value(&self) -> U256 {
        self.value
    }

    /// Raw call input, selector included.
    pub const fn input(&self) -> &Bytes {
        &self.input
    }

    /// Gas still available to this frame.
    pub const fn gas_remaining(&self) -> Gas {
        self.gas
    }

    /// True when this frame (not an ancestor) is static.
    pub const fn is_static(&self) -> bool {
        self.is_static
    }

    /// Block the call executes in.
    pub const fn block(&self) -> BlockInfo {
        self.block
    }

    /// Deducts `amount` from the frame's remaining gas.
    ///
    /// Answers `false`, deducting nothing, when the frame cannot pay.
    pub fn use_gas(&mut self, amount: Gas) -> bool {
        match self.gas.checked_sub(amount) {
            Some(remaining) => {
                self.gas = remaining;
                true
            }
            None => false,
        }
    }
}

/// Result of a successful precompile call.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PrecompileOutput {
    /// ABI-encoded return data.
    pub bytes: Bytes,
    /// Gas the call deducted from its frame.
    pub gas_used: Gas,
    /// Events the call emitted, in emission order.
    pub events: Vec<Event>,
}

impl PrecompileOutput {
    /// Creates an output with no events.
    pub const fn new(gas_used: Gas, bytes: Bytes) -> Self {
        Self { bytes, gas_used, events: Vec::new() }
    }

    /// Attaches emitted events.
    #[must_use]
    pub fn with_events(mut self, events: Vec<Event>) -> Self {
        self.events = events;
        self
    }
}

/// A precompiled contract that reads and writes chain state.
///
/// Implementations are registered once at startup and then shared across
/// calls, so methods take `&self`; per-call state lives in the
/// [`CallContext`](evmx_state::CallContext) each call builds for itself.
pub trait StatefulPrecompile: Send + Sync {
    /// The reserved address this contract answers at.
    fn address(&self) -> Address;

    /// Gas the call must have available before it is attempted.
    ///
    /// This is an eligibility floor checked by
    /// [`run_precompiled_contract`](crate::run_precompiled_contract);
    /// nothing is deducted here. Actual cost is what the call meters.
    fn required_gas(&self, input: &[u8]) -> Gas;

    /// Executes one call.
    ///
    /// `read_only` carries static-ness inherited from enclosing frames;
    /// the frame's own flag is OR-ed in by the context builder.
    fn run(
        &self,
        frame: &mut CallFrame,
        read_only: bool,
    ) -> Result<PrecompileOutput, PrecompileError>;

    /// True when `method` mutates state.
    fn is_transaction(&self, method: &str) -> bool;
}
