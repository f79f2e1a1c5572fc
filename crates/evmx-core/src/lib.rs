//! Dispatch and metering core for stateful precompiled contracts.
//!
//! A precompile built on this crate exposes the uniform VM-facing surface
//! ([`StatefulPrecompile`]) and runs every call through the same loop:
//! selector resolution against a [`MethodRegistry`] built once from a JSON
//! ABI, the read-only/payability gate, argument decoding, handler
//! execution against a fresh [`CallContext`](evmx_state::CallContext), and
//! gas settlement that deducts exactly the metered chain-state cost from
//! the VM frame. Every failure is a classified [`PrecompileError`]; the
//! [`run_precompiled_contract`] boundary converts even a stray panic into
//! one instead of letting it unwind into consensus-critical code.

pub mod context;
pub mod dispatch;
pub mod error;
pub mod gas;
pub mod gate;
pub mod precompile;
pub mod registry;
pub mod set;

pub use context::build_call_context;
pub use dispatch::{finish, run_precompiled_contract, setup, Dispatch};
pub use error::{ConstructionError, PrecompileError};
pub use gas::{estimate_gas, settle_gas};
pub use precompile::{CallFrame, PrecompileOutput, StatefulPrecompile};
pub use registry::{MethodDescriptor, MethodRegistry, Selector};
pub use set::PrecompileSet;
