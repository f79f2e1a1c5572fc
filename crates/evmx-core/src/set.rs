//! Address-keyed collection of registered precompiles.
//!
//! The set is assembled once at startup and shared immutably afterwards;
//! registration collisions are [`ConstructionError`]s, so two contracts
//! can never silently shadow one address.

use crate::dispatch::run_precompiled_contract;
use crate::error::{ConstructionError, PrecompileError};
use crate::precompile::{CallFrame, PrecompileOutput, StatefulPrecompile};
use alloy_primitives::Address;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Routes calls to precompiles by target address.
#[derive(Clone, Default)]
pub struct PrecompileSet {
    precompiles: BTreeMap<Address, Arc<dyn StatefulPrecompile>>,
}

impl fmt::Debug for PrecompileSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrecompileSet")
            .field("addresses", &self.precompiles.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl PrecompileSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `precompile` at its reserved address.
    pub fn register(
        &mut self,
        precompile: Arc<dyn StatefulPrecompile>,
    ) -> Result<(), ConstructionError> {
        let address = precompile.address();
        if self.precompiles.contains_key(&address) {
            return Err(ConstructionError::DuplicateAddress(address));
        }
        tracing::debug!(target: "evmx::dispatch", %address, "registered precompile");
        self.precompiles.insert(address, precompile);
        Ok(())
    }

    /// The precompile registered at `address`, if any.
    pub fn get(&self, address: &Address) -> Option<&Arc<dyn StatefulPrecompile>> {
        self.precompiles.get(address)
    }

    /// True when `address` hosts a precompile.
    pub fn contains(&self, address: &Address) -> bool {
        self.precompiles.contains_key(address)
    }

    /// Registered addresses, in order.
    pub fn addresses(&self) -> impl Iterator<Item = Address> + '_ {
        self.precompiles.keys().copied()
    }

    /// Number of registered precompiles.
    pub fn len(&self) -> usize {
        self.precompiles.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.precompiles.is_empty()
    }

    /// Runs the call the frame targets, if its address hosts a precompile.
    ///
    /// `None` means the address is not a precompile and the VM should
    /// treat the call as ordinary bytecode execution.
    pub fn call(
        &self,
        frame: &mut CallFrame,
        read_only: bool,
    ) -> Option<Result<PrecompileOutput, PrecompileError>> {
        let precompile = self.precompiles.get(&frame.target())?;
        Some(run_precompiled_contract(precompile.as_ref(), frame, read_only))
    }
}
