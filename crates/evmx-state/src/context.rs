//! Per-call execution context.

use crate::events::{Event, EventManager};
use crate::gas::{Gas, GasConfig, GasMeter, OutOfGasError};
use crate::store::{GasKv, KvStore};
use alloy_primitives::{Address, U256};

/// Block-level facts visible to a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockInfo {
    /// Height of the block being executed.
    pub height: u64,
    /// Block timestamp, seconds since epoch.
    pub time: u64,
}

/// Everything a handler may observe or consume during one call.
///
/// Constructed fresh per invocation by the dispatch layer and dropped when
/// the call exits; nothing in it survives across calls. The gas meter is
/// limited to the VM frame's remaining gas so chain-state work can never
/// outspend the frame, and `initial_gas` snapshots the meter at entry for
/// the settlement delta.
#[derive(Debug)]
pub struct CallContext {
    block: BlockInfo,
    caller: Address,
    value: U256,
    read_only: bool,
    gas_meter: GasMeter,
    initial_gas: Gas,
    kv_gas_config: GasConfig,
    events: EventManager,
}

impl CallContext {
    /// Creates a context for one call.
    pub fn new(
        block: BlockInfo,
        caller: Address,
        value: U256,
        read_only: bool,
        gas_limit: Gas,
        kv_gas_config: GasConfig,
    ) -> Self {
        let gas_meter = GasMeter::new(gas_limit);
        let initial_gas = gas_meter.gas_consumed();
        Self {
            block,
            caller,
            value,
            read_only,
            gas_meter,
            initial_gas,
            kv_gas_config,
            events: EventManager::new(),
        }
    }

    /// Block facts for this call.
    pub const fn block(&self) -> BlockInfo {
        self.block
    }

    /// EVM address that made the call.
    pub const fn caller(&self) -> Address {
        self.caller
    }

    /// Value sent along with the call.
    pub const fn value(&self) -> U256 {
        self.value
    }

    /// True when the call (or any enclosing frame) is static.
    pub const fn read_only(&self) -> bool {
        self.read_only
    }

    /// Meter snapshot taken when the context was built.
    pub const fn initial_gas(&self) -> Gas {
        self.initial_gas
    }

    /// The store tariff this call meters under.
    pub const fn kv_gas_config(&self) -> GasConfig {
        self.kv_gas_config
    }

    /// Read access to the gas meter.
    pub const fn gas_meter(&self) -> &GasMeter {
        &self.gas_meter
    }

    /// Mutable access to the gas meter, for metered store wrappers.
    pub fn gas_meter_mut(&mut self) -> &mut GasMeter {
        &mut self.gas_meter
    }

    /// Pays `amount` gas attributed to `descriptor`.
    pub fn consume_gas(&mut self, amount: Gas, descriptor: &'static str) -> Result<(), OutOfGasError> {
        self.gas_meter.consume(amount, descriptor)
    }

    /// Wraps `store` in a gas-charging view bound to this call's meter and
    /// tariff. Keepers route every state access through this.
    pub fn metered<'a>(&'a mut self, store: &'a mut dyn KvStore) -> GasKv<'a> {
        let config = self.kv_gas_config;
        GasKv::new(store, &mut self.gas_meter, config)
    }

    /// Appends an event to the call's buffer.
    pub fn emit_event(&mut self, event: Event) {
        self.events.emit(event);
    }

    /// Events emitted so far.
    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    /// Drains the emitted events, used at call exit.
    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take()
    }
}
