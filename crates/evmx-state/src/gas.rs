//! Unit-of-work gas accounting.
//!
//! The meter here is the chain-side counter: it prices state access in the
//! chain's own gas units while the VM keeps its own counter on the call
//! frame. The dispatch layer reconciles the two exactly once per call.
//! Unlike the classic panic-on-exhaustion meter, [`GasMeter::consume`]
//! returns a typed error so handlers can propagate exhaustion with `?`.

/// Gas amounts are unsigned 64-bit units.
pub type Gas = u64;

/// Raised when a [`GasMeter`] cannot cover a consumption request.
///
/// Also raised when gas arithmetic overflows: an overflowing amount is
/// treated as maximum cost, never clamped to zero.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("out of gas in {descriptor}: requested {requested}, consumed {consumed} of limit {limit}")]
pub struct OutOfGasError {
    /// What was being paid for when the meter ran out.
    pub descriptor: &'static str,
    /// Amount of the failed consumption request.
    pub requested: Gas,
    /// Gas consumed before the failed request.
    pub consumed: Gas,
    /// The meter's limit.
    pub limit: Gas,
}

/// A bounded gas meter.
///
/// Maintains `consumed <= limit`; a failed consumption saturates the meter
/// so no further work can be paid for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GasMeter {
    limit: Gas,
    consumed: Gas,
}

impl GasMeter {
    /// Creates a meter that can pay for up to `limit` gas.
    pub const fn new(limit: Gas) -> Self {
        Self { limit, consumed: 0 }
    }

    /// Gas consumed so far.
    pub const fn gas_consumed(&self) -> Gas {
        self.consumed
    }

    /// The meter's limit.
    pub const fn limit(&self) -> Gas {
        self.limit
    }

    /// Gas still available.
    pub const fn gas_remaining(&self) -> Gas {
        self.limit - self.consumed
    }

    /// Pays for `amount` gas attributed to `descriptor`.
    ///
    /// On failure the meter saturates at its limit and every later request
    /// fails too.
    pub fn consume(&mut self, amount: Gas, descriptor: &'static str) -> Result<(), OutOfGasError> {
        let requested_total = self.consumed.checked_add(amount);
        match requested_total {
            Some(total) if total <= self.limit => {
                self.consumed = total;
                Ok(())
            }
            _ => {
                let err = OutOfGasError {
                    descriptor,
                    requested: amount,
                    consumed: self.consumed,
                    limit: self.limit,
                };
                self.consumed = self.limit;
                Err(err)
            }
        }
    }

    /// Pays for `len` items at `unit_cost` gas each.
    ///
    /// Overflow of `unit_cost * len` fails closed as out-of-gas.
    pub fn consume_per_byte(
        &mut self,
        unit_cost: Gas,
        len: usize,
        descriptor: &'static str,
    ) -> Result<(), OutOfGasError> {
        match unit_cost.checked_mul(len as Gas) {
            Some(amount) => self.consume(amount, descriptor),
            None => {
                let err = OutOfGasError {
                    descriptor,
                    requested: Gas::MAX,
                    consumed: self.consumed,
                    limit: self.limit,
                };
                self.consumed = self.limit;
                Err(err)
            }
        }
    }
}

/// Cost table for metered key-value access.
///
/// The defaults mirror the standard chain KV tariff. [`GasConfig::free`]
/// zeroes every entry; query-only precompiles run with the free table so
/// their flat per-method estimate is the whole cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GasConfig {
    /// Flat cost charged before every read.
    #[serde(default = "default_read_cost_flat")]
    pub read_cost_flat: Gas,
    /// Per-byte cost of key plus value on reads.
    #[serde(default = "default_read_cost_per_byte")]
    pub read_cost_per_byte: Gas,
    /// Flat cost charged before every write.
    #[serde(default = "default_write_cost_flat")]
    pub write_cost_flat: Gas,
    /// Per-byte cost of key plus value on writes.
    #[serde(default = "default_write_cost_per_byte")]
    pub write_cost_per_byte: Gas,
    /// Flat cost of a delete.
    #[serde(default = "default_delete_cost")]
    pub delete_cost: Gas,
    /// Flat cost of an existence check.
    #[serde(default = "default_has_cost")]
    pub has_cost: Gas,
    /// Flat cost per entry yielded by a prefix scan.
    #[serde(default = "default_iter_next_cost_flat")]
    pub iter_next_cost_flat: Gas,
}

const fn default_read_cost_flat() -> Gas {
    1000
}

const fn default_read_cost_per_byte() -> Gas {
    3
}

const fn default_write_cost_flat() -> Gas {
    2000
}

const fn default_write_cost_per_byte() -> Gas {
    30
}

const fn default_delete_cost() -> Gas {
    1000
}

const fn default_has_cost() -> Gas {
    1000
}

const fn default_iter_next_cost_flat() -> Gas {
    30
}

impl Default for GasConfig {
    fn default() -> Self {
        Self {
            read_cost_flat: default_read_cost_flat(),
            read_cost_per_byte: default_read_cost_per_byte(),
            write_cost_flat: default_write_cost_flat(),
            write_cost_per_byte: default_write_cost_per_byte(),
            delete_cost: default_delete_cost(),
            has_cost: default_has_cost(),
            iter_next_cost_flat: default_iter_next_cost_flat(),
        }
    }
}

impl GasConfig {
    /// A zeroed tariff: state access consumes no gas.
    pub const fn free() -> Self {
        Self {
            read_cost_flat: 0,
            read_cost_per_byte: 0,
            write_cost_flat: 0,
            write_cost_per_byte: 0,
            delete_cost: 0,
            has_cost: 0,
            iter_next_cost_flat: 0,
        }
    }
}
