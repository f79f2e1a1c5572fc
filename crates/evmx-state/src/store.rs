//! Key-value storage with gas-charging access.

use crate::gas::{GasConfig, GasMeter, OutOfGasError};
use std::collections::BTreeMap;

/// Byte-keyed, byte-valued ordered storage.
///
/// The trait is deliberately minimal: the keepers build their own key
/// schemas on top, and the metered wrapper [`GasKv`] prices each operation.
pub trait KvStore {
    /// Returns the value stored under `key`.
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: Vec<u8>, value: Vec<u8>);

    /// Removes `key`. Removing an absent key is a no-op.
    fn delete(&mut self, key: &[u8]);

    /// Returns true when `key` is present.
    fn has(&self, key: &[u8]) -> bool;

    /// Returns all entries whose key starts with `prefix`, in key order.
    fn scan_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)>;
}

/// In-memory [`KvStore`] backed by a `BTreeMap`.
#[derive(Debug, Default, Clone)]
pub struct MemStore {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true when no entries are stored.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KvStore for MemStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.entries.insert(key, value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.entries.remove(key);
    }

    fn has(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.entries
            .range(prefix.to_vec()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Gas-charging view over a [`KvStore`].
///
/// Flat costs are charged before the underlying operation, per-byte costs
/// after, on key plus value length. A failed charge leaves the store
/// untouched for writes because the flat cost is paid first.
pub struct GasKv<'a> {
    store: &'a mut dyn KvStore,
    meter: &'a mut GasMeter,
    config: GasConfig,
}

impl std::fmt::Debug for GasKv<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GasKv")
            .field("meter", &self.meter)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<'a> GasKv<'a> {
    /// Wraps `store`, charging `meter` per `config`.
    pub fn new(store: &'a mut dyn KvStore, meter: &'a mut GasMeter, config: GasConfig) -> Self {
        Self { store, meter, config }
    }

    /// Metered read.
    pub fn get(&mut self, key: &[u8]) -> Result<Option<Vec<u8>>, OutOfGasError> {
        self.meter.consume(self.config.read_cost_flat, "store read flat")?;
        let value = self.store.get(key);
        let value_len = value.as_ref().map_or(0, Vec::len);
        self.meter.consume_per_byte(
            self.config.read_cost_per_byte,
            key.len() + value_len,
            "store read per byte",
        )?;
        Ok(value)
    }

    /// Metered write.
    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>) -> Result<(), OutOfGasError> {
        self.meter.consume(self.config.write_cost_flat, "store write flat")?;
        self.meter.consume_per_byte(
            self.config.write_cost_per_byte,
            key.len() + value.len(),
            "store write per byte",
        )?;
        self.store.set(key, value);
        Ok(())
    }

    /// Metered delete.
    pub fn delete(&mut self, key: &[u8]) -> Result<(), OutOfGasError> {
        self.meter.consume(self.config.delete_cost, "store delete")?;
        self.store.delete(key);
        Ok(())
    }

    /// Metered existence check.
    pub fn has(&mut self, key: &[u8]) -> Result<bool, OutOfGasError> {
        self.meter.consume(self.config.has_cost, "store has")?;
        Ok(self.store.has(key))
    }

    /// Metered prefix scan: one flat read plus a per-entry charge.
    pub fn scan_prefix(&mut self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, OutOfGasError> {
        self.meter.consume(self.config.read_cost_flat, "store scan flat")?;
        let entries = self.store.scan_prefix(prefix);
        for (key, value) in &entries {
            self.meter.consume(self.config.iter_next_cost_flat, "store scan next")?;
            self.meter.consume_per_byte(
                self.config.read_cost_per_byte,
                key.len() + value.len(),
                "store scan per byte",
            )?;
        }
        Ok(entries)
    }
}
