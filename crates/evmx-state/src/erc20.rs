//! Registry of denomination ↔ ERC-20 token address pairs.
//!
//! Balance queries surfaced to the EVM are keyed by token contract address,
//! not by denomination; this registry is the bridge. Denominations without
//! a registered pair simply do not exist from the EVM's point of view.

use crate::context::CallContext;
use crate::error::StateError;
use crate::store::MemStore;
use alloy_primitives::Address;
use evmx_primitives::validate_denom;
use parking_lot::RwLock;
use std::sync::Arc;

const DENOM_PREFIX: &[u8] = b"erc20/denom/";
const TOKEN_PREFIX: &[u8] = b"erc20/token/";

/// Capability for resolving denomination ↔ token address pairs.
pub trait Erc20Registry: Send + Sync {
    /// Token contract address paired with `denom`, if any.
    fn token_address(
        &self,
        ctx: &mut CallContext,
        denom: &str,
    ) -> Result<Option<Address>, StateError>;

    /// Denomination paired with `token`, if any.
    fn pair_denom(
        &self,
        ctx: &mut CallContext,
        token: Address,
    ) -> Result<Option<String>, StateError>;
}

/// In-memory [`Erc20Registry`] backed by a shared [`MemStore`].
#[derive(Debug, Default)]
pub struct MemErc20Registry {
    store: Arc<RwLock<MemStore>>,
}

impl MemErc20Registry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the pair `denom` ↔ `token`, both directions. Unmetered;
    /// for wiring and tests.
    pub fn register_pair(&self, denom: &str, token: Address) -> Result<(), StateError> {
        use crate::store::KvStore;
        validate_denom(denom).map_err(evmx_primitives::CoinError::from)?;
        let mut store = self.store.write();
        store.set(denom_key(denom), token.as_slice().to_vec());
        store.set(token_key(&token), denom.as_bytes().to_vec());
        Ok(())
    }
}

impl Erc20Registry for MemErc20Registry {
    fn token_address(
        &self,
        ctx: &mut CallContext,
        denom: &str,
    ) -> Result<Option<Address>, StateError> {
        let mut backing = self.store.write();
        let mut store = ctx.metered(&mut *backing);
        match store.get(&denom_key(denom))? {
            Some(bytes) if bytes.len() == Address::len_bytes() => {
                Ok(Some(Address::from_slice(&bytes)))
            }
            Some(_) => Err(StateError::invalid("corrupted token pair entry")),
            None => Ok(None),
        }
    }

    fn pair_denom(
        &self,
        ctx: &mut CallContext,
        token: Address,
    ) -> Result<Option<String>, StateError> {
        let mut backing = self.store.write();
        let mut store = ctx.metered(&mut *backing);
        match store.get(&token_key(&token))? {
            Some(bytes) => String::from_utf8(bytes)
                .map(Some)
                .map_err(|_| StateError::invalid("corrupted token pair entry")),
            None => Ok(None),
        }
    }
}

fn denom_key(denom: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(DENOM_PREFIX.len() + denom.len());
    key.extend_from_slice(DENOM_PREFIX);
    key.extend_from_slice(denom.as_bytes());
    key
}

fn token_key(token: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(TOKEN_PREFIX.len() + 20);
    key.extend_from_slice(TOKEN_PREFIX);
    key.extend_from_slice(token.as_slice());
    key
}
