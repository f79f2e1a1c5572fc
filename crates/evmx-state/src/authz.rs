//! Authorization grants bridging EVM callers into native fund movement.
//!
//! The EVM caller of a precompile and the native owner of the funds being
//! moved are different trust domains. A grant is the explicit bridge: the
//! owner (granter) allows a specific caller (grantee) to spend up to a
//! per-denomination limit on its behalf. Spending decrements the limit;
//! an exhausted grant is removed.

use crate::context::CallContext;
use crate::error::StateError;
use crate::store::MemStore;
use alloy_primitives::{Address, U256};
use evmx_primitives::Coin;
use parking_lot::RwLock;
use std::sync::Arc;

const GRANT_PREFIX: &[u8] = b"authz/grants/";

/// Capability for managing and consuming spend authorizations.
pub trait AuthzKeeper: Send + Sync {
    /// Remaining spend limit for (`grantee`, `granter`, `denom`); zero when
    /// no grant exists.
    fn allowance(
        &self,
        ctx: &mut CallContext,
        grantee: Address,
        granter: Address,
        denom: &str,
    ) -> Result<U256, StateError>;

    /// Creates or replaces a grant. A zero amount removes it.
    fn set_allowance(
        &self,
        ctx: &mut CallContext,
        grantee: Address,
        granter: Address,
        denom: &str,
        amount: U256,
    ) -> Result<(), StateError>;

    /// Consumes `coin.amount` of the grant, decrementing the limit.
    ///
    /// Fails with [`StateError::Unauthorized`] when no grant exists or the
    /// limit is below the requested amount; the grant is left untouched in
    /// that case.
    fn spend(
        &self,
        ctx: &mut CallContext,
        grantee: Address,
        granter: Address,
        coin: &Coin,
    ) -> Result<(), StateError>;

    /// Removes a grant. Removing an absent grant is a no-op.
    fn revoke(
        &self,
        ctx: &mut CallContext,
        grantee: Address,
        granter: Address,
        denom: &str,
    ) -> Result<(), StateError>;
}

/// In-memory [`AuthzKeeper`] backed by a shared [`MemStore`].
#[derive(Debug, Default)]
pub struct MemAuthz {
    store: Arc<RwLock<MemStore>>,
}

impl MemAuthz {
    /// Creates an empty grant store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuthzKeeper for MemAuthz {
    fn allowance(
        &self,
        ctx: &mut CallContext,
        grantee: Address,
        granter: Address,
        denom: &str,
    ) -> Result<U256, StateError> {
        let mut backing = self.store.write();
        let mut store = ctx.metered(&mut *backing);
        match store.get(&grant_key(&grantee, &granter, denom))? {
            Some(bytes) => decode_limit(&bytes),
            None => Ok(U256::ZERO),
        }
    }

    fn set_allowance(
        &self,
        ctx: &mut CallContext,
        grantee: Address,
        granter: Address,
        denom: &str,
        amount: U256,
    ) -> Result<(), StateError> {
        let key = grant_key(&grantee, &granter, denom);
        let mut backing = self.store.write();
        let mut store = ctx.metered(&mut *backing);
        if amount.is_zero() {
            store.delete(&key)?;
        } else {
            store.set(key, amount.to_be_bytes::<32>().to_vec())?;
        }
        Ok(())
    }

    fn spend(
        &self,
        ctx: &mut CallContext,
        grantee: Address,
        granter: Address,
        coin: &Coin,
    ) -> Result<(), StateError> {
        let key = grant_key(&grantee, &granter, &coin.denom);
        let mut backing = self.store.write();
        let mut store = ctx.metered(&mut *backing);

        let limit = match store.get(&key)? {
            Some(bytes) => decode_limit(&bytes)?,
            None => {
                tracing::warn!(
                    target: "evmx::state",
                    %grantee,
                    %granter,
                    denom = %coin.denom,
                    "spend attempt without a grant"
                );
                return Err(StateError::Unauthorized(format!(
                    "no {} authorization for grantee {grantee} from {granter}",
                    coin.denom
                )));
            }
        };
        let Some(remaining) = limit.checked_sub(coin.amount) else {
            return Err(StateError::Unauthorized(format!(
                "authorization limit {limit}{} below requested {}",
                coin.denom, coin
            )));
        };

        if remaining.is_zero() {
            store.delete(&key)?;
        } else {
            store.set(key, remaining.to_be_bytes::<32>().to_vec())?;
        }
        Ok(())
    }

    fn revoke(
        &self,
        ctx: &mut CallContext,
        grantee: Address,
        granter: Address,
        denom: &str,
    ) -> Result<(), StateError> {
        let key = grant_key(&grantee, &granter, denom);
        let mut backing = self.store.write();
        let mut store = ctx.metered(&mut *backing);
        store.delete(&key)?;
        Ok(())
    }
}

fn grant_key(grantee: &Address, granter: &Address, denom: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(GRANT_PREFIX.len() + 41 + denom.len());
    key.extend_from_slice(GRANT_PREFIX);
    key.extend_from_slice(granter.as_slice());
    key.extend_from_slice(grantee.as_slice());
    key.push(b'/');
    key.extend_from_slice(denom.as_bytes());
    key
}

fn decode_limit(bytes: &[u8]) -> Result<U256, StateError> {
    if bytes.len() != 32 {
        return Err(StateError::invalid("corrupted grant entry"));
    }
    Ok(U256::from_be_slice(bytes))
}
