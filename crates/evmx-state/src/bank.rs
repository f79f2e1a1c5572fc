//! Bank keeper: token balances and supplies.
//!
//! Balances are stored per `(account, denom)`, supplies per denom, both as
//! 32-byte big-endian amounts. A zero balance is deleted rather than stored,
//! so iteration only ever yields holdings. All trait methods meter their
//! store access through the calling context; the unmetered `set_balance`
//! seeding path exists for wiring and tests only.

use crate::context::CallContext;
use crate::error::StateError;
use crate::events::Event;
use crate::store::MemStore;
use alloy_primitives::{Address, U256};
use evmx_primitives::{Coin, CoinError};
use parking_lot::RwLock;
use std::sync::Arc;

const BALANCE_PREFIX: &[u8] = b"bank/balances/";
const SUPPLY_PREFIX: &[u8] = b"bank/supply/";

/// Capability for reading and moving token balances.
pub trait BankKeeper: Send + Sync {
    /// Balance of `account` in `denom`; zero when the account holds none.
    fn balance(
        &self,
        ctx: &mut CallContext,
        account: Address,
        denom: &str,
    ) -> Result<U256, StateError>;

    /// All non-zero balances of `account`, sorted by denomination.
    fn balances(&self, ctx: &mut CallContext, account: Address) -> Result<Vec<Coin>, StateError>;

    /// Total supply of `denom`; zero when the denomination is unknown.
    fn supply_of(&self, ctx: &mut CallContext, denom: &str) -> Result<U256, StateError>;

    /// Total supply of every known denomination, sorted by denomination.
    fn total_supply(&self, ctx: &mut CallContext) -> Result<Vec<Coin>, StateError>;

    /// Moves `coin` from `from` to `to`.
    ///
    /// Fails with [`StateError::InsufficientBalance`] when `from` cannot
    /// cover the amount; a zero amount is rejected as invalid.
    fn send(
        &self,
        ctx: &mut CallContext,
        from: Address,
        to: Address,
        coin: &Coin,
    ) -> Result<(), StateError>;
}

/// In-memory [`BankKeeper`] backed by a shared [`MemStore`].
#[derive(Debug, Default)]
pub struct MemBank {
    store: Arc<RwLock<MemStore>>,
}

impl MemBank {
    /// Creates an empty bank.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `account`'s balance of `coin.denom` to `coin.amount`, adjusting
    /// the tracked supply by the difference. Unmetered; for wiring and
    /// tests, not for handlers.
    pub fn set_balance(&self, account: Address, coin: &Coin) -> Result<(), StateError> {
        use crate::store::KvStore;
        let mut store = self.store.write();
        let key = balance_key(&account, &coin.denom);
        let old = match store.get(&key) {
            Some(bytes) => decode_amount(&bytes)?,
            None => U256::ZERO,
        };
        let skey = supply_key(&coin.denom);
        let supply = match store.get(&skey) {
            Some(bytes) => decode_amount(&bytes)?,
            None => U256::ZERO,
        };
        let supply = supply
            .checked_sub(old)
            .and_then(|s| s.checked_add(coin.amount))
            .ok_or_else(|| StateError::invalid("supply arithmetic overflow"))?;
        if coin.amount.is_zero() {
            store.delete(&key);
        } else {
            store.set(key, encode_amount(coin.amount));
        }
        if supply.is_zero() {
            store.delete(&skey);
        } else {
            store.set(skey, encode_amount(supply));
        }
        Ok(())
    }
}

impl BankKeeper for MemBank {
    fn balance(
        &self,
        ctx: &mut CallContext,
        account: Address,
        denom: &str,
    ) -> Result<U256, StateError> {
        let mut backing = self.store.write();
        let mut store = ctx.metered(&mut *backing);
        match store.get(&balance_key(&account, denom))? {
            Some(bytes) => decode_amount(&bytes),
            None => Ok(U256::ZERO),
        }
    }

    fn balances(&self, ctx: &mut CallContext, account: Address) -> Result<Vec<Coin>, StateError> {
        let prefix = account_prefix(&account);
        let mut backing = self.store.write();
        let mut store = ctx.metered(&mut *backing);
        let entries = store.scan_prefix(&prefix)?;
        decode_coin_entries(entries, prefix.len())
    }

    fn supply_of(&self, ctx: &mut CallContext, denom: &str) -> Result<U256, StateError> {
        let mut backing = self.store.write();
        let mut store = ctx.metered(&mut *backing);
        match store.get(&supply_key(denom))? {
            Some(bytes) => decode_amount(&bytes),
            None => Ok(U256::ZERO),
        }
    }

    fn total_supply(&self, ctx: &mut CallContext) -> Result<Vec<Coin>, StateError> {
        let mut backing = self.store.write();
        let mut store = ctx.metered(&mut *backing);
        let entries = store.scan_prefix(SUPPLY_PREFIX)?;
        decode_coin_entries(entries, SUPPLY_PREFIX.len())
    }

    fn send(
        &self,
        ctx: &mut CallContext,
        from: Address,
        to: Address,
        coin: &Coin,
    ) -> Result<(), StateError> {
        if coin.amount.is_zero() {
            return Err(StateError::invalid("cannot send a zero amount"));
        }
        {
            let mut backing = self.store.write();
            let mut store = ctx.metered(&mut *backing);

            let from_key = balance_key(&from, &coin.denom);
            let from_balance = match store.get(&from_key)? {
                Some(bytes) => decode_amount(&bytes)?,
                None => U256::ZERO,
            };
            let Some(new_from) = from_balance.checked_sub(coin.amount) else {
                return Err(StateError::InsufficientBalance {
                    denom: coin.denom.clone(),
                    available: from_balance,
                    requested: coin.amount,
                });
            };

            let to_key = balance_key(&to, &coin.denom);
            let to_balance = match store.get(&to_key)? {
                Some(bytes) => decode_amount(&bytes)?,
                None => U256::ZERO,
            };
            let new_to = to_balance.checked_add(coin.amount).ok_or(StateError::Coin(
                CoinError::AmountOverflow { lhs: to_balance, rhs: coin.amount },
            ))?;

            if new_from.is_zero() {
                store.delete(&from_key)?;
            } else {
                store.set(from_key, encode_amount(new_from))?;
            }
            store.set(to_key, encode_amount(new_to))?;
        }

        tracing::debug!(target: "evmx::state", %from, %to, coin = %coin, "bank send");
        ctx.emit_event(
            Event::new("transfer")
                .attr("sender", from.to_string())
                .attr("recipient", to.to_string())
                .attr("amount", coin.to_string()),
        );
        Ok(())
    }
}

fn balance_key(account: &Address, denom: &str) -> Vec<u8> {
    let mut key = account_prefix(account);
    key.extend_from_slice(denom.as_bytes());
    key
}

fn account_prefix(account: &Address) -> Vec<u8> {
    let mut key = Vec::with_capacity(BALANCE_PREFIX.len() + 21);
    key.extend_from_slice(BALANCE_PREFIX);
    key.extend_from_slice(account.as_slice());
    key.push(b'/');
    key
}

fn supply_key(denom: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(SUPPLY_PREFIX.len() + denom.len());
    key.extend_from_slice(SUPPLY_PREFIX);
    key.extend_from_slice(denom.as_bytes());
    key
}

fn encode_amount(amount: U256) -> Vec<u8> {
    amount.to_be_bytes::<32>().to_vec()
}

fn decode_amount(bytes: &[u8]) -> Result<U256, StateError> {
    if bytes.len() != 32 {
        return Err(StateError::invalid("corrupted amount encoding"));
    }
    Ok(U256::from_be_slice(bytes))
}

fn decode_coin_entries(
    entries: Vec<(Vec<u8>, Vec<u8>)>,
    prefix_len: usize,
) -> Result<Vec<Coin>, StateError> {
    let mut coins = Vec::with_capacity(entries.len());
    for (key, value) in entries {
        let denom = std::str::from_utf8(&key[prefix_len..])
            .map_err(|_| StateError::invalid("corrupted balance key"))?;
        let amount = decode_amount(&value)?;
        if amount.is_zero() {
            continue;
        }
        coins.push(Coin { denom: denom.to_owned(), amount });
    }
    Ok(coins)
}
