//! Bank Precompile
//!
//! Read-only view over the chain's native bank, keyed by the ERC-20
//! contracts its denominations are paired with.
//!
//! ## Overview
//!
//! Contracts query native balances and supplies through familiar
//! address-keyed shapes: every answer is denominated in the paired ERC-20
//! contract address, never in raw denomination strings. Denominations
//! without a registered pair are simply absent from list answers, and
//! `supplyOf` answers zero for an unknown token rather than failing, so
//! callers can probe without try/catch.
//!
//! ## Address
//!
//! The precompile is reserved at `0x0000000000000000000000000000000000000804`.
//!
//! ## Interface
//!
//! ```solidity
//! struct Balance {
//!     address contractAddress;
//!     uint256 amount;
//! }
//!
//! interface IBank {
//!     function balances(address account) external view returns (Balance[] memory);
//!     function totalSupply() external view returns (Balance[] memory);
//!     function supplyOf(address erc20Address) external view returns (uint256);
//! }
//! ```
//!
//! ## Gas
//!
//! Every method costs a flat, configurable amount ([`BankConfig`], default
//! 100 each). The handlers consume that flat cost up front and run their
//! store accesses under a free tariff, so the flat figure is both the
//! eligibility floor and the exact amount settled against the frame.
//!
//! | Method | Default cost |
//! |--------|--------------|
//! | `balances` | 100 |
//! | `totalSupply` | 100 |
//! | `supplyOf` | 100 |

use crate::args::address_arg;
use crate::config::BankConfig;
use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{address, Address, U256};
use evmx_core::{
    finish, setup, CallFrame, ConstructionError, MethodRegistry, PrecompileError,
    PrecompileOutput, StatefulPrecompile,
};
use evmx_primitives::Coin;
use evmx_state::{BankKeeper, CallContext, Erc20Registry, Gas, GasConfig};
use std::sync::Arc;

/// Reserved address of the bank precompile.
pub const BANK_ADDRESS: Address = address!("0x0000000000000000000000000000000000000804");

const BANK_ABI: &str = include_str!("abi/bank.json");

/// Query-only precompile exposing bank balances and supplies.
pub struct BankPrecompile {
    registry: MethodRegistry,
    config: BankConfig,
    bank: Arc<dyn BankKeeper>,
    erc20: Arc<dyn Erc20Registry>,
}

impl std::fmt::Debug for BankPrecompile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BankPrecompile")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BankPrecompile {
    /// Builds the precompile, resolving its interface description.
    pub fn new(
        config: BankConfig,
        bank: Arc<dyn BankKeeper>,
        erc20: Arc<dyn Erc20Registry>,
    ) -> Result<Self, ConstructionError> {
        let registry = MethodRegistry::from_abi_json(BANK_ABI)?;
        Ok(Self { registry, config, bank, erc20 })
    }

    fn balances(
        &self,
        ctx: &mut CallContext,
        args: &[DynSolValue],
    ) -> Result<Vec<DynSolValue>, PrecompileError> {
        ctx.consume_gas(self.config.balances_gas, "bank.balances")?;
        let account = address_arg(args, 0, "balances")?;
        let coins = self.bank.balances(ctx, account)?;
        Ok(vec![self.paired_entries(ctx, coins)?])
    }

    fn total_supply(&self, ctx: &mut CallContext) -> Result<Vec<DynSolValue>, PrecompileError> {
        ctx.consume_gas(self.config.total_supply_gas, "bank.totalSupply")?;
        let coins = self.bank.total_supply(ctx)?;
        Ok(vec![self.paired_entries(ctx, coins)?])
    }

    fn supply_of(
        &self,
        ctx: &mut CallContext,
        args: &[DynSolValue],
    ) -> Result<Vec<DynSolValue>, PrecompileError> {
        ctx.consume_gas(self.config.supply_of_gas, "bank.supplyOf")?;
        let token = address_arg(args, 0, "supplyOf")?;
        // An unknown pair answers zero, it is not an error.
        let amount = match self.erc20.pair_denom(ctx, token)? {
            Some(denom) => self.bank.supply_of(ctx, &denom)?,
            None => U256::ZERO,
        };
        Ok(vec![DynSolValue::Uint(amount, 256)])
    }

    /// Projects coins onto `(token, amount)` entries, keeping denom order
    /// and dropping denominations without a registered ERC-20 pair.
    fn paired_entries(
        &self,
        ctx: &mut CallContext,
        coins: Vec<Coin>,
    ) -> Result<DynSolValue, PrecompileError> {
        let mut entries = Vec::with_capacity(coins.len());
        for coin in coins {
            let Some(token) = self.erc20.token_address(ctx, &coin.denom)? else {
                continue;
            };
            entries.push(DynSolValue::Tuple(vec![
                DynSolValue::Address(token),
                DynSolValue::Uint(coin.amount, 256),
            ]));
        }
        Ok(DynSolValue::Array(entries))
    }
}

impl StatefulPrecompile for BankPrecompile {
    fn address(&self) -> Address {
        BANK_ADDRESS
    }

    /// Per-method flat policy; an unknown selector floors at zero so the
    /// dispatch loop classifies it instead of starving it.
    fn required_gas(&self, input: &[u8]) -> Gas {
        self.registry
            .resolve(input)
            .and_then(|method| self.config.method_gas(method.name()))
            .unwrap_or(0)
    }

    fn run(
        &self,
        frame: &mut CallFrame,
        read_only: bool,
    ) -> Result<PrecompileOutput, PrecompileError> {
        // Queries run under a free store tariff: the flat per-method cost
        // consumed by each handler is the whole price.
        let dispatch = setup(&self.registry, frame, read_only, GasConfig::free())?;
        let (mut ctx, method, args) = dispatch.into_parts();

        let values = match method.name() {
            "balances" => self.balances(&mut ctx, &args)?,
            "totalSupply" => self.total_supply(&mut ctx)?,
            "supplyOf" => self.supply_of(&mut ctx, &args)?,
            other => return Err(PrecompileError::UnknownMethod(other.to_owned())),
        };
        tracing::debug!(target: "evmx::bank", method = method.name(), "bank query served");

        let bytes = method.abi_encode_output(values);
        finish(ctx, frame, bytes)
    }

    fn is_transaction(&self, method: &str) -> bool {
        self.registry.is_transaction(method)
    }
}
