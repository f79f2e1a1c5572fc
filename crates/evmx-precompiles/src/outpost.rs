//! Transfer Outpost Precompile
//!
//! Lets contracts move native tokens across IBC and manage the spend
//! authorizations that make third-party orchestration safe.
//!
//! ## Overview
//!
//! `transfer` escrows the token on this chain and submits the outgoing
//! packet through the transfer capability, answering with the packet's
//! sequence number. The owner of the funds can always move them; anyone
//! else must first be granted a per-denomination allowance by the owner
//! (`approve`), which `transfer` spends before anything is escrowed. A
//! failed authorization therefore leaves no trace on chain state.
//!
//! ## Address
//!
//! The precompile is reserved at `0x0000000000000000000000000000000000000802`.
//!
//! ## Interface
//!
//! ```solidity
//! interface IOutpost {
//!     function transfer(
//!         string memory sourceChannel,
//!         string memory denom,
//!         uint256 amount,
//!         address sender,
//!         string memory receiver,
//!         string memory memo
//!     ) external returns (uint64 nextSequence);
//!
//!     function approve(address grantee, string memory denom, uint256 amount)
//!         external returns (bool approved);
//!     function revoke(address grantee, string memory denom)
//!         external returns (bool revoked);
//!     function allowance(address grantee, address granter, string memory denom)
//!         external view returns (uint256 remaining);
//! }
//! ```
//!
//! The source port is deployment policy ([`OutpostConfig`], default
//! `"transfer"`), not a caller argument.

use crate::args::{address_arg, str_arg, uint_arg};
use crate::config::OutpostConfig;
use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{address, Address, U256};
use evmx_core::{
    estimate_gas, finish, setup, CallFrame, ConstructionError, MethodRegistry, PrecompileError,
    PrecompileOutput, StatefulPrecompile,
};
use evmx_primitives::{validate_denom, Coin, CoinError};
use evmx_state::{AuthzKeeper, CallContext, Event, Gas, MsgTransfer, StateError, TransferKeeper};
use std::sync::Arc;

/// Reserved address of the transfer outpost precompile.
pub const OUTPOST_ADDRESS: Address = address!("0x0000000000000000000000000000000000000802");

const OUTPOST_ABI: &str = include_str!("abi/outpost.json");

/// Cross-chain transfer orchestration with on-chain spend authorizations.
pub struct OutpostPrecompile {
    registry: MethodRegistry,
    config: OutpostConfig,
    transfer: Arc<dyn TransferKeeper>,
    authz: Arc<dyn AuthzKeeper>,
}

impl std::fmt::Debug for OutpostPrecompile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutpostPrecompile")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl OutpostPrecompile {
    /// Builds the precompile, resolving its interface description.
    pub fn new(
        config: OutpostConfig,
        transfer: Arc<dyn TransferKeeper>,
        authz: Arc<dyn AuthzKeeper>,
    ) -> Result<Self, ConstructionError> {
        let registry = MethodRegistry::from_abi_json(OUTPOST_ABI)?;
        Ok(Self { registry, config, transfer, authz })
    }

    fn transfer(
        &self,
        ctx: &mut CallContext,
        args: &[DynSolValue],
    ) -> Result<Vec<DynSolValue>, PrecompileError> {
        // 1) Arguments in declaration order.
        let source_channel = str_arg(args, 0, "transfer")?;
        let denom = str_arg(args, 1, "transfer")?;
        let amount = uint_arg(args, 2, "transfer")?;
        let sender = address_arg(args, 3, "transfer")?;
        let receiver = str_arg(args, 4, "transfer")?;
        let memo = str_arg(args, 5, "transfer")?;

        // 2) Validate the token and receiver before any authorization work.
        let token = Coin::new(denom, amount).map_err(StateError::from)?;
        if token.is_zero() {
            return Err(PrecompileError::business("cannot transfer a zero amount"));
        }
        if receiver.is_empty() {
            return Err(PrecompileError::business("receiver must not be empty"));
        }

        // 3) A caller moving someone else's funds spends its allowance
        //    first; the owner needs no grant. Nothing is escrowed when the
        //    spend fails.
        let caller = ctx.caller();
        if caller != sender {
            tracing::debug!(
                target: "evmx::outpost",
                %caller,
                %sender,
                token = %token,
                "spending third-party authorization"
            );
            self.authz.spend(ctx, caller, sender, &token)?;
        }

        // 4) Escrow and packet bookkeeping happen behind the capability.
        let msg = MsgTransfer {
            source_port: self.config.source_port.clone(),
            source_channel: source_channel.to_owned(),
            token,
            sender,
            receiver: receiver.to_owned(),
            memo: memo.to_owned(),
        };
        let sequence = self.transfer.send_transfer(ctx, msg)?;
        tracing::debug!(
            target: "evmx::outpost",
            %sender,
            channel = %source_channel,
            sequence,
            "transfer submitted"
        );

        Ok(vec![DynSolValue::Uint(U256::from(sequence), 64)])
    }

    fn approve(
        &self,
        ctx: &mut CallContext,
        args: &[DynSolValue],
    ) -> Result<Vec<DynSolValue>, PrecompileError> {
        let grantee = address_arg(args, 0, "approve")?;
        let denom = str_arg(args, 1, "approve")?;
        let amount = uint_arg(args, 2, "approve")?;

        validate_denom(denom).map_err(|err| StateError::from(CoinError::from(err)))?;
        let granter = ctx.caller();
        if grantee == granter {
            return Err(PrecompileError::business("grantee must differ from the granter"));
        }

        self.authz.set_allowance(ctx, grantee, granter, denom, amount)?;
        tracing::debug!(
            target: "evmx::outpost",
            %granter,
            %grantee,
            denom,
            amount = %amount,
            "transfer authorization granted"
        );
        ctx.emit_event(
            Event::new("transfer_authorization")
                .attr("granter", granter.to_string())
                .attr("grantee", grantee.to_string())
                .attr("denom", denom)
                .attr("amount", amount.to_string()),
        );
        Ok(vec![DynSolValue::Bool(true)])
    }

    fn revoke(
        &self,
        ctx: &mut CallContext,
        args: &[DynSolValue],
    ) -> Result<Vec<DynSolValue>, PrecompileError> {
        let grantee = address_arg(args, 0, "revoke")?;
        let denom = str_arg(args, 1, "revoke")?;

        let granter = ctx.caller();
        self.authz.revoke(ctx, grantee, granter, denom)?;
        tracing::debug!(
            target: "evmx::outpost",
            %granter,
            %grantee,
            denom,
            "transfer authorization revoked"
        );
        ctx.emit_event(
            Event::new("revoke_authorization")
                .attr("granter", granter.to_string())
                .attr("grantee", grantee.to_string())
                .attr("denom", denom),
        );
        Ok(vec![DynSolValue::Bool(true)])
    }

    fn allowance(
        &self,
        ctx: &mut CallContext,
        args: &[DynSolValue],
    ) -> Result<Vec<DynSolValue>, PrecompileError> {
        let grantee = address_arg(args, 0, "allowance")?;
        let granter = address_arg(args, 1, "allowance")?;
        let denom = str_arg(args, 2, "allowance")?;

        let remaining = self.authz.allowance(ctx, grantee, granter, denom)?;
        Ok(vec![DynSolValue::Uint(remaining, 256)])
    }
}

impl StatefulPrecompile for OutpostPrecompile {
    fn address(&self) -> Address {
        OUTPOST_ADDRESS
    }

    /// Tariff-derived floor: write costs for transactions, read costs for
    /// queries, per argument byte. Unknown selectors floor at zero so the
    /// dispatch loop classifies them.
    fn required_gas(&self, input: &[u8]) -> Gas {
        let Some(method) = self.registry.resolve(input) else {
            return 0;
        };
        estimate_gas(method, self.config.store_gas, None, input.len().saturating_sub(4))
    }

    fn run(
        &self,
        frame: &mut CallFrame,
        read_only: bool,
    ) -> Result<PrecompileOutput, PrecompileError> {
        let dispatch = setup(&self.registry, frame, read_only, self.config.store_gas)?;
        let (mut ctx, method, args) = dispatch.into_parts();

        let values = match method.name() {
            "transfer" => self.transfer(&mut ctx, &args)?,
            "approve" => self.approve(&mut ctx, &args)?,
            "revoke" => self.revoke(&mut ctx, &args)?,
            "allowance" => self.allowance(&mut ctx, &args)?,
            other => return Err(PrecompileError::UnknownMethod(other.to_owned())),
        };

        let bytes = method.abi_encode_output(values);
        finish(ctx, frame, bytes)
    }

    fn is_transaction(&self, method: &str) -> bool {
        self.registry.is_transaction(method)
    }
}
