//! # EVMX Precompiled Contracts
//!
//! Stateful precompiles shipped with the evmx framework, built on the
//! dispatch and metering core in `evmx-core`.
//!
//! ## Available Precompiles
//!
//! | Address | Name | Description |
//! |---------|------|-------------|
//! | `0x0804` | [`bank`] | Native bank queries keyed by paired ERC-20 address |
//! | `0x0802` | [`outpost`] | IBC transfers with on-chain spend authorizations |
//!
//! ## Architecture
//!
//! Both precompiles follow the same pattern:
//!
//! 1. **Declarative interface**: a JSON ABI asset compiled in with
//!    `include_str!` and resolved once at construction
//! 2. **Uniform call path**: setup, gate, decode and settlement run in
//!    `evmx-core`; only handler bodies live here
//! 3. **Capability handles**: chain state is reached exclusively through
//!    the keeper traits in `evmx-state`
//! 4. **Configured policy**: gas numbers and the source port come from
//!    [`PrecompilesConfig`], not from constants
//!
//! ## Integration
//!
//! ```ignore
//! use evmx_precompiles::{default_precompile_set, PrecompilesConfig};
//!
//! let set = default_precompile_set(
//!     PrecompilesConfig::default(),
//!     bank_keeper,
//!     erc20_registry,
//!     transfer_keeper,
//!     authz_keeper,
//! )?;
//! ```

mod args;

pub mod bank;
pub mod builder;
pub mod config;
pub mod outpost;

pub use bank::{BankPrecompile, BANK_ADDRESS};
pub use builder::default_precompile_set;
pub use config::{BankConfig, ConfigError, OutpostConfig, PrecompilesConfig};
pub use outpost::{OutpostPrecompile, OUTPOST_ADDRESS};
