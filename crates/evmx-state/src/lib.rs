//! Chain-state layer for evmx precompiles.
//!
//! Everything a native handler touches while it runs lives here: the gas
//! meter that prices state access, the metered key-value store, the event
//! buffer, the per-call [`CallContext`], and the keeper capabilities
//! (bank, ERC-20 pair registry, IBC transfer, authorization grants) that
//! precompiles consume.
//!
//! The in-memory keeper implementations are reference backends: they hold
//! real state behind `Arc<RwLock<…>>` and meter every access, so the full
//! dispatch and settlement path can run against them unchanged. Integrators
//! embedding the framework in a node substitute keepers backed by the
//! chain's own stores; the capability traits are the only seam.

pub mod authz;
pub mod bank;
pub mod context;
pub mod erc20;
pub mod error;
pub mod events;
pub mod gas;
pub mod store;
pub mod transfer;

pub use authz::{AuthzKeeper, MemAuthz};
pub use bank::{BankKeeper, MemBank};
pub use context::{BlockInfo, CallContext};
pub use erc20::{Erc20Registry, MemErc20Registry};
pub use error::StateError;
pub use events::{Event, EventManager};
pub use gas::{Gas, GasConfig, GasMeter, OutOfGasError};
pub use store::{GasKv, KvStore, MemStore};
pub use transfer::{MemTransfer, MsgTransfer, TransferKeeper};
