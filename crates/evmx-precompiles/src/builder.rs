//! Assembly of the default precompile set.

use crate::bank::BankPrecompile;
use crate::config::PrecompilesConfig;
use crate::outpost::OutpostPrecompile;
use evmx_core::{ConstructionError, PrecompileSet};
use evmx_state::{AuthzKeeper, BankKeeper, Erc20Registry, TransferKeeper};
use std::sync::Arc;

/// Builds the set shipped by default: bank and transfer outpost, each at
/// its reserved address.
///
/// Fails fast on a broken interface asset or an address collision; a set
/// that constructs is fully usable.
pub fn default_precompile_set(
    config: PrecompilesConfig,
    bank: Arc<dyn BankKeeper>,
    erc20: Arc<dyn Erc20Registry>,
    transfer: Arc<dyn TransferKeeper>,
    authz: Arc<dyn AuthzKeeper>,
) -> Result<PrecompileSet, ConstructionError> {
    let mut set = PrecompileSet::new();
    set.register(Arc::new(BankPrecompile::new(config.bank, bank, erc20)?))?;
    set.register(Arc::new(OutpostPrecompile::new(config.outpost, transfer, authz)?))?;
    tracing::info!(
        target: "evmx::precompiles",
        count = set.len(),
        "default precompile set ready"
    );
    Ok(set)
}
