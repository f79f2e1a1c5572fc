//! Policy configuration for the shipped precompiles.
//!
//! Gas numbers here are chain policy, not protocol constants; operators
//! tune them per deployment. Everything deserializes with defaults so a
//! partial config overrides only what it names.

use evmx_state::{Gas, GasConfig};
use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;

const fn default_bank_method_gas() -> Gas {
    100
}

fn default_source_port() -> String {
    "transfer".to_owned()
}

/// Flat per-method gas for the bank precompile.
///
/// The bank runs its store accesses under a free tariff, so these flat
/// costs are the whole price of a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankConfig {
    /// Cost of one `balances` call.
    #[serde(default = "default_bank_method_gas")]
    pub balances_gas: Gas,
    /// Cost of one `totalSupply` call.
    #[serde(default = "default_bank_method_gas")]
    pub total_supply_gas: Gas,
    /// Cost of one `supplyOf` call.
    #[serde(default = "default_bank_method_gas")]
    pub supply_of_gas: Gas,
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            balances_gas: default_bank_method_gas(),
            total_supply_gas: default_bank_method_gas(),
            supply_of_gas: default_bank_method_gas(),
        }
    }
}

impl BankConfig {
    /// Flat cost of `method`, when it is one of the bank's.
    pub fn method_gas(&self, method: &str) -> Option<Gas> {
        match method {
            "balances" => Some(self.balances_gas),
            "totalSupply" => Some(self.total_supply_gas),
            "supplyOf" => Some(self.supply_of_gas),
            _ => None,
        }
    }
}

/// Configuration for the transfer outpost precompile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutpostConfig {
    /// Port outgoing transfers leave through.
    #[serde(default = "default_source_port")]
    pub source_port: String,
    /// Store tariff the outpost's state work meters under.
    #[serde(default)]
    pub store_gas: GasConfig,
}

impl Default for OutpostConfig {
    fn default() -> Self {
        Self { source_port: default_source_port(), store_gas: GasConfig::default() }
    }
}

/// Top-level configuration for the default precompile set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PrecompilesConfig {
    /// Bank precompile policy.
    #[serde(default)]
    pub bank: BankConfig,
    /// Outpost precompile policy.
    #[serde(default)]
    pub outpost: OutpostConfig,
}

impl PrecompilesConfig {
    /// Parses a configuration from a JSON blob.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(raw).map_err(|err| ConfigError::Invalid(err.to_string()))
    }

    /// Loads the configuration from an environment variable holding JSON.
    pub fn from_env(var: &str) -> Result<Self, ConfigError> {
        let raw = env::var(var).map_err(|_| ConfigError::MissingEnv { var: var.into() })?;
        if raw.trim().is_empty() {
            return Err(ConfigError::EmptyEnv { var: var.into() });
        }
        Self::from_json(raw.trim())
    }

    /// Like [`from_env`](Self::from_env), but an unset variable yields the
    /// default policy. A variable that is set but unparseable still fails,
    /// so a typo cannot silently fall back.
    pub fn from_env_or_default(var: &str) -> Result<Self, ConfigError> {
        match Self::from_env(var) {
            Err(ConfigError::MissingEnv { .. }) => Ok(Self::default()),
            other => other,
        }
    }
}

/// Errors that can occur while building a [`PrecompilesConfig`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The configuration environment variable was not set.
    #[error("environment variable {var} is not set")]
    MissingEnv {
        /// Name of the environment variable that was not present.
        var: String,
    },
    /// The configuration environment variable was empty or whitespace.
    #[error("environment variable {var} is empty")]
    EmptyEnv {
        /// Name of the environment variable that evaluated to an empty string.
        var: String,
    },
    /// The supplied configuration could not be parsed.
    #[error("invalid precompiles config: {0}")]
    Invalid(String),
}
