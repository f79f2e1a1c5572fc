//! Integration tests for the evmx precompile framework
//!
//! This crate exercises the full call path end to end: frames routed
//! through a [`PrecompileSet`](evmx_core::PrecompileSet) into the bank and
//! outpost precompiles over in-memory keepers, plus common fixtures shared
//! across test files.

pub mod common;

#[cfg(test)]
pub(crate) mod e2e_tests;

// Re-export common test utilities
pub use common::*;
