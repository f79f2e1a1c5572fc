//! Typed accessors over decoded call arguments.
//!
//! The ABI decoder guarantees the value shapes match the declared types,
//! so a miss here means the handler and its ABI asset disagree; that is
//! still reported as a classified decode failure, not a panic.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{Address, U256};
use evmx_core::PrecompileError;

pub(crate) fn address_arg(
    args: &[DynSolValue],
    index: usize,
    method: &str,
) -> Result<Address, PrecompileError> {
    match args.get(index) {
        Some(DynSolValue::Address(address)) => Ok(*address),
        other => Err(mismatch(method, index, "address", other)),
    }
}

pub(crate) fn uint_arg(
    args: &[DynSolValue],
    index: usize,
    method: &str,
) -> Result<U256, PrecompileError> {
    match args.get(index) {
        Some(DynSolValue::Uint(value, _)) => Ok(*value),
        other => Err(mismatch(method, index, "uint", other)),
    }
}

pub(crate) fn str_arg<'a>(
    args: &'a [DynSolValue],
    index: usize,
    method: &str,
) -> Result<&'a str, PrecompileError> {
    match args.get(index) {
        Some(DynSolValue::String(value)) => Ok(value.as_str()),
        other => Err(mismatch(method, index, "string", other)),
    }
}

fn mismatch(
    method: &str,
    index: usize,
    expected: &str,
    got: Option<&DynSolValue>,
) -> PrecompileError {
    let got = got.map_or_else(|| "nothing".to_owned(), |value| format!("{value:?}"));
    PrecompileError::ArgumentDecode {
        method: method.to_owned(),
        reason: format!("argument {index}: expected {expected}, got {got}"),
    }
}
