//! Selector-keyed method registry built from a declarative JSON ABI.
//!
//! The interface description is parsed and fully resolved once, at
//! construction; anything malformed fails there with a
//! [`ConstructionError`] so a broken contract can never be registered.
//! Per-call lookups are infallible map reads: an unknown selector is a
//! normal miss, reported by the dispatch loop as a call failure.

use crate::error::{ConstructionError, PrecompileError};
use alloy_dyn_abi::{DynSolType, DynSolValue, Specifier};
use alloy_json_abi::{Function, JsonAbi, StateMutability};
use alloy_primitives::{hex, Bytes};
use std::collections::BTreeMap;

/// First four bytes of call input, identifying the method.
pub type Selector = [u8; 4];

/// One callable method: selector, resolved types and mutability class.
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    name: String,
    selector: Selector,
    signature: String,
    inputs: Vec<DynSolType>,
    outputs: Vec<DynSolType>,
    is_transaction: bool,
    payable: bool,
}

impl MethodDescriptor {
    /// Declared method name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The method's 4-byte selector.
    pub const fn selector(&self) -> Selector {
        self.selector
    }

    /// Canonical signature, e.g. `balances(address)`.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Resolved parameter types, in declaration order.
    pub fn inputs(&self) -> &[DynSolType] {
        &self.inputs
    }

    /// Resolved return types, in declaration order.
    pub fn outputs(&self) -> &[DynSolType] {
        &self.outputs
    }

    /// True when the method mutates state (neither `pure` nor `view`).
    pub const fn is_transaction(&self) -> bool {
        self.is_transaction
    }

    /// True when the method accepts a call value.
    pub const fn payable(&self) -> bool {
        self.payable
    }

    /// Decodes `data` (input minus selector) against the declared
    /// parameter types.
    pub fn abi_decode_input(&self, data: &[u8]) -> Result<Vec<DynSolValue>, PrecompileError> {
        if self.inputs.is_empty() {
            if data.is_empty() {
                return Ok(Vec::new());
            }
            return Err(PrecompileError::ArgumentDecode {
                method: self.name.clone(),
                reason: format!("{} unexpected argument bytes", data.len()),
            });
        }
        let tuple = DynSolType::Tuple(self.inputs.clone());
        let decoded = tuple.abi_decode_params(data).map_err(|err| {
            PrecompileError::ArgumentDecode { method: self.name.clone(), reason: err.to_string() }
        })?;
        match decoded {
            DynSolValue::Tuple(values) => Ok(values),
            single => Ok(vec![single]),
        }
    }

    /// Encodes return values positionally per the declared return types.
    pub fn abi_encode_output(&self, values: Vec<DynSolValue>) -> Bytes {
        DynSolValue::Tuple(values).abi_encode_params().into()
    }
}

/// Immutable selector → method mapping for one precompiled contract.
#[derive(Debug, Clone)]
pub struct MethodRegistry {
    methods: BTreeMap<Selector, MethodDescriptor>,
}

impl MethodRegistry {
    /// Builds a registry from ABI JSON text.
    pub fn from_abi_json(json: &str) -> Result<Self, ConstructionError> {
        let abi: JsonAbi = serde_json::from_str(json)?;
        Self::from_abi(&abi)
    }

    /// Builds a registry from a parsed ABI.
    pub fn from_abi(abi: &JsonAbi) -> Result<Self, ConstructionError> {
        let mut methods: BTreeMap<Selector, MethodDescriptor> = BTreeMap::new();
        for function in abi.functions() {
            let descriptor = describe(function)?;
            let selector = descriptor.selector;
            if let Some(existing) = methods.get(&selector) {
                return Err(ConstructionError::DuplicateSelector {
                    selector: hex::encode(selector),
                    existing: existing.signature.clone(),
                    duplicate: descriptor.signature,
                });
            }
            methods.insert(selector, descriptor);
        }
        if methods.is_empty() {
            return Err(ConstructionError::EmptyInterface);
        }
        Ok(Self { methods })
    }

    /// Resolves the first four bytes of `input` to a method, if registered.
    ///
    /// Input shorter than a selector resolves to `None`, never a panic.
    pub fn resolve(&self, input: &[u8]) -> Option<&MethodDescriptor> {
        let selector: Selector = input.get(..4)?.try_into().ok()?;
        self.methods.get(&selector)
    }

    /// Looks a method up by declared name.
    pub fn method_by_name(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.values().find(|method| method.name == name)
    }

    /// True when `name` is a registered state-mutating method.
    ///
    /// Unknown names answer `false`; `resolve` is where unknown methods
    /// get reported.
    pub fn is_transaction(&self, name: &str) -> bool {
        self.method_by_name(name).is_some_and(MethodDescriptor::is_transaction)
    }

    /// All registered methods in selector order.
    pub fn methods(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.methods.values()
    }

    /// Number of registered methods.
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Always false for a constructed registry; construction rejects empty
    /// interfaces.
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

fn describe(function: &Function) -> Result<MethodDescriptor, ConstructionError> {
    let mut inputs = Vec::with_capacity(function.inputs.len());
    for param in &function.inputs {
        inputs.push(param.resolve().map_err(|err| ConstructionError::UnsupportedType {
            method: function.name.clone(),
            param: param.name.clone(),
            reason: err.to_string(),
        })?);
    }
    let mut outputs = Vec::with_capacity(function.outputs.len());
    for param in &function.outputs {
        outputs.push(param.resolve().map_err(|err| ConstructionError::UnsupportedType {
            method: function.name.clone(),
            param: param.name.clone(),
            reason: err.to_string(),
        })?);
    }
    Ok(MethodDescriptor {
        name: function.name.clone(),
        selector: function.selector().0,
        signature: function.signature(),
        inputs,
        outputs,
        is_transaction: !matches!(
            function.state_mutability,
            StateMutability::Pure | StateMutability::View
        ),
        payable: matches!(function.state_mutability, StateMutability::Payable),
    })
}
