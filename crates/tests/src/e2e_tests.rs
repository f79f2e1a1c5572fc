//! End-to-end tests driving the precompile set the way a VM integrator
//! would: build a frame, route it through [`PrecompileSet::call`], then
//! assert on output bytes, gas accounting, emitted events and keeper
//! state. The scratch fixture pins the settlement math down to the exact
//! gas unit; the shipped bank and outpost contracts cover the authorized
//! paths and every classified rejection.

use alloy_dyn_abi::DynSolValue;
use alloy_primitives::{address, Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};
use evmx_core::{
    estimate_gas, finish, setup, CallFrame, MethodRegistry, PrecompileError, PrecompileOutput,
    PrecompileSet, StatefulPrecompile,
};
use evmx_precompiles::BANK_ADDRESS;
use evmx_state::{CallContext, Gas, GasConfig, MemTransfer};
use parking_lot::RwLock;
use std::sync::Arc;

use crate::common::{
    balance_entries, bank_frame, outpost_frame, test_chain, word, CountingStore, IBank, IOutpost,
    ALICE, ALICE_STAKE, BOB, OPERATOR, STAKE_DENOM, STAKE_TOKEN, TEST_CHANNEL, TEST_GAS_LIMIT,
    TEST_RECEIVER,
};

sol! {
    /// Interface of the scratch fixture precompile.
    interface IScratch {
        function put(uint256 value) external returns (bool stored);
        function peek() external view returns (uint256 value);
    }
}

/// Address the scratch fixture registers at.
const SCRATCH_ADDRESS: Address = address!("0x0000000000000000000000000000000000000777");
/// Address the panicking fixture registers at.
const PANIC_ADDRESS: Address = address!("0x0000000000000000000000000000000000000778");
/// Store key the scratch fixture writes under, 7 bytes long.
const SCRATCH_KEY: &[u8] = b"scratch";

const SCRATCH_ABI: &str = r#"[
    {
        "type": "function", "name": "put", "stateMutability": "nonpayable",
        "inputs": [{"name": "value", "type": "uint256"}],
        "outputs": [{"name": "stored", "type": "bool"}]
    },
    {
        "type": "function", "name": "peek", "stateMutability": "view",
        "inputs": [],
        "outputs": [{"name": "value", "type": "uint256"}]
    }
]"#;

/// Minimal store-backed precompile whose costs are computable by hand:
/// `put` writes one 32-byte word under [`SCRATCH_KEY`], `peek` reads it
/// back. Both run against the default store tariff.
#[derive(Debug)]
struct ScratchPrecompile {
    registry: MethodRegistry,
    store: Arc<RwLock<CountingStore>>,
}

impl ScratchPrecompile {
    fn new(store: Arc<RwLock<CountingStore>>) -> Self {
        Self { registry: MethodRegistry::from_abi_json(SCRATCH_ABI).expect("scratch abi"), store }
    }

    fn put(
        &self,
        ctx: &mut CallContext,
        args: &[DynSolValue],
    ) -> Result<Vec<DynSolValue>, PrecompileError> {
        let Some(DynSolValue::Uint(value, _)) = args.first() else {
            return Err(PrecompileError::business("put expects a uint256"));
        };
        let mut store = self.store.write();
        let mut kv = ctx.metered(&mut *store);
        kv.set(SCRATCH_KEY.to_vec(), value.to_be_bytes::<32>().to_vec())?;
        Ok(vec![DynSolValue::Bool(true)])
    }

    fn peek(&self, ctx: &mut CallContext) -> Result<Vec<DynSolValue>, PrecompileError> {
        let mut store = self.store.write();
        let mut kv = ctx.metered(&mut *store);
        let stored = kv.get(SCRATCH_KEY)?;
        let value = stored.map_or(U256::ZERO, |bytes| U256::from_be_slice(&bytes));
        Ok(vec![DynSolValue::Uint(value, 256)])
    }
}

impl StatefulPrecompile for ScratchPrecompile {
    fn address(&self) -> Address {
        SCRATCH_ADDRESS
    }

    fn required_gas(&self, input: &[u8]) -> Gas {
        let Some(method) = self.registry.resolve(input) else {
            return 0;
        };
        estimate_gas(method, GasConfig::default(), None, input.len().saturating_sub(4))
    }

    fn run(
        &self,
        frame: &mut CallFrame,
        read_only: bool,
    ) -> Result<PrecompileOutput, PrecompileError> {
        let dispatch = setup(&self.registry, frame, read_only, GasConfig::default())?;
        let (mut ctx, method, args) = dispatch.into_parts();
        let values = match method.name() {
            "put" => self.put(&mut ctx, &args)?,
            "peek" => self.peek(&mut ctx)?,
            other => return Err(PrecompileError::UnknownMethod(other.to_owned())),
        };
        let bytes = method.abi_encode_output(values);
        finish(ctx, frame, bytes)
    }

    fn is_transaction(&self, method: &str) -> bool {
        self.registry.is_transaction(method)
    }
}

/// A precompile that panics on every call, for the unwind boundary.
#[derive(Debug)]
struct PanickingPrecompile;

impl StatefulPrecompile for PanickingPrecompile {
    fn address(&self) -> Address {
        PANIC_ADDRESS
    }

    fn required_gas(&self, _input: &[u8]) -> Gas {
        0
    }

    fn run(
        &self,
        _frame: &mut CallFrame,
        _read_only: bool,
    ) -> Result<PrecompileOutput, PrecompileError> {
        panic!("scratch slot corrupted")
    }

    fn is_transaction(&self, _method: &str) -> bool {
        false
    }
}

/// A set hosting only the scratch fixture, plus a handle to its store.
fn scratch_set() -> (PrecompileSet, Arc<RwLock<CountingStore>>) {
    let store = Arc::new(RwLock::new(CountingStore::new()));
    let mut set = PrecompileSet::new();
    set.register(Arc::new(ScratchPrecompile::new(store.clone()))).expect("register scratch");
    (set, store)
}

fn scratch_frame(input: Vec<u8>, gas_limit: Gas) -> CallFrame {
    CallFrame::new(BOB, SCRATCH_ADDRESS, Bytes::from(input), gas_limit)
}

/// Calldata moving `amount` stake from `sender` out over the test channel.
fn transfer_calldata(sender: Address, amount: u64) -> Vec<u8> {
    IOutpost::transferCall {
        sourceChannel: TEST_CHANNEL.to_owned(),
        denom: STAKE_DENOM.to_owned(),
        amount: U256::from(amount),
        sender,
        receiver: TEST_RECEIVER.to_owned(),
        memo: String::new(),
    }
    .abi_encode()
}

#[test]
fn test_e2e_bank_balance_query_settles_the_flat_tariff() {
    let chain = test_chain();
    let call = IBank::balancesCall { account: ALICE }.abi_encode();

    let bank = chain.set.get(&BANK_ADDRESS).expect("bank is registered");
    assert_eq!(bank.required_gas(&call), 100, "the floor is the configured flat cost");

    let mut frame = bank_frame(BOB, call);
    let output = chain
        .set
        .call(&mut frame, false)
        .expect("bank is registered")
        .expect("balance query succeeds");

    assert_eq!(
        balance_entries(&output.bytes),
        vec![(STAKE_TOKEN, U256::from(ALICE_STAKE))],
        "only denominations with a registered pair are answered"
    );
    assert_eq!(output.gas_used, 100, "queries settle exactly the flat cost");
    assert_eq!(frame.gas_remaining(), TEST_GAS_LIMIT - 100);
}

#[test]
fn test_e2e_bank_supply_of_unknown_token_answers_zero() {
    let chain = test_chain();
    let call = IBank::supplyOfCall { erc20Address: Address::repeat_byte(0x5e) }.abi_encode();

    let mut frame = bank_frame(BOB, call);
    let output = chain
        .set
        .call(&mut frame, false)
        .expect("bank is registered")
        .expect("an unknown token is not an error");

    assert_eq!(word(&output.bytes), U256::ZERO);
}

#[test]
fn test_e2e_total_supply_skips_unpaired_denominations() {
    let chain = test_chain();
    let call = IBank::totalSupplyCall {}.abi_encode();

    let mut frame = bank_frame(BOB, call);
    let output = chain
        .set
        .call(&mut frame, false)
        .expect("bank is registered")
        .expect("supply query succeeds");

    // The chain also holds 77 unpaired uatom; they have no token address
    // to report under.
    assert_eq!(balance_entries(&output.bytes), vec![(STAKE_TOKEN, U256::from(ALICE_STAKE))]);
}

#[test]
fn test_e2e_queries_are_referentially_transparent() {
    let chain = test_chain();
    let call = IBank::balancesCall { account: ALICE }.abi_encode();

    let mut first_frame = bank_frame(BOB, call.clone());
    let first = chain
        .set
        .call(&mut first_frame, false)
        .expect("bank is registered")
        .expect("first query succeeds");
    let mut second_frame = bank_frame(OPERATOR, call);
    let second = chain
        .set
        .call(&mut second_frame, true)
        .expect("bank is registered")
        .expect("a static frame admits queries");

    assert_eq!(first.bytes, second.bytes, "identical queries answer identical bytes");
    assert_eq!(first.gas_used, second.gas_used, "and cost the same");
}

#[test]
fn test_e2e_unknown_selector_is_classified_not_starved() {
    let chain = test_chain();

    let probe = vec![0xde, 0xad, 0xbe, 0xef];
    let bank = chain.set.get(&BANK_ADDRESS).expect("bank is registered");
    assert_eq!(bank.required_gas(&probe), 0, "unknown selectors floor at zero");

    let mut frame = bank_frame(BOB, probe);
    let err = chain
        .set
        .call(&mut frame, false)
        .expect("bank is registered")
        .expect_err("no method answers 0xdeadbeef");
    assert!(matches!(err, PrecompileError::UnknownMethod(_)), "got {err}");
    assert_eq!(frame.gas_remaining(), TEST_GAS_LIMIT, "a classified miss deducts nothing");

    // Input too short for a selector takes the same path, without panicking.
    let mut frame = bank_frame(BOB, vec![0x01, 0x02]);
    let err = chain
        .set
        .call(&mut frame, false)
        .expect("bank is registered")
        .expect_err("two bytes cannot name a method");
    assert!(matches!(err, PrecompileError::UnknownMethod(_)), "got {err}");
}

#[test]
fn test_e2e_truncated_arguments_classify_as_a_decode_failure() {
    let chain = test_chain();
    let mut input = IBank::balancesCall { account: ALICE }.abi_encode();
    input.truncate(16);

    let mut frame = bank_frame(BOB, input);
    let err = chain
        .set
        .call(&mut frame, false)
        .expect("bank is registered")
        .expect_err("half an address does not decode");

    let PrecompileError::ArgumentDecode { method, .. } = err else {
        panic!("expected a decode failure, got {err}");
    };
    assert_eq!(method, "balances");
}

#[test]
fn test_e2e_owner_transfer_escrows_and_reports_the_sequence() {
    let chain = test_chain();

    let mut frame = outpost_frame(ALICE, transfer_calldata(ALICE, 180));
    let output = chain
        .set
        .call(&mut frame, false)
        .expect("outpost is registered")
        .expect("an owner moves their own funds without a grant");

    assert_eq!(word(&output.bytes), U256::from(1u64), "first packet on the channel");
    let escrow = MemTransfer::escrow_address("transfer", TEST_CHANNEL);
    assert_eq!(chain.balance_of(escrow, STAKE_DENOM), U256::from(180u64));
    assert_eq!(chain.balance_of(ALICE, STAKE_DENOM), U256::from(ALICE_STAKE - 180));
    assert!(
        output.events.iter().any(|event| event.kind == "ibc_transfer"),
        "the submitted packet announces itself"
    );

    let submitted = chain.transfer.submitted();
    assert_eq!(submitted.len(), 1);
    assert_eq!(submitted[0].receiver, TEST_RECEIVER);
    assert_eq!(submitted[0].sender, ALICE);

    assert!(output.gas_used > 0, "transactions settle their metered store work");
    assert_eq!(frame.gas_remaining(), TEST_GAS_LIMIT - output.gas_used);
}

#[test]
fn test_e2e_static_frame_blocks_transfer_before_any_state_touch() {
    let chain = test_chain();

    let mut frame = outpost_frame(ALICE, transfer_calldata(ALICE, 100)).with_static(true);
    let err = chain
        .set
        .call(&mut frame, true)
        .expect("outpost is registered")
        .expect_err("a transaction cannot run in a static frame");

    assert!(matches!(err, PrecompileError::ReadOnlyViolation(_)), "got {err}");
    assert!(chain.transfer.submitted().is_empty(), "nothing reached the transfer keeper");
    assert_eq!(chain.balance_of(ALICE, STAKE_DENOM), U256::from(ALICE_STAKE));
}

#[test]
fn test_e2e_third_party_transfer_without_grant_moves_nothing() {
    let chain = test_chain();

    let mut frame = outpost_frame(OPERATOR, transfer_calldata(ALICE, 100));
    let err = chain
        .set
        .call(&mut frame, false)
        .expect("outpost is registered")
        .expect_err("no grant authorizes the operator");

    let PrecompileError::BusinessRule(msg) = err else {
        panic!("expected a business-rule rejection, got {err}");
    };
    assert!(msg.contains("unauthorized"), "got {msg}");
    assert!(chain.transfer.submitted().is_empty(), "nothing was submitted");
    assert_eq!(chain.balance_of(ALICE, STAKE_DENOM), U256::from(ALICE_STAKE));
}

#[test]
fn test_e2e_granted_operator_spends_down_the_allowance() {
    let chain = test_chain();

    // ALICE grants OPERATOR 300 stake.
    let approve = IOutpost::approveCall {
        grantee: OPERATOR,
        denom: STAKE_DENOM.to_owned(),
        amount: U256::from(300u64),
    }
    .abi_encode();
    let mut frame = outpost_frame(ALICE, approve);
    let output = chain
        .set
        .call(&mut frame, false)
        .expect("outpost is registered")
        .expect("approval succeeds");
    assert_eq!(word(&output.bytes), U256::from(1u64));
    assert!(output.events.iter().any(|event| event.kind == "transfer_authorization"));

    // OPERATOR moves 200 of ALICE's stake under the grant.
    let mut frame = outpost_frame(OPERATOR, transfer_calldata(ALICE, 200));
    let output = chain
        .set
        .call(&mut frame, false)
        .expect("outpost is registered")
        .expect("the grant covers 200");
    assert_eq!(word(&output.bytes), U256::from(1u64));
    assert_eq!(chain.balance_of(ALICE, STAKE_DENOM), U256::from(ALICE_STAKE - 200));

    // 100 remains on the grant.
    let allowance = IOutpost::allowanceCall {
        grantee: OPERATOR,
        granter: ALICE,
        denom: STAKE_DENOM.to_owned(),
    }
    .abi_encode();
    let mut frame = outpost_frame(BOB, allowance.clone()).with_static(true);
    let output = chain
        .set
        .call(&mut frame, true)
        .expect("outpost is registered")
        .expect("allowance reads under a static frame");
    assert_eq!(word(&output.bytes), U256::from(100u64));

    // 150 now overruns what is left.
    let mut frame = outpost_frame(OPERATOR, transfer_calldata(ALICE, 150));
    let err = chain
        .set
        .call(&mut frame, false)
        .expect("outpost is registered")
        .expect_err("the grant no longer covers 150");
    assert!(err.to_string().contains("unauthorized"), "got {err}");
    assert_eq!(chain.transfer.submitted().len(), 1, "only the covered transfer went out");

    // Revoking ends the arrangement.
    let revoke =
        IOutpost::revokeCall { grantee: OPERATOR, denom: STAKE_DENOM.to_owned() }.abi_encode();
    let mut frame = outpost_frame(ALICE, revoke);
    let output = chain
        .set
        .call(&mut frame, false)
        .expect("outpost is registered")
        .expect("revocation succeeds");
    assert!(output.events.iter().any(|event| event.kind == "revoke_authorization"));

    let mut frame = outpost_frame(BOB, allowance);
    let output = chain
        .set
        .call(&mut frame, false)
        .expect("outpost is registered")
        .expect("allowance query succeeds");
    assert_eq!(word(&output.bytes), U256::ZERO);
}

#[test]
fn test_e2e_call_value_on_a_nonpayable_method_is_rejected() {
    let chain = test_chain();

    let mut frame =
        outpost_frame(ALICE, transfer_calldata(ALICE, 50)).with_value(U256::from(1u64));
    let err = chain
        .set
        .call(&mut frame, false)
        .expect("outpost is registered")
        .expect_err("transfer does not accept a call value");

    assert!(matches!(err, PrecompileError::NonPayable(_)), "got {err}");
    assert!(chain.transfer.submitted().is_empty());
}

#[test]
fn test_e2e_scratch_settlement_matches_the_metered_work_exactly() {
    let (set, store) = scratch_set();
    let put = IScratch::putCall { value: U256::from(7u64) }.abi_encode();

    // Floor: write flat 2000 plus 30 per argument byte over one word.
    let scratch = set.get(&SCRATCH_ADDRESS).expect("scratch is registered");
    assert_eq!(scratch.required_gas(&put), 2_960);

    let mut frame = scratch_frame(put, 10_000);
    let output = set.call(&mut frame, false).expect("scratch is registered").expect("put succeeds");

    // Actual: write flat 2000 plus 30 per byte over the 7-byte key and
    // the 32-byte value.
    assert_eq!(output.gas_used, 3_170);
    assert_eq!(frame.gas_remaining(), 10_000 - 3_170);
    assert_eq!(store.read().writes(), 1);

    // The word reads back through the same meter: read flat 1000 plus 3
    // per byte over key and value.
    let peek = IScratch::peekCall {}.abi_encode();
    let mut frame = scratch_frame(peek, 10_000);
    let output =
        set.call(&mut frame, false).expect("scratch is registered").expect("peek succeeds");
    assert_eq!(word(&output.bytes), U256::from(7u64));
    assert_eq!(output.gas_used, 1_117);
}

#[test]
fn test_e2e_scratch_meter_exhaustion_leaves_the_store_untouched() {
    let (set, store) = scratch_set();
    let put = IScratch::putCall { value: U256::from(7u64) }.abi_encode();

    // 3000 clears the 2960 floor but not the 3170 the write actually
    // costs, so the meter dies mid-handler.
    let mut frame = scratch_frame(put, 3_000);
    let err = set
        .call(&mut frame, false)
        .expect("scratch is registered")
        .expect_err("the meter cannot cover the write");

    assert_eq!(err, PrecompileError::OutOfGas);
    assert_eq!(store.read().writes(), 0, "the charge precedes the write");
    assert_eq!(frame.gas_remaining(), 3_000, "failed calls leave the frame to the integrator");
}

#[test]
fn test_e2e_scratch_floor_aborts_before_the_handler_runs() {
    let (set, store) = scratch_set();
    let put = IScratch::putCall { value: U256::from(7u64) }.abi_encode();

    let mut frame = scratch_frame(put, 2_000);
    let err = set
        .call(&mut frame, false)
        .expect("scratch is registered")
        .expect_err("2000 is below the 2960 floor");

    assert_eq!(err, PrecompileError::OutOfGas);
    assert_eq!(store.read().writes(), 0, "the handler never ran");
    assert_eq!(frame.gas_remaining(), 2_000, "an aborted call deducts nothing");
}

#[test]
fn test_e2e_static_put_never_reaches_the_store() {
    let (set, store) = scratch_set();
    let put = IScratch::putCall { value: U256::from(9u64) }.abi_encode();

    let mut frame = scratch_frame(put, TEST_GAS_LIMIT).with_static(true);
    let err = set
        .call(&mut frame, true)
        .expect("scratch is registered")
        .expect_err("put cannot run read-only");
    assert!(matches!(err, PrecompileError::ReadOnlyViolation(_)), "got {err}");
    assert_eq!(store.read().writes(), 0);

    // The same static frame shape admits the query.
    let peek = IScratch::peekCall {}.abi_encode();
    let mut frame = scratch_frame(peek, TEST_GAS_LIMIT).with_static(true);
    let output = set
        .call(&mut frame, true)
        .expect("scratch is registered")
        .expect("peek runs read-only");
    assert_eq!(word(&output.bytes), U256::ZERO, "nothing was ever stored");
}

#[test]
fn test_e2e_panic_is_contained_and_the_set_keeps_serving() {
    let chain = test_chain();
    let mut set = chain.set.clone();
    set.register(Arc::new(PanickingPrecompile)).expect("register the panicking fixture");

    let mut frame = CallFrame::new(BOB, PANIC_ADDRESS, Bytes::new(), TEST_GAS_LIMIT);
    let err = set
        .call(&mut frame, false)
        .expect("fixture is registered")
        .expect_err("the panic is classified, not propagated");
    let PrecompileError::Internal(msg) = err else {
        panic!("expected an internal fault, got {err}");
    };
    assert!(msg.contains("corrupted"), "the payload message survives: {msg}");

    // The set stays healthy for the next call.
    let call = IBank::balancesCall { account: ALICE }.abi_encode();
    let mut frame = bank_frame(BOB, call);
    assert!(
        set.call(&mut frame, false).expect("bank is registered").is_ok(),
        "an unrelated fault does not poison the set"
    );
}

#[test]
fn test_e2e_unregistered_address_is_not_intercepted() {
    let chain = test_chain();
    let mut frame = CallFrame::new(BOB, Address::repeat_byte(0x99), Bytes::new(), TEST_GAS_LIMIT);
    assert!(
        chain.set.call(&mut frame, false).is_none(),
        "plain addresses fall through to ordinary execution"
    );
}
