//! Common test utilities and fixtures for evmx integration tests.
//!
//! Provides a seeded in-memory chain (keepers plus the default precompile
//! set), Solidity bindings for the shipped interfaces, frame builders and
//! output decoders, so individual tests stay focused on behavior.

use alloy_dyn_abi::{DynSolType, DynSolValue};
use alloy_primitives::{address, Address, Bytes, U256};
use alloy_sol_types::sol;
use evmx_core::{CallFrame, PrecompileSet};
use evmx_precompiles::{
    default_precompile_set, PrecompilesConfig, BANK_ADDRESS, OUTPOST_ADDRESS,
};
use evmx_primitives::Coin;
use evmx_state::{
    BankKeeper, CallContext, GasConfig, KvStore, MemAuthz, MemBank, MemErc20Registry, MemStore,
    MemTransfer,
};
use std::sync::Arc;

sol! {
    /// Balance entry answered by the bank precompile.
    struct Balance {
        address contractAddress;
        uint256 amount;
    }

    /// Interface of the bank precompile, used to build calldata in tests.
    interface IBank {
        function balances(address account) external view returns (Balance[] memory);
        function totalSupply() external view returns (Balance[] memory);
        function supplyOf(address erc20Address) external view returns (uint256);
    }

    /// Interface of the transfer outpost precompile.
    interface IOutpost {
        function transfer(
            string memory sourceChannel,
            string memory denom,
            uint256 amount,
            address sender,
            string memory receiver,
            string memory memo
        ) external returns (uint64 nextSequence);

        function approve(address grantee, string memory denom, uint256 amount)
            external returns (bool approved);
        function revoke(address grantee, string memory denom)
            external returns (bool revoked);
        function allowance(address grantee, address granter, string memory denom)
            external view returns (uint256 remaining);
    }
}

/// Funded account in the seeded chain.
pub const ALICE: Address = address!("0x00000000000000000000000000000000000000a1");
/// Unfunded second account.
pub const BOB: Address = address!("0x00000000000000000000000000000000000000b1");
/// Third-party orchestrator account.
pub const OPERATOR: Address = address!("0x00000000000000000000000000000000000000c1");
/// ERC-20 contract paired with [`STAKE_DENOM`].
pub const STAKE_TOKEN: Address = address!("0x00000000000000000000000000000000000000e1");
/// Denomination seeded with a registered ERC-20 pair.
pub const STAKE_DENOM: &str = "stake";
/// Denomination seeded without an ERC-20 pair.
pub const UNPAIRED_DENOM: &str = "uatom";
/// Stake balance ALICE starts with.
pub const ALICE_STAKE: u64 = 500;
/// Channel open on the seeded chain.
pub const TEST_CHANNEL: &str = "channel-0";
/// Bech32 receiver used for outgoing transfers.
pub const TEST_RECEIVER: &str = "cosmos1xyknr59u9cfnj04rskcgm3wjjzvwrsrc2kp53t";
/// Gas limit given to test frames.
pub const TEST_GAS_LIMIT: u64 = 1_000_000;

/// In-memory chain: keepers plus the default precompile set over them.
#[derive(Debug)]
pub struct TestChain {
    /// Bank keeper backing both precompiles' balance movements.
    pub bank: Arc<MemBank>,
    /// Denomination-to-token pair registry.
    pub erc20: Arc<MemErc20Registry>,
    /// Transfer keeper recording submitted packets.
    pub transfer: Arc<MemTransfer>,
    /// Spend-authorization keeper.
    pub authz: Arc<MemAuthz>,
    /// The default set: bank at `0x0804`, outpost at `0x0802`.
    pub set: PrecompileSet,
}

impl TestChain {
    /// Reads a balance directly off the bank keeper, outside any frame.
    pub fn balance_of(&self, account: Address, denom: &str) -> U256 {
        let mut ctx = unmetered_ctx();
        self.bank.balance(&mut ctx, account, denom).expect("balance read")
    }
}

/// Builds the seeded chain every integration test starts from.
///
/// ALICE holds [`ALICE_STAKE`] `stake` (paired with [`STAKE_TOKEN`]) and
/// 77 unpaired `uatom`; the `transfer`/`channel-0` channel is open.
pub fn test_chain() -> TestChain {
    let bank = Arc::new(MemBank::new());
    bank.set_balance(ALICE, &Coin::new(STAKE_DENOM, U256::from(ALICE_STAKE)).expect("coin"))
        .expect("seed stake");
    bank.set_balance(ALICE, &Coin::new(UNPAIRED_DENOM, U256::from(77u64)).expect("coin"))
        .expect("seed uatom");

    let erc20 = Arc::new(MemErc20Registry::new());
    erc20.register_pair(STAKE_DENOM, STAKE_TOKEN).expect("register pair");

    let transfer = Arc::new(MemTransfer::new(bank.clone()));
    transfer.add_channel("transfer", TEST_CHANNEL);

    let authz = Arc::new(MemAuthz::new());

    let set = default_precompile_set(
        PrecompilesConfig::default(),
        bank.clone(),
        erc20.clone(),
        transfer.clone(),
        authz.clone(),
    )
    .expect("default set");

    TestChain { bank, erc20, transfer, authz, set }
}

/// A frame calling the bank precompile.
pub fn bank_frame(caller: Address, input: Vec<u8>) -> CallFrame {
    CallFrame::new(caller, BANK_ADDRESS, Bytes::from(input), TEST_GAS_LIMIT)
}

/// A frame calling the outpost precompile.
pub fn outpost_frame(caller: Address, input: Vec<u8>) -> CallFrame {
    CallFrame::new(caller, OUTPOST_ADDRESS, Bytes::from(input), TEST_GAS_LIMIT)
}

/// A free, roomy context for direct keeper access in assertions.
pub fn unmetered_ctx() -> CallContext {
    CallContext::new(
        Default::default(),
        Address::ZERO,
        U256::ZERO,
        false,
        u64::MAX,
        GasConfig::free(),
    )
}

/// Decodes a single 32-byte word answer.
pub fn word(bytes: &[u8]) -> U256 {
    assert_eq!(bytes.len(), 32, "expected a single word, got {} bytes", bytes.len());
    U256::from_be_slice(bytes)
}

/// Decodes a `Balance[]` answer into `(token, amount)` pairs.
pub fn balance_entries(bytes: &[u8]) -> Vec<(Address, U256)> {
    let shape = DynSolType::Tuple(vec![DynSolType::Array(Box::new(DynSolType::Tuple(vec![
        DynSolType::Address,
        DynSolType::Uint(256),
    ])))]);
    let DynSolValue::Tuple(mut outer) = shape.abi_decode_params(bytes).expect("decodable answer")
    else {
        panic!("answer is not a parameter sequence");
    };
    let DynSolValue::Array(entries) = outer.remove(0) else {
        panic!("answer is not an array");
    };
    entries
        .into_iter()
        .map(|entry| {
            let DynSolValue::Tuple(fields) = entry else { panic!("entry is not a tuple") };
            let [DynSolValue::Address(token), DynSolValue::Uint(amount, _)] = fields.as_slice()
            else {
                panic!("entry is not (address, uint256)");
            };
            (*token, *amount)
        })
        .collect()
}

/// A [`KvStore`] wrapper counting mutating operations, for asserting that
/// a rejected call never reached the store.
#[derive(Debug, Default)]
pub struct CountingStore {
    inner: MemStore,
    writes: usize,
    deletes: usize,
}

impl CountingStore {
    /// Creates an empty counting store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `set` calls that reached the store.
    pub const fn writes(&self) -> usize {
        self.writes
    }

    /// Number of `delete` calls that reached the store.
    pub const fn deletes(&self) -> usize {
        self.deletes
    }
}

impl KvStore for CountingStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.inner.get(key)
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.writes += 1;
        self.inner.set(key, value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.deletes += 1;
        self.inner.delete(key);
    }

    fn has(&self, key: &[u8]) -> bool {
        self.inner.has(key)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        self.inner.scan_prefix(prefix)
    }
}
