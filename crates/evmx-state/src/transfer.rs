//! Cross-chain transfer keeper.
//!
//! Accepts fully-validated transfer messages, escrows the token with the
//! bank, assigns a per-channel sequence and records the outgoing packet.
//! Packet relay and acknowledgement are out of scope; the recorded packet
//! list is the hand-off point (and what tests inspect to prove that a
//! rejected call submitted nothing).

use crate::bank::BankKeeper;
use crate::context::CallContext;
use crate::error::StateError;
use crate::events::Event;
use crate::store::MemStore;
use alloy_primitives::{keccak256, Address};
use evmx_primitives::Coin;
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

const CHANNEL_PREFIX: &[u8] = b"transfer/channels/";
const SEQUENCE_PREFIX: &[u8] = b"transfer/sequence/";

/// A cross-chain fungible token transfer, validated and ready to submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsgTransfer {
    /// Port on this chain the transfer leaves through.
    pub source_port: String,
    /// Channel on this chain the transfer leaves through.
    pub source_channel: String,
    /// Token being moved.
    pub token: Coin,
    /// Owner of the funds on this chain.
    pub sender: Address,
    /// Recipient address on the counterparty chain, in its own format.
    pub receiver: String,
    /// Free-form memo carried with the packet.
    pub memo: String,
}

/// Capability for submitting cross-chain transfers.
pub trait TransferKeeper: Send + Sync {
    /// Returns true when `port`/`channel` is open on this chain.
    fn has_channel(
        &self,
        ctx: &mut CallContext,
        port: &str,
        channel: &str,
    ) -> Result<bool, StateError>;

    /// Escrows the token and records the outgoing packet.
    ///
    /// Returns the packet's sequence number, starting at 1 per channel.
    fn send_transfer(&self, ctx: &mut CallContext, msg: MsgTransfer) -> Result<u64, StateError>;
}

/// In-memory [`TransferKeeper`] escrowing through a [`BankKeeper`].
pub struct MemTransfer {
    store: Arc<RwLock<MemStore>>,
    bank: Arc<dyn BankKeeper>,
    submitted: Arc<RwLock<Vec<MsgTransfer>>>,
}

impl MemTransfer {
    /// Creates a keeper with no open channels.
    pub fn new(bank: Arc<dyn BankKeeper>) -> Self {
        Self {
            store: Arc::new(RwLock::new(MemStore::new())),
            bank,
            submitted: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Opens `port`/`channel`. Unmetered; for wiring and tests.
    pub fn add_channel(&self, port: &str, channel: &str) {
        use crate::store::KvStore;
        self.store.write().set(channel_key(port, channel), vec![1]);
    }

    /// Packets submitted so far, in order.
    pub fn submitted(&self) -> Vec<MsgTransfer> {
        self.submitted.read().clone()
    }

    /// The escrow account funds are parked in for `port`/`channel`.
    pub fn escrow_address(port: &str, channel: &str) -> Address {
        let hash = keccak256(format!("evmx/escrow/{port}/{channel}").as_bytes());
        Address::from_slice(&hash[12..])
    }
}

impl fmt::Debug for MemTransfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemTransfer")
            .field("store", &self.store)
            .field("submitted", &self.submitted)
            .finish_non_exhaustive()
    }
}

impl TransferKeeper for MemTransfer {
    fn has_channel(
        &self,
        ctx: &mut CallContext,
        port: &str,
        channel: &str,
    ) -> Result<bool, StateError> {
        let mut backing = self.store.write();
        let mut store = ctx.metered(&mut *backing);
        Ok(store.has(&channel_key(port, channel))?)
    }

    fn send_transfer(&self, ctx: &mut CallContext, msg: MsgTransfer) -> Result<u64, StateError> {
        if msg.receiver.trim().is_empty() {
            return Err(StateError::invalid("receiver must not be empty"));
        }
        {
            let mut backing = self.store.write();
            let mut store = ctx.metered(&mut *backing);
            if !store.has(&channel_key(&msg.source_port, &msg.source_channel))? {
                return Err(StateError::UnknownChannel {
                    port: msg.source_port.clone(),
                    channel: msg.source_channel.clone(),
                });
            }
        }

        let escrow = Self::escrow_address(&msg.source_port, &msg.source_channel);
        self.bank.send(ctx, msg.sender, escrow, &msg.token)?;

        let sequence = {
            let mut backing = self.store.write();
            let mut store = ctx.metered(&mut *backing);
            let key = sequence_key(&msg.source_port, &msg.source_channel);
            let next = match store.get(&key)? {
                Some(bytes) => decode_sequence(&bytes)?,
                None => 1,
            };
            let bumped = next
                .checked_add(1)
                .ok_or_else(|| StateError::invalid("channel sequence overflow"))?;
            store.set(key, bumped.to_be_bytes().to_vec())?;
            next
        };

        tracing::debug!(
            target: "evmx::state",
            sender = %msg.sender,
            receiver = %msg.receiver,
            token = %msg.token,
            channel = %msg.source_channel,
            sequence,
            "transfer packet submitted"
        );
        ctx.emit_event(
            Event::new("ibc_transfer")
                .attr("sender", msg.sender.to_string())
                .attr("receiver", msg.receiver.clone())
                .attr("amount", msg.token.to_string())
                .attr("source_port", msg.source_port.clone())
                .attr("source_channel", msg.source_channel.clone())
                .attr("sequence", sequence.to_string())
                .attr("memo", msg.memo.clone()),
        );
        self.submitted.write().push(msg);
        Ok(sequence)
    }
}

fn channel_key(port: &str, channel: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(CHANNEL_PREFIX.len() + port.len() + 1 + channel.len());
    key.extend_from_slice(CHANNEL_PREFIX);
    key.extend_from_slice(port.as_bytes());
    key.push(b'/');
    key.extend_from_slice(channel.as_bytes());
    key
}

fn sequence_key(port: &str, channel: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(SEQUENCE_PREFIX.len() + port.len() + 1 + channel.len());
    key.extend_from_slice(SEQUENCE_PREFIX);
    key.extend_from_slice(port.as_bytes());
    key.push(b'/');
    key.extend_from_slice(channel.as_bytes());
    key
}

fn decode_sequence(bytes: &[u8]) -> Result<u64, StateError> {
    let arr: [u8; 8] =
        bytes.try_into().map_err(|_| StateError::invalid("corrupted sequence entry"))?;
    Ok(u64::from_be_bytes(arr))
}
