//! In-memory wallet and pool used by the unit tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;

use alloy_primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{broadcast, Notify};

use crate::contract::StakingCall;
use crate::provider::{Accounts, ContractReader, ProviderError, ProviderEvent, ReceiptStatus, WalletProvider};

/// Lets a test park `sign_and_send` while it inspects in-flight state.
#[derive(Default)]
pub(crate) struct SendGate {
    pub entered: Notify,
    pub release: Notify,
}

pub(crate) struct MockWallet {
    accounts: Mutex<Result<Accounts, ProviderError>>,
    switch_error: Mutex<Option<ProviderError>>,
    send_results: Mutex<VecDeque<Result<TxHash, ProviderError>>>,
    sent: Mutex<Vec<(Address, StakingCall)>>,
    switches: Mutex<Vec<u64>>,
    disconnects: AtomicUsize,
    next_hash: AtomicU8,
    gate: Mutex<Option<Arc<SendGate>>>,
    receipts: Mutex<HashMap<TxHash, ReceiptStatus>>,
    events: broadcast::Sender<ProviderEvent>,
}

impl MockWallet {
    pub fn new(address: Address, chain_id: u64) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            accounts: Mutex::new(Ok(Accounts { address, chain_id })),
            switch_error: Mutex::new(None),
            send_results: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            switches: Mutex::new(Vec::new()),
            disconnects: AtomicUsize::new(0),
            next_hash: AtomicU8::new(1),
            gate: Mutex::new(None),
            receipts: Mutex::new(HashMap::new()),
            events,
        }
    }

    pub fn fail_connect(&self, err: ProviderError) {
        *self.accounts.lock() = Err(err);
    }

    pub fn fail_switch(&self, err: ProviderError) {
        *self.switch_error.lock() = Some(err);
    }

    /// Result for the next `sign_and_send`; defaults to a fresh hash.
    pub fn queue_send(&self, result: Result<TxHash, ProviderError>) {
        self.send_results.lock().push_back(result);
    }

    pub fn hold_sends(&self) -> Arc<SendGate> {
        let gate = Arc::new(SendGate::default());
        *self.gate.lock() = Some(gate.clone());
        gate
    }

    pub fn sent_calls(&self) -> Vec<StakingCall> {
        self.sent.lock().iter().map(|(_, call)| call.clone()).collect()
    }

    pub fn sign_requests(&self) -> usize {
        self.sent.lock().len()
    }

    pub fn switch_requests(&self) -> Vec<u64> {
        self.switches.lock().clone()
    }

    pub fn disconnects(&self) -> usize {
        self.disconnects.load(Ordering::SeqCst)
    }

    pub fn emit(&self, event: ProviderEvent) {
        let _ = self.events.send(event);
    }

    /// Record `tx` as mined and announce its receipt.
    pub fn mine(&self, tx: TxHash, status: ReceiptStatus) {
        self.receipts.lock().insert(tx, status);
        self.emit(ProviderEvent::Receipt { tx, status });
    }
}

#[async_trait]
impl WalletProvider for MockWallet {
    async fn request_accounts(&self) -> Result<Accounts, ProviderError> {
        self.accounts.lock().clone()
    }

    async fn disconnect(&self) {
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }

    async fn request_network_switch(&self, chain_id: u64) -> Result<(), ProviderError> {
        self.switches.lock().push(chain_id);
        if let Some(err) = self.switch_error.lock().clone() {
            return Err(err);
        }
        if let Ok(accounts) = self.accounts.lock().as_mut() {
            accounts.chain_id = chain_id;
        }
        self.emit(ProviderEvent::ChainChanged(chain_id));
        Ok(())
    }

    async fn sign_and_send(&self, contract: Address, call: &StakingCall) -> Result<TxHash, ProviderError> {
        self.sent.lock().push((contract, call.clone()));
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        match self.send_results.lock().pop_front() {
            Some(result) => result,
            None => Ok(TxHash::with_last_byte(self.next_hash.fetch_add(1, Ordering::SeqCst))),
        }
    }

    async fn receipt_status(&self, tx: TxHash) -> Result<Option<ReceiptStatus>, ProviderError> {
        Ok(self.receipts.lock().get(&tx).copied())
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

pub(crate) struct MockReader {
    staked: Mutex<Result<U256, ProviderError>>,
    rewards: Mutex<Result<U256, ProviderError>>,
    balance: Mutex<Result<U256, ProviderError>>,
    reads: AtomicUsize,
}

impl MockReader {
    pub fn new(staked: u64, rewards: u64) -> Self {
        Self {
            staked: Mutex::new(Ok(U256::from(staked))),
            rewards: Mutex::new(Ok(U256::from(rewards))),
            balance: Mutex::new(Ok(U256::from(1_000u64))),
            reads: AtomicUsize::new(0),
        }
    }

    pub fn set_staked(&self, value: u64) {
        *self.staked.lock() = Ok(U256::from(value));
    }

    pub fn set_rewards(&self, value: u64) {
        *self.rewards.lock() = Ok(U256::from(value));
    }

    pub fn fail_staked(&self, msg: &str) {
        *self.staked.lock() = Err(ProviderError::Rpc(msg.into()));
    }

    pub fn fail_rewards(&self, msg: &str) {
        *self.rewards.lock() = Err(ProviderError::Rpc(msg.into()));
    }

    /// Number of refresh rounds observed (one per staked-balance read).
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContractReader for MockReader {
    async fn staked_balance_of(&self, _account: Address) -> Result<U256, ProviderError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.staked.lock().clone()
    }

    async fn pending_rewards_of(&self, _account: Address) -> Result<U256, ProviderError> {
        self.rewards.lock().clone()
    }

    async fn wallet_balance_of(&self, _account: Address) -> Result<U256, ProviderError> {
        self.balance.lock().clone()
    }
}
