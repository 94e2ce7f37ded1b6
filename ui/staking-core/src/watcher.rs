//! Follows broadcast transactions until the provider reports their receipt.
//!
//! The watcher never polls and has no timeout: a transaction whose receipt
//! never arrives simply stays `Submitted`.

use std::collections::{HashMap, VecDeque};

use alloy_primitives::TxHash;
use parking_lot::Mutex;

use crate::calls::WriteOrchestrator;
use crate::contract::CallKind;
use crate::error::StakeError;
use crate::notify::NotificationSink;
use crate::provider::ReceiptStatus;

/// Receipts that arrive before their hash is registered are parked here.
const EARLY_RECEIPTS: usize = 16;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed { kind: CallKind, tx: TxHash },
    Failed { kind: CallKind, tx: TxHash, error: StakeError },
}

impl Confirmation {
    /// Confirmed calls change pool balances, so reads must be refreshed.
    pub fn needs_refresh(&self) -> bool {
        matches!(self, Confirmation::Confirmed { .. })
    }
}

#[derive(Default)]
struct Watched {
    pending: HashMap<TxHash, CallKind>,
    early: VecDeque<(TxHash, ReceiptStatus)>,
}

pub struct ConfirmationWatcher {
    watched: Mutex<Watched>,
    notifications: NotificationSink,
}

impl ConfirmationWatcher {
    pub fn new(notifications: NotificationSink) -> Self {
        Self {
            watched: Mutex::new(Watched::default()),
            notifications,
        }
    }

    /// Start following `tx`. If its receipt already arrived, it is resolved
    /// immediately.
    pub fn watch(&self, kind: CallKind, tx: TxHash, calls: &WriteOrchestrator) -> Option<Confirmation> {
        let early = {
            let mut watched = self.watched.lock();
            match watched.early.iter().position(|(hash, _)| *hash == tx) {
                Some(pos) => watched.early.remove(pos).map(|(_, status)| status),
                None => {
                    watched.pending.insert(tx, kind);
                    None
                }
            }
        };
        tracing::debug!(%kind, %tx, early = early.is_some(), "watching transaction");
        early.and_then(|status| self.resolve(kind, tx, status, calls))
    }

    pub fn is_watching(&self, tx: &TxHash) -> bool {
        self.watched.lock().pending.contains_key(tx)
    }

    pub fn pending(&self) -> usize {
        self.watched.lock().pending.len()
    }

    /// Hashes still waiting for a receipt.
    pub fn pending_hashes(&self) -> Vec<TxHash> {
        self.watched.lock().pending.keys().copied().collect()
    }

    /// React to a receipt notification from the provider.
    pub fn on_receipt(&self, tx: TxHash, status: ReceiptStatus, calls: &WriteOrchestrator) -> Option<Confirmation> {
        let kind = {
            let mut watched = self.watched.lock();
            match watched.pending.remove(&tx) {
                Some(kind) => kind,
                None => {
                    if watched.early.len() == EARLY_RECEIPTS {
                        watched.early.pop_front();
                    }
                    watched.early.push_back((tx, status));
                    return None;
                }
            }
        };
        self.resolve(kind, tx, status, calls)
    }

    /// Settle the call slot. Nothing is announced when the slot has already
    /// moved on to another transaction.
    fn resolve(
        &self,
        kind: CallKind,
        tx: TxHash,
        status: ReceiptStatus,
        calls: &WriteOrchestrator,
    ) -> Option<Confirmation> {
        match status {
            ReceiptStatus::Included => {
                if !calls.confirm(kind, tx) {
                    tracing::debug!(%kind, %tx, "receipt for a superseded call");
                    return None;
                }
                tracing::info!(%kind, %tx, "transaction confirmed");
                self.notifications.success(kind.success_message());
                Some(Confirmation::Confirmed { kind, tx })
            }
            ReceiptStatus::Reverted | ReceiptStatus::Dropped => {
                let error = match status {
                    ReceiptStatus::Reverted => StakeError::TransactionReverted(tx),
                    _ => StakeError::TransactionFailed("the network no longer knows this transaction".into()),
                };
                if !calls.fail(kind, tx, &error.to_string()) {
                    tracing::debug!(%kind, %tx, "receipt for a superseded call");
                    return None;
                }
                tracing::warn!(%kind, %tx, error = %error, "transaction failed");
                self.notifications.error(format!("{} transaction failed on-chain.", kind.label()));
                Some(Confirmation::Failed { kind, tx, error })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use alloy_primitives::{address, Address, U256};

    use super::*;
    use crate::balances::Balances;
    use crate::calls::{CallStatus, WriteGate};
    use crate::chain::ChainGuard;
    use crate::notify::Severity;
    use crate::session::Session;
    use crate::testing::MockWallet;

    const ALICE: Address = address!("00000000000000000000000000000000000000a1");
    const POOL: Address = address!("00000000000000000000000000000000000000cc");

    struct Fixture {
        wallet: Arc<MockWallet>,
        sink: NotificationSink,
        calls: WriteOrchestrator,
        watcher: ConfirmationWatcher,
    }

    impl Fixture {
        fn new() -> Self {
            let sink = NotificationSink::new(Duration::from_secs(6));
            Self {
                wallet: Arc::new(MockWallet::new(ALICE, 1)),
                calls: WriteOrchestrator::new(POOL, sink.clone()),
                watcher: ConfirmationWatcher::new(sink.clone()),
                sink,
            }
        }

        async fn send(&self, kind: CallKind, amount: &str) -> TxHash {
            let session = Session {
                address: Some(ALICE),
                connected: true,
                chain_id: Some(1),
            };
            let mut balances = Balances::default();
            balances.rewards.value = U256::from(1u8);
            let gate = WriteGate {
                session: &session,
                guard: &ChainGuard::new(1),
                balances: &balances,
            };
            self.calls.set_input(kind, amount);
            self.calls.submit(self.wallet.as_ref(), kind, &gate).await.unwrap()
        }
    }

    #[tokio::test]
    async fn inclusion_confirms_and_clears_input() {
        let fx = Fixture::new();
        let tx = fx.send(CallKind::Withdraw, "4").await;
        assert_eq!(fx.watcher.watch(CallKind::Withdraw, tx, &fx.calls), None);
        assert!(fx.watcher.is_watching(&tx));

        let outcome = fx.watcher.on_receipt(tx, ReceiptStatus::Included, &fx.calls).unwrap();
        assert_eq!(outcome, Confirmation::Confirmed { kind: CallKind::Withdraw, tx });
        assert!(outcome.needs_refresh());

        let call = fx.calls.call(CallKind::Withdraw);
        assert_eq!(call.status, CallStatus::Confirmed);
        assert_eq!(call.input_amount, "");
        let shown = fx.sink.visible().unwrap();
        assert_eq!(shown.severity, Severity::Success);
        assert_eq!(shown.message, "Successfully withdrew tokens!");
        assert_eq!(fx.watcher.pending(), 0);
    }

    #[tokio::test]
    async fn revert_fails_the_call() {
        let fx = Fixture::new();
        let tx = fx.send(CallKind::Stake, "1").await;
        fx.watcher.watch(CallKind::Stake, tx, &fx.calls);

        let outcome = fx.watcher.on_receipt(tx, ReceiptStatus::Reverted, &fx.calls).unwrap();
        assert!(!outcome.needs_refresh());
        assert_eq!(
            outcome,
            Confirmation::Failed {
                kind: CallKind::Stake,
                tx,
                error: StakeError::TransactionReverted(tx),
            }
        );

        let call = fx.calls.call(CallKind::Stake);
        assert_eq!(call.status, CallStatus::Failed);
        assert_eq!(call.input_amount, "1");
        assert_eq!(call.error, Some(StakeError::TransactionReverted(tx).to_string()));
        let shown = fx.sink.visible().unwrap();
        assert_eq!(shown.severity, Severity::Error);
        assert_eq!(shown.message, "Stake transaction failed on-chain.");
    }

    #[tokio::test]
    async fn early_receipt_is_resolved_on_registration() {
        let fx = Fixture::new();
        let tx = fx.send(CallKind::Claim, "").await;

        assert_eq!(fx.watcher.on_receipt(tx, ReceiptStatus::Included, &fx.calls), None);
        assert_eq!(fx.calls.call(CallKind::Claim).status, CallStatus::Submitted);

        let outcome = fx.watcher.watch(CallKind::Claim, tx, &fx.calls);
        assert_eq!(outcome, Some(Confirmation::Confirmed { kind: CallKind::Claim, tx }));
        assert_eq!(fx.calls.call(CallKind::Claim).status, CallStatus::Confirmed);
        assert!(!fx.watcher.is_watching(&tx));
    }

    #[tokio::test]
    async fn foreign_receipts_are_ignored() {
        let fx = Fixture::new();
        let tx = fx.send(CallKind::Stake, "1").await;
        fx.watcher.watch(CallKind::Stake, tx, &fx.calls);

        for byte in 0..40u8 {
            let other = TxHash::with_last_byte(0x80 | byte);
            assert_eq!(fx.watcher.on_receipt(other, ReceiptStatus::Included, &fx.calls), None);
        }
        assert_eq!(fx.calls.call(CallKind::Stake).status, CallStatus::Submitted);
        assert!(fx.watcher.is_watching(&tx));
        assert_eq!(fx.sink.shown_count(), 0);
    }

    #[tokio::test]
    async fn dropped_transaction_fails_and_keeps_input() {
        let fx = Fixture::new();
        let tx = fx.send(CallKind::Withdraw, "3").await;
        fx.watcher.watch(CallKind::Withdraw, tx, &fx.calls);

        let outcome = fx.watcher.on_receipt(tx, ReceiptStatus::Dropped, &fx.calls).unwrap();
        assert!(matches!(
            outcome,
            Confirmation::Failed { kind: CallKind::Withdraw, error: StakeError::TransactionFailed(_), .. }
        ));

        let call = fx.calls.call(CallKind::Withdraw);
        assert_eq!(call.status, CallStatus::Failed);
        assert_eq!(call.input_amount, "3");
        let shown = fx.sink.visible().unwrap();
        assert_eq!(shown.severity, Severity::Error);
        assert_eq!(shown.message, "Withdraw transaction failed on-chain.");
    }

    #[tokio::test]
    async fn receipt_for_another_hash_leaves_the_slot_alone() {
        let fx = Fixture::new();
        let tx = fx.send(CallKind::Stake, "1").await;
        let other = TxHash::with_last_byte(0xee);
        fx.watcher.watch(CallKind::Stake, other, &fx.calls);

        assert_eq!(fx.watcher.on_receipt(other, ReceiptStatus::Included, &fx.calls), None);
        assert_eq!(fx.watcher.on_receipt(other, ReceiptStatus::Reverted, &fx.calls), None);

        let call = fx.calls.call(CallKind::Stake);
        assert_eq!(call.status, CallStatus::Submitted);
        assert_eq!(call.tx, Some(tx));
        assert_eq!(call.input_amount, "1");
        assert_eq!(fx.sink.shown_count(), 0);
    }

    #[tokio::test]
    async fn pending_hashes_lists_unresolved_transactions() {
        let fx = Fixture::new();
        let stake = fx.send(CallKind::Stake, "1").await;
        let claim = fx.send(CallKind::Claim, "").await;
        fx.watcher.watch(CallKind::Stake, stake, &fx.calls);
        fx.watcher.watch(CallKind::Claim, claim, &fx.calls);
        fx.watcher.on_receipt(claim, ReceiptStatus::Included, &fx.calls);

        assert_eq!(fx.watcher.pending_hashes(), vec![stake]);
    }
}
