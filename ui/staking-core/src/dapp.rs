//! The dashboard's central store.
//!
//! [`StakingDapp`] owns every component and is shared with the view by
//! reference. The view reads [`DappSnapshot`]s, calls the async operations on
//! user input, and keeps [`StakingDapp::run`] alive for as long as it is
//! mounted; dropping that future tears down every subscription.

use std::sync::Arc;

use alloy_primitives::TxHash;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};

use crate::balances::{Balances, ReadCache};
use crate::calls::{CallBook, PendingCall, WriteGate, WriteOrchestrator};
use crate::chain::ChainGuard;
use crate::config::StakingConfig;
use crate::contract::CallKind;
use crate::error::StakeError;
use crate::notify::{Notification, NotificationSink};
use crate::provider::{ContractReader, ProviderEvent, WalletProvider};
use crate::session::{ConnectionStatus, Session, SessionAdapter};
use crate::watcher::{Confirmation, ConfirmationWatcher};

/// Point-in-time copy of everything the view renders.
#[derive(Clone, Debug, PartialEq)]
pub struct DappSnapshot {
    pub session: Session,
    pub status: ConnectionStatus,
    pub balances: Balances,
    pub calls: CallBook,
    pub notification: Option<Notification>,
    pub guard: ChainGuard,
}

impl DappSnapshot {
    pub fn connected(&self) -> bool {
        self.session.connected
    }

    /// Connected, but not to the allowed network.
    pub fn wrong_network(&self) -> bool {
        self.guard.is_mismatched(&self.session)
    }

    pub fn reads_enabled(&self) -> bool {
        self.guard.permits(&self.session)
    }

    pub fn call(&self, kind: CallKind) -> &PendingCall {
        self.calls.get(kind)
    }

    /// Whether the action button for `kind` is enabled.
    pub fn can_submit(&self, kind: CallKind) -> bool {
        let gate = WriteGate {
            session: &self.session,
            guard: &self.guard,
            balances: &self.balances,
        };
        gate.enabled(self.calls.get(kind))
    }
}

/// Change feed over every observable piece of dashboard state.
pub struct Updates {
    session: watch::Receiver<Session>,
    status: watch::Receiver<ConnectionStatus>,
    balances: watch::Receiver<Balances>,
    calls: watch::Receiver<CallBook>,
    notification: watch::Receiver<Option<Notification>>,
}

impl Updates {
    /// Wait for the next change. Returns false once the store is gone.
    pub async fn changed(&mut self) -> bool {
        tokio::select! {
            r = self.session.changed() => r.is_ok(),
            r = self.status.changed() => r.is_ok(),
            r = self.balances.changed() => r.is_ok(),
            r = self.calls.changed() => r.is_ok(),
            r = self.notification.changed() => r.is_ok(),
        }
    }
}

pub struct StakingDapp<W, R> {
    config: StakingConfig,
    guard: ChainGuard,
    session: SessionAdapter<W>,
    reader: Arc<R>,
    balances: ReadCache,
    calls: WriteOrchestrator,
    watcher: ConfirmationWatcher,
    notifications: NotificationSink,
}

impl<W, R> StakingDapp<W, R>
where
    W: WalletProvider,
    R: ContractReader,
{
    pub fn new(config: StakingConfig, wallet: Arc<W>, reader: Arc<R>) -> Self {
        let notifications = NotificationSink::new(config.notification_ttl);
        Self {
            guard: ChainGuard::new(config.chain_id),
            session: SessionAdapter::new(wallet),
            reader,
            balances: ReadCache::new(notifications.clone()),
            calls: WriteOrchestrator::new(config.contract_address, notifications.clone()),
            watcher: ConfirmationWatcher::new(notifications.clone()),
            notifications,
            config,
        }
    }

    pub fn notifications(&self) -> &NotificationSink {
        &self.notifications
    }

    pub fn snapshot(&self) -> DappSnapshot {
        DappSnapshot {
            session: self.session.session(),
            status: self.session.status(),
            balances: self.balances.balances(),
            calls: self.calls.book(),
            notification: self.notifications.visible(),
            guard: self.guard,
        }
    }

    pub fn updates(&self) -> Updates {
        Updates {
            session: self.session.watch(),
            status: self.session.watch_status(),
            balances: self.balances.watch(),
            calls: self.calls.watch(),
            notification: self.notifications.subscribe(),
        }
    }

    pub async fn connect(&self) -> Result<(), StakeError> {
        let session = match self.session.connect().await {
            Ok(session) => session,
            Err(e) => {
                self.notifications.error(e.to_string());
                return Err(e);
            }
        };
        self.balances.reset(session.address);
        if self.guard.is_mismatched(&session) {
            self.notifications.warning(self.guard.wrong_network_message());
        } else {
            self.refresh_quietly().await;
        }
        Ok(())
    }

    pub async fn disconnect(&self) {
        self.session.disconnect().await;
        self.balances.reset(None);
    }

    pub async fn switch_network(&self) -> Result<(), StakeError> {
        self.guard
            .switch_network(self.session.wallet().as_ref(), &self.notifications)
            .await
    }

    /// Re-read balances now. Fails without touching the pool when the
    /// session is not connected to the allowed network.
    pub async fn refresh(&self) -> Result<(), StakeError> {
        let session = self.session.session();
        self.guard.check(&session)?;
        let account = session.address.ok_or(StakeError::NotConnected)?;
        self.balances.refresh(self.reader.as_ref(), account).await
    }

    async fn refresh_quietly(&self) {
        if !self.guard.permits(&self.session.session()) {
            return;
        }
        if let Err(e) = self.refresh().await {
            tracing::debug!(error = %e, "refresh failed");
        }
    }

    pub fn set_input(&self, kind: CallKind, text: impl Into<String>) {
        self.calls.set_input(kind, text);
    }

    /// Validate, sign and broadcast `kind`, then follow it until confirmed.
    pub async fn submit(&self, kind: CallKind) -> Result<TxHash, StakeError> {
        let session = self.session.session();
        let balances = self.balances.balances();
        let gate = WriteGate {
            session: &session,
            guard: &self.guard,
            balances: &balances,
        };
        let tx = self
            .calls
            .submit(self.session.wallet().as_ref(), kind, &gate)
            .await?;
        if let Some(outcome) = self.watcher.watch(kind, tx, &self.calls) {
            self.settle(outcome).await;
        }
        Ok(tx)
    }

    /// Return a confirmed or failed call to idle.
    pub fn acknowledge(&self, kind: CallKind) {
        self.calls.acknowledge(kind);
    }

    pub fn dismiss_notification(&self) {
        self.notifications.dismiss();
    }

    async fn settle(&self, outcome: Confirmation) {
        if outcome.needs_refresh() {
            self.refresh_quietly().await;
        }
    }

    /// React to one event from the wallet.
    pub async fn handle_event(&self, event: ProviderEvent) {
        match event {
            ProviderEvent::Receipt { tx, status } => {
                if let Some(outcome) = self.watcher.on_receipt(tx, status, &self.calls) {
                    self.settle(outcome).await;
                }
            }
            ProviderEvent::NewBlock(number) => {
                tracing::trace!(number, "new block");
                self.refresh_quietly().await;
            }
            ProviderEvent::AccountsChanged(_)
            | ProviderEvent::ChainChanged(_)
            | ProviderEvent::Disconnected => {
                let change = self.session.apply(&event);
                let session = self.session.session();
                if change.address_changed {
                    self.balances.reset(session.address);
                }
                if change.chain_changed && self.guard.is_mismatched(&session) {
                    self.notifications.warning(self.guard.wrong_network_message());
                }
                if change.any() {
                    self.refresh_quietly().await;
                }
            }
        }
    }

    /// Ask the wallet directly about every watched transaction. Used when
    /// events were skipped, since a skipped receipt is never re-sent.
    async fn recheck_receipts(&self) {
        let wallet = self.session.wallet();
        for tx in self.watcher.pending_hashes() {
            match wallet.receipt_status(tx).await {
                Ok(Some(status)) => {
                    if let Some(outcome) = self.watcher.on_receipt(tx, status, &self.calls) {
                        self.settle(outcome).await;
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(%tx, error = %e, "receipt lookup failed"),
            }
        }
    }

    /// Event loop: provider events, the read-poll timer and notification
    /// expiry. Runs until the wallet's event stream closes.
    pub async fn run(&self) {
        let mut events = self.session.wallet().subscribe();
        let mut poll = time::interval(self.config.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let expiry = self.notifications.expire_loop();
        tokio::pin!(expiry);

        if self.config.auto_connect {
            // failures are already surfaced as notifications
            let _ = self.connect().await;
        }

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Ok(event) => self.handle_event(event).await,
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "provider events lagged");
                        self.recheck_receipts().await;
                        self.refresh_quietly().await;
                    }
                    Err(RecvError::Closed) => {
                        tracing::info!("provider event stream closed");
                        break;
                    }
                },
                _ = poll.tick() => self.refresh_quietly().await,
                _ = &mut expiry => {}
            }
        }
    }
}
