//! Mutating calls: stake, withdraw and claim.
//!
//! Each kind has exactly one [`PendingCall`] slot, so at most one call per
//! kind is in flight while different kinds may overlap.

use std::fmt;

use alloy_primitives::{Address, TxHash};
use tokio::sync::watch;

use crate::amount::parse_amount;
use crate::balances::Balances;
use crate::chain::ChainGuard;
use crate::contract::{CallKind, StakingCall};
use crate::error::StakeError;
use crate::notify::NotificationSink;
use crate::provider::{ProviderError, WalletProvider};
use crate::session::Session;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CallStatus {
    #[default]
    Idle,
    /// Waiting for the wallet to sign and broadcast.
    Submitting,
    /// Broadcast, waiting for inclusion.
    Submitted,
    Confirmed,
    Failed,
}

impl CallStatus {
    /// Statuses only move forward; terminal ones go back to idle.
    pub fn can_advance_to(self, next: CallStatus) -> bool {
        use CallStatus::*;
        matches!(
            (self, next),
            (Idle, Submitting)
                | (Submitting, Submitted)
                | (Submitting, Failed)
                | (Submitted, Confirmed)
                | (Submitted, Failed)
                | (Confirmed, Idle)
                | (Failed, Idle)
        )
    }

    pub fn in_flight(self) -> bool {
        matches!(self, CallStatus::Submitting | CallStatus::Submitted)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, CallStatus::Confirmed | CallStatus::Failed)
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CallStatus::Idle => "idle",
            CallStatus::Submitting => "submitting",
            CallStatus::Submitted => "submitted",
            CallStatus::Confirmed => "confirmed",
            CallStatus::Failed => "failed",
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingCall {
    pub kind: CallKind,
    /// The amount field as typed by the user. Unused for claims.
    pub input_amount: String,
    pub tx: Option<TxHash>,
    pub status: CallStatus,
    pub error: Option<String>,
}

impl PendingCall {
    fn new(kind: CallKind) -> Self {
        Self {
            kind,
            input_amount: String::new(),
            tx: None,
            status: CallStatus::Idle,
            error: None,
        }
    }

    fn advance(&mut self, next: CallStatus) -> bool {
        if !self.status.can_advance_to(next) {
            tracing::warn!(kind = %self.kind, from = %self.status, to = %next, "ignoring invalid transition");
            return false;
        }
        tracing::debug!(kind = %self.kind, from = %self.status, to = %next, "call status");
        self.status = next;
        true
    }

    /// Return a finished call to idle so it can be reused.
    fn acknowledge(&mut self) {
        if self.status.is_terminal() {
            self.advance(CallStatus::Idle);
            self.tx = None;
            self.error = None;
        }
    }
}

/// The three call slots, indexed by kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallBook {
    slots: [PendingCall; 3],
}

impl Default for CallBook {
    fn default() -> Self {
        Self {
            slots: CallKind::ALL.map(PendingCall::new),
        }
    }
}

impl CallBook {
    pub fn get(&self, kind: CallKind) -> &PendingCall {
        &self.slots[kind.index()]
    }

    fn get_mut(&mut self, kind: CallKind) -> &mut PendingCall {
        &mut self.slots[kind.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingCall> {
        self.slots.iter()
    }
}

/// Everything a write needs to know besides the call itself.
pub struct WriteGate<'a> {
    pub session: &'a Session,
    pub guard: &'a ChainGuard,
    pub balances: &'a Balances,
}

impl WriteGate<'_> {
    /// Session-level preconditions shared by every kind.
    pub fn check(&self, call: &PendingCall) -> Result<(), StakeError> {
        self.guard.check(self.session)?;
        if call.status.in_flight() {
            return Err(StakeError::AlreadyInProgress(call.kind));
        }
        if call.kind == CallKind::Claim && !self.balances.has_rewards() {
            return Err(StakeError::NothingToClaim);
        }
        Ok(())
    }

    /// Whether the action button for `call` should be enabled. Amount
    /// validity is checked on click, not here.
    pub fn enabled(&self, call: &PendingCall) -> bool {
        self.check(call).is_ok() && (!call.kind.takes_amount() || !call.input_amount.trim().is_empty())
    }
}

pub struct WriteOrchestrator {
    book: watch::Sender<CallBook>,
    contract: Address,
    notifications: NotificationSink,
}

impl WriteOrchestrator {
    pub fn new(contract: Address, notifications: NotificationSink) -> Self {
        let (book, _) = watch::channel(CallBook::default());
        Self {
            book,
            contract,
            notifications,
        }
    }

    pub fn book(&self) -> CallBook {
        self.book.borrow().clone()
    }

    pub fn call(&self, kind: CallKind) -> PendingCall {
        self.book.borrow().get(kind).clone()
    }

    pub fn watch(&self) -> watch::Receiver<CallBook> {
        self.book.subscribe()
    }

    /// Update the amount field. Editing is always allowed; it only affects
    /// the next submission.
    pub fn set_input(&self, kind: CallKind, text: impl Into<String>) {
        let text = text.into();
        self.book.send_if_modified(|book| {
            let call = book.get_mut(kind);
            if call.input_amount == text {
                return false;
            }
            call.input_amount = text;
            true
        });
    }

    pub(crate) fn clear_input(&self, kind: CallKind) {
        self.set_input(kind, String::new());
    }

    /// Validate and claim the slot for `kind`, moving it to `Submitting`.
    ///
    /// Nothing is sent to the wallet when this fails.
    pub fn begin(&self, kind: CallKind, gate: &WriteGate<'_>) -> Result<StakingCall, StakeError> {
        let mut outcome = Err(StakeError::NotConnected);
        self.book.send_if_modified(|book| {
            let slot = book.get_mut(kind);
            outcome = prepare(slot, gate);
            if outcome.is_err() {
                return false;
            }
            slot.acknowledge();
            slot.advance(CallStatus::Submitting);
            slot.tx = None;
            slot.error = None;
            true
        });

        match &outcome {
            Err(err @ StakeError::InvalidAmount(_)) => {
                tracing::debug!(%kind, error = %err, "rejected amount");
                self.notifications.warning(kind.invalid_amount_message());
            }
            Err(StakeError::WrongNetwork { .. }) => {
                self.notifications.error(gate.guard.wrong_network_message());
            }
            Err(err) => {
                tracing::debug!(%kind, error = %err, "write not permitted");
                self.notifications.warning(err.to_string());
            }
            Ok(_) => {}
        }
        outcome
    }

    /// Record the wallet's answer for a call started with [`Self::begin`].
    pub fn finish(&self, kind: CallKind, result: Result<TxHash, ProviderError>) -> Result<TxHash, StakeError> {
        match result {
            Ok(tx) => {
                tracing::info!(%kind, %tx, "transaction broadcast");
                self.book.send_modify(|book| {
                    let slot = book.get_mut(kind);
                    if slot.advance(CallStatus::Submitted) {
                        slot.tx = Some(tx);
                    }
                });
                Ok(tx)
            }
            Err(e) => {
                tracing::warn!(%kind, error = %e, "transaction not sent");
                let message = e.message().unwrap_or(kind.failure_message()).to_string();
                self.book.send_modify(|book| {
                    let slot = book.get_mut(kind);
                    if slot.advance(CallStatus::Failed) {
                        slot.error = Some(message.clone());
                    }
                });
                self.notifications.error(message.clone());
                Err(match e {
                    ProviderError::Rejected(_) => StakeError::TransactionRejectedByUser(message),
                    ProviderError::Unavailable(_) | ProviderError::Rpc(_) => {
                        StakeError::TransactionFailed(message)
                    }
                })
            }
        }
    }

    /// Validate, sign and broadcast one call. On success the returned hash
    /// still has to be handed to the confirmation watcher.
    pub async fn submit<W>(&self, wallet: &W, kind: CallKind, gate: &WriteGate<'_>) -> Result<TxHash, StakeError>
    where
        W: WalletProvider + ?Sized,
    {
        let call = self.begin(kind, gate)?;
        let result = wallet.sign_and_send(self.contract, &call).await;
        self.finish(kind, result)
    }

    /// The watched transaction was included.
    pub(crate) fn confirm(&self, kind: CallKind, tx: TxHash) -> bool {
        let confirmed = self.book.send_if_modified(|book| {
            let slot = book.get_mut(kind);
            slot.tx == Some(tx) && slot.advance(CallStatus::Confirmed)
        });
        if confirmed && kind.takes_amount() {
            self.clear_input(kind);
        }
        confirmed
    }

    /// The watched transaction reverted or vanished.
    pub(crate) fn fail(&self, kind: CallKind, tx: TxHash, reason: &str) -> bool {
        self.book.send_if_modified(|book| {
            let slot = book.get_mut(kind);
            if slot.tx != Some(tx) || !slot.advance(CallStatus::Failed) {
                return false;
            }
            slot.error = Some(reason.to_string());
            true
        })
    }

    /// Dismiss a confirmed or failed call so its slot reads idle again.
    pub fn acknowledge(&self, kind: CallKind) {
        self.book.send_if_modified(|book| {
            let slot = book.get_mut(kind);
            let terminal = slot.status.is_terminal();
            slot.acknowledge();
            terminal
        });
    }
}

fn prepare(slot: &PendingCall, gate: &WriteGate<'_>) -> Result<StakingCall, StakeError> {
    gate.check(slot)?;
    Ok(match slot.kind {
        CallKind::Stake => StakingCall::Stake {
            value: parse_amount(&slot.input_amount)?,
        },
        CallKind::Withdraw => StakingCall::Withdraw {
            amount: parse_amount(&slot.input_amount)?,
        },
        CallKind::Claim => StakingCall::Claim,
    })
}
