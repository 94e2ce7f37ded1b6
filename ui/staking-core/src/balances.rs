//! Cached contract reads for the connected account.
//!
//! A failed read keeps the last good value on screen and only flags the
//! error, so a flaky endpoint never blanks the dashboard.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use alloy_primitives::{Address, U256};
use tokio::sync::watch;

use crate::error::StakeError;
use crate::notify::NotificationSink;
use crate::provider::{ContractReader, ProviderError};

/// One read-only query: last known value plus its loading and error flags.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Query {
    pub value: U256,
    /// A value has been fetched at least once for this account.
    pub loaded: bool,
    pub loading: bool,
    pub error: Option<String>,
}

impl Query {
    /// Apply a result. Returns the error when the read failed.
    fn settle(&mut self, result: Result<U256, ProviderError>, done: bool) -> Option<ProviderError> {
        if done {
            self.loading = false;
        }
        match result {
            Ok(value) => {
                self.value = value;
                self.loaded = true;
                self.error = None;
                None
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Some(e)
            }
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Balances {
    pub account: Option<Address>,
    pub staked: Query,
    pub rewards: Query,
    /// Native balance of the account, shown alongside the pool figures.
    pub wallet: Query,
    pub last_refreshed: Option<SystemTime>,
    applied_seq: u64,
}

impl Balances {
    pub fn loading(&self) -> bool {
        self.staked.loading || self.rewards.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.staked.error.as_deref().or(self.rewards.error.as_deref())
    }

    pub fn has_rewards(&self) -> bool {
        !self.rewards.value.is_zero()
    }
}

pub struct ReadCache {
    state: watch::Sender<Balances>,
    next_seq: AtomicU64,
    notifications: NotificationSink,
}

impl ReadCache {
    pub fn new(notifications: NotificationSink) -> Self {
        let (state, _) = watch::channel(Balances::default());
        Self {
            state,
            next_seq: AtomicU64::new(0),
            notifications,
        }
    }

    pub fn balances(&self) -> Balances {
        self.state.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<Balances> {
        self.state.subscribe()
    }

    /// Point the cache at a (possibly different) account. Values belonging to
    /// another account are dropped; the same account keeps its values.
    pub fn reset(&self, account: Option<Address>) {
        self.state.send_if_modified(|b| {
            if b.account == account {
                return false;
            }
            tracing::debug!(?account, "read cache reset");
            *b = Balances {
                account,
                applied_seq: b.applied_seq,
                ..Balances::default()
            };
            true
        });
    }

    /// Re-read every query for `account`.
    ///
    /// Responses that arrive after a newer refresh has been applied, or after
    /// the account changed, are discarded.
    pub async fn refresh<R>(&self, reader: &R, account: Address) -> Result<(), StakeError>
    where
        R: ContractReader + ?Sized,
    {
        let seq = self.next_seq.fetch_add(1, Ordering::SeqCst) + 1;
        self.reset(Some(account));
        self.state.send_modify(|b| {
            b.staked.loading = true;
            b.rewards.loading = true;
            b.wallet.loading = true;
        });

        let (staked, rewards, wallet) = tokio::join!(
            reader.staked_balance_of(account),
            reader.pending_rewards_of(account),
            reader.wallet_balance_of(account),
        );

        let mut failed = Vec::new();
        let applied = self.state.send_if_modified(|b| {
            if b.account != Some(account) || seq < b.applied_seq {
                return false;
            }
            b.applied_seq = seq;
            let latest = seq == self.next_seq.load(Ordering::SeqCst);
            let any_ok = staked.is_ok() || rewards.is_ok();

            if let Some(e) = b.staked.settle(staked, latest) {
                failed.push(("Unable to fetch staked balance. Please check your connection.", e));
            }
            if let Some(e) = b.rewards.settle(rewards, latest) {
                failed.push(("Unable to fetch rewards. Please check your connection.", e));
            }
            if let Some(e) = b.wallet.settle(wallet, latest) {
                tracing::debug!(error = %e, "wallet balance read failed");
            }
            if any_ok {
                b.last_refreshed = Some(SystemTime::now());
            }
            true
        });

        if !applied {
            tracing::debug!(seq, %account, "discarding stale read");
            return Ok(());
        }

        for (message, e) in &failed {
            tracing::warn!(error = %e, "{message}");
            self.notifications.error(*message);
        }

        let balances = self.balances();
        match balances.error() {
            Some(err) => Err(StakeError::ReadQueryFailed(err.to_string())),
            None => Ok(()),
        }
    }
}
