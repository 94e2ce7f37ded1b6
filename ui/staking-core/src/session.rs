//! Wallet session: the one place that opens and closes the wallet
//! connection. Everyone else observes [`Session`] through a watch channel.

use std::sync::Arc;

use alloy_primitives::Address;
use tokio::sync::watch;

use crate::error::StakeError;
use crate::provider::{ProviderError, ProviderEvent, WalletProvider};

/// Current wallet connection state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
    Error(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub address: Option<Address>,
    pub connected: bool,
    pub chain_id: Option<u64>,
}

impl Session {
    /// Address shortened for display, `0x1234...abcd`.
    pub fn short_address(&self) -> Option<String> {
        self.address.map(|a| truncate_address(&a.to_checksum(None)))
    }
}

pub fn truncate_address(address: &str) -> String {
    if address.len() > 12 {
        format!("{}...{}", &address[..6], &address[address.len() - 4..])
    } else {
        address.to_string()
    }
}

/// What changed when a provider event was applied.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionChange {
    pub address_changed: bool,
    pub chain_changed: bool,
}

impl SessionChange {
    pub fn any(self) -> bool {
        self.address_changed || self.chain_changed
    }
}

pub struct SessionAdapter<W> {
    wallet: Arc<W>,
    session: watch::Sender<Session>,
    status: watch::Sender<ConnectionStatus>,
}

impl<W: WalletProvider> SessionAdapter<W> {
    pub fn new(wallet: Arc<W>) -> Self {
        let (session, _) = watch::channel(Session::default());
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            wallet,
            session,
            status,
        }
    }

    /// Read-only handle to the wallet capability.
    pub fn wallet(&self) -> &Arc<W> {
        &self.wallet
    }

    pub fn session(&self) -> Session {
        self.session.borrow().clone()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.status.borrow().clone()
    }

    pub fn watch(&self) -> watch::Receiver<Session> {
        self.session.subscribe()
    }

    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    /// Ask the wallet for an account.
    pub async fn connect(&self) -> Result<Session, StakeError> {
        self.status.send_replace(ConnectionStatus::Connecting);

        match self.wallet.request_accounts().await {
            Ok(accounts) => {
                let session = Session {
                    address: Some(accounts.address),
                    connected: true,
                    chain_id: Some(accounts.chain_id),
                };
                tracing::info!(
                    address = %accounts.address,
                    chain_id = accounts.chain_id,
                    "wallet connected"
                );
                self.session.send_replace(session.clone());
                self.status.send_replace(ConnectionStatus::Connected);
                Ok(session)
            }
            Err(e) => {
                let err = match e {
                    ProviderError::Rejected(msg) => StakeError::ConnectionRejected(msg),
                    ProviderError::Unavailable(msg) | ProviderError::Rpc(msg) => {
                        StakeError::ProviderUnavailable(msg)
                    }
                };
                tracing::warn!(error = %err, "wallet connection failed");
                self.session.send_replace(Session::default());
                self.status.send_replace(ConnectionStatus::Error(err.to_string()));
                Err(err)
            }
        }
    }

    /// Close the session. Always succeeds.
    pub async fn disconnect(&self) {
        self.wallet.disconnect().await;
        self.clear();
        tracing::info!("wallet disconnected");
    }

    fn clear(&self) {
        self.session.send_replace(Session::default());
        self.status.send_replace(ConnectionStatus::Disconnected);
    }

    /// Fold an account/chain event from the wallet into the session.
    pub fn apply(&self, event: &ProviderEvent) -> SessionChange {
        let mut change = SessionChange::default();
        match event {
            ProviderEvent::AccountsChanged(Some(address)) => {
                self.session.send_if_modified(|s| {
                    if !s.connected || s.address == Some(*address) {
                        return false;
                    }
                    s.address = Some(*address);
                    change.address_changed = true;
                    true
                });
            }
            ProviderEvent::AccountsChanged(None) | ProviderEvent::Disconnected => {
                if self.session.borrow().connected {
                    change.address_changed = true;
                    self.clear();
                }
            }
            ProviderEvent::ChainChanged(chain_id) => {
                self.session.send_if_modified(|s| {
                    if !s.connected || s.chain_id == Some(*chain_id) {
                        return false;
                    }
                    s.chain_id = Some(*chain_id);
                    change.chain_changed = true;
                    true
                });
            }
            ProviderEvent::NewBlock(_) | ProviderEvent::Receipt { .. } => {}
        }
        if change.any() {
            tracing::debug!(?change, session = ?self.session(), "session updated");
        }
        change
    }
}
