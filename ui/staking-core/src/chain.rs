//! Single-network gate in front of every contract interaction.

use crate::config;
use crate::error::StakeError;
use crate::notify::NotificationSink;
use crate::provider::WalletProvider;
use crate::session::Session;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainGuard {
    target: u64,
}

impl ChainGuard {
    pub fn new(target: u64) -> Self {
        Self { target }
    }

    pub fn target(&self) -> u64 {
        self.target
    }

    pub fn network_name(&self) -> &'static str {
        config::network_name(self.target)
    }

    /// Target chain id in the `0x`-prefixed form wallets use.
    pub fn target_hex(&self) -> String {
        format!("{:#x}", self.target)
    }

    pub fn is_allowed_chain(&self, chain_id: u64) -> bool {
        chain_id == self.target
    }

    /// Whether the session is on the wrong network. A disconnected session
    /// is not a mismatch, it is simply not connected.
    pub fn is_mismatched(&self, session: &Session) -> bool {
        session.connected && !session.chain_id.is_some_and(|id| self.is_allowed_chain(id))
    }

    /// Gate for reads and writes: connected and on the target chain.
    pub fn check(&self, session: &Session) -> Result<(), StakeError> {
        let on_target = session.chain_id.is_some_and(|id| self.is_allowed_chain(id));
        if !on_target && session.chain_id.is_some() {
            return Err(StakeError::WrongNetwork {
                expected: self.target,
                actual: session.chain_id,
            });
        }
        if !session.connected || session.address.is_none() {
            return Err(StakeError::NotConnected);
        }
        if !on_target {
            return Err(StakeError::WrongNetwork {
                expected: self.target,
                actual: None,
            });
        }
        Ok(())
    }

    pub fn permits(&self, session: &Session) -> bool {
        self.check(session).is_ok()
    }

    pub fn wrong_network_message(&self) -> String {
        format!(
            "Please connect to the {} network to use this application.",
            self.network_name()
        )
    }

    /// Ask the wallet to move to the target network. Failure is reported to
    /// the user and returned, never escalated.
    pub async fn switch_network<W: WalletProvider + ?Sized>(
        &self,
        wallet: &W,
        notifications: &NotificationSink,
    ) -> Result<(), StakeError> {
        tracing::info!(target_chain = self.target, "requesting network switch");
        match wallet.request_network_switch(self.target).await {
            Ok(()) => Ok(()),
            Err(e) => {
                let reason = e.message().unwrap_or("the wallet refused").to_string();
                tracing::warn!(error = %e, "network switch failed");
                notifications.warning(format!("Unable to switch network: {reason}"));
                Err(StakeError::WrongNetwork {
                    expected: self.target,
                    actual: None,
                })
            }
        }
    }
}
