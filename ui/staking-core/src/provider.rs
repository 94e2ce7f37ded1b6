//! Capabilities consumed from the outside world: the wallet (signing,
//! network switching, event stream) and read access to the pool.

use alloy_primitives::{Address, TxHash, U256};
use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::contract::StakingCall;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    /// No usable provider: not installed, not configured or unreachable.
    #[error("{0}")]
    Unavailable(String),

    /// The user declined the request.
    #[error("{0}")]
    Rejected(String),

    /// The provider accepted the request but the node returned an error.
    #[error("{0}")]
    Rpc(String),
}

impl ProviderError {
    /// The provider's own message, if it gave a meaningful one.
    pub fn message(&self) -> Option<&str> {
        let msg = match self {
            ProviderError::Unavailable(m) | ProviderError::Rejected(m) | ProviderError::Rpc(m) => m,
        };
        let msg = msg.trim();
        (!msg.is_empty()).then_some(msg)
    }
}

/// Account and network reported by the wallet after a successful connect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Accounts {
    pub address: Address,
    pub chain_id: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiptStatus {
    /// Mined and executed successfully.
    Included,
    /// Mined but execution reverted.
    Reverted,
    /// The provider lost track of the transaction.
    Dropped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Option<Address>),
    ChainChanged(u64),
    NewBlock(u64),
    Receipt { tx: TxHash, status: ReceiptStatus },
    Disconnected,
}

/// The wallet session capability. Only the session adapter opens or closes
/// it; everything else uses it read-only.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request_accounts(&self) -> Result<Accounts, ProviderError>;

    async fn disconnect(&self);

    async fn request_network_switch(&self, chain_id: u64) -> Result<(), ProviderError>;

    /// Sign and broadcast one transaction to `contract`.
    async fn sign_and_send(&self, contract: Address, call: &StakingCall) -> Result<TxHash, ProviderError>;

    /// Receipt of `tx` if it has been mined; `None` while it is pending.
    async fn receipt_status(&self, tx: TxHash) -> Result<Option<ReceiptStatus>, ProviderError>;

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent>;
}

/// Read-only views of the pool plus the account's native balance.
#[async_trait]
pub trait ContractReader: Send + Sync {
    async fn staked_balance_of(&self, account: Address) -> Result<U256, ProviderError>;

    async fn pending_rewards_of(&self, account: Address) -> Result<U256, ProviderError>;

    async fn wallet_balance_of(&self, account: Address) -> Result<U256, ProviderError>;
}
