//! Orchestration core of the staking dashboard.
//!
//! Everything the view needs lives behind [`StakingDapp`]: the wallet
//! session, the network guard, cached pool reads, the three write calls and
//! their confirmation, and the single-slot notification. Wallet and chain
//! access go through the [`provider`] traits so the core can be driven by an
//! RPC-backed wallet or by an in-memory one.

pub mod amount;
pub mod balances;
pub mod calls;
pub mod chain;
pub mod config;
pub mod contract;
pub mod dapp;
pub mod error;
pub mod notify;
pub mod provider;
pub mod session;
pub mod watcher;

#[cfg(test)]
pub(crate) mod testing;

pub use alloy_primitives::{Address, TxHash, U256};

pub use balances::{Balances, Query};
pub use calls::{CallBook, CallStatus, PendingCall};
pub use chain::ChainGuard;
pub use config::{ConfigError, StakingConfig};
pub use contract::{CallKind, StakingCall};
pub use dapp::{DappSnapshot, StakingDapp, Updates};
pub use error::StakeError;
pub use notify::{Notification, NotificationSink, Severity};
pub use provider::{Accounts, ContractReader, ProviderError, ProviderEvent, ReceiptStatus, WalletProvider};
pub use session::{ConnectionStatus, Session};
