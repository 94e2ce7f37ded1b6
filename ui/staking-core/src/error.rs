//! Error taxonomy shared by every component.
//!
//! Nothing here is fatal: each variant is recovered into a [`Notification`]
//! by the component that raises it, and the dashboard stays interactive.
//!
//! [`Notification`]: crate::notify::Notification

use alloy_primitives::TxHash;
use thiserror::Error;

use crate::contract::CallKind;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StakeError {
    #[error("Wallet connection rejected: {0}")]
    ConnectionRejected(String),

    #[error("No compatible wallet provider: {0}")]
    ProviderUnavailable(String),

    #[error("Wallet is not connected")]
    NotConnected,

    #[error("Wrong network: expected chain {expected}, wallet is on {}", display_chain(.actual))]
    WrongNetwork { expected: u64, actual: Option<u64> },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("A {0} transaction is already in progress")]
    AlreadyInProgress(CallKind),

    #[error("There are no rewards to claim")]
    NothingToClaim,

    #[error("Transaction rejected: {0}")]
    TransactionRejectedByUser(String),

    #[error("Transaction could not be sent: {0}")]
    TransactionFailed(String),

    #[error("Transaction {0} reverted")]
    TransactionReverted(TxHash),

    #[error("Read query failed: {0}")]
    ReadQueryFailed(String),
}

fn display_chain(chain: &Option<u64>) -> String {
    match chain {
        Some(id) => format!("chain {id}"),
        None => "an unknown chain".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrong_network_message_names_both_chains() {
        let err = StakeError::WrongNetwork {
            expected: 11_155_111,
            actual: Some(1),
        };
        assert_eq!(
            err.to_string(),
            "Wrong network: expected chain 11155111, wallet is on chain 1"
        );

        let err = StakeError::WrongNetwork {
            expected: 11_155_111,
            actual: None,
        };
        assert!(err.to_string().ends_with("an unknown chain"));
    }
}
