//! Shared handles for the dashboard UI.

use std::sync::Arc;

use staking_core::{CallKind, StakingDapp};

use crate::wallet::{AlloyWallet, ContractClient};

/// The store, provided as root context and cloned into event handlers.
pub type SharedDapp = Arc<StakingDapp<AlloyWallet, ContractClient>>;

/// Ticker of the currency each call moves.
pub fn unit(kind: CallKind) -> &'static str {
    match kind {
        CallKind::Stake | CallKind::Withdraw => "ETH",
        CallKind::Claim => "VGB",
    }
}

/// Button text while idle and while the wallet is busy.
pub fn action_labels(kind: CallKind) -> (&'static str, &'static str) {
    match kind {
        CallKind::Stake => ("Stake", "Staking..."),
        CallKind::Withdraw => ("Withdraw", "Withdrawing..."),
        CallKind::Claim => ("Claim Rewards", "Claiming..."),
    }
}
