//! ABI of the external staking pool and the typed call descriptors sent to
//! the wallet.
//!
//! The pool is deployed and owned elsewhere; the entry point names below are
//! its own and are treated as a fixed boundary.

use std::fmt;

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};

use crate::provider::ProviderError;

sol! {
    interface IStakingPool {
        function Balances(address account) external view returns (uint256);
        function getRewards(address account) external view returns (uint256);
        function stake() external payable;
        function unstake(uint256 amount) external;
        function claimRewards() external;
    }
}

/// The three mutating operations the dashboard can issue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CallKind {
    Stake,
    Withdraw,
    Claim,
}

impl CallKind {
    pub const ALL: [CallKind; 3] = [CallKind::Stake, CallKind::Withdraw, CallKind::Claim];

    /// Whether the call is parameterized by a user-entered amount.
    pub fn takes_amount(self) -> bool {
        !matches!(self, CallKind::Claim)
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            CallKind::Stake => "Stake",
            CallKind::Withdraw => "Withdraw",
            CallKind::Claim => "Claim",
        }
    }

    pub(crate) fn invalid_amount_message(self) -> &'static str {
        match self {
            CallKind::Stake => "Please enter a valid amount to stake",
            CallKind::Withdraw => "Please enter a valid amount to withdraw",
            CallKind::Claim => "There are no rewards to claim",
        }
    }

    pub(crate) fn failure_message(self) -> &'static str {
        match self {
            CallKind::Stake => "Failed to stake tokens. Please try again.",
            CallKind::Withdraw => "Failed to withdraw tokens. Please try again.",
            CallKind::Claim => "Failed to claim rewards. Please try again.",
        }
    }

    pub(crate) fn success_message(self) -> &'static str {
        match self {
            CallKind::Stake => "Successfully staked tokens!",
            CallKind::Withdraw => "Successfully withdrew tokens!",
            CallKind::Claim => "Successfully claimed rewards!",
        }
    }
}

impl fmt::Display for CallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CallKind::Stake => "stake",
            CallKind::Withdraw => "withdraw",
            CallKind::Claim => "claim",
        })
    }
}

/// A validated, fully-typed mutating call. Amounts are already in base units.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StakingCall {
    /// `stake()` with the amount attached as value.
    Stake { value: U256 },
    /// `unstake(amount)`.
    Withdraw { amount: U256 },
    /// `claimRewards()`.
    Claim,
}

impl StakingCall {
    pub fn kind(&self) -> CallKind {
        match self {
            StakingCall::Stake { .. } => CallKind::Stake,
            StakingCall::Withdraw { .. } => CallKind::Withdraw,
            StakingCall::Claim => CallKind::Claim,
        }
    }

    pub fn calldata(&self) -> Bytes {
        let encoded = match self {
            StakingCall::Stake { .. } => IStakingPool::stakeCall {}.abi_encode(),
            StakingCall::Withdraw { amount } => IStakingPool::unstakeCall { amount: *amount }.abi_encode(),
            StakingCall::Claim => IStakingPool::claimRewardsCall {}.abi_encode(),
        };
        encoded.into()
    }

    /// Native value attached to the transaction.
    pub fn value(&self) -> U256 {
        match self {
            StakingCall::Stake { value } => *value,
            StakingCall::Withdraw { .. } | StakingCall::Claim => U256::ZERO,
        }
    }
}

/// Calldata for the staked-balance view.
pub fn staked_balance_query(account: Address) -> Bytes {
    IStakingPool::BalancesCall { account }.abi_encode().into()
}

/// Calldata for the pending-rewards view.
pub fn pending_rewards_query(account: Address) -> Bytes {
    IStakingPool::getRewardsCall { account }.abi_encode().into()
}

pub fn decode_staked_balance(output: &[u8]) -> Result<U256, ProviderError> {
    IStakingPool::BalancesCall::abi_decode_returns(output)
        .map_err(|e| ProviderError::Rpc(format!("malformed Balances response: {e}")))
}

pub fn decode_pending_rewards(output: &[u8]) -> Result<U256, ProviderError> {
    IStakingPool::getRewardsCall::abi_decode_returns(output)
        .map_err(|e| ProviderError::Rpc(format!("malformed getRewards response: {e}")))
}
