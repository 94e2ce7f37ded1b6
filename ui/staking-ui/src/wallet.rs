//! alloy-backed wallet and pool reader.
//!
//! The wallet signs with a local key read from the environment when the user
//! connects, and talks to the configured HTTP endpoint for everything else.

use std::time::Duration;

use alloy::network::EthereumWallet;
use alloy::primitives::{Address, Bytes, TxHash, TxKind, U256};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use alloy::signers::local::PrivateKeySigner;
use alloy::transports::http::reqwest::Url;
use alloy::transports::{RpcError, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use staking_core::config::WALLET_KEY_VAR;
use staking_core::contract::{self, StakingCall};
use staking_core::{Accounts, ContractReader, ProviderError, ProviderEvent, ReceiptStatus, WalletProvider};

const EVENT_CAPACITY: usize = 64;

type KeySource = Box<dyn Fn() -> Option<String> + Send + Sync>;

struct Connection {
    provider: DynProvider,
    address: Address,
    chain_id: u64,
    block_poller: JoinHandle<()>,
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.block_poller.abort();
    }
}

pub struct AlloyWallet {
    rpc_url: String,
    block_interval: Duration,
    key: KeySource,
    connection: Mutex<Option<Connection>>,
    events: broadcast::Sender<ProviderEvent>,
}

impl AlloyWallet {
    /// Wallet whose key is read from `STAKING_WALLET_KEY` on every connect.
    pub fn new(rpc_url: impl Into<String>, block_interval: Duration) -> Self {
        Self::with_key_source(rpc_url, block_interval, || std::env::var(WALLET_KEY_VAR).ok())
    }

    pub fn with_key_source<F>(rpc_url: impl Into<String>, block_interval: Duration, key: F) -> Self
    where
        F: Fn() -> Option<String> + Send + Sync + 'static,
    {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            rpc_url: rpc_url.into(),
            block_interval,
            key: Box::new(key),
            connection: Mutex::new(None),
            events,
        }
    }

    fn provider(&self) -> Result<DynProvider, ProviderError> {
        self.connection
            .lock()
            .as_ref()
            .map(|c| c.provider.clone())
            .ok_or_else(|| ProviderError::Unavailable("Wallet is not connected".into()))
    }

    fn emit(&self, event: ProviderEvent) {
        // no subscribers is fine
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl WalletProvider for AlloyWallet {
    async fn request_accounts(&self) -> Result<Accounts, ProviderError> {
        let key = (self.key)()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| ProviderError::Unavailable(format!("No wallet key found; set {WALLET_KEY_VAR}")))?;
        let url = endpoint(&self.rpc_url)?;
        let signer: PrivateKeySigner = key
            .trim()
            .parse()
            .map_err(|_| ProviderError::Rejected("The wallet key could not be read".into()))?;
        let address = signer.address();

        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();
        let chain_id = provider.get_chain_id().await.map_err(provider_error)?;

        let block_poller = spawn_block_poller(provider.clone(), self.events.clone(), self.block_interval);
        *self.connection.lock() = Some(Connection {
            provider,
            address,
            chain_id,
            block_poller,
        });
        tracing::info!(%address, chain_id, rpc = %self.rpc_url, "local wallet unlocked");
        Ok(Accounts { address, chain_id })
    }

    async fn disconnect(&self) {
        if self.connection.lock().take().is_some() {
            self.emit(ProviderEvent::Disconnected);
        }
    }

    async fn request_network_switch(&self, chain_id: u64) -> Result<(), ProviderError> {
        let provider = self.provider()?;
        let served = provider.get_chain_id().await.map_err(provider_error)?;
        if served != chain_id {
            return Err(ProviderError::Rpc(format!(
                "the endpoint serves chain {served}, not chain {chain_id}"
            )));
        }

        let changed = {
            let mut connection = self.connection.lock();
            match connection.as_mut() {
                Some(c) if c.chain_id != served => {
                    c.chain_id = served;
                    true
                }
                _ => false,
            }
        };
        if changed {
            self.emit(ProviderEvent::ChainChanged(served));
        }
        Ok(())
    }

    async fn sign_and_send(&self, contract: Address, call: &StakingCall) -> Result<TxHash, ProviderError> {
        let (provider, from) = {
            let connection = self.connection.lock();
            let c = connection
                .as_ref()
                .ok_or_else(|| ProviderError::Unavailable("Wallet is not connected".into()))?;
            (c.provider.clone(), c.address)
        };
        let tx = TransactionRequest {
            from: Some(from),
            to: Some(TxKind::Call(contract)),
            value: Some(call.value()),
            input: TransactionInput::new(call.calldata()),
            ..Default::default()
        };

        let pending = provider.send_transaction(tx).await.map_err(provider_error)?;
        let hash = *pending.tx_hash();
        tracing::info!(kind = %call.kind(), tx = %hash, "transaction broadcast");

        let events = self.events.clone();
        tokio::spawn(async move {
            let status = match pending.get_receipt().await {
                Ok(receipt) if receipt.status() => ReceiptStatus::Included,
                Ok(_) => ReceiptStatus::Reverted,
                Err(e) => {
                    tracing::warn!(tx = %hash, error = %e, "lost track of transaction");
                    ReceiptStatus::Dropped
                }
            };
            let _ = events.send(ProviderEvent::Receipt { tx: hash, status });
        });
        Ok(hash)
    }

    async fn receipt_status(&self, tx: TxHash) -> Result<Option<ReceiptStatus>, ProviderError> {
        let receipt = self
            .provider()?
            .get_transaction_receipt(tx)
            .await
            .map_err(provider_error)?;
        Ok(receipt.map(|r| if r.status() { ReceiptStatus::Included } else { ReceiptStatus::Reverted }))
    }

    fn subscribe(&self) -> broadcast::Receiver<ProviderEvent> {
        self.events.subscribe()
    }
}

fn spawn_block_poller(
    provider: DynProvider,
    events: broadcast::Sender<ProviderEvent>,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut tick = time::interval(every);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut last = None;
        loop {
            tick.tick().await;
            match provider.get_block_number().await {
                Ok(number) if last != Some(number) => {
                    last = Some(number);
                    let _ = events.send(ProviderEvent::NewBlock(number));
                }
                Ok(_) => {}
                Err(e) => tracing::debug!(error = %e, "block number poll failed"),
            }
        }
    })
}

/// Read-only access to the pool over plain `eth_call`.
pub struct ContractClient {
    provider: DynProvider,
    contract: Address,
}

impl ContractClient {
    pub fn new(rpc_url: &str, contract: Address) -> Result<Self, ProviderError> {
        let provider = ProviderBuilder::new().connect_http(endpoint(rpc_url)?).erased();
        Ok(Self { provider, contract })
    }

    async fn call(&self, input: Bytes) -> Result<Bytes, ProviderError> {
        let tx = TransactionRequest {
            to: Some(TxKind::Call(self.contract)),
            input: TransactionInput::new(input),
            ..Default::default()
        };
        self.provider.call(tx).await.map_err(provider_error)
    }
}

#[async_trait]
impl ContractReader for ContractClient {
    async fn staked_balance_of(&self, account: Address) -> Result<U256, ProviderError> {
        let output = self.call(contract::staked_balance_query(account)).await?;
        contract::decode_staked_balance(&output)
    }

    async fn pending_rewards_of(&self, account: Address) -> Result<U256, ProviderError> {
        let output = self.call(contract::pending_rewards_query(account)).await?;
        contract::decode_pending_rewards(&output)
    }

    async fn wallet_balance_of(&self, account: Address) -> Result<U256, ProviderError> {
        self.provider.get_balance(account).await.map_err(provider_error)
    }
}

fn endpoint(rpc_url: &str) -> Result<Url, ProviderError> {
    rpc_url
        .parse()
        .map_err(|e| ProviderError::Unavailable(format!("Invalid RPC endpoint {rpc_url}: {e}")))
}

/// Node error responses keep their message; transport failures mean the
/// endpoint is unreachable.
fn provider_error(e: TransportError) -> ProviderError {
    match e {
        RpcError::ErrorResp(payload) => ProviderError::Rpc(payload.message.to_string()),
        RpcError::Transport(kind) => ProviderError::Unavailable(kind.to_string()),
        other => ProviderError::Rpc(other.to_string()),
    }
}
