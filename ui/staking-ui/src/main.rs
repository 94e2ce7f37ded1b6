#![allow(non_snake_case)]

mod components;
mod state;
mod wallet;

use std::sync::Arc;

use dioxus::prelude::*;
use staking_core::config::{self, StakingConfig};
use staking_core::{DappSnapshot, StakingDapp};
use tracing_subscriber::EnvFilter;

use state::SharedDapp;
use wallet::{AlloyWallet, ContractClient};

const STYLE: &str = include_str!("../assets/style.css");

fn main() {
    config::load_env_file();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let dapp = match build_dapp() {
        Ok(dapp) => dapp,
        Err(e) => {
            tracing::error!(error = %e, "cannot start the staking dashboard");
            std::process::exit(1);
        }
    };

    dioxus::LaunchBuilder::new().with_context(dapp).launch(App);
}

fn build_dapp() -> Result<SharedDapp, Box<dyn std::error::Error>> {
    let config = StakingConfig::from_env()?;
    tracing::info!(
        chain_id = config.chain_id,
        network = config.network_name(),
        contract = %config.contract_address,
        "staking dashboard configured"
    );
    let wallet = AlloyWallet::new(config.rpc_url.clone(), config.poll_interval);
    let reader = ContractClient::new(&config.rpc_url, config.contract_address)?;
    Ok(Arc::new(StakingDapp::new(config, Arc::new(wallet), Arc::new(reader))))
}

#[component]
fn App() -> Element {
    let dapp = use_context::<SharedDapp>();
    let mut snapshot = use_context_provider(|| Signal::new(dapp.snapshot()));

    // Event loop: wallet events, read polling and snackbar expiry. Dropped
    // with the window, which releases every subscription.
    let runner = dapp.clone();
    use_future(move || {
        let dapp = runner.clone();
        async move { dapp.run().await }
    });

    // Mirror store changes into the signal the components read.
    use_future(move || {
        let dapp = dapp.clone();
        async move {
            let mut updates = dapp.updates();
            loop {
                let next: DappSnapshot = dapp.snapshot();
                if *snapshot.peek() != next {
                    snapshot.set(next);
                }
                if !updates.changed().await {
                    break;
                }
            }
        }
    });

    rsx! {
        document::Style { {STYLE} }
        components::layout::Layout {}
    }
}
