use dioxus::prelude::*;
use staking_core::amount::format_amount_short;
use staking_core::{CallKind, DappSnapshot};

use super::balance::BalanceCards;
use super::claim::ClaimCard;
use super::connection_status::ConnectionStatusIndicator;
use super::network_guard::NetworkBanner;
use super::notification::Snackbar;
use super::stake::AmountCard;

#[component]
pub fn Layout() -> Element {
    let snapshot = use_context::<Signal<DappSnapshot>>();
    let connected = snapshot.read().connected();

    rsx! {
        div { class: "app-container",
            TopBar {}
            main { class: "main-content",
                NetworkBanner {}
                if connected {
                    BalanceCards {}
                    div { class: "action-grid",
                        AmountCard { kind: CallKind::Stake }
                        AmountCard { kind: CallKind::Withdraw }
                        ClaimCard {}
                    }
                } else {
                    div { class: "connect-nudge",
                        h1 { "Stake ETH, earn VGB" }
                        p { class: "empty-desc",
                            "Connect your wallet to see your stake and pending rewards."
                        }
                    }
                }
            }
            Snackbar {}
        }
    }
}

#[component]
pub fn TopBar() -> Element {
    let snapshot = use_context::<Signal<DappSnapshot>>();
    let snap = snapshot.read();
    let network = snap.guard.network_name();
    let chip_class = if snap.wrong_network() { "network-chip network-chip-wrong" } else { "network-chip" };
    let wallet_balance = snap
        .balances
        .wallet
        .loaded
        .then(|| format_amount_short(snap.balances.wallet.value));

    rsx! {
        header { class: "topbar",
            div { class: "topbar-left",
                span { class: "brand-icon", "◈" }
                span { class: "brand-text", "Staking dApp" }
                span { class: chip_class, "{network}" }
                if let Some(balance) = wallet_balance {
                    div { class: "topbar-divider" }
                    div { class: "topbar-balance",
                        span { class: "topbar-label", "Wallet" }
                        span { class: "topbar-value", "{balance} ETH" }
                    }
                }
            }
            div { class: "topbar-right",
                ConnectionStatusIndicator {}
            }
        }
    }
}
