use dioxus::prelude::*;
use staking_core::amount::{format_amount, format_amount_short};
use staking_core::{DappSnapshot, Query};

use crate::state::SharedDapp;

#[component]
pub fn BalanceCards() -> Element {
    let dapp = use_context::<SharedDapp>();
    let snapshot = use_context::<Signal<DappSnapshot>>();

    let balances = snapshot.read().balances.clone();
    let enabled = snapshot.read().reads_enabled();
    let busy = balances.loading();

    let on_refresh = move |_| {
        let dapp = dapp.clone();
        spawn(async move {
            if let Err(e) = dapp.refresh().await {
                tracing::debug!(error = %e, "manual refresh failed");
            }
        });
    };

    rsx! {
        div { class: "stats-row",
            StatCard { title: "Your Stake", unit: "ETH", query: balances.staked.clone() }
            StatCard { title: "Pending Rewards", unit: "VGB", query: balances.rewards.clone() }
            div { class: "stats-actions",
                button {
                    class: "btn btn-secondary",
                    disabled: busy || !enabled,
                    onclick: on_refresh,
                    if busy { "Refreshing..." } else { "Refresh" }
                }
            }
        }
    }
}

#[component]
fn StatCard(title: &'static str, unit: &'static str, query: Query) -> Element {
    let shown = if query.loaded {
        format_amount_short(query.value)
    } else if query.loading {
        "…".to_string()
    } else {
        "—".to_string()
    };
    let exact = format_amount(query.value);

    rsx! {
        div { class: "result-card stat-card",
            p { class: "label", "{title}" }
            p { class: "balance-large", title: "{exact} {unit}",
                "{shown} "
                span { class: "balance-unit", "{unit}" }
                if query.loading {
                    span { class: "spinner" }
                }
            }
            if let Some(err) = &query.error {
                p { class: "error-text", "{err}" }
            }
        }
    }
}
