use dioxus::prelude::*;
use staking_core::amount::format_amount_short;
use staking_core::{CallKind, DappSnapshot};

use super::stake::CallStatusLine;
use crate::state::{action_labels, SharedDapp};

#[component]
pub fn ClaimCard() -> Element {
    let dapp = use_context::<SharedDapp>();
    let snapshot = use_context::<Signal<DappSnapshot>>();

    let call = snapshot.read().call(CallKind::Claim).clone();
    let enabled = snapshot.read().can_submit(CallKind::Claim);
    let has_rewards = snapshot.read().balances.has_rewards();
    let rewards = format_amount_short(snapshot.read().balances.rewards.value);
    let (idle_label, busy_label) = action_labels(CallKind::Claim);

    let on_claim = move |_| {
        let dapp = dapp.clone();
        spawn(async move {
            if let Err(e) = dapp.submit(CallKind::Claim).await {
                tracing::debug!(error = %e, "claim did not go through");
            }
        });
    };

    rsx! {
        div { class: "action-card",
            h2 { "Rewards" }
            p { class: "balance-large", "{rewards} " span { class: "balance-unit", "VGB" } }
            if !has_rewards {
                p { class: "hint", "No rewards to claim yet." }
            }
            button {
                class: "btn btn-primary",
                disabled: !enabled,
                onclick: on_claim,
                if call.status.in_flight() { "{busy_label}" } else { "{idle_label}" }
            }
            CallStatusLine { call }
        }
    }
}
