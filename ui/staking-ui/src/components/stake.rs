use dioxus::prelude::*;
use staking_core::amount::format_amount_short;
use staking_core::{CallKind, CallStatus, DappSnapshot, PendingCall};

use crate::state::{action_labels, unit, SharedDapp};

/// Card for the calls that take an amount: stake and withdraw.
#[component]
pub fn AmountCard(kind: CallKind) -> Element {
    let dapp = use_context::<SharedDapp>();
    let snapshot = use_context::<Signal<DappSnapshot>>();

    let call = snapshot.read().call(kind).clone();
    let enabled = snapshot.read().can_submit(kind);
    let staked = snapshot.read().balances.staked.value;
    let (idle_label, busy_label) = action_labels(kind);
    let (title, hint) = match kind {
        CallKind::Withdraw => ("Withdraw", format!("Staked: {} ETH", format_amount_short(staked))),
        _ => ("Stake", "Stake ETH to start earning VGB rewards.".to_string()),
    };

    let dapp_for_input = dapp.clone();
    let on_input = move |e: FormEvent| dapp_for_input.set_input(kind, e.value());
    let on_submit = move |_| {
        let dapp = dapp.clone();
        spawn(async move {
            if let Err(e) = dapp.submit(kind).await {
                tracing::debug!(%kind, error = %e, "submission did not go through");
            }
        });
    };

    rsx! {
        div { class: "action-card",
            h2 { "{title}" }
            p { class: "hint", "{hint}" }
            div { class: "form-group",
                label { "Amount ({unit(kind)})" }
                input {
                    class: "input",
                    r#type: "text",
                    placeholder: "0.0",
                    disabled: call.status.in_flight(),
                    value: "{call.input_amount}",
                    oninput: on_input,
                }
            }
            button {
                class: "btn btn-primary",
                disabled: !enabled,
                onclick: on_submit,
                if call.status.in_flight() { "{busy_label}" } else { "{idle_label}" }
            }
            CallStatusLine { call: call.clone() }
        }
    }
}

/// Progress of the last submission of one call.
#[component]
pub fn CallStatusLine(call: PendingCall) -> Element {
    let tx = call.tx.map(|hash| {
        let hash = hash.to_string();
        format!("{}...{}", &hash[..10], &hash[hash.len() - 8..])
    });

    let (class, text) = match call.status {
        CallStatus::Idle => return rsx! {},
        CallStatus::Submitting => ("status-text", "Waiting for the wallet to sign...".to_string()),
        CallStatus::Submitted => ("status-text", "Transaction submitted, waiting for confirmation...".to_string()),
        CallStatus::Confirmed => ("success-text", "Transaction confirmed.".to_string()),
        CallStatus::Failed => (
            "error-text",
            call.error.clone().unwrap_or_else(|| "Transaction failed.".to_string()),
        ),
    };

    rsx! {
        div { class: "call-status",
            p { class: class, "{text}" }
            if let Some(tx) = tx {
                p { class: "label", "Tx: " span { class: "mono", "{tx}" } }
            }
        }
    }
}
