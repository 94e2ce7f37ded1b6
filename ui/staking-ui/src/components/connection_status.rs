use dioxus::prelude::*;
use staking_core::{ConnectionStatus, DappSnapshot};

use crate::state::SharedDapp;

#[component]
pub fn ConnectionStatusIndicator() -> Element {
    let dapp = use_context::<SharedDapp>();
    let snapshot = use_context::<Signal<DappSnapshot>>();

    let status = snapshot.read().status.clone();
    let address = snapshot.read().session.short_address();

    let (dot_class, label) = match &status {
        ConnectionStatus::Disconnected => ("dot disconnected", "Disconnected"),
        ConnectionStatus::Connecting => ("dot connecting", "Connecting"),
        ConnectionStatus::Connected => ("dot connected", "Connected"),
        ConnectionStatus::Error(_) => ("dot error", "Error"),
    };
    let is_connected = matches!(status, ConnectionStatus::Connected);

    let dapp_for_disconnect = dapp.clone();
    let connect = move |_| {
        let dapp = dapp.clone();
        spawn(async move {
            // failures surface through the snackbar
            let _ = dapp.connect().await;
        });
    };
    let disconnect = move |_| {
        let dapp = dapp_for_disconnect.clone();
        spawn(async move { dapp.disconnect().await });
    };

    rsx! {
        div { class: "conn-indicator",
            span { class: dot_class }
            if let Some(address) = address {
                span { class: "conn-label mono", "{address}" }
            } else {
                span { class: "conn-label", "{label}" }
            }
            if is_connected {
                button { class: "conn-btn conn-btn-disconnect", onclick: disconnect, "Disconnect" }
            } else {
                button {
                    class: "conn-btn conn-btn-connect",
                    disabled: matches!(status, ConnectionStatus::Connecting),
                    onclick: connect,
                    "Connect Wallet"
                }
            }
        }
    }
}
