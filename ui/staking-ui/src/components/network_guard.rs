use dioxus::prelude::*;
use staking_core::DappSnapshot;

use crate::state::SharedDapp;

/// Banner shown while the wallet sits on another network.
#[component]
pub fn NetworkBanner() -> Element {
    let dapp = use_context::<SharedDapp>();
    let snapshot = use_context::<Signal<DappSnapshot>>();
    let mut switching = use_signal(|| false);

    if !snapshot.read().wrong_network() {
        return rsx! {};
    }
    let network = snapshot.read().guard.network_name();
    let message = snapshot.read().guard.wrong_network_message();

    let on_switch = move |_| {
        let dapp = dapp.clone();
        switching.set(true);
        spawn(async move {
            let _ = dapp.switch_network().await;
            switching.set(false);
        });
    };

    rsx! {
        div { class: "network-banner",
            span { class: "warning-text", "{message}" }
            button {
                class: "btn btn-warning",
                disabled: *switching.read(),
                onclick: on_switch,
                if *switching.read() { "Switching..." } else { "Switch to {network}" }
            }
        }
    }
}
