use dioxus::prelude::*;
use staking_core::DappSnapshot;

use crate::state::SharedDapp;

/// Single-slot snackbar; the store hides it after its time-to-live.
#[component]
pub fn Snackbar() -> Element {
    let dapp = use_context::<SharedDapp>();
    let snapshot = use_context::<Signal<DappSnapshot>>();

    let Some(notification) = snapshot.read().notification.clone() else {
        return rsx! {};
    };
    let class = format!("snackbar snackbar-{}", notification.severity.as_str());

    rsx! {
        div { class: "{class}", role: "alert",
            span { class: "snackbar-message", "{notification.message}" }
            button {
                class: "snackbar-close",
                onclick: move |_| dapp.dismiss_notification(),
                "×"
            }
        }
    }
}
