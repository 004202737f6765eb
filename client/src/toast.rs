use boxmap_shared::Notifier;
use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;

use crate::config::TOAST_DURATION_MS;

/// Message currently shown by [`Toast`], if any.
#[derive(Clone, Copy)]
pub(crate) struct ToastMessage(pub RwSignal<Option<String>>);

/// Shows a message in the toast slot and clears it after a short delay,
/// unless a newer message replaced it meanwhile.
#[derive(Clone, Copy)]
pub struct ToastNotifier {
    slot: RwSignal<Option<String>>,
}

impl ToastNotifier {
    pub fn new(slot: RwSignal<Option<String>>) -> Self {
        Self { slot }
    }
}

impl Notifier for ToastNotifier {
    fn notify(&self, message: &str) {
        let slot = self.slot;
        let shown = message.to_owned();
        slot.set(Some(shown.clone()));
        wasm_bindgen_futures::spawn_local(async move {
            TimeoutFuture::new(TOAST_DURATION_MS).await;
            if slot.get_untracked().as_deref() == Some(shown.as_str()) {
                slot.set(None);
            }
        });
    }
}

#[component]
pub fn Toast() -> impl IntoView {
    let ToastMessage(message) = expect_context();

    view! {
        {move || {
            message.get().map(|text| view! {
                <div
                    class="toast"
                    style="position: fixed; left: 50%; bottom: 96px; transform: translateX(-50%); z-index: 100; background: #161921; color: #e2e0d8; border: 1px solid #282c3e; border-radius: 6px; padding: 10px 16px; font-family: 'Inter', system-ui, sans-serif; font-size: 0.85rem; box-shadow: 0 4px 16px rgba(0,0,0,0.5); pointer-events: none;"
                >
                    {text}
                </div>
            })
        }}
    }
}
