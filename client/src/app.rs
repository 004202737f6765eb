use std::cell::RefCell;

use boxmap_shared::LatLng;
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::canvas::MapCanvas;
use crate::config::{self, LOCATE_ZOOM};
use crate::locate;
use crate::toast::{Toast, ToastMessage};
use crate::viewport::MapView;

pub(crate) fn canvas_dimensions() -> (f64, f64) {
    let Some(window) = web_sys::window() else {
        return (1200.0, 800.0);
    };
    let w = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(1200.0);
    let h = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(800.0);
    (w, h)
}

/// A window listener kept alive until it is replaced.
struct WindowBinding<E: 'static> {
    window: web_sys::Window,
    event: &'static str,
    handler: Closure<dyn Fn(E)>,
}

impl<E: 'static> WindowBinding<E> {
    fn attach(window: &web_sys::Window, event: &'static str, handler: Closure<dyn Fn(E)>) -> Option<Self> {
        window
            .add_event_listener_with_callback(event, handler.as_ref().unchecked_ref())
            .ok()?;
        Some(Self {
            window: window.clone(),
            event,
            handler,
        })
    }
}

impl<E: 'static> Drop for WindowBinding<E> {
    fn drop(&mut self) {
        let _ = self
            .window
            .remove_event_listener_with_callback(self.event, self.handler.as_ref().unchecked_ref());
    }
}

thread_local! {
    static RESIZE_BINDING: RefCell<Option<WindowBinding<web_sys::Event>>> = const { RefCell::new(None) };
    static KEYDOWN_BINDING: RefCell<Option<WindowBinding<web_sys::KeyboardEvent>>> = const { RefCell::new(None) };
}

/// Newtype wrappers so same-typed signals stay distinct in Leptos context.
#[derive(Clone, Copy)]
pub(crate) struct GridActive(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct SelectedCount(pub RwSignal<usize>);
#[derive(Clone, Copy)]
pub(crate) struct PurchasePending(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct DevicePosition(pub RwSignal<Option<LatLng>>);

#[component]
pub fn App() -> impl IntoView {
    let initial = config::initial_view();
    let (w, h) = canvas_dimensions();

    let view: RwSignal<MapView> = RwSignal::new(MapView::new(initial.center, initial.zoom, w, h));
    let active: RwSignal<bool> = RwSignal::new(false);
    let selected_count: RwSignal<usize> = RwSignal::new(0);
    let pending: RwSignal<bool> = RwSignal::new(false);
    let position: RwSignal<Option<LatLng>> = RwSignal::new(None);
    let toast: RwSignal<Option<String>> = RwSignal::new(None);

    provide_context(view);
    provide_context(GridActive(active));
    provide_context(SelectedCount(selected_count));
    provide_context(PurchasePending(pending));
    provide_context(DevicePosition(position));
    provide_context(ToastMessage(toast));

    tracing::info!(
        lat = initial.center.lat,
        lng = initial.center.lng,
        zoom = initial.zoom,
        locate = initial.locate,
        "map starting"
    );

    // Center on the device once the browser reports it.
    if initial.locate {
        locate::request_position(move |found| {
            position.set(Some(found));
            view.update(|v| v.set_view(found, LOCATE_ZOOM));
        });
    }

    // Keep the view size in step with the window.
    Effect::new(move || {
        let Some(window) = web_sys::window() else {
            return;
        };
        let handler = Closure::<dyn Fn(web_sys::Event)>::new(move |_: web_sys::Event| {
            let (w, h) = canvas_dimensions();
            view.update(|v| v.resize(w, h));
        });
        let binding = WindowBinding::attach(&window, "resize", handler);
        RESIZE_BINDING.with(|slot| *slot.borrow_mut() = binding);
    });

    // Keyboard zoom: `+`/`=` in, `-` out.
    Effect::new(move || {
        let Some(window) = web_sys::window() else {
            return;
        };
        let handler =
            Closure::<dyn Fn(web_sys::KeyboardEvent)>::new(move |e: web_sys::KeyboardEvent| {
                let typing = e
                    .target()
                    .and_then(|t| t.dyn_into::<web_sys::HtmlElement>().ok())
                    .is_some_and(|el| matches!(el.tag_name().as_str(), "INPUT" | "TEXTAREA"));
                if typing {
                    return;
                }
                let steps = match e.key().as_str() {
                    "+" | "=" => 1,
                    "-" => -1,
                    _ => return,
                };
                e.prevent_default();
                view.update(|v| {
                    v.zoom_by(steps);
                });
            });
        let binding = WindowBinding::attach(&window, "keydown", handler);
        KEYDOWN_BINDING.with(|slot| *slot.borrow_mut() = binding);
    });

    view! {
        <MapCanvas />
        <Toast />
    }
}
