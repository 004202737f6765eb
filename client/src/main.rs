#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

mod app;
mod basemap;
mod canvas;
mod config;
mod locate;
mod logging;
mod render_loop;
mod storage;
mod toast;
mod viewport;

use leptos::mount::mount_to;
use std::any::Any;
use std::cell::RefCell;
use wasm_bindgen::JsCast;

thread_local! {
    static MOUNTED_MAP: RefCell<Option<Box<dyn Any>>> = RefCell::new(None);
}

/// `#app` if the page provides it, else `<body>`.
fn mount_target(document: &web_sys::Document) -> Option<web_sys::HtmlElement> {
    document
        .get_element_by_id("app")
        .and_then(|node| node.dyn_into::<web_sys::HtmlElement>().ok())
        .or_else(|| document.body())
}

fn main() {
    console_error_panic_hook::set_once();
    logging::init(&config::log_filter());

    let Some(target) = web_sys::window()
        .and_then(|window| window.document())
        .and_then(|document| mount_target(&document))
    else {
        tracing::error!("no element to mount the map into");
        return;
    };

    MOUNTED_MAP.with(move |slot| {
        // The old map's canvas listeners and frame callback go away with its
        // handle, so release it before the new map starts painting.
        slot.borrow_mut().take();
        let handle = mount_to(target, app::App);
        *slot.borrow_mut() = Some(Box::new(handle));
    });
}
