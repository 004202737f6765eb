use std::cell::{Cell, RefCell};
use std::rc::Rc;

use boxmap_shared::config::ACTIVATION_ZOOM;
use boxmap_shared::render::{SELECTED_CLASS, SELECTED_HIGHLIGHT, SELECTED_HIGHLIGHT_WIDTH};
use boxmap_shared::{
    GridConfig, GridOverlay, LatLng, Notifier, PixelPoint, PurchaseCoordinator, PurchaseOutcome,
    Transition,
};
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, PointerEvent, WheelEvent};

use crate::app::{DevicePosition, GridActive, PurchasePending, SelectedCount};
use crate::basemap::{ATTRIBUTION, BaseMap};
use crate::config::{CLICK_TOLERANCE_PX, PURCHASE_FAILED_MESSAGE, WHEEL_PX_PER_ZOOM_LEVEL};
use crate::render_loop::FrameScheduler;
use crate::storage::BrowserStore;
use crate::toast::{ToastMessage, ToastNotifier};
use crate::viewport::MapView;

const BACKGROUND: &str = "#aad3df";
const MARKER_RADIUS: f64 = 7.0;
const MARKER_FILL: &str = "rgba(37, 99, 235, 0.95)";
const MARKER_STROKE: &str = "#ffffff";
/// `WheelEvent.deltaMode` for line-based scrolling.
const DOM_DELTA_LINE: u32 = 1;
const WHEEL_LINE_HEIGHT_PX: f64 = 16.0;

type Coordinator = PurchaseCoordinator<BrowserStore, ToastNotifier>;

fn device_pixel_ratio() -> f64 {
    web_sys::window()
        .map(|w| w.device_pixel_ratio())
        .unwrap_or(1.0)
        .max(1.0)
}

/// Container-relative position of a client (viewport) point.
fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, client_x: i32, client_y: i32) -> PixelPoint {
    canvas_ref
        .get_untracked()
        .map(|el| {
            let rect = el.get_bounding_client_rect();
            PixelPoint::new(client_x as f64 - rect.left(), client_y as f64 - rect.top())
        })
        .unwrap_or(PixelPoint::new(client_x as f64, client_y as f64))
}

/// Slippy map with the purchase grid on top, plus zoom controls and the
/// purchase panel.
#[component]
pub fn MapCanvas() -> impl IntoView {
    let view: RwSignal<MapView> = expect_context();
    let GridActive(active) = expect_context();
    let SelectedCount(selected_count) = expect_context();
    let PurchasePending(pending) = expect_context();
    let DevicePosition(position) = expect_context();
    let ToastMessage(toast) = expect_context();

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let notifier = ToastNotifier::new(toast);
    let grid = Rc::new(RefCell::new(GridOverlay::new(GridConfig::default())));
    let coordinator: Rc<Coordinator> = Rc::new(PurchaseCoordinator::new(BrowserStore, notifier));

    // Bumped whenever a base map image finishes loading.
    let repaint: RwSignal<u64> = RwSignal::new(0);
    let basemap = Rc::new(RefCell::new(BaseMap::new(move || {
        repaint.update(|n| *n = n.wrapping_add(1));
    })));

    let scheduler = FrameScheduler::new({
        let grid = grid.clone();
        let basemap = basemap.clone();
        move || paint(canvas_ref, view, position, &grid, &basemap)
    });

    // Zoom transitions create or tear down the grid; any view change repaints.
    Effect::new({
        let grid = grid.clone();
        let scheduler = scheduler.clone();
        move || {
            let zoom = view.with(|v| v.zoom);
            let (transition, is_active, selected) = {
                let mut overlay = grid.borrow_mut();
                let transition = overlay.on_zoom_changed(zoom);
                (transition, overlay.is_active(), overlay.store().selected_len())
            };
            if transition != Transition::Unchanged {
                active.set(is_active);
                selected_count.set(selected);
            }
            scheduler.request();
        }
    });

    Effect::new({
        let scheduler = scheduler.clone();
        move || {
            repaint.track();
            position.track();
            scheduler.request();
        }
    });

    // Sold boxes come from storage once the map is up. On failure the
    // coordinator retries before the next purchase and refuses it until a
    // read succeeds.
    {
        let grid = grid.clone();
        let coordinator = coordinator.clone();
        let scheduler = scheduler.clone();
        wasm_bindgen_futures::spawn_local(async move {
            match coordinator.load_sold(&grid).await {
                Ok(_) => {
                    selected_count.set(grid.borrow().store().selected_len());
                    scheduler.request();
                }
                Err(e) => tracing::warn!(error = %e, "failed to load sold boxes"),
            }
        });
    }

    // --- Input handlers ---

    let is_dragging = Rc::new(Cell::new(false));
    let drag_start = Rc::new(Cell::new((0.0f64, 0.0f64)));
    let last_pos = Rc::new(Cell::new((0.0f64, 0.0f64)));
    let wheel_accum = Rc::new(Cell::new(0.0f64));

    let on_wheel = move |e: WheelEvent| {
        e.prevent_default();
        let mut delta = e.delta_y();
        if e.delta_mode() == DOM_DELTA_LINE {
            delta *= WHEEL_LINE_HEIGHT_PX;
        }
        let accum = wheel_accum.get() + delta;
        let steps = (accum / WHEEL_PX_PER_ZOOM_LEVEL).trunc();
        wheel_accum.set(accum - steps * WHEEL_PX_PER_ZOOM_LEVEL);
        if steps != 0.0 {
            let at = local_point(canvas_ref, e.client_x(), e.client_y());
            view.update(|v| {
                v.zoom_at(-(steps as i32), at.x, at.y);
            });
        }
    };

    let on_pointer_down = {
        let is_dragging = is_dragging.clone();
        let drag_start = drag_start.clone();
        let last_pos = last_pos.clone();
        move |e: PointerEvent| {
            is_dragging.set(true);
            let at = (e.client_x() as f64, e.client_y() as f64);
            drag_start.set(at);
            last_pos.set(at);

            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.set_pointer_capture(e.pointer_id()).ok();
                el.style().set_property("cursor", "grabbing").ok();
            }
        }
    };

    let on_pointer_move = {
        let is_dragging = is_dragging.clone();
        let last_pos = last_pos.clone();
        move |e: PointerEvent| {
            if !is_dragging.get() {
                return;
            }
            let (last_x, last_y) = last_pos.get();
            let (x, y) = (e.client_x() as f64, e.client_y() as f64);
            last_pos.set((x, y));
            view.update(|v| v.pan(x - last_x, y - last_y));
        }
    };

    let on_pointer_up = {
        let is_dragging = is_dragging.clone();
        move |e: PointerEvent| {
            is_dragging.set(false);
            if let Some(target) = e.target()
                && let Ok(el) = target.dyn_into::<web_sys::HtmlElement>()
            {
                el.style().set_property("cursor", "grab").ok();
            }
        }
    };

    let on_click = {
        let grid = grid.clone();
        let scheduler = scheduler.clone();
        move |e: MouseEvent| {
            let (start_x, start_y) = drag_start.get();
            let dx = (e.client_x() as f64 - start_x).abs();
            let dy = (e.client_y() as f64 - start_y).abs();
            if dx >= CLICK_TOLERANCE_PX || dy >= CLICK_TOLERANCE_PX {
                return;
            }
            let at = local_point(canvas_ref, e.client_x(), e.client_y());
            let selected = {
                let mut overlay = grid.borrow_mut();
                let current = view.get_untracked();
                overlay.click_at(&current, at).map(|_| overlay.store().selected_len())
            };
            if let Some(selected) = selected {
                selected_count.set(selected);
                scheduler.request();
            }
        }
    };

    let on_buy = {
        let grid = grid.clone();
        let coordinator = coordinator.clone();
        let scheduler = scheduler.clone();
        move |_: MouseEvent| {
            if pending.get_untracked() {
                return;
            }
            pending.set(true);
            let grid = grid.clone();
            let coordinator = coordinator.clone();
            let scheduler = scheduler.clone();
            wasm_bindgen_futures::spawn_local(async move {
                match coordinator.purchase(&grid).await {
                    Ok(PurchaseOutcome::Completed { .. }) | Ok(PurchaseOutcome::NothingSelected) => {}
                    Err(_) => notifier.notify(PURCHASE_FAILED_MESSAGE),
                }
                selected_count.set(grid.borrow().store().selected_len());
                pending.set(false);
                scheduler.request();
            });
        }
    };

    let zoom_in = move |_: MouseEvent| {
        view.update(|v| {
            v.zoom_by(1);
        });
    };
    let zoom_out = move |_: MouseEvent| {
        view.update(|v| {
            v.zoom_by(-1);
        });
    };
    let zoom_to_grid = move |_: MouseEvent| {
        view.update(|v| {
            let steps = ACTIVATION_ZOOM as i32 - v.zoom as i32;
            v.zoom_by(steps);
        });
    };

    let buy_disabled = move || selected_count.get() == 0 || pending.get();

    view! {
        <div
            style="position: fixed; inset: 0; overflow: hidden; background: #aad3df;"
        >
            <div
                style="position: absolute; inset: 0;"
                on:wheel=on_wheel
                on:pointerdown=on_pointer_down
                on:pointermove=on_pointer_move
                on:pointerup=on_pointer_up
                on:click=on_click
            >
                <canvas
                    node_ref=canvas_ref
                    style="position: absolute; inset: 0; width: 100%; height: 100%; touch-action: none; cursor: grab;"
                />
            </div>

            <div style="position: absolute; top: 12px; left: 12px; z-index: 10; display: flex; flex-direction: column; gap: 4px;">
                <button class="zoom-in" style="width: 32px; height: 32px; font-size: 1.1rem;" on:click=zoom_in>"+"</button>
                <button class="zoom-out" style="width: 32px; height: 32px; font-size: 1.1rem;" on:click=zoom_out>"−"</button>
            </div>

            <div
                class="purchase-panel"
                style="position: absolute; bottom: 24px; left: 50%; transform: translateX(-50%); z-index: 10; display: flex; align-items: center; gap: 12px; background: #161921; color: #e2e0d8; border: 1px solid #282c3e; border-radius: 6px; padding: 10px 16px; font-family: 'Inter', system-ui, sans-serif; font-size: 0.85rem;"
            >
                <span
                    class="zoom-hint"
                    style=move || if active.get() { "display: none;" } else { "" }
                >
                    {format!("Zoom in to level {ACTIVATION_ZOOM} to pick boxes")}
                </span>
                <button
                    class="zoom-to-grid"
                    style=move || if active.get() { "display: none;" } else { "" }
                    on:click=zoom_to_grid
                >
                    "Go"
                </button>
                <span
                    class="selected-count"
                    style=move || if active.get() { "" } else { "display: none;" }
                >
                    {move || format!("{} selected", selected_count.get())}
                </span>
                <button
                    class="buy-now"
                    style=move || if active.get() { "" } else { "display: none;" }
                    disabled=buy_disabled
                    on:click=on_buy
                >
                    {move || if pending.get() { "Buying…" } else { "Buy now" }}
                </button>
            </div>

            <div
                class="attribution"
                style="position: absolute; right: 0; bottom: 0; z-index: 10; background: rgba(255,255,255,0.75); color: #333; font-size: 11px; padding: 1px 5px; font-family: system-ui, sans-serif;"
            >
                {ATTRIBUTION}
            </div>
        </div>
    }
}

/// Draw one frame: base map, then the grid at its configured opacity, then
/// the device marker.
fn paint(
    canvas_ref: NodeRef<leptos::html::Canvas>,
    view: RwSignal<MapView>,
    position: RwSignal<Option<LatLng>>,
    grid: &RefCell<GridOverlay>,
    basemap: &RefCell<BaseMap>,
) {
    let Some(canvas) = canvas_ref.get_untracked() else {
        return;
    };
    let canvas: &HtmlCanvasElement = &canvas;
    let Some(parent) = canvas.parent_element() else {
        return;
    };
    let w = parent.client_width() as f64;
    let h = parent.client_height() as f64;
    if w <= 0.0 || h <= 0.0 {
        return;
    }

    let dpr = device_pixel_ratio();
    let (pw, ph) = ((w * dpr).round() as u32, (h * dpr).round() as u32);
    if canvas.width() != pw || canvas.height() != ph {
        canvas.set_width(pw);
        canvas.set_height(ph);
    }
    if view.with_untracked(|v| v.width != w || v.height != h) {
        view.update_untracked(|v| v.resize(w, h));
    }

    let Some(ctx) = canvas
        .get_context("2d")
        .ok()
        .flatten()
        .and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
    else {
        return;
    };
    let _ = ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0);
    ctx.set_global_alpha(1.0);
    ctx.set_fill_style_str(BACKGROUND);
    ctx.fill_rect(0.0, 0.0, w, h);

    let current = view.get_untracked();
    basemap.borrow_mut().draw(&ctx, &current);

    {
        let mut overlay = grid.borrow_mut();
        overlay.sync_tiles(&current);
        if overlay.is_active() {
            draw_grid(&ctx, &current, &overlay);
        }
    }

    if let Some(located) = position.get_untracked() {
        draw_marker(&ctx, current.latlng_to_container(located));
    }
}

fn draw_grid(ctx: &CanvasRenderingContext2d, view: &MapView, overlay: &GridOverlay) {
    let size = overlay.config().tile_size_px();
    for tile in overlay.tiles() {
        let at = view.pixel_to_container(tile.coord.north_west(size));
        let surface = &tile.surface;
        ctx.set_global_alpha(surface.opacity);

        // Half-pixel offset keeps the 1px border crisp.
        let [first, rest @ ..] = &surface.path;
        ctx.set_line_width(1.0);
        ctx.set_stroke_style_str(&surface.border_css());
        ctx.begin_path();
        ctx.move_to(at.x + first.0 + 0.5, at.y + first.1 + 0.5);
        for (x, y) in rest {
            ctx.line_to(at.x + x + 0.5, at.y + y + 0.5);
        }
        ctx.close_path();
        ctx.stroke();

        if tile.has_class(SELECTED_CLASS) {
            let inset = SELECTED_HIGHLIGHT_WIDTH / 2.0 + 1.0;
            ctx.set_line_width(SELECTED_HIGHLIGHT_WIDTH);
            ctx.set_stroke_style_str(&SELECTED_HIGHLIGHT.css());
            ctx.stroke_rect(
                at.x + inset,
                at.y + inset,
                surface.width as f64 - 2.0 * inset,
                surface.height as f64 - 2.0 * inset,
            );
        }
    }
    ctx.set_global_alpha(1.0);
}

fn draw_marker(ctx: &CanvasRenderingContext2d, at: PixelPoint) {
    ctx.begin_path();
    if ctx
        .arc(at.x, at.y, MARKER_RADIUS, 0.0, std::f64::consts::TAU)
        .is_err()
    {
        return;
    }
    ctx.set_fill_style_str(MARKER_FILL);
    ctx.fill();
    ctx.set_line_width(2.0);
    ctx.set_stroke_style_str(MARKER_STROKE);
    ctx.stroke();
}
