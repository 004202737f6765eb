use boxmap_shared::LatLng;
use boxmap_shared::config::{MAX_MAP_ZOOM, MIN_MAP_ZOOM};

pub const DEFAULT_LOG_FILTER: &str = "info";
pub const DEFAULT_ZOOM: u8 = 1;
/// Zoom used when centering on the device position.
pub const LOCATE_ZOOM: u8 = 13;
pub const TOAST_DURATION_MS: u32 = 2_000;
pub const PURCHASE_FAILED_MESSAGE: &str = "Purchase failed, please try again";
/// Wheel delta (CSS px) that accounts for one zoom level.
pub const WHEEL_PX_PER_ZOOM_LEVEL: f64 = 60.0;
/// Pointer travel below which a press counts as a click rather than a drag.
pub const CLICK_TOLERANCE_PX: f64 = 5.0;

/// Initial camera; `locate` asks the browser for the device position afterwards.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialView {
    pub center: LatLng,
    pub zoom: u8,
    pub locate: bool,
}

fn location_search() -> String {
    web_sys::window()
        .and_then(|w| w.location().search().ok())
        .unwrap_or_default()
}

/// First value of `name` in a `?a=1&b=2` style query string, decoded by
/// the browser. Blank values count as absent.
pub fn query_param(search: &str, name: &str) -> Option<String> {
    let params = web_sys::UrlSearchParams::new_with_str(search).ok()?;
    params
        .get(name)
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

pub fn log_filter_from(param: impl Fn(&str) -> Option<String>) -> String {
    param("log").unwrap_or_else(|| DEFAULT_LOG_FILTER.to_owned())
}

pub fn initial_view_from(param: impl Fn(&str) -> Option<String>) -> InitialView {
    let lat = param("lat")
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite() && value.abs() <= 90.0);
    let lng = param("lng")
        .and_then(|value| value.parse::<f64>().ok())
        .filter(|value| value.is_finite() && value.abs() <= 180.0);
    let zoom = param("zoom")
        .and_then(|value| value.parse::<u8>().ok())
        .filter(|value| (MIN_MAP_ZOOM..=MAX_MAP_ZOOM).contains(value));

    match (lat, lng) {
        (Some(lat), Some(lng)) => InitialView {
            center: LatLng::new(lat, lng),
            zoom: zoom.unwrap_or(LOCATE_ZOOM),
            locate: false,
        },
        _ => InitialView {
            center: LatLng::new(0.0, 0.0),
            zoom: zoom.unwrap_or(DEFAULT_ZOOM),
            locate: true,
        },
    }
}

pub fn log_filter() -> String {
    let search = location_search();
    log_filter_from(|name| query_param(&search, name))
}

pub fn initial_view() -> InitialView {
    let search = location_search();
    initial_view_from(|name| query_param(&search, name))
}
