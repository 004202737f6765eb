use boxmap_shared::LatLng;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Position as GeolocationPosition, PositionError as GeolocationPositionError};

/// Ask the browser for the device position once. `on_found` runs only on
/// success; denial and timeouts are logged and otherwise ignored.
pub fn request_position(on_found: impl FnOnce(LatLng) + 'static) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let geolocation = match window.navigator().geolocation() {
        Ok(geolocation) => geolocation,
        Err(e) => {
            tracing::warn!(error = ?e, "geolocation unavailable");
            return;
        }
    };

    let on_success = Closure::once_into_js(move |position: GeolocationPosition| {
        let coords = position.coords();
        let found = LatLng::new(coords.latitude(), coords.longitude());
        tracing::debug!(lat = found.lat, lng = found.lng, "device located");
        on_found(found);
    });
    let on_error = Closure::once_into_js(move |error: GeolocationPositionError| {
        tracing::warn!(code = error.code(), message = %error.message(), "geolocation failed");
    });

    if let Err(e) = geolocation.get_current_position_with_error_callback(
        on_success.unchecked_ref(),
        Some(on_error.unchecked_ref()),
    ) {
        tracing::warn!(error = ?e, "geolocation request rejected");
    }
}
