use wasm_bindgen::closure::Closure;
use wasm_bindgen::JsCast;
use web_sys as web;

pub const CANVAS_ID: &str = "app-canvas";
pub const START_BUTTON_ID: &str = "start-btn";
pub const START_OVERLAY_ID: &str = "start-overlay";
pub const STATUS_ID: &str = "status";
/// Dispatched on `window` when the detector should open the camera.
pub const START_TRACKING_EVENT: &str = "tree-start-tracking";

#[inline]
pub fn add_click_listener(
    document: &web::Document,
    element_id: &str,
    mut handler: impl FnMut() + 'static,
) {
    if let Some(el) = document.get_element_by_id(element_id) {
        let closure = Closure::wrap(Box::new(move || handler()) as Box<dyn FnMut()>);
        let _ = el.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

pub fn add_keydown_listener(window: &web::Window, mut handler: impl FnMut(web::KeyboardEvent) + 'static) {
    let closure = Closure::wrap(Box::new(move |ev: web::KeyboardEvent| handler(ev)) as Box<dyn FnMut(_)>);
    let _ = window.add_event_listener_with_callback("keydown", closure.as_ref().unchecked_ref());
    closure.forget();
}

pub fn sync_canvas_backing_size(canvas: &web::HtmlCanvasElement) {
    if let Some(w) = web::window() {
        let dpr = w.device_pixel_ratio();
        let rect = canvas.get_bounding_client_rect();
        let w_px = (rect.width() * dpr) as u32;
        let h_px = (rect.height() * dpr) as u32;
        canvas.set_width(w_px.max(1));
        canvas.set_height(h_px.max(1));
    }
}

/// Keep the canvas backing store matched to its CSS size on window resize.
pub fn track_canvas_size(window: &web::Window, canvas: &web::HtmlCanvasElement) {
    sync_canvas_backing_size(canvas);
    let canvas = canvas.clone();
    let closure = Closure::wrap(Box::new(move || sync_canvas_backing_size(&canvas)) as Box<dyn FnMut()>);
    let _ = window.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref());
    closure.forget();
}

pub fn hide_overlay(document: &web::Document) {
    if let Some(el) = document.get_element_by_id(START_OVERLAY_ID) {
        let _ = el.set_attribute("style", "display:none");
    }
}

/// Write the status line and expose the signal name for styling.
pub fn set_status(document: &web::Document, name: &str, message: &str) {
    if let Some(el) = document.get_element_by_id(STATUS_ID) {
        el.set_text_content(Some(message));
        let _ = el.set_attribute("data-status", name);
    }
}

/// `?TREE_START=eager` style overrides from the page URL.
pub fn query_lookup(window: &web::Window) -> impl Fn(&str) -> Option<String> {
    let params = window
        .location()
        .search()
        .ok()
        .and_then(|search| web::UrlSearchParams::new_with_str(&search).ok());
    move |key: &str| params.as_ref().and_then(|p| p.get(key))
}

pub fn dispatch_window_event(window: &web::Window, name: &str) {
    match web::Event::new(name) {
        Ok(ev) => {
            let _ = window.dispatch_event(&ev);
        }
        Err(e) => log::warn!("[dom] could not create {name} event: {e:?}"),
    }
}
