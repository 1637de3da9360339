//! WebAssembly bindings for Cookiewatch
//!
//! One module serves both extension contexts: the service worker forwards
//! browser events to the `handle_*` exports, the popup page calls
//! `start_popup()`.

mod background;
mod chrome;
mod popup;

use wasm_bindgen::prelude::*;

pub use background::{
    handle_installed, handle_storage_changed, handle_tab_activated, handle_tab_updated,
};

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
}

/// Wire up the popup page and load the active tab's cookies.
#[wasm_bindgen]
pub fn start_popup() -> Result<(), JsValue> {
    popup::start()
}
