//! Background service worker handlers.
//!
//! `background.js` registers the `chrome.*` listeners synchronously on the
//! worker's first turn, waits for the module to initialize, then calls one
//! of these handlers. Each handler builds a [`BackgroundEvent`] and runs it
//! on the worker's aggregator.

use std::rc::Rc;

use wasm_bindgen::prelude::*;

use cw_core::background::{BackgroundEvent, BadgeAggregator};

use crate::chrome::Chrome;

thread_local! {
    static AGGREGATOR: Rc<BadgeAggregator<Chrome>> = Rc::new(BadgeAggregator::new(Chrome));
}

async fn dispatch(event: BackgroundEvent) {
    let aggregator = AGGREGATOR.with(Rc::clone);
    if let Some(tab_id) = aggregator.handle_event(&event).await {
        log::debug!("badge recomputed for tab {} after {:?}", tab_id, event);
    }
}

/// `chrome.tabs.onUpdated`
#[wasm_bindgen]
pub async fn handle_tab_updated(tab_id: i32, status: Option<String>, url: Option<String>) {
    dispatch(BackgroundEvent::tab_updated(tab_id, status.as_deref(), url)).await;
}

/// `chrome.tabs.onActivated`
#[wasm_bindgen]
pub async fn handle_tab_activated(tab_id: i32) {
    dispatch(BackgroundEvent::TabActivated { tab_id }).await;
}

/// `chrome.runtime.onInstalled`
#[wasm_bindgen]
pub async fn handle_installed() {
    dispatch(BackgroundEvent::Installed).await;
}

/// `chrome.storage.onChanged`, with the changed keys already extracted.
#[wasm_bindgen]
pub async fn handle_storage_changed(keys: js_sys::Array, area: String) {
    let keys = keys.iter().filter_map(|k| k.as_string()).collect();
    if let Some(event) = BackgroundEvent::storage_changed(&area, keys) {
        dispatch(event).await;
    }
}
