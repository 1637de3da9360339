//! `chrome.*` extension APIs as a Cookiewatch platform
//!
//! Every call goes through the promise-returning MV3 API and is awaited to
//! completion. Values cross the boundary as JSON.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Map, Value};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use cw_core::platform::{BadgeSink, CookieSource, KeyValueStore, PlatformError, TabSource};
use cw_core::types::{Cookie, Tab, TabId};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = get)]
    fn storage_local_get(keys: &JsValue) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "storage", "local"], js_name = set)]
    fn storage_local_set(items: &JsValue) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "cookies"], js_name = getAll)]
    fn cookies_get_all(details: &JsValue) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = query)]
    fn tabs_query(query_info: &JsValue) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "tabs"], js_name = get)]
    fn tabs_get(tab_id: i32) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "action"], js_name = setBadgeText)]
    fn action_set_badge_text(details: &JsValue) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(catch, js_namespace = ["chrome", "action"], js_name = setBadgeBackgroundColor)]
    fn action_set_badge_background_color(details: &JsValue) -> Result<js_sys::Promise, JsValue>;
}

// =============================================================================
// Conversions
// =============================================================================

/// Message of a rejected promise or thrown value.
pub(crate) fn js_error(value: JsValue) -> PlatformError {
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return PlatformError::new(String::from(error.message()));
    }
    if let Some(message) = value.as_string() {
        return PlatformError::new(message);
    }
    // chrome.runtime.lastError style objects
    let message = js_sys::Reflect::get(&value, &"message".into())
        .ok()
        .and_then(|m| m.as_string());
    PlatformError::new(message.unwrap_or_else(|| "Unknown platform error".to_string()))
}

/// Decode a JS value through its JSON form. `undefined` decodes as `null`.
pub(crate) fn from_js<T: DeserializeOwned>(value: &JsValue) -> Result<T, PlatformError> {
    let text = js_sys::JSON::stringify(value)
        .ok()
        .and_then(|s| s.as_string())
        .unwrap_or_else(|| "null".to_string());
    serde_json::from_str(&text).map_err(|e| PlatformError::new(e.to_string()))
}

pub(crate) fn to_js<T: Serialize>(value: &T) -> Result<JsValue, PlatformError> {
    let text = serde_json::to_string(value).map_err(|e| PlatformError::new(e.to_string()))?;
    js_sys::JSON::parse(&text).map_err(js_error)
}

async fn call(promise: Result<js_sys::Promise, JsValue>) -> Result<JsValue, PlatformError> {
    let promise = promise.map_err(js_error)?;
    JsFuture::from(promise).await.map_err(js_error)
}

// =============================================================================
// Platform
// =============================================================================

/// The browser, as seen from either extension context.
#[derive(Debug, Clone, Copy, Default)]
pub struct Chrome;

impl KeyValueStore for Chrome {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, PlatformError> {
        let keys = to_js(&keys)?;
        let data = call(storage_local_get(&keys)).await?;
        // Malformed results read as "nothing stored"
        Ok(from_js::<Option<Map<String, Value>>>(&data)?.unwrap_or_default())
    }

    async fn set(&self, items: Map<String, Value>) -> Result<(), PlatformError> {
        let items = to_js(&Value::Object(items))?;
        call(storage_local_set(&items)).await?;
        Ok(())
    }
}

impl CookieSource for Chrome {
    async fn cookies_for_url(&self, url: &str) -> Result<Vec<Cookie>, PlatformError> {
        let details = to_js(&json!({ "url": url }))?;
        let cookies = call(cookies_get_all(&details)).await?;
        Ok(from_js::<Option<Vec<Cookie>>>(&cookies)?.unwrap_or_default())
    }
}

impl TabSource for Chrome {
    async fn active_tab(&self) -> Result<Option<Tab>, PlatformError> {
        let query = to_js(&json!({ "active": true, "currentWindow": true }))?;
        let tabs = call(tabs_query(&query)).await?;
        let tabs: Option<Vec<Tab>> = from_js(&tabs)?;
        Ok(tabs.unwrap_or_default().into_iter().next())
    }

    async fn get_tab(&self, tab_id: TabId) -> Result<Tab, PlatformError> {
        let tab = call(tabs_get(tab_id)).await?;
        from_js(&tab)
    }
}

impl BadgeSink for Chrome {
    async fn set_badge_text(&self, tab_id: TabId, text: &str) -> Result<(), PlatformError> {
        let details = to_js(&json!({ "tabId": tab_id, "text": text }))?;
        call(action_set_badge_text(&details)).await?;
        Ok(())
    }

    async fn set_badge_color(&self, tab_id: TabId, color: &str) -> Result<(), PlatformError> {
        let details = to_js(&json!({ "tabId": tab_id, "color": color }))?;
        call(action_set_badge_background_color(&details)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_from_js_cookie_list() {
        let json = r#"[{"name":"_ga","domain":".example.com","httpOnly":true}]"#;
        let value = js_sys::JSON::parse(json).unwrap();
        let cookies: Vec<Cookie> = from_js(&value).unwrap();
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].http_only);
    }

    #[wasm_bindgen_test]
    fn test_from_js_undefined_is_null() {
        let tabs: Option<Vec<Tab>> = from_js(&JsValue::UNDEFINED).unwrap();
        assert!(tabs.is_none());
    }

    #[wasm_bindgen_test]
    fn test_js_error_message() {
        let err = js_error(js_sys::Error::new("No tab with id: 4.").into());
        assert_eq!(err.to_string(), "No tab with id: 4.");
        assert_eq!(js_error(JsValue::from_str("boom")).to_string(), "boom");
    }
}
