//! Host platform seams
//!
//! The extension never owns tabs, cookies, storage or the badge; it only
//! calls into the browser for them. Each concern is a trait so the same
//! controller and aggregator run against `chrome.*` in the extension and
//! against fixture files in the CLI.
//!
//! All calls are awaited to completion; there are no partial results and
//! no cancellation. Futures are not required to be `Send` since both
//! execution contexts are single-threaded.

#![allow(async_fn_in_trait)]

use serde_json::{Map, Value};

use crate::types::{Cookie, Tab, TabId};

/// A platform call failed. Displays as the platform's own message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct PlatformError {
    pub message: String,
}

impl PlatformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// String-keyed, JSON-valued persistent storage.
///
/// Each call is atomic on its own; there is no transaction across calls,
/// so concurrent writers race with last-write-wins per key.
pub trait KeyValueStore {
    /// Read the given keys. Missing keys are simply absent from the map.
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, PlatformError>;

    /// Write every entry of `items`, leaving other keys untouched.
    async fn set(&self, items: Map<String, Value>) -> Result<(), PlatformError>;
}

/// The browser cookie store.
pub trait CookieSource {
    /// Cookies that would accompany a request to `url`. Domain, path and
    /// secure matching is done by the platform.
    async fn cookies_for_url(&self, url: &str) -> Result<Vec<Cookie>, PlatformError>;
}

/// Tab enumeration.
pub trait TabSource {
    /// Active tab of the current window, if any.
    async fn active_tab(&self) -> Result<Option<Tab>, PlatformError>;

    /// Look up a tab by id. Fails if the tab no longer exists.
    async fn get_tab(&self, tab_id: TabId) -> Result<Tab, PlatformError>;
}

/// Per-tab action badge.
pub trait BadgeSink {
    /// Set the badge text; an empty string clears the badge.
    async fn set_badge_text(&self, tab_id: TabId, text: &str) -> Result<(), PlatformError>;

    async fn set_badge_color(&self, tab_id: TabId, color: &str) -> Result<(), PlatformError>;
}
