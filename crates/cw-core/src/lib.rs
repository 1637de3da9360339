//! Cookiewatch Core Library
//!
//! This crate provides the platform-independent half of the Cookiewatch
//! browser extension: classifying the cookies a page uses against the
//! user's blacklist and greylist, and deciding what the popup and the
//! action badge show.
//!
//! # Architecture
//!
//! Two contexts share the term lists but never call each other. The
//! background context runs a [`BadgeAggregator`] driven by tab and storage
//! events; the popup builds a [`PopupModel`] each time it opens. Both reach
//! the browser only through the traits in [`platform`], and list edits made
//! in the popup reach the background as storage change notifications.
//!
//! # Modules
//!
//! - `types`: Cookie, tab and storage-change records
//! - `lists`: Term lists and their storage keys
//! - `store`: Loading and saving term lists
//! - `classify`: Blacklist / greylist matching
//! - `party`: First-party / third-party rule
//! - `url`: Tab URL helpers
//! - `badge`: Badge counts, text and color
//! - `background`: Event-driven badge aggregator
//! - `popup`: Popup controller state and loading
//! - `view`: Row and detail formatting
//! - `platform`: Host platform traits

pub mod background;
pub mod badge;
pub mod classify;
pub mod lists;
pub mod party;
pub mod platform;
pub mod popup;
pub mod store;
pub mod types;
pub mod url;
pub mod view;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use background::{BackgroundEvent, BadgeAggregator};
pub use badge::{Badge, BadgeSummary};
pub use classify::{classify, matches, Classification};
pub use lists::{ListField, ListKey, ListKind, Lists, TermList};
pub use party::is_third_party;
pub use platform::{BadgeSink, CookieSource, KeyValueStore, PlatformError, TabSource};
pub use popup::{PopupError, PopupModel};
pub use store::TermEdit;
pub use types::{Cookie, CookieKey, StorageArea, StorageChange, Tab, TabId};
