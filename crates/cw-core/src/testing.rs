//! In-memory platform for controller and aggregator tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::platform::{BadgeSink, CookieSource, KeyValueStore, PlatformError, TabSource};
use crate::store::tests::MemoryStore;
use crate::types::{Cookie, Tab, TabId};

pub(crate) fn cookie(name: &str, value: &str, domain: &str, path: &str) -> Cookie {
    Cookie {
        name: name.into(),
        value: value.into(),
        domain: domain.into(),
        path: path.into(),
        ..Default::default()
    }
}

#[derive(Default)]
pub(crate) struct FakePlatform {
    pub store: MemoryStore,
    tabs: HashMap<TabId, Tab>,
    active: Option<Tab>,
    cookies: Vec<Cookie>,
    cookie_error: Option<String>,
    cookie_queries: Cell<usize>,
    badges: RefCell<HashMap<TabId, (String, Option<String>)>>,
}

impl FakePlatform {
    pub fn new(storage: Value) -> Self {
        Self {
            store: MemoryStore::with(storage),
            ..Default::default()
        }
    }

    pub fn tab(mut self, id: TabId, url: &str) -> Self {
        self.tabs.insert(
            id,
            Tab {
                id: Some(id),
                url: Some(url.to_string()),
            },
        );
        self
    }

    pub fn active(mut self, id: TabId) -> Self {
        self.active = self.tabs.get(&id).cloned();
        self
    }

    pub fn active_raw(mut self, tab: Tab) -> Self {
        self.active = Some(tab);
        self
    }

    pub fn cookies(mut self, cookies: Vec<Cookie>) -> Self {
        self.cookies = cookies;
        self
    }

    pub fn cookie_error(mut self, message: &str) -> Self {
        self.cookie_error = Some(message.to_string());
        self
    }

    pub fn cookie_queries(&self) -> usize {
        self.cookie_queries.get()
    }

    pub fn badge(&self, tab_id: TabId) -> Option<(String, Option<String>)> {
        self.badges.borrow().get(&tab_id).cloned()
    }
}

impl KeyValueStore for FakePlatform {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, PlatformError> {
        self.store.get(keys).await
    }

    async fn set(&self, items: Map<String, Value>) -> Result<(), PlatformError> {
        self.store.set(items).await
    }
}

impl CookieSource for FakePlatform {
    async fn cookies_for_url(&self, _url: &str) -> Result<Vec<Cookie>, PlatformError> {
        self.cookie_queries.set(self.cookie_queries.get() + 1);
        match &self.cookie_error {
            Some(message) => Err(PlatformError::new(message.clone())),
            None => Ok(self.cookies.clone()),
        }
    }
}

impl TabSource for FakePlatform {
    async fn active_tab(&self) -> Result<Option<Tab>, PlatformError> {
        Ok(self.active.clone())
    }

    async fn get_tab(&self, tab_id: TabId) -> Result<Tab, PlatformError> {
        self.tabs
            .get(&tab_id)
            .cloned()
            .ok_or_else(|| PlatformError::new(format!("No tab with id: {}.", tab_id)))
    }
}

impl BadgeSink for FakePlatform {
    async fn set_badge_text(&self, tab_id: TabId, text: &str) -> Result<(), PlatformError> {
        if !self.tabs.contains_key(&tab_id) {
            return Err(PlatformError::new(format!("No tab with id: {}.", tab_id)));
        }
        let mut badges = self.badges.borrow_mut();
        let entry = badges.entry(tab_id).or_default();
        entry.0 = text.to_string();
        if text.is_empty() {
            entry.1 = None;
        }
        Ok(())
    }

    async fn set_badge_color(&self, tab_id: TabId, color: &str) -> Result<(), PlatformError> {
        let mut badges = self.badges.borrow_mut();
        badges.entry(tab_id).or_default().1 = Some(color.to_string());
        Ok(())
    }
}
