//! File-backed stand-ins for the browser: a JSON list store and a cookie
//! fixture filtered the way the browser filters cookies for a URL.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tokio::sync::broadcast;

use cw_core::party::host_within_domain;
use cw_core::platform::{BadgeSink, CookieSource, KeyValueStore, PlatformError, TabSource};
use cw_core::types::{Cookie, StorageArea, StorageChange, Tab, TabId};
use cw_core::url::{extract_host, extract_path, extract_scheme, WebScheme};

/// The single tab the CLI simulates.
pub const FIXTURE_TAB: TabId = 1;

pub fn read_cookies(path: &Path) -> Result<Vec<Cookie>, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
    serde_json::from_str(&content)
        .map_err(|e| format!("Invalid cookie fixture '{}': {}", path.display(), e))
}

// =============================================================================
// List Store
// =============================================================================

/// Key-value store persisted as one JSON object on disk.
///
/// Writers publish a [`StorageChange`] after every successful write when
/// they hold a change sender.
pub struct FileStore {
    path: PathBuf,
    changes: Option<broadcast::Sender<StorageChange>>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            changes: None,
        }
    }

    pub fn with_changes(mut self, sender: broadcast::Sender<StorageChange>) -> Self {
        self.changes = Some(sender);
        self
    }

    async fn read_all(&self) -> Result<Map<String, Value>, PlatformError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => {
                return Err(PlatformError::new(format!(
                    "Failed to read '{}': {}",
                    self.path.display(),
                    e
                )))
            }
        };
        if content.trim().is_empty() {
            return Ok(Map::new());
        }
        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Ok(Map::new()),
            Err(e) => Err(PlatformError::new(format!(
                "Invalid store '{}': {}",
                self.path.display(),
                e
            ))),
        }
    }
}

impl KeyValueStore for FileStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, PlatformError> {
        let mut all = self.read_all().await?;
        Ok(keys
            .iter()
            .filter_map(|k| all.remove(*k).map(|v| (k.to_string(), v)))
            .collect())
    }

    async fn set(&self, items: Map<String, Value>) -> Result<(), PlatformError> {
        let keys: Vec<String> = items.keys().cloned().collect();
        let mut all = self.read_all().await?;
        all.extend(items);
        let text = serde_json::to_string_pretty(&Value::Object(all))
            .map_err(|e| PlatformError::new(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                PlatformError::new(format!("Failed to create '{}': {}", parent.display(), e))
            })?;
        }
        tokio::fs::write(&self.path, text).await.map_err(|e| {
            PlatformError::new(format!("Failed to write '{}': {}", self.path.display(), e))
        })?;

        if let Some(sender) = &self.changes {
            // No receivers is fine
            let _ = sender.send(StorageChange {
                area: StorageArea::Local,
                keys,
            });
        }
        Ok(())
    }
}

// =============================================================================
// Cookie Matching
// =============================================================================

/// Whether the browser would send `cookie` with a request to `url`.
pub fn cookie_matches_url(cookie: &Cookie, url: &str, now_secs: f64) -> bool {
    let Some(scheme) = extract_scheme(url) else {
        return false;
    };
    let Some(host) = extract_host(url) else {
        return false;
    };
    let host = host.to_ascii_lowercase();
    let domain = cookie.domain.to_ascii_lowercase();

    let domain_ok = match domain.strip_prefix('.') {
        Some(bare) if !cookie.host_only => host_within_domain(&host, bare),
        _ => host == domain,
    };
    let secure_ok = !cookie.secure || scheme == WebScheme::Https;
    let live = cookie.expiration_date.map_or(true, |exp| exp > now_secs);

    domain_ok && secure_ok && live && path_matches(extract_path(url), &cookie.path)
}

fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    if cookie_path.is_empty() || cookie_path == "/" || request_path == cookie_path {
        return true;
    }
    match request_path.strip_prefix(cookie_path) {
        Some(rest) => cookie_path.ends_with('/') || rest.starts_with('/'),
        None => false,
    }
}

// =============================================================================
// Platform
// =============================================================================

/// One simulated tab over a cookie fixture and a file store.
pub struct FixturePlatform {
    store: FileStore,
    url: Option<String>,
    cookies: Vec<Cookie>,
    badges: RefCell<HashMap<TabId, (String, Option<String>)>>,
}

impl FixturePlatform {
    pub fn new(store: FileStore, url: Option<String>, cookies: Vec<Cookie>) -> Self {
        Self {
            store,
            url,
            cookies,
            badges: RefCell::new(HashMap::new()),
        }
    }

    pub fn badge(&self, tab_id: TabId) -> Option<(String, Option<String>)> {
        self.badges.borrow().get(&tab_id).cloned()
    }
}

impl KeyValueStore for FixturePlatform {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Value>, PlatformError> {
        self.store.get(keys).await
    }

    async fn set(&self, items: Map<String, Value>) -> Result<(), PlatformError> {
        self.store.set(items).await
    }
}

impl CookieSource for FixturePlatform {
    async fn cookies_for_url(&self, url: &str) -> Result<Vec<Cookie>, PlatformError> {
        let now = chrono::Utc::now().timestamp() as f64;
        Ok(self
            .cookies
            .iter()
            .filter(|c| cookie_matches_url(c, url, now))
            .cloned()
            .collect())
    }
}

impl TabSource for FixturePlatform {
    async fn active_tab(&self) -> Result<Option<Tab>, PlatformError> {
        Ok(Some(Tab {
            id: Some(FIXTURE_TAB),
            url: self.url.clone(),
        }))
    }

    async fn get_tab(&self, tab_id: TabId) -> Result<Tab, PlatformError> {
        if tab_id != FIXTURE_TAB {
            return Err(PlatformError::new(format!("No tab with id: {}.", tab_id)));
        }
        Ok(Tab {
            id: Some(FIXTURE_TAB),
            url: self.url.clone(),
        })
    }
}

impl BadgeSink for FixturePlatform {
    async fn set_badge_text(&self, tab_id: TabId, text: &str) -> Result<(), PlatformError> {
        let mut badges = self.badges.borrow_mut();
        let badge = badges.entry(tab_id).or_default();
        badge.0 = text.to_string();
        if text.is_empty() {
            badge.1 = None;
        }
        Ok(())
    }

    async fn set_badge_color(&self, tab_id: TabId, color: &str) -> Result<(), PlatformError> {
        self.badges.borrow_mut().entry(tab_id).or_default().1 = Some(color.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cw_core::store::{load_lists, save_list};
    use cw_core::{ListKey, TermList};

    fn cookie(domain: &str, path: &str) -> Cookie {
        Cookie {
            name: "c".into(),
            domain: domain.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_domain_cookie_matches_subdomains() {
        let c = cookie(".example.com", "/");
        assert!(cookie_matches_url(&c, "https://www.example.com/", 0.0));
        assert!(cookie_matches_url(&c, "https://example.com/", 0.0));
        assert!(!cookie_matches_url(&c, "https://example.org/", 0.0));
    }

    #[test]
    fn test_host_only_cookie_requires_exact_host() {
        let c = Cookie { host_only: true, ..cookie("example.com", "/") };
        assert!(cookie_matches_url(&c, "https://example.com/", 0.0));
        assert!(!cookie_matches_url(&c, "https://www.example.com/", 0.0));
    }

    #[test]
    fn test_path_prefix() {
        let c = cookie(".example.com", "/app");
        assert!(cookie_matches_url(&c, "https://example.com/app", 0.0));
        assert!(cookie_matches_url(&c, "https://example.com/app/x", 0.0));
        assert!(!cookie_matches_url(&c, "https://example.com/apple", 0.0));
        assert!(!cookie_matches_url(&c, "https://example.com/", 0.0));
    }

    #[test]
    fn test_secure_and_expiry() {
        let c = Cookie { secure: true, ..cookie(".example.com", "/") };
        assert!(!cookie_matches_url(&c, "http://example.com/", 0.0));
        assert!(cookie_matches_url(&c, "https://example.com/", 0.0));

        let expired = Cookie { expiration_date: Some(10.0), ..cookie(".example.com", "/") };
        assert!(!cookie_matches_url(&expired, "https://example.com/", 20.0));
        assert!(cookie_matches_url(&expired, "https://example.com/", 5.0));
    }

    #[test]
    fn test_non_web_url_matches_nothing() {
        assert!(!cookie_matches_url(&cookie(".example.com", "/"), "chrome://extensions", 0.0));
    }

    #[tokio::test]
    async fn test_file_store_round_trip_and_change_event() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("lists.json");
        let (tx, mut rx) = broadcast::channel(4);
        let store = FileStore::new(&path).with_changes(tx);

        assert_eq!(load_lists(&store).await.unwrap(), Default::default());

        let list: TermList = ["track"].into_iter().collect();
        save_list(&store, ListKey::BlacklistNames, &list).await.unwrap();
        let change = rx.recv().await.unwrap();
        assert_eq!(change.area, StorageArea::Local);
        assert_eq!(change.keys, vec!["blacklistNames".to_string()]);

        let lists = load_lists(&FileStore::new(&path)).await.unwrap();
        assert_eq!(lists.black_names, list);
    }

    #[tokio::test]
    async fn test_file_store_malformed_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lists.json");
        std::fs::write(&path, r#"{"blacklistNames": "not-an-array", "theme": "dark"}"#).unwrap();
        let store = FileStore::new(&path);
        let lists = load_lists(&store).await.unwrap();
        assert!(lists.black_names.is_empty());

        save_list(&store, ListKey::GreylistNames, &["x"].into_iter().collect()).await.unwrap();
        let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["theme"], "dark");
    }
}
