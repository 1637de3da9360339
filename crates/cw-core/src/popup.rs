//! Popup controller
//!
//! The popup is ephemeral: a fresh [`PopupModel`] is built every time it
//! opens, so search text and expanded rows never outlive one session.
//!
//! Loading is split from the model so the host can await platform calls
//! without holding the model borrowed: [`load`] gathers everything the
//! popup needs, [`PopupModel::finish_load`] applies it.

use std::collections::HashSet;

use log::debug;

use crate::classify::{classify, Classification};
use crate::lists::{ListKey, Lists, TermList};
use crate::party::{is_third_party, PartyCounts};
use crate::platform::{CookieSource, KeyValueStore, PlatformError, TabSource};
use crate::store::{edit_list, load_lists, TermEdit};
use crate::types::{Cookie, CookieKey};
use crate::url::{extract_host, extract_origin, is_web_url};

/// Why the popup could not show cookies.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PopupError {
    #[error("No active tab or URL")]
    NoActiveTab,
    #[error("This page is not a web page (e.g. chrome://)")]
    NotWebPage,
    #[error(transparent)]
    Platform(#[from] PlatformError),
}

// =============================================================================
// Loading
// =============================================================================

/// The page the popup was opened on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteInfo {
    pub url: String,
    pub origin: String,
    /// Lowercased hostname
    pub hostname: String,
}

impl SiteInfo {
    /// Parse a tab URL. `None` unless it is an http(s) URL with a host.
    pub fn from_url(url: &str) -> Option<Self> {
        if !is_web_url(url) {
            return None;
        }
        Some(Self {
            url: url.to_string(),
            origin: extract_origin(url)?,
            hostname: extract_host(url)?.to_ascii_lowercase(),
        })
    }
}

/// The page half of a popup load: the site and its cookies.
#[derive(Debug, Clone, PartialEq)]
pub struct PageData {
    pub site: SiteInfo,
    pub cookies: Vec<Cookie>,
}

/// Everything a popup load gathers from the platform.
///
/// The lists are read first and kept even when the page half fails, so the
/// settings panel always edits what is actually stored.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupLoad {
    /// `None` only if storage itself could not be read
    pub lists: Option<Lists>,
    pub page: Result<PageData, PopupError>,
}

/// Load lists, resolve the active tab and fetch its cookies.
pub async fn load<P>(platform: &P) -> PopupLoad
where
    P: KeyValueStore + TabSource + CookieSource,
{
    match load_lists(platform).await {
        Ok(lists) => PopupLoad {
            lists: Some(lists),
            page: load_page(platform).await,
        },
        Err(e) => PopupLoad {
            lists: None,
            page: Err(e.into()),
        },
    }
}

async fn load_page<P>(platform: &P) -> Result<PageData, PopupError>
where
    P: TabSource + CookieSource,
{
    let url = platform
        .active_tab()
        .await?
        .and_then(|tab| tab.url)
        .filter(|url| !url.is_empty())
        .ok_or(PopupError::NoActiveTab)?;
    let site = SiteInfo::from_url(&url).ok_or(PopupError::NotWebPage)?;
    let cookies = platform.cookies_for_url(&site.url).await?;
    debug!("popup loaded {} cookies for {}", cookies.len(), site.hostname);
    Ok(PageData { site, cookies })
}

/// Write a settings edit through to storage.
///
/// Re-reads the stored list before applying the edit, so a stale popup copy
/// never overwrites terms it has not seen. Returns the list as stored.
pub async fn save_edit<S: KeyValueStore>(
    store: &S,
    key: ListKey,
    edit: &TermEdit,
) -> Result<TermList, PopupError> {
    Ok(edit_list(store, key, edit).await?)
}

// =============================================================================
// Model
// =============================================================================

/// A fetched cookie with its derived classification.
#[derive(Debug, Clone, PartialEq)]
pub struct CookieEntry {
    pub cookie: Cookie,
    pub class: Classification,
    pub third_party: bool,
}

impl CookieEntry {
    pub fn key(&self) -> CookieKey {
        self.cookie.key()
    }

    /// Case-insensitive search on name or value. `query` must already be
    /// trimmed and lowercased.
    fn matches_query(&self, query: &str) -> bool {
        query.is_empty()
            || self.cookie.name.to_lowercase().contains(query)
            || self.cookie.value.to_lowercase().contains(query)
    }
}

/// Load lifecycle of the popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Loading,
    Ready,
    Failed(String),
}

/// Summary counts shown above the list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PopupStats {
    pub total: usize,
    pub first_party: usize,
    pub third_party: usize,
    pub blacklisted: usize,
    pub greylisted: usize,
}

/// Message shown in place of an empty list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyState {
    /// The site has no cookies at all
    NoCookies,
    /// Cookies exist but none match the search
    NoMatches,
}

impl EmptyState {
    pub fn message(self) -> &'static str {
        match self {
            Self::NoCookies => "No cookies for this site.",
            Self::NoMatches => "No cookies match your filter.",
        }
    }

    pub fn hint(self) -> &'static str {
        match self {
            Self::NoCookies => "Cookies appear when you visit and interact with a page.",
            Self::NoMatches => "Try a different search.",
        }
    }
}

/// State of one popup session.
#[derive(Debug, Clone)]
pub struct PopupModel {
    state: LoadState,
    lists: Lists,
    site: Option<SiteInfo>,
    /// Cookies in platform order
    cookies: Vec<Cookie>,
    /// Classified and sorted view of `cookies`
    entries: Vec<CookieEntry>,
    query: String,
    expanded: HashSet<CookieKey>,
    settings_error: Option<String>,
}

impl Default for PopupModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PopupModel {
    pub fn new() -> Self {
        Self {
            state: LoadState::Loading,
            lists: Lists::default(),
            site: None,
            cookies: Vec::new(),
            entries: Vec::new(),
            query: String::new(),
            expanded: HashSet::new(),
            settings_error: None,
        }
    }

    /// Enter the loading state (initial open or refresh).
    pub fn begin_load(&mut self) {
        self.state = LoadState::Loading;
    }

    pub fn finish_load(&mut self, load: PopupLoad) {
        if let Some(lists) = load.lists {
            self.lists = lists;
        }
        match load.page {
            Ok(data) => {
                self.site = Some(data.site);
                self.cookies = data.cookies;
                self.state = LoadState::Ready;
                self.reclassify();
            }
            Err(e) => {
                debug!("popup load failed: {}", e);
                self.site = None;
                self.cookies.clear();
                self.entries.clear();
                self.state = LoadState::Failed(e.to_string());
            }
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            LoadState::Failed(message) => Some(message),
            _ => None,
        }
    }

    pub fn site(&self) -> Option<&SiteInfo> {
        self.site.as_ref()
    }

    /// Header label: hostname when loaded, placeholder otherwise.
    pub fn site_label(&self) -> &str {
        match (&self.state, &self.site) {
            (LoadState::Loading, _) => "Loading…",
            (_, Some(site)) if !site.hostname.is_empty() => &site.hostname,
            (_, Some(site)) => &site.origin,
            (_, None) => "—",
        }
    }

    pub fn lists(&self) -> &Lists {
        &self.lists
    }

    /// All entries in display order: greylisted, blacklisted, the rest.
    pub fn entries(&self) -> &[CookieEntry] {
        &self.entries
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
    }

    /// Entries matching the current search, in display order.
    pub fn visible(&self) -> Vec<&CookieEntry> {
        let query = self.query.trim().to_lowercase();
        self.entries
            .iter()
            .filter(|entry| entry.matches_query(&query))
            .collect()
    }

    /// Counts over the full fetched set, independent of the search.
    pub fn stats(&self) -> PopupStats {
        let Some(site) = &self.site else {
            return PopupStats::default();
        };
        let party = PartyCounts::tally(&self.cookies, &site.hostname);
        PopupStats {
            total: self.cookies.len(),
            first_party: party.first_party,
            third_party: party.third_party,
            blacklisted: self.entries.iter().filter(|e| e.class.blacklisted).count(),
            greylisted: self.entries.iter().filter(|e| e.class.greylisted).count(),
        }
    }

    pub fn empty_state(&self) -> Option<EmptyState> {
        if self.state != LoadState::Ready {
            return None;
        }
        if self.cookies.is_empty() {
            Some(EmptyState::NoCookies)
        } else if self.visible().is_empty() {
            Some(EmptyState::NoMatches)
        } else {
            None
        }
    }

    // -------------------------------------------------------------------------
    // Expand / collapse
    // -------------------------------------------------------------------------

    /// Flip a row's detail panel. Returns the new expanded state.
    pub fn toggle_expanded(&mut self, key: &CookieKey) -> bool {
        if self.expanded.remove(key) {
            false
        } else {
            self.expanded.insert(key.clone());
            true
        }
    }

    pub fn is_expanded(&self, key: &CookieKey) -> bool {
        self.expanded.contains(key)
    }

    // -------------------------------------------------------------------------
    // Settings
    // -------------------------------------------------------------------------

    /// Apply a term edit locally and re-sort the list immediately.
    ///
    /// Returns the updated list for the caller to persist, or `None` if the
    /// edit changed nothing.
    pub fn edit_term(&mut self, key: ListKey, edit: &TermEdit) -> Option<TermList> {
        let list = self.lists.get_mut(key);
        if !edit.apply(list) {
            return None;
        }
        let updated = list.clone();
        self.settings_error = None;
        self.reclassify();
        Some(updated)
    }

    /// Adopt a list as it was written to storage.
    pub fn apply_saved_list(&mut self, key: ListKey, list: TermList) {
        if *self.lists.get(key) != list {
            *self.lists.get_mut(key) = list;
            self.reclassify();
        }
        self.settings_error = None;
    }

    /// Record a failed settings write.
    pub fn set_settings_error(&mut self, error: Option<String>) {
        self.settings_error = error;
    }

    pub fn settings_error(&self) -> Option<&str> {
        self.settings_error.as_deref()
    }

    fn reclassify(&mut self) {
        let hostname = self.site.as_ref().map_or("", |s| s.hostname.as_str());
        let mut entries: Vec<CookieEntry> = self
            .cookies
            .iter()
            .map(|cookie| CookieEntry {
                class: classify(cookie, &self.lists),
                third_party: is_third_party(cookie, hostname),
                cookie: cookie.clone(),
            })
            .collect();
        // Stable: ties keep platform order
        entries.sort_by_key(|e| e.class.sort_rank());
        self.entries = entries;
    }
}
