//! Background badge aggregator
//!
//! Keeps the per-tab action badge in sync with the term lists. Runs in its
//! own event-driven context and never talks to the popup directly: list
//! edits reach it only as storage change notifications.
//!
//! Every failure degrades to a cleared badge. Nothing is retried; the next
//! event recomputes from scratch.

use futures::future::join;
use log::{debug, warn};

use crate::badge::{Badge, BadgeSummary};
use crate::lists::touches_lists;
use crate::platform::{BadgeSink, CookieSource, KeyValueStore, PlatformError, TabSource};
use crate::store::load_lists;
use crate::types::{StorageArea, StorageChange, TabId};
use crate::url::is_web_url;

/// Events the background context reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundEvent {
    /// A tab's state changed. Only a completed load of an http(s) page
    /// triggers a recompute.
    TabUpdated {
        tab_id: TabId,
        complete: bool,
        url: Option<String>,
    },
    /// A tab became the active tab of its window.
    TabActivated { tab_id: TabId },
    /// The extension was installed or updated.
    Installed,
    /// Persistent storage changed.
    StorageChanged(StorageChange),
}

impl BackgroundEvent {
    /// Build a tab update from the browser's load `status` string.
    pub fn tab_updated(tab_id: TabId, status: Option<&str>, url: Option<String>) -> Self {
        Self::TabUpdated {
            tab_id,
            complete: status == Some("complete"),
            url,
        }
    }

    /// Build a storage change from the browser's area name. Unknown areas
    /// yield `None`.
    pub fn storage_changed(area: &str, keys: Vec<String>) -> Option<Self> {
        let area = StorageArea::from_str(area)?;
        Some(Self::StorageChanged(StorageChange { area, keys }))
    }

    /// Tab the event targets directly, or `None` if it applies to the
    /// active tab (or to nothing).
    fn direct_target(&self) -> Option<TabId> {
        match self {
            Self::TabUpdated {
                tab_id,
                complete: true,
                url: Some(url),
            } if is_web_url(url) => Some(*tab_id),
            Self::TabActivated { tab_id } => Some(*tab_id),
            _ => None,
        }
    }

    /// True for events that recompute the currently active tab.
    fn targets_active_tab(&self) -> bool {
        match self {
            Self::Installed => true,
            Self::StorageChanged(change) => {
                change.area == StorageArea::Local && touches_lists(&change.keys)
            }
            _ => false,
        }
    }
}

/// Recomputes action badges from the current lists and cookies.
pub struct BadgeAggregator<P> {
    platform: P,
}

impl<P> BadgeAggregator<P>
where
    P: KeyValueStore + CookieSource + TabSource + BadgeSink,
{
    pub fn new(platform: P) -> Self {
        Self { platform }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    /// Dispatch an event. Returns the tab whose badge was recomputed.
    pub async fn handle_event(&self, event: &BackgroundEvent) -> Option<TabId> {
        if let Some(tab_id) = event.direct_target() {
            self.update_badge_for_tab(tab_id).await;
            return Some(tab_id);
        }
        if event.targets_active_tab() {
            return self.update_badge_for_active_tab().await;
        }
        None
    }

    /// Recompute the active tab's badge, if there is an active tab.
    pub async fn update_badge_for_active_tab(&self) -> Option<TabId> {
        let tab_id = match self.platform.active_tab().await {
            Ok(Some(tab)) => tab.id?,
            Ok(None) => return None,
            Err(e) => {
                warn!("active tab lookup failed: {}", e);
                return None;
            }
        };
        self.update_badge_for_tab(tab_id).await;
        Some(tab_id)
    }

    /// Recompute and paint one tab's badge. Never fails.
    pub async fn update_badge_for_tab(&self, tab_id: TabId) -> Badge {
        let badge = match self.compute_badge(tab_id).await {
            Ok(badge) => badge,
            Err(e) => {
                warn!("badge for tab {} cleared: {}", tab_id, e);
                Badge::cleared()
            }
        };
        if let Err(e) = self.apply(tab_id, &badge).await {
            warn!("could not paint badge for tab {}: {}", tab_id, e);
        }
        badge
    }

    async fn compute_badge(&self, tab_id: TabId) -> Result<Badge, PlatformError> {
        let tab = self.platform.get_tab(tab_id).await?;
        let url = match tab.url {
            Some(url) if is_web_url(&url) => url,
            _ => return Ok(Badge::cleared()),
        };

        // Independent reads
        let (lists, cookies) = join(
            load_lists(&self.platform),
            self.platform.cookies_for_url(&url),
        )
        .await;
        let (lists, cookies) = (lists?, cookies?);

        let summary = BadgeSummary::compute(&cookies, &lists);
        debug!(
            "tab {}: {} cookies, {} blacklisted, {} distinct matches",
            tab_id,
            cookies.len(),
            summary.blacklisted,
            summary.distinct
        );
        Ok(Badge::from_summary(&summary))
    }

    async fn apply(&self, tab_id: TabId, badge: &Badge) -> Result<(), PlatformError> {
        self.platform.set_badge_text(tab_id, &badge.text).await?;
        if let Some(color) = badge.color {
            self.platform.set_badge_color(tab_id, color).await?;
        }
        Ok(())
    }
}
