//! Badge computation
//!
//! Pure aggregation over a cookie set: how many cookies match either list
//! (deduplicated by identity), and whether any of them is blacklisted.

use std::collections::HashSet;

use crate::classify::classify;
use crate::lists::Lists;
use crate::types::Cookie;

/// Badge color when at least one cookie is blacklisted.
pub const ALERT_COLOR: &str = "#c2410c";
/// Badge color when only greylisted cookies match.
pub const WATCH_COLOR: &str = "#6b6b6b";

/// Counts above this show as `"99+"`.
pub const MAX_BADGE_COUNT: usize = 99;

/// Match counts for one cookie set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BadgeSummary {
    /// Cookies matching the blacklist
    pub blacklisted: usize,
    /// Cookies matching the greylist
    pub greylisted: usize,
    /// Cookies matching either list, counted once per `(name, domain, path)`
    pub distinct: usize,
}

impl BadgeSummary {
    pub fn compute(cookies: &[Cookie], lists: &Lists) -> Self {
        let mut summary = Self::default();
        let mut seen = HashSet::new();
        for cookie in cookies {
            let class = classify(cookie, lists);
            if class.blacklisted {
                summary.blacklisted += 1;
            }
            if class.greylisted {
                summary.greylisted += 1;
            }
            if class.is_match() {
                seen.insert(cookie.key());
            }
        }
        summary.distinct = seen.len();
        summary
    }
}

/// What the action badge should show for a tab.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Badge {
    /// Empty clears the badge
    pub text: String,
    /// Only meaningful when `text` is non-empty
    pub color: Option<&'static str>,
}

impl Badge {
    pub fn cleared() -> Self {
        Self::default()
    }

    pub fn from_summary(summary: &BadgeSummary) -> Self {
        if summary.distinct == 0 {
            return Self::cleared();
        }
        let color = if summary.blacklisted > 0 {
            ALERT_COLOR
        } else {
            WATCH_COLOR
        };
        Self {
            text: badge_text(summary.distinct),
            color: Some(color),
        }
    }

    pub fn is_cleared(&self) -> bool {
        self.text.is_empty()
    }
}

/// Badge label for a match count; empty for zero.
pub fn badge_text(count: usize) -> String {
    match count {
        0 => String::new(),
        n if n > MAX_BADGE_COUNT => format!("{}+", MAX_BADGE_COUNT),
        n => n.to_string(),
    }
}
