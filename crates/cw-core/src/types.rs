//! Core type definitions for Cookiewatch
//!
//! These types mirror the objects the browser hands to the extension
//! (cookie records, tabs, storage change sets) and deserialize directly
//! from their JSON form.

use serde::{Deserialize, Serialize};

// =============================================================================
// Cookie Records
// =============================================================================

/// Same-site policy reported by the cookie store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SameSite {
    NoRestriction,
    Lax,
    Strict,
    #[default]
    #[serde(other)]
    Unspecified,
}

impl SameSite {
    /// Policy as shown in the detail view, `None` when the store did not
    /// report one.
    pub fn label(self) -> Option<&'static str> {
        match self {
            Self::NoRestriction => Some("no_restriction"),
            Self::Lax => Some("lax"),
            Self::Strict => Some("strict"),
            Self::Unspecified => None,
        }
    }
}

bitflags::bitflags! {
    /// Boolean cookie attributes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct CookieFlags: u8 {
        const SECURE = 1 << 0;
        const HTTP_ONLY = 1 << 1;
        /// Cookie is only sent to the exact host that set it
        const HOST_ONLY = 1 << 2;
        /// No expiration date; dropped when the browser session ends
        const SESSION = 1 << 3;
    }
}

/// Read-only snapshot of a cookie as returned by the cookie store.
///
/// Every field defaults when absent so partially populated records (and
/// hand-written fixtures) still load.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub secure: bool,
    pub http_only: bool,
    pub host_only: bool,
    pub same_site: SameSite,
    /// Seconds since the Unix epoch; `None` for session cookies
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<f64>,
    pub store_id: String,
}

impl Cookie {
    /// Identity used for expand/collapse state and badge deduplication.
    pub fn key(&self) -> CookieKey {
        CookieKey {
            name: self.name.clone(),
            domain: self.domain.clone(),
            path: self.path.clone(),
        }
    }

    pub fn flags(&self) -> CookieFlags {
        let mut flags = CookieFlags::empty();
        flags.set(CookieFlags::SECURE, self.secure);
        flags.set(CookieFlags::HTTP_ONLY, self.http_only);
        flags.set(CookieFlags::HOST_ONLY, self.host_only);
        flags.set(CookieFlags::SESSION, self.expiration_date.is_none());
        flags
    }
}

/// `(name, domain, path)` identity of a cookie.
///
/// The cookie store does not guarantee this is unique; two records sharing
/// a key are treated as the same cookie.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CookieKey {
    pub name: String,
    pub domain: String,
    pub path: String,
}

// =============================================================================
// Tabs
// =============================================================================

/// Browser tab identifier.
pub type TabId = i32;

/// The subset of a browser tab the extension reads.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tab {
    pub id: Option<TabId>,
    pub url: Option<String>,
}

// =============================================================================
// Storage Changes
// =============================================================================

/// Storage area a change notification came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageArea {
    Local,
    Sync,
    Session,
    Managed,
}

impl StorageArea {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "local" => Some(Self::Local),
            "sync" => Some(Self::Sync),
            "session" => Some(Self::Session),
            "managed" => Some(Self::Managed),
            _ => None,
        }
    }
}

/// A storage mutation notification: the area and the keys that changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub area: StorageArea,
    pub keys: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_from_platform_json() {
        let json = r#"{
            "domain": ".example.com",
            "expirationDate": 1767225600.5,
            "hostOnly": false,
            "httpOnly": true,
            "name": "_ga",
            "path": "/",
            "sameSite": "lax",
            "secure": true,
            "session": false,
            "storeId": "0",
            "value": "GA1.2.3"
        }"#;
        let cookie: Cookie = serde_json::from_str(json).unwrap();
        assert_eq!(cookie.name, "_ga");
        assert_eq!(cookie.same_site, SameSite::Lax);
        assert_eq!(cookie.expiration_date, Some(1767225600.5));
        assert_eq!(cookie.flags(), CookieFlags::SECURE | CookieFlags::HTTP_ONLY);
    }

    #[test]
    fn test_cookie_missing_fields_default() {
        let cookie: Cookie = serde_json::from_str(r#"{"name": "sid"}"#).unwrap();
        assert_eq!(cookie.value, "");
        assert_eq!(cookie.domain, "");
        assert!(cookie.flags().contains(CookieFlags::SESSION));
    }

    #[test]
    fn test_unknown_same_site_is_unspecified() {
        let cookie: Cookie = serde_json::from_str(r#"{"sameSite": "bogus"}"#).unwrap();
        assert_eq!(cookie.same_site, SameSite::Unspecified);
        assert_eq!(cookie.same_site.label(), None);
    }

    #[test]
    fn test_key_ignores_value() {
        let a = Cookie {
            name: "id".into(),
            domain: "a.com".into(),
            path: "/".into(),
            value: "1".into(),
            ..Default::default()
        };
        let b = Cookie { value: "2".into(), secure: true, ..a.clone() };
        assert_eq!(a.key(), b.key());
    }
}
