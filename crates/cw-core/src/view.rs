//! Text formatting for cookie rows
//!
//! Shared by the popup renderer and the CLI so both show the same labels.

use std::borrow::Cow;

use crate::popup::CookieEntry;
use crate::types::{Cookie, CookieFlags};

/// Values longer than this are truncated in the collapsed row.
pub const VALUE_PREVIEW_CHARS: usize = 200;

/// Placeholder for missing attributes.
pub const PLACEHOLDER: &str = "—";

/// `Secure · HttpOnly · SameSite=lax`, or a placeholder when none apply.
pub fn meta_line(cookie: &Cookie) -> String {
    let flags = cookie.flags();
    let mut parts: Vec<Cow<'static, str>> = Vec::with_capacity(3);
    if flags.contains(CookieFlags::SECURE) {
        parts.push(Cow::Borrowed("Secure"));
    }
    if flags.contains(CookieFlags::HTTP_ONLY) {
        parts.push(Cow::Borrowed("HttpOnly"));
    }
    if let Some(policy) = cookie.same_site.label() {
        parts.push(Cow::Owned(format!("SameSite={}", policy)));
    }
    if parts.is_empty() {
        PLACEHOLDER.to_string()
    } else {
        parts.join(" · ")
    }
}

pub fn domain_label(cookie: &Cookie) -> &str {
    if cookie.domain.is_empty() {
        PLACEHOLDER
    } else {
        &cookie.domain
    }
}

/// Expiry label. `format_timestamp` renders seconds since the epoch in the
/// host's locale.
pub fn expiry_label<F>(cookie: &Cookie, format_timestamp: F) -> String
where
    F: FnOnce(f64) -> String,
{
    match cookie.expiration_date {
        Some(secs) => format_timestamp(secs),
        None => "Session".to_string(),
    }
}

/// Truncate to `max` characters, appending an ellipsis when cut.
pub fn truncate(s: &str, max: usize) -> Cow<'_, str> {
    match s.char_indices().nth(max) {
        Some((cut, _)) => Cow::Owned(format!("{}…", &s[..cut])),
        None => Cow::Borrowed(s),
    }
}

/// Space-separated row markers for styling.
pub fn row_classes(entry: &CookieEntry) -> String {
    let mut classes = String::from("cookie-item");
    if entry.third_party {
        classes.push_str(" third-party");
    }
    if entry.class.blacklisted {
        classes.push_str(" blacklisted");
    }
    if entry.class.greylisted {
        classes.push_str(" greylisted");
    }
    classes
}

/// Label/value pairs for an expanded row's detail panel.
pub fn detail_fields<F>(cookie: &Cookie, format_timestamp: F) -> Vec<(&'static str, String)>
where
    F: FnOnce(f64) -> String,
{
    let flags = cookie.flags();
    let yes_no = |flag: CookieFlags| (if flags.contains(flag) { "Yes" } else { "No" }).to_string();
    let or_placeholder = |s: &str| {
        if s.is_empty() {
            PLACEHOLDER.to_string()
        } else {
            s.to_string()
        }
    };
    vec![
        ("Name", cookie.name.clone()),
        ("Value", cookie.value.clone()),
        ("Domain", domain_label(cookie).to_string()),
        ("Path", or_placeholder(&cookie.path)),
        ("Expires", expiry_label(cookie, format_timestamp)),
        ("Secure", yes_no(CookieFlags::SECURE)),
        ("HttpOnly", yes_no(CookieFlags::HTTP_ONLY)),
        ("HostOnly", yes_no(CookieFlags::HOST_ONLY)),
        ("SameSite", cookie.same_site.label().unwrap_or(PLACEHOLDER).to_string()),
        ("Store", or_placeholder(&cookie.store_id)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::Classification;
    use crate::types::SameSite;

    #[test]
    fn test_meta_line() {
        let cookie = Cookie {
            secure: true,
            http_only: true,
            same_site: SameSite::Strict,
            ..Default::default()
        };
        assert_eq!(meta_line(&cookie), "Secure · HttpOnly · SameSite=strict");
        assert_eq!(meta_line(&Cookie::default()), "—");
    }

    #[test]
    fn test_expiry_label() {
        assert_eq!(expiry_label(&Cookie::default(), |_| unreachable!()), "Session");
        let cookie = Cookie { expiration_date: Some(10.0), ..Default::default() };
        assert_eq!(expiry_label(&cookie, |s| format!("t={}", s)), "t=10");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 200), "short");
        assert_eq!(truncate("abcdef", 3), "abc…");
        assert_eq!(truncate("ééé", 2), "éé…");
        assert_eq!(truncate("", 3), "");
    }

    #[test]
    fn test_row_classes() {
        let entry = CookieEntry {
            cookie: Cookie::default(),
            class: Classification { blacklisted: true, greylisted: false },
            third_party: true,
        };
        assert_eq!(row_classes(&entry), "cookie-item third-party blacklisted");
    }

    #[test]
    fn test_detail_fields() {
        let cookie = Cookie { name: "sid".into(), path: "/".into(), ..Default::default() };
        let fields = detail_fields(&cookie, |_| String::new());
        assert_eq!(fields[0], ("Name", "sid".to_string()));
        assert_eq!(fields[2], ("Domain", "—".to_string()));
        assert_eq!(fields[4], ("Expires", "Session".to_string()));
        assert_eq!(fields[5], ("Secure", "No".to_string()));

        let host_only = Cookie { host_only: true, http_only: true, ..cookie };
        let fields = detail_fields(&host_only, |_| String::new());
        assert_eq!(fields[6], ("HttpOnly", "Yes".to_string()));
        assert_eq!(fields[7], ("HostOnly", "Yes".to_string()));
        assert_eq!(fields[9], ("Store", "—".to_string()));
    }
}
