//! First-party / third-party cookie classification
//!
//! A deliberately loose version of the browser's domain-match rule: no
//! Public Suffix List, just exact and parent-domain comparison.
//!
//! # Examples
//!
//! ```
//! use cw_core::party::is_third_party_domain;
//!
//! assert!(!is_third_party_domain(".example.com", "www.example.com"));
//! assert!(is_third_party_domain("other.com", "example.com"));
//! ```

use crate::types::Cookie;

/// Strip a single leading dot from a cookie domain attribute.
#[inline]
pub fn bare_domain(domain: &str) -> &str {
    domain.strip_prefix('.').unwrap_or(domain)
}

/// True if `host` is `domain` itself or a subdomain of it.
#[inline]
pub fn host_within_domain(host: &str, domain: &str) -> bool {
    match host.strip_suffix(domain) {
        Some("") => true,
        Some(prefix) => prefix.ends_with('.'),
        None => false,
    }
}

/// Third-party check on a raw cookie domain attribute.
///
/// An empty domain is never third-party.
pub fn is_third_party_domain(cookie_domain: &str, site_host: &str) -> bool {
    let domain = bare_domain(cookie_domain);
    if domain.is_empty() {
        return false;
    }
    !host_within_domain(site_host, domain)
}

pub fn is_third_party(cookie: &Cookie, site_host: &str) -> bool {
    is_third_party_domain(&cookie.domain, site_host)
}

/// First-party / third-party tally over a cookie set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PartyCounts {
    pub first_party: usize,
    pub third_party: usize,
}

impl PartyCounts {
    pub fn tally<'a, I>(cookies: I, site_host: &str) -> Self
    where
        I: IntoIterator<Item = &'a Cookie>,
    {
        let mut counts = Self::default();
        for cookie in cookies {
            if is_third_party(cookie, site_host) {
                counts.third_party += 1;
            } else {
                counts.first_party += 1;
            }
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.first_party + self.third_party
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subdomain_is_first_party() {
        assert!(!is_third_party_domain(".example.com", "www.example.com"));
        assert!(!is_third_party_domain("example.com", "a.b.example.com"));
    }

    #[test]
    fn test_exact_host_is_first_party() {
        assert!(!is_third_party_domain("example.com", "example.com"));
        assert!(!is_third_party_domain(".example.com", "example.com"));
    }

    #[test]
    fn test_other_domain_is_third_party() {
        assert!(is_third_party_domain("other.com", "example.com"));
        assert!(is_third_party_domain(".ads.example.com", "example.com"));
    }

    #[test]
    fn test_suffix_without_dot_is_third_party() {
        assert!(is_third_party_domain("ample.com", "example.com"));
    }

    #[test]
    fn test_empty_domain_is_first_party() {
        assert!(!is_third_party_domain("", "example.com"));
        assert!(!is_third_party_domain(".", "example.com"));
    }

    #[test]
    fn test_only_one_leading_dot_stripped() {
        assert_eq!(bare_domain("..example.com"), ".example.com");
        assert!(is_third_party_domain("..example.com", "www.example.com"));
    }

    #[test]
    fn test_tally() {
        let cookies = [
            Cookie { domain: ".example.com".into(), ..Default::default() },
            Cookie { domain: "tracker.net".into(), ..Default::default() },
            Cookie { domain: String::new(), ..Default::default() },
        ];
        let counts = PartyCounts::tally(&cookies, "www.example.com");
        assert_eq!(counts, PartyCounts { first_party: 2, third_party: 1 });
        assert_eq!(counts.total(), 3);
    }
}
