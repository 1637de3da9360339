//! Cookie classification against the term lists
//!
//! Matching is plain case-insensitive substring containment: no regex, no
//! anchoring. A one-character term therefore matches most cookies.

use crate::lists::{ListKind, Lists};
use crate::types::Cookie;

/// True if the cookie's name contains any of `name_terms` or its value
/// contains any of `value_terms`.
///
/// Terms are trimmed and lowercased before comparison; the cookie's name and
/// value are lowercased once.
pub fn matches<N, V>(cookie: &Cookie, name_terms: N, value_terms: V) -> bool
where
    N: IntoIterator,
    N::Item: AsRef<str>,
    V: IntoIterator,
    V::Item: AsRef<str>,
{
    let name = cookie.name.to_lowercase();
    let value = cookie.value.to_lowercase();
    contains_any(&name, name_terms) || contains_any(&value, value_terms)
}

#[inline]
fn contains_any<I>(haystack: &str, terms: I) -> bool
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    terms
        .into_iter()
        .any(|term| haystack.contains(term.as_ref().trim().to_lowercase().as_str()))
}

pub fn is_blacklisted(cookie: &Cookie, lists: &Lists) -> bool {
    matches_kind(cookie, lists, ListKind::Blacklist)
}

pub fn is_greylisted(cookie: &Cookie, lists: &Lists) -> bool {
    matches_kind(cookie, lists, ListKind::Greylist)
}

fn matches_kind(cookie: &Cookie, lists: &Lists, kind: ListKind) -> bool {
    let (names, values) = lists.pair(kind);
    matches(cookie, names.iter(), values.iter())
}

/// Blacklist / greylist membership of one cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub blacklisted: bool,
    pub greylisted: bool,
}

impl Classification {
    pub fn is_match(self) -> bool {
        self.blacklisted || self.greylisted
    }

    /// Display rank: greylisted first, then blacklisted, then the rest.
    pub fn sort_rank(self) -> u8 {
        if self.greylisted {
            0
        } else if self.blacklisted {
            1
        } else {
            2
        }
    }
}

pub fn classify(cookie: &Cookie, lists: &Lists) -> Classification {
    Classification {
        blacklisted: is_blacklisted(cookie, lists),
        greylisted: is_greylisted(cookie, lists),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NONE: [&str; 0] = [];

    fn cookie(name: &str, value: &str) -> Cookie {
        Cookie {
            name: name.to_string(),
            value: value.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_name_term_matches_substring() {
        assert!(matches(&cookie("_tracker_id", "abc"), ["track"], NONE));
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        assert!(matches(&cookie("_GA", "x"), ["  _ga  "], NONE));
        assert!(matches(&cookie("sid", "UserToken"), NONE, ["TOKEN"]));
    }

    #[test]
    fn test_empty_lists_never_match() {
        assert!(!matches(&cookie("anything", "at all"), NONE, NONE));
    }

    #[test]
    fn test_name_terms_do_not_match_value() {
        assert!(!matches(&cookie("sid", "tracking"), ["track"], NONE));
        assert!(!matches(&cookie("tracking", "sid"), NONE, ["track"]));
    }

    #[test]
    fn test_single_character_term_matches_broadly() {
        assert!(matches(&cookie("session", ""), ["s"], NONE));
    }

    #[test]
    fn test_missing_name_and_value() {
        let empty = Cookie::default();
        assert!(!matches(&empty, ["a"], ["b"]));
    }

    #[test]
    fn test_classify_both_lists() {
        let mut lists = Lists::default();
        lists.black_names.add("ad");
        lists.grey_values.add("42");
        let c = classify(&cookie("ad_id", "42"), &lists);
        assert!(c.blacklisted && c.greylisted);
        assert_eq!(c.sort_rank(), 0);

        let c = classify(&cookie("ad_id", "7"), &lists);
        assert_eq!(c, Classification { blacklisted: true, greylisted: false });
        assert_eq!(c.sort_rank(), 1);

        let c = classify(&cookie("sid", "7"), &lists);
        assert!(!c.is_match());
        assert_eq!(c.sort_rank(), 2);
    }
}
