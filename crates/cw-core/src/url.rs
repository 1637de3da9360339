//! URL helpers for tab URLs
//!
//! These functions avoid allocations and work directly on string slices.
//! Only the pieces the extension needs are covered: scheme, host, origin.

// =============================================================================
// Scheme Extraction
// =============================================================================

/// Web schemes the extension inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebScheme {
    Http,
    Https,
}

impl WebScheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }
}

/// Fast scheme extraction without URL parsing.
/// Returns `None` for anything other than http/https.
#[inline]
pub fn extract_scheme(url: &str) -> Option<WebScheme> {
    let bytes = url.as_bytes();
    if bytes.len() >= 8 && bytes[..8].eq_ignore_ascii_case(b"https://") {
        Some(WebScheme::Https)
    } else if bytes.len() >= 7 && bytes[..7].eq_ignore_ascii_case(b"http://") {
        Some(WebScheme::Http)
    } else {
        None
    }
}

/// True for http(s) URLs with a non-empty host.
#[inline]
pub fn is_web_url(url: &str) -> bool {
    extract_scheme(url).is_some() && extract_host(url).is_some_and(|h| !h.is_empty())
}

/// Get the position after "://".
#[inline]
pub fn get_scheme_end(url: &str) -> Option<usize> {
    let colon_pos = url.find(':')?;
    url[colon_pos..].starts_with("://").then_some(colon_pos + 3)
}

// =============================================================================
// Host Extraction
// =============================================================================

/// Get the start and end positions of the hostname in a URL.
#[inline]
pub fn get_host_position(url: &str) -> Option<(usize, usize)> {
    let scheme_end = get_scheme_end(url)?;
    let bytes = url.as_bytes();

    // Authority ends at the first '/', '?' or '#'
    let authority_end = bytes[scheme_end..]
        .iter()
        .position(|&b| b == b'/' || b == b'?' || b == b'#')
        .map_or(bytes.len(), |i| scheme_end + i);

    // Skip userinfo
    let host_start = url[scheme_end..authority_end]
        .rfind('@')
        .map_or(scheme_end, |at| scheme_end + at + 1);

    // Bracketed IPv6 literal keeps its colons
    if bytes.get(host_start) == Some(&b'[') {
        let close = url[host_start..authority_end].find(']')?;
        return Some((host_start, host_start + close + 1));
    }

    let host_end = url[host_start..authority_end]
        .find(':')
        .map_or(authority_end, |i| host_start + i);

    Some((host_start, host_end))
}

/// Fast host extraction without allocations.
/// Returns a slice into the original URL.
#[inline]
pub fn extract_host(url: &str) -> Option<&str> {
    let (host_start, host_end) = get_host_position(url)?;
    Some(&url[host_start..host_end])
}

/// `scheme://host[:port]` of an http(s) URL, with the scheme and host
/// lowercased.
pub fn extract_origin(url: &str) -> Option<String> {
    let scheme = extract_scheme(url)?;
    let (host_start, host_end) = get_host_position(url)?;
    let port_end = url[host_end..]
        .find(|c: char| c == '/' || c == '?' || c == '#')
        .map_or(url.len(), |i| host_end + i);
    let port = &url[host_end..port_end];
    Some(format!(
        "{}://{}{}",
        scheme.as_str(),
        url[host_start..host_end].to_ascii_lowercase(),
        port
    ))
}

// =============================================================================
// Path Extraction
// =============================================================================

/// Extract the path portion of a URL.
#[inline]
pub fn extract_path(url: &str) -> &str {
    let Some(scheme_end) = get_scheme_end(url) else {
        return "/";
    };
    let rest = &url[scheme_end..];
    let Some(path_start) = rest.find(|c: char| c == '/' || c == '?' || c == '#') else {
        return "/";
    };
    let rest = &rest[path_start..];
    if !rest.starts_with('/') {
        return "/";
    }
    let path_end = rest.find(|c: char| c == '?' || c == '#').unwrap_or(rest.len());
    &rest[..path_end]
}
