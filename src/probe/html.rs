// src/probe/html.rs
// =============================================================================
// Lightweight HTML sniffing on probe responses.
//
// No DOM is built; a scan reads thousands of bodies (mostly error pages)
// and only needs
// - the page title (first <title>...</title> span)
// - whether the response looks like a directory (URL shape or an
//   auto-generated index page)
//
// Both functions are pure, so they can be tested without a network.
// =============================================================================

use std::collections::BTreeMap;

const TITLE_OPEN: &str = "<title>";
const TITLE_CLOSE: &str = "</title>";

/// Body markers of server-generated directory listings
pub const LISTING_MARKERS: &[&str] = &["<title>Index of", "Directory listing for", "Parent Directory"];

// Extracts the trimmed text of the first <title>...</title> span
//
// Returns an empty string when either marker is missing or the title is
// unterminated.
//
// Examples:
//   "<title> Admin </title>"  -> "Admin"
//   "<title>Unclosed"         -> ""
pub fn extract_title(body: &str) -> String {
    let start = match body.find(TITLE_OPEN) {
        Some(idx) => idx + TITLE_OPEN.len(),
        None => return String::new(),
    };

    match body[start..].find(TITLE_CLOSE) {
        Some(len) => body[start..start + len].trim().to_string(),
        None => String::new(),
    }
}

// Decides whether a probed resource is a directory worth recursing into
//
// True when
//   - the URL ends with "/", or
//   - the Content-Type is text/html and the body carries a listing marker
//
// `headers` is keyed by lower-case header name, as stored on ProbeResult.
pub fn is_directory(url: &str, headers: &BTreeMap<String, String>, body: &str) -> bool {
    if url.ends_with('/') {
        return true;
    }

    let is_html = headers
        .get("content-type")
        .map(|ct| ct.contains("text/html"))
        .unwrap_or(false);

    is_html && LISTING_MARKERS.iter().any(|marker| body.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html_headers() -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "text/html; charset=utf-8".to_string());
        headers
    }

    #[test]
    fn test_extract_title() {
        assert_eq!(extract_title("<html><title> Admin Panel </title></html>"), "Admin Panel");
        assert_eq!(extract_title("<title>a</title><title>b</title>"), "a");
    }

    #[test]
    fn test_extract_title_missing_or_unterminated() {
        assert_eq!(extract_title(""), "");
        assert_eq!(extract_title("<html><body>hi</body></html>"), "");
        assert_eq!(extract_title("<title>never closed"), "");
    }

    #[test]
    fn test_directory_by_trailing_slash() {
        assert!(is_directory("https://example.com/admin/", &BTreeMap::new(), ""));
    }

    #[test]
    fn test_directory_by_listing_body() {
        let body = "<html><title>Index of /backup</title><a href=\"../\">Parent Directory</a>";
        assert!(is_directory("https://example.com/backup", &html_headers(), body));

        let python = "<h1>Directory listing for /files</h1>";
        assert!(is_directory("https://example.com/files", &html_headers(), python));
    }

    #[test]
    fn test_listing_body_needs_html_content_type() {
        let body = "<title>Index of /backup</title>";
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), "text/plain".to_string());
        assert!(!is_directory("https://example.com/backup", &headers, body));
        assert!(!is_directory("https://example.com/backup", &BTreeMap::new(), body));
    }

    #[test]
    fn test_plain_page_is_not_directory() {
        let body = "<title>Login</title>";
        assert!(!is_directory("https://example.com/login", &html_headers(), body));
    }
}
