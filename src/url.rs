//! Static resource URL resolution.

use regex::Regex;
use std::sync::OnceLock;

fn scheme_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z]+:").expect("valid scheme regex"))
}

/// Returns true if `url` carries a scheme (`http:`, `mailto:`, `javascript:`...)
pub fn has_scheme(url: &str) -> bool {
    scheme_re().is_match(url)
}

/// Convert a URL relative to the static contents into an absolute one.
///
/// Scheme-prefixed and site-rooted URLs are returned unchanged; relative ones
/// are joined to `base` with exactly one `/`.
pub fn absolute_url(url: &str, base: &str) -> String {
    if url.is_empty() || url.starts_with('/') || has_scheme(url) {
        return url.to_string();
    }

    if base.ends_with('/') {
        format!("{}{}", base, url)
    } else {
        format!("{}/{}", base, url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absolute_urls_unchanged() {
        assert_eq!(absolute_url("http://example.com/a.css", "/static"), "http://example.com/a.css");
        assert_eq!(absolute_url("mailto:root@localhost", "/static"), "mailto:root@localhost");
        assert_eq!(absolute_url("/img/logo.gif", "/static"), "/img/logo.gif");
    }

    #[test]
    fn test_relative_single_separator() {
        assert_eq!(absolute_url("theme.css", "/static"), "/static/theme.css");
        assert_eq!(absolute_url("theme.css", "/static/"), "/static/theme.css");
        assert_eq!(absolute_url("css/theme.css", ""), "/css/theme.css");
    }

    #[test]
    fn test_colon_after_non_letters_is_relative() {
        assert_eq!(absolute_url("a1:b", "/s"), "/s/a1:b");
        assert_eq!(absolute_url("img:1.png", "/s"), "img:1.png");
    }

    #[test]
    fn test_empty_url() {
        assert_eq!(absolute_url("", "/static"), "");
    }
}
