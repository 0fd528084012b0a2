//! Cross-origin policy.
//!
//! [`OriginMatcher`] compiles the `CORS_ORIGIN` setting once at start-up and
//! answers a single question per request: may this `Origin` read the response?
//! [`cors_layer`] plugs that answer into `tower_http`'s CORS middleware.

use http::{request::Parts, HeaderValue};
use regex::{Regex, RegexBuilder};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};

/// Upper bound on the compiled size of a single origin pattern.
const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Decides whether a browser origin is allowed cross-origin access.
pub trait OriginPolicy: Send + Sync {
    /// `origin` is the raw `Origin` header, `None` when the request carried none.
    fn is_allowed(&self, origin: Option<&str>) -> bool;
}

/// Immutable set of compiled origin patterns.
#[derive(Debug, Clone)]
pub struct OriginMatcher {
    allow_all: bool,
    patterns: Vec<String>,
    matchers: Vec<Regex>,
}

impl OriginMatcher {
    /// Compile a comma-separated list of origins.
    ///
    /// A `*` token allows every origin. Any other `*` is a wildcard matching
    /// zero or more characters, so `https://*.example.com` accepts
    /// `https://a.b.example.com` but not `https://example.com`. Tokens that
    /// fail to compile are skipped with a warning.
    pub fn build(raw: &str) -> Self {
        let patterns: Vec<String> = raw
            .split(',')
            .map(normalize_token)
            .filter(|token| !token.is_empty())
            .collect();

        if patterns.iter().any(|p| p == "*") {
            return Self {
                allow_all: true,
                patterns,
                matchers: Vec::new(),
            };
        }

        let matchers = patterns
            .iter()
            .filter_map(|pattern| match compile_pattern(pattern) {
                Ok(regex) => Some(regex),
                Err(e) => {
                    tracing::warn!(pattern = %pattern, "Skipping unusable CORS origin: {}", e);
                    None
                }
            })
            .collect();

        Self {
            allow_all: false,
            patterns,
            matchers,
        }
    }

    /// Whether the `*` token was configured.
    pub fn allows_all(&self) -> bool {
        self.allow_all
    }

    /// Normalized configured tokens, in configuration order.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// True when no configured token survived compilation, so every
    /// cross-origin request will be refused.
    pub fn denies_all(&self) -> bool {
        !self.allow_all && self.matchers.is_empty()
    }
}

impl OriginPolicy for OriginMatcher {
    fn is_allowed(&self, origin: Option<&str>) -> bool {
        // Non-browser and same-origin callers send no Origin header.
        let Some(origin) = origin else {
            return true;
        };

        if self.allow_all {
            return true;
        }

        let origin = strip_trailing_slash(origin.trim()).to_lowercase();
        self.matchers.iter().any(|m| m.is_match(&origin))
    }
}

/// Trim, unquote and drop one trailing slash from a configured token.
fn normalize_token(token: &str) -> String {
    let token = token.trim();
    let token = strip_wrapping_quotes(token).trim();
    strip_trailing_slash(token).to_string()
}

fn strip_wrapping_quotes(token: &str) -> &str {
    for quote in ['"', '\''] {
        if token.len() >= 2 && token.starts_with(quote) && token.ends_with(quote) {
            return &token[1..token.len() - 1];
        }
    }
    token
}

fn strip_trailing_slash(value: &str) -> &str {
    value.strip_suffix('/').unwrap_or(value)
}

/// Escape first, then turn the escaped `*` back into `.*`, so literal dots stay literal.
fn compile_pattern(pattern: &str) -> Result<Regex, regex::Error> {
    let escaped = regex::escape(pattern).replace(r"\*", ".*");
    RegexBuilder::new(&format!("^{}$", escaped))
        .case_insensitive(true)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
}

/// Build the CORS middleware for `policy`.
///
/// Credentials are always allowed, so an accepted request gets its own origin
/// echoed back rather than `*`, in allow-all mode too. A rejected origin simply
/// receives no CORS headers.
pub fn cors_layer<P>(policy: Arc<P>) -> CorsLayer
where
    P: OriginPolicy + ?Sized + 'static,
{
    let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _parts: &Parts| {
        // Browsers may send non-ASCII hosts raw
        policy.is_allowed(Some(&String::from_utf8_lossy(origin.as_bytes())))
    });

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .max_age(Duration::from_secs(60 * 10))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_allows_everything() {
        let matcher = OriginMatcher::build("*");
        assert!(matcher.allows_all());
        assert!(matcher.is_allowed(Some("https://anything.test")));
    }

    #[test]
    fn test_star_anywhere_in_list_allows_everything() {
        let matcher = OriginMatcher::build("https://a.com, *");
        assert!(matcher.allows_all());
        assert!(matcher.is_allowed(Some("https://z.org")));
    }

    #[test]
    fn test_literal_origins() {
        let matcher = OriginMatcher::build("https://a.com,https://b.com");
        assert!(!matcher.allows_all());
        assert!(matcher.is_allowed(Some("https://a.com")));
        assert!(matcher.is_allowed(Some("https://b.com")));
        assert!(!matcher.is_allowed(Some("https://c.com")));
        assert!(!matcher.is_allowed(Some("https://a.com.evil.test")));
        assert!(!matcher.is_allowed(Some("http://a.com")));
    }

    #[test]
    fn test_subdomain_wildcard() {
        let matcher = OriginMatcher::build("https://*.example.com");
        assert!(matcher.is_allowed(Some("https://sub.example.com")));
        assert!(matcher.is_allowed(Some("https://a.b.example.com")));
        assert!(!matcher.is_allowed(Some("https://example.com")));
        assert!(!matcher.is_allowed(Some("https://evil.com")));
        assert!(!matcher.is_allowed(Some("https://evilexample.com")));
    }

    #[test]
    fn test_wildcard_port() {
        let matcher = OriginMatcher::build("http://localhost:*");
        assert!(matcher.is_allowed(Some("http://localhost:5173")));
        assert!(!matcher.is_allowed(Some("http://localhost")));
    }

    #[test]
    fn test_case_insensitive() {
        let matcher = OriginMatcher::build("https://A.com");
        assert!(matcher.is_allowed(Some("https://a.COM")));
    }

    #[test]
    fn test_trailing_slash_ignored() {
        let matcher = OriginMatcher::build("https://a.com/");
        assert!(matcher.is_allowed(Some("https://a.com")));
        assert!(matcher.is_allowed(Some("https://a.com/")));
    }

    #[test]
    fn test_missing_origin_always_allowed() {
        assert!(OriginMatcher::build("https://a.com").is_allowed(None));
        assert!(OriginMatcher::build("").is_allowed(None));
        assert!(OriginMatcher::build("*").is_allowed(None));
    }

    #[test]
    fn test_quotes_and_whitespace_stripped() {
        let matcher = OriginMatcher::build(r#" "https://a.com" , 'https://b.com/' ,, "#);
        assert_eq!(matcher.patterns(), ["https://a.com", "https://b.com"]);
        assert!(matcher.is_allowed(Some("https://a.com")));
        assert!(matcher.is_allowed(Some("https://b.com")));
    }

    #[test]
    fn test_unbalanced_quote_left_unchanged() {
        let matcher = OriginMatcher::build("\"https://a.com");
        assert_eq!(matcher.patterns(), ["\"https://a.com"]);
        assert!(!matcher.is_allowed(Some("https://a.com")));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        let matcher = OriginMatcher::build("https://a+b.com");
        assert!(matcher.is_allowed(Some("https://a+b.com")));
        assert!(!matcher.is_allowed(Some("https://aab.com")));
    }

    #[test]
    fn test_empty_config_denies_browsers() {
        let matcher = OriginMatcher::build(" , ");
        assert!(!matcher.allows_all());
        assert!(!matcher.is_allowed(Some("https://a.com")));
    }

    #[test]
    fn test_denies_all_tracks_compiled_patterns() {
        assert!(OriginMatcher::build(" , ").denies_all());
        assert!(!OriginMatcher::build("*").denies_all());
        assert!(!OriginMatcher::build("https://a.com").denies_all());
    }

    #[test]
    fn test_oversized_pattern_is_skipped() {
        let huge = format!("https://{}.example.com", "*".repeat(100_000));
        let matcher = OriginMatcher::build(&huge);

        assert_eq!(matcher.patterns().len(), 1);
        assert!(matcher.denies_all());
        assert!(!matcher.is_allowed(Some("https://a.example.com")));
    }

    #[test]
    fn test_non_ascii_origins() {
        assert!(OriginMatcher::build("*").is_allowed(Some("https://café.test")));

        let matcher = OriginMatcher::build("https://*.café.test");
        assert!(matcher.is_allowed(Some("https://menu.CAFÉ.test")));
        assert!(!matcher.is_allowed(Some("https://menu.cafe.test")));
    }

    #[test]
    fn test_rebuilding_gives_same_decisions() {
        let raw = "https://*.example.com, https://app.test";
        let first = OriginMatcher::build(raw);
        let second = OriginMatcher::build(raw);
        for origin in [
            "https://x.example.com",
            "https://app.test",
            "https://other.test",
            "https://example.com",
        ] {
            assert_eq!(first.is_allowed(Some(origin)), second.is_allowed(Some(origin)));
        }
    }
}
