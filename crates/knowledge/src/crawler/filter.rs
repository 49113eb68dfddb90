//! Exclusion patterns for discovered URLs.

use regex::Regex;
use webrag_core::{AppError, AppResult};

/// Matches URLs against glob patterns where `*` matches any run of characters.
///
/// Patterns are anchored at both ends and matched against the full URL.
/// `*` also crosses `/`, so `*/login*` skips `https://example.com/login?next=/`
/// as well as `https://example.com/blog/login-tips`.
#[derive(Debug, Clone, Default)]
pub struct UrlFilter {
    patterns: Vec<Regex>,
}

impl UrlFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> AppResult<Self> {
        let patterns = patterns
            .iter()
            .map(|p| glob_to_regex(p.as_ref()))
            .collect::<AppResult<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    /// Whether `url` matches any exclusion pattern.
    pub fn is_excluded(&self, url: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(url))
    }
}

fn glob_to_regex(pattern: &str) -> AppResult<Regex> {
    let escaped = regex::escape(pattern).replace(r"\*", ".*");
    Regex::new(&format!("^{}$", escaped))
        .map_err(|e| AppError::Config(format!("Invalid exclude pattern '{}': {}", pattern, e)))
}
