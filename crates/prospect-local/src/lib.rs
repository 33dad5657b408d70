use prospect_core::{Error, Result};
use std::time::Duration;

pub mod browserless;
pub mod extract;
pub mod openai;
pub mod pdf;
pub mod scrape;
pub mod serper;
pub mod splitter;
pub mod summarize;

/// Shared HTTP client with safety defaults: avoid "hang forever" on DNS/TLS/body
/// stalls. Per-request timeouts override the blanket read timeout.
pub fn default_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent("prospect/0.1")
        .redirect(reqwest::redirect::Policy::limited(10))
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| Error::Network(e.to_string()))
}

pub fn env_nonblank(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Provider requests can hang indefinitely without an explicit deadline.
/// Keep a conservative cap even if callers pass something huge.
pub fn clamp_timeout_ms(timeout_ms: u64) -> u64 {
    timeout_ms.clamp(1_000, 180_000)
}

/// reqwest folds deadline misses into its generic error type; split them back
/// out so timeouts stay a distinct failure kind.
pub fn classify_transport(e: reqwest::Error, what: &str) -> Error {
    if e.is_timeout() {
        Error::Timeout(format!("{what}: {e}"))
    } else {
        Error::Network(format!("{what}: {e}"))
    }
}

/// Bounded excerpt for error contexts. Upstream error bodies can be huge;
/// never carry whole payloads inside an error value.
pub fn snippet(s: &str, max_chars: usize) -> String {
    let trimmed = s.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(max_chars).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_timeout_bounds_both_ends() {
        assert_eq!(clamp_timeout_ms(0), 1_000);
        assert_eq!(clamp_timeout_ms(5_000), 5_000);
        assert_eq!(clamp_timeout_ms(u64::MAX), 180_000);
    }

    #[test]
    fn snippet_truncates_and_marks() {
        assert_eq!(snippet("  short  ", 10), "short");
        let s = snippet(&"x".repeat(50), 10);
        assert_eq!(s.chars().count(), 11);
        assert!(s.ends_with('…'));
    }
}
