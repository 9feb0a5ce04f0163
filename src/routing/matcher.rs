//! Mount path matching.
//!
//! # Design Decisions
//! - Path matching is case-sensitive
//! - A prefix only matches on a segment boundary (`/api` does not match `/apis`)
//! - Works on the raw request path so percent-encoding survives to the backend

/// Matches a request path against a mount prefix and yields what follows it.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher. A trailing `/` is ignored.
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        Self {
            prefix: prefix.trim_end_matches('/').to_string(),
        }
    }

    /// Returns the remainder below the prefix, without its leading `/`.
    pub fn strip<'a>(&self, path: &'a str) -> Option<&'a str> {
        let rest = path.strip_prefix(self.prefix.as_str())?;
        if rest.is_empty() {
            Some(rest)
        } else {
            rest.strip_prefix('/')
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_matcher() {
        let matcher = PathPrefixMatcher::new("/api");

        assert_eq!(matcher.strip("/api/dns/example.com"), Some("dns/example.com"));
        assert_eq!(matcher.strip("/api"), Some(""));
        assert_eq!(matcher.strip("/api/"), Some(""));
        assert_eq!(matcher.strip("/apis"), None);
        assert_eq!(matcher.strip("/images"), None);
        assert_eq!(matcher.strip("/API/dns"), None);
    }

    #[test]
    fn test_trailing_slash_ignored() {
        let matcher = PathPrefixMatcher::new("/api/");
        assert_eq!(matcher.strip("/api"), Some(""));
        assert_eq!(matcher.strip("/api/ip"), Some("ip"));
    }

    #[test]
    fn test_encoding_preserved() {
        let matcher = PathPrefixMatcher::new("/api");
        assert_eq!(matcher.strip("/api/dns/a%2Fb"), Some("dns/a%2Fb"));
    }
}
