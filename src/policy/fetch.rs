//! Allow-list for remote document and context fetches.
//!
//! A URL may be fetched iff at least one pattern matches the *whole* URL.
//! Patterns are anchored on compile so `https://a\.org/.*` can never be
//! satisfied by `https://evil.com/https://a.org/x`.

use regex_lite::Regex;
use serde_json::Value;

use crate::config::ConfigError;

/// A compiled allow pattern that only accepts full-string matches.
#[derive(Debug, Clone)]
pub struct AllowPattern {
    source: String,
    anchored: Regex,
}

impl AllowPattern {
    /// Compile a pattern. The source is kept verbatim for reporting.
    pub fn new(source: impl Into<String>) -> Result<Self, ConfigError> {
        let source = source.into();
        let anchored = Regex::new(&format!("^(?:{source})$")).map_err(|e| {
            ConfigError::InvalidPattern {
                pattern: source.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self { source, anchored })
    }

    /// The pattern as configured.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True if the pattern matches `url` end to end.
    pub fn full_match(&self, url: &str) -> bool {
        self.anchored.is_match(url)
    }
}

/// Ordered set of allow patterns. Empty means remote fetching is disabled.
#[derive(Debug, Clone, Default)]
pub struct FetchPolicy {
    patterns: Vec<AllowPattern>,
}

impl FetchPolicy {
    /// Policy that refuses every URL.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Build a policy from pattern sources.
    pub fn from_patterns<I, S>(patterns: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns = patterns
            .into_iter()
            .map(AllowPattern::new)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    /// Parse the `REMOTE_FETCH_ALLOWED` setting.
    ///
    /// Accepts a JSON string, a JSON array of strings, or a bare regular
    /// expression. Blank input and an empty array both disable fetching.
    pub fn from_setting(raw: &str) -> Result<Self, ConfigError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Self::disabled());
        }

        match serde_json::from_str::<Value>(raw) {
            Ok(Value::String(pattern)) => Self::from_patterns([pattern]),
            Ok(Value::Array(items)) => {
                let patterns = items
                    .into_iter()
                    .map(|item| match item {
                        Value::String(s) => Ok(s),
                        other => Err(ConfigError::InvalidFetchSetting(other.to_string())),
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Self::from_patterns(patterns)
            }
            Ok(other) => Err(ConfigError::InvalidFetchSetting(other.to_string())),
            // Not JSON at all: the whole value is one pattern.
            Err(_) => Self::from_patterns([raw]),
        }
    }

    /// Whether any remote fetch can ever be allowed.
    pub fn is_enabled(&self) -> bool {
        !self.patterns.is_empty()
    }

    /// Whether `url` is covered by some pattern.
    pub fn allows(&self, url: &str) -> bool {
        self.patterns.iter().any(|p| p.full_match(url))
    }

    /// Pattern sources in configuration order.
    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(AllowPattern::as_str)
    }

    /// A single expression equivalent to the whole set, for clients that
    /// want to pre-validate URLs. A lone pattern is returned unchanged.
    pub fn combined_pattern(&self) -> Option<String> {
        match self.patterns.as_slice() {
            [] => None,
            [single] => Some(single.as_str().to_string()),
            many => Some(
                many.iter()
                    .map(|p| format!("(?:{})", p.as_str()))
                    .collect::<Vec<_>>()
                    .join("|"),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_match_rejects_embedded_url() {
        let policy = FetchPolicy::from_patterns([r"https://a\.org/.*"]).unwrap();
        assert!(policy.allows("https://a.org/doc.json"));
        assert!(!policy.allows("https://evil.com/https://a.org/x"));
        assert!(!policy.allows("https://a.org.evil.com/x"));
    }

    #[test]
    fn test_suffix_is_not_enough() {
        let policy = FetchPolicy::from_patterns([r"https://trusted\.org/data"]).unwrap();
        assert!(policy.allows("https://trusted.org/data"));
        assert!(!policy.allows("https://trusted.org/data/../../secret"));
        assert!(!policy.allows("evil.com/https://trusted.org/data"));
    }

    #[test]
    fn test_alternation_is_anchored_as_a_whole() {
        let policy = FetchPolicy::from_patterns([r"https://a\.org/x|https://b\.org/y"]).unwrap();
        assert!(policy.allows("https://b.org/y"));
        assert!(!policy.allows("https://a.org/x/extra"));
        assert!(!policy.allows("prefix-https://b.org/y"));
    }

    #[test]
    fn test_disabled_policy_refuses_everything() {
        let policy = FetchPolicy::disabled();
        assert!(!policy.is_enabled());
        assert!(!policy.allows("https://a.org/"));
        assert_eq!(policy.combined_pattern(), None);
    }

    #[test]
    fn test_setting_blank_disables() {
        assert!(!FetchPolicy::from_setting("  ").unwrap().is_enabled());
        assert!(!FetchPolicy::from_setting("[]").unwrap().is_enabled());
    }

    #[test]
    fn test_setting_json_string() {
        let policy = FetchPolicy::from_setting(r#""https://a\\.org/.*""#).unwrap();
        assert_eq!(policy.patterns().collect::<Vec<_>>(), vec![r"https://a\.org/.*"]);
    }

    #[test]
    fn test_setting_json_array() {
        let policy =
            FetchPolicy::from_setting(r#"["https://a\\.org/.*", "https://b\\.org/.*"]"#).unwrap();
        assert_eq!(policy.patterns().count(), 2);
        assert!(policy.allows("https://b.org/z"));
        assert_eq!(
            policy.combined_pattern().unwrap(),
            r"(?:https://a\.org/.*)|(?:https://b\.org/.*)"
        );
    }

    #[test]
    fn test_setting_bare_regex() {
        let policy = FetchPolicy::from_setting(r"https://a\.org/.*").unwrap();
        assert!(policy.allows("https://a.org/q"));
    }

    #[test]
    fn test_setting_rejects_non_string_json() {
        assert!(matches!(
            FetchPolicy::from_setting("5"),
            Err(ConfigError::InvalidFetchSetting(_))
        ));
        assert!(matches!(
            FetchPolicy::from_setting(r#"["ok", 3]"#),
            Err(ConfigError::InvalidFetchSetting(_))
        ));
    }

    #[test]
    fn test_setting_rejects_invalid_regex() {
        let err = FetchPolicy::from_setting("https://(unclosed").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }
}
