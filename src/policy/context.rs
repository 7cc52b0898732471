//! Policy for JSON-LD contexts referenced from a context definition.

use serde::Serialize;
use serde_json::Value;

use crate::config::ConfigError;

/// Which remote JSON-LD contexts the engine may reference.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "type", content = "whitelist", rename_all = "lowercase")]
pub enum ContextFetchPolicy {
    /// Any URL.
    #[default]
    Open,
    /// No URL.
    Disabled,
    /// Only URLs under one of these entries.
    Whitelist(Vec<String>),
}

impl ContextFetchPolicy {
    /// Parse the `REMOTE_CONTEXT_FETCH_WHITELIST` setting.
    ///
    /// Absent, blank or `null` leaves fetching open; `false` or an array with
    /// no usable entries disables it.
    pub fn from_setting(raw: Option<&str>) -> Result<Self, ConfigError> {
        let raw = match raw.map(str::trim) {
            None | Some("") => return Ok(Self::Open),
            Some(raw) => raw,
        };

        let value: Value = serde_json::from_str(raw)
            .map_err(|e| ConfigError::InvalidWhitelist(format!("{raw}: {e}")))?;

        match value {
            Value::Null => Ok(Self::Open),
            Value::Bool(false) => Ok(Self::Disabled),
            Value::Array(items) => {
                let mut entries = Vec::with_capacity(items.len());
                for item in items {
                    match item {
                        Value::String(s) if s.trim().is_empty() => {}
                        Value::String(s) => entries.push(s),
                        Value::Null => {}
                        other => return Err(ConfigError::InvalidWhitelist(other.to_string())),
                    }
                }
                Ok(Self::whitelist(entries))
            }
            other => Err(ConfigError::InvalidWhitelist(other.to_string())),
        }
    }

    /// Whitelist from entries; an empty list disables fetching.
    pub fn whitelist<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries: Vec<String> = entries.into_iter().map(Into::into).collect();
        if entries.is_empty() {
            Self::Disabled
        } else {
            Self::Whitelist(entries)
        }
    }

    /// Whether `url` may be referenced.
    ///
    /// A whitelist entry covers the exact URL and anything below it, where
    /// "below" means the next character after the entry is a path, query or
    /// fragment delimiter (or the entry itself ends with `/`).
    pub fn allows(&self, url: &str) -> bool {
        match self {
            Self::Open => true,
            Self::Disabled => false,
            Self::Whitelist(entries) => entries.iter().any(|entry| covers(entry, url)),
        }
    }

    /// `open`, `disabled` or `whitelist`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Disabled => "disabled",
            Self::Whitelist(_) => "whitelist",
        }
    }

    /// Whitelisted entries, if this is a whitelist.
    pub fn entries(&self) -> Option<&[String]> {
        match self {
            Self::Whitelist(entries) => Some(entries),
            _ => None,
        }
    }
}

fn covers(entry: &str, url: &str) -> bool {
    match url.strip_prefix(entry) {
        Some("") => true,
        Some(rest) => entry.ends_with('/') || rest.starts_with(['/', '?', '#']),
        None => false,
    }
}
