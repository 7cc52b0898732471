//! Error taxonomy for the uplift pipeline.
//!
//! Every failure a request can hit ends up as an [`UpliftError`]. Each
//! variant maps to exactly one [`ErrorKind`], whose tag is the stable
//! `type` field clients see. HTTP status codes are assigned by the service
//! layer, never here.
//!
//! | Kind | Tag | Extra fields |
//! |------|-----|--------------|
//! | [`ErrorKind::JsonDecode`] | `JSONDecodeError` | none |
//! | [`ErrorKind::Validation`] | `ValidationError` | index, property, value, cause |
//! | [`ErrorKind::FetchForbidden`] | `FetchForbidden` | none |
//! | [`ErrorKind::UnprocessableEntity`] | `UnprocessableEntity` | none |
//! | everything else | its own category name | none |

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::fetch::FetchError;

/// Semantic validation failure raised by the transformation engine.
///
/// Mirrors the fields a context or document validator can report: where the
/// problem is (`index`, `property`), what was found (`value`), and the
/// underlying cause formatted as `Category|message`.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{msg}")]
pub struct ValidationError {
    /// Human-readable message.
    pub msg: String,
    /// Position inside a list, when the failure is tied to one entry.
    pub index: Option<usize>,
    /// Offending property name.
    pub property: Option<String>,
    /// Offending value.
    pub value: Option<Value>,
    /// Underlying cause, `Category|message`.
    pub cause: Option<String>,
}

impl ValidationError {
    /// Create a validation error with just a message.
    pub fn new(msg: impl Into<String>) -> Self {
        Self {
            msg: msg.into(),
            index: None,
            property: None,
            value: None,
            cause: None,
        }
    }

    /// Attach the list index the failure refers to.
    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Attach the property name the failure refers to.
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    /// Attach the offending value.
    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    /// Attach an underlying cause as `category|message`.
    pub fn with_cause(mut self, category: &str, cause: impl fmt::Display) -> Self {
        self.cause = Some(format!("{category}|{cause}"));
        self
    }
}

/// Stable error categories exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The JSON document could not be parsed.
    JsonDecode,
    /// Context or document failed semantic validation.
    Validation,
    /// A remote fetch was refused by the allow-list.
    FetchForbidden,
    /// No JSON document was supplied, or the form was unusable.
    UnprocessableEntity,
    /// A permitted remote fetch failed at the transport level.
    Fetch,
    /// Fetched or inline context bytes were not UTF-8.
    Encoding,
    /// The multipart request body could not be read.
    Multipart,
    /// The `all` bundle could not be written.
    Archive,
    /// A rendered representation could not be serialized.
    Serialization,
}

impl ErrorKind {
    /// The `type` tag sent to clients.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JsonDecode => "JSONDecodeError",
            Self::Validation => "ValidationError",
            Self::FetchForbidden => "FetchForbidden",
            Self::UnprocessableEntity => "UnprocessableEntity",
            Self::Fetch => "FetchError",
            Self::Encoding => "EncodingError",
            Self::Multipart => "MultipartError",
            Self::Archive => "ArchiveError",
            Self::Serialization => "SerializationError",
        }
    }

    /// Whether this is one of the deliberate domain errors with a fixed shape.
    pub fn is_domain(&self) -> bool {
        matches!(
            self,
            Self::JsonDecode | Self::Validation | Self::FetchForbidden | Self::UnprocessableEntity
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single uplift request.
#[derive(Debug, thiserror::Error)]
pub enum UpliftError {
    /// The JSON document is not valid JSON.
    #[error("Invalid JSON input: {0}")]
    JsonDecode(#[source] serde_json::Error),

    /// The engine rejected the context or the document.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The URL is not covered by the fetch allow-list.
    #[error("Fetch is forbidden from the requested URL: {url}")]
    FetchForbidden {
        /// The refused URL.
        url: String,
    },

    /// The request cannot be processed as submitted.
    #[error("{0}")]
    UnprocessableEntity(String),

    /// A permitted fetch failed.
    #[error(transparent)]
    Fetch(FetchError),

    /// Context bytes were not valid UTF-8.
    #[error("Context definition is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    /// Multipart body could not be read.
    #[error("Malformed multipart body: {0}")]
    Multipart(String),

    /// Writing the zip bundle failed.
    #[error("Failed to build output bundle: {0}")]
    Archive(String),

    /// Serializing a JSON representation failed.
    #[error("Failed to serialize output: {0}")]
    Serialization(#[source] serde_json::Error),
}

impl From<FetchError> for UpliftError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Forbidden { url } => Self::FetchForbidden { url },
            other => Self::Fetch(other),
        }
    }
}

impl UpliftError {
    /// Missing JSON source.
    pub fn missing_document() -> Self {
        Self::UnprocessableEntity("No JSON source specified".to_string())
    }

    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::JsonDecode(_) => ErrorKind::JsonDecode,
            Self::Validation(_) => ErrorKind::Validation,
            Self::FetchForbidden { .. } => ErrorKind::FetchForbidden,
            Self::UnprocessableEntity(_) => ErrorKind::UnprocessableEntity,
            Self::Fetch(_) => ErrorKind::Fetch,
            Self::Encoding(_) => ErrorKind::Encoding,
            Self::Multipart(_) => ErrorKind::Multipart,
            Self::Archive(_) => ErrorKind::Archive,
            Self::Serialization(_) => ErrorKind::Serialization,
        }
    }

    /// The client-facing description of this error.
    pub fn detail(&self) -> ErrorDetail {
        let kind = self.kind().as_str().to_string();
        match self {
            Self::JsonDecode(_) => ErrorDetail::new(kind, "Invalid JSON input"),
            Self::Validation(e) => ErrorDetail {
                kind,
                msg: e.msg.clone(),
                validation: Some(ValidationFields {
                    index: e.index,
                    property: e.property.clone(),
                    value: e.value.clone(),
                    cause: e.cause.clone(),
                }),
            },
            Self::FetchForbidden { .. } => {
                ErrorDetail::new(kind, "Fetch is forbidden from the requested URL")
            }
            Self::UnprocessableEntity(msg) => ErrorDetail::new(kind, msg.clone()),
            other => ErrorDetail::new(kind, other.to_string()),
        }
    }
}

/// Client-facing error body: `{type, msg}` plus kind-specific fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Stable error tag.
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable message.
    pub msg: String,
    /// Present only for validation errors.
    #[serde(flatten)]
    pub validation: Option<ValidationFields>,
}

impl ErrorDetail {
    /// Create a detail without kind-specific fields.
    pub fn new(kind: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            msg: msg.into(),
            validation: None,
        }
    }
}

/// Extra fields carried by `ValidationError` details. Always serialized, `null` when unknown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationFields {
    /// List index.
    pub index: Option<usize>,
    /// Property name.
    pub property: Option<String>,
    /// Offending value.
    pub value: Option<Value>,
    /// `Category|message` cause.
    pub cause: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_domain_kinds_have_fixed_tags() {
        assert_eq!(ErrorKind::JsonDecode.as_str(), "JSONDecodeError");
        assert_eq!(ErrorKind::Validation.as_str(), "ValidationError");
        assert_eq!(ErrorKind::FetchForbidden.as_str(), "FetchForbidden");
        assert_eq!(ErrorKind::UnprocessableEntity.as_str(), "UnprocessableEntity");
        assert!(ErrorKind::FetchForbidden.is_domain());
        assert!(!ErrorKind::Fetch.is_domain());
    }

    #[test]
    fn test_validation_detail_carries_all_fields() {
        let err: UpliftError = ValidationError::new("Unknown term")
            .with_index(2)
            .with_property("types")
            .with_value(json!(42))
            .with_cause("TypeError", "expected string")
            .into();

        let body = serde_json::to_value(err.detail()).unwrap();
        assert_eq!(
            body,
            json!({
                "type": "ValidationError",
                "msg": "Unknown term",
                "index": 2,
                "property": "types",
                "value": 42,
                "cause": "TypeError|expected string",
            })
        );
    }

    #[test]
    fn test_validation_detail_serializes_nulls() {
        let err = UpliftError::from(ValidationError::new("bad"));
        let body = serde_json::to_value(err.detail()).unwrap();
        assert_eq!(body["index"], Value::Null);
        assert_eq!(body["cause"], Value::Null);
    }

    #[test]
    fn test_plain_detail_has_only_type_and_msg() {
        let body = serde_json::to_value(UpliftError::missing_document().detail()).unwrap();
        assert_eq!(
            body,
            json!({"type": "UnprocessableEntity", "msg": "No JSON source specified"})
        );
    }

    #[test]
    fn test_forbidden_fetch_error_becomes_fetch_forbidden() {
        let err = UpliftError::from(FetchError::Forbidden {
            url: "https://evil.example/x".to_string(),
        });
        assert_eq!(err.kind(), ErrorKind::FetchForbidden);

        let err = UpliftError::from(FetchError::Status {
            url: "https://a.example/x".to_string(),
            status: 500,
        });
        assert_eq!(err.kind(), ErrorKind::Fetch);
        assert!(err.detail().msg.contains("500"));
    }

    #[test]
    fn test_json_decode_detail_hides_parser_message() {
        let parse_err = serde_json::from_str::<Value>("{nope").unwrap_err();
        let detail = UpliftError::JsonDecode(parse_err).detail();
        assert_eq!(detail.kind, "JSONDecodeError");
        assert_eq!(detail.msg, "Invalid JSON input");
    }
}
