//! Uplift request and output selection.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::output::mime;

/// Which representation a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputKind {
    /// The uplifted JSON form as produced by the engine.
    #[default]
    Uplifted,
    /// Zip bundle with Turtle, expanded JSON-LD and uplifted JSON.
    All,
    /// Expanded JSON-LD.
    Expanded,
    /// Turtle serialization of the graph.
    #[serde(rename = "ttl")]
    Turtle,
}

impl OutputKind {
    /// Wire name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uplifted => "uplifted",
            Self::All => "all",
            Self::Expanded => "expanded",
            Self::Turtle => "ttl",
        }
    }

    /// Content type of the rendered response.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Uplifted | Self::Expanded => mime::JSON,
            Self::All => mime::ZIP,
            Self::Turtle => mime::TURTLE,
        }
    }
}

impl fmt::Display for OutputKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized `output` value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid output type {0:?}, expected one of: uplifted, all, expanded, ttl")]
pub struct UnknownOutputKind(pub String);

impl FromStr for OutputKind {
    type Err = UnknownOutputKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uplifted" => Ok(Self::Uplifted),
            "all" => Ok(Self::All),
            "expanded" => Ok(Self::Expanded),
            "ttl" => Ok(Self::Turtle),
            other => Err(UnknownOutputKind(other.to_string())),
        }
    }
}

/// A single uplift request.
///
/// Inline content always wins over a URL for the same input. The document
/// must come from one of the two; the context may be absent entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpliftRequest {
    /// Inline context definition bytes (UTF-8).
    pub context: Option<Vec<u8>>,
    /// URL of the context definition.
    pub context_url: Option<String>,
    /// Inline JSON document bytes.
    pub document: Option<Vec<u8>>,
    /// URL of the JSON document.
    pub document_url: Option<String>,
    /// Requested representation.
    pub output: OutputKind,
    /// Base URI for relative identifiers.
    pub base_uri: Option<String>,
    /// Whether to attach provenance metadata.
    pub include_provenance: bool,
}

impl Default for UpliftRequest {
    fn default() -> Self {
        Self {
            context: None,
            context_url: None,
            document: None,
            document_url: None,
            output: OutputKind::Uplifted,
            base_uri: None,
            include_provenance: true,
        }
    }
}

impl UpliftRequest {
    /// Empty request with provenance enabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inline context definition.
    pub fn with_context(mut self, context: impl Into<Vec<u8>>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Context definition URL.
    pub fn with_context_url(mut self, url: impl Into<String>) -> Self {
        self.context_url = Some(url.into());
        self
    }

    /// Inline JSON document.
    pub fn with_document(mut self, document: impl Into<Vec<u8>>) -> Self {
        self.document = Some(document.into());
        self
    }

    /// JSON document URL.
    pub fn with_document_url(mut self, url: impl Into<String>) -> Self {
        self.document_url = Some(url.into());
        self
    }

    /// Requested representation.
    pub fn with_output(mut self, output: OutputKind) -> Self {
        self.output = output;
        self
    }

    /// Base URI.
    pub fn with_base_uri(mut self, base: impl Into<String>) -> Self {
        self.base_uri = Some(base.into());
        self
    }

    /// Enable or disable provenance.
    pub fn with_provenance(mut self, include: bool) -> Self {
        self.include_provenance = include;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_kind_parse() {
        assert_eq!("ttl".parse::<OutputKind>().unwrap(), OutputKind::Turtle);
        assert_eq!("all".parse::<OutputKind>().unwrap(), OutputKind::All);
        assert_eq!("expanded".parse::<OutputKind>().unwrap(), OutputKind::Expanded);
        assert_eq!("uplifted".parse::<OutputKind>().unwrap(), OutputKind::Uplifted);
        assert!("turtle".parse::<OutputKind>().is_err());
    }

    #[test]
    fn test_output_kind_serde_names() {
        assert_eq!(serde_json::to_string(&OutputKind::Turtle).unwrap(), "\"ttl\"");
        assert_eq!(
            serde_json::from_str::<OutputKind>("\"expanded\"").unwrap(),
            OutputKind::Expanded
        );
    }

    #[test]
    fn test_content_types() {
        assert_eq!(OutputKind::Uplifted.content_type(), "application/json");
        assert_eq!(OutputKind::Expanded.content_type(), "application/json");
        assert_eq!(OutputKind::Turtle.content_type(), "text/turtle");
        assert_eq!(OutputKind::All.content_type(), "application/zip");
    }

    #[test]
    fn test_request_defaults() {
        let request = UpliftRequest::new();
        assert!(request.include_provenance);
        assert_eq!(request.output, OutputKind::Uplifted);
    }
}
