//! Provenance metadata for rendered outputs.
//!
//! ## Lifecycle
//!
//! | Step | What happens |
//! |------|--------------|
//! | request start | `start` recorded, `used` filled from the request |
//! | assembly | `end` stamped once via [`ProvenanceMetadata::stamped`] |
//! | each representation | copy made via [`ProvenanceMetadata::for_output`] |
//!
//! Representations of the same request therefore share `used`, `start` and
//! `end`, and differ only in `output`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::output::mime;
use super::request::UpliftRequest;

/// A file that took part in producing an output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileProvenance {
    /// Where the file came from; `None` for inline content.
    pub uri: Option<String>,
    /// Media type.
    pub mime_type: String,
    /// Human-readable label.
    pub label: Option<String>,
}

impl FileProvenance {
    /// Describe a file.
    pub fn new(uri: Option<String>, mime_type: impl Into<String>) -> Self {
        Self {
            uri,
            mime_type: mime_type.into(),
            label: None,
        }
    }

    /// Attach a label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Provenance for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProvenanceMetadata {
    /// Inputs, in order.
    pub used: Vec<FileProvenance>,
    /// When processing started.
    pub start: DateTime<Utc>,
    /// When processing ended; stamped at annotation time.
    pub end: Option<DateTime<Utc>>,
    /// The output this copy describes.
    pub output: Option<FileProvenance>,
}

impl ProvenanceMetadata {
    /// Metadata with no inputs yet.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            used: Vec::new(),
            start,
            end: None,
            output: None,
        }
    }

    /// Metadata for a request: the context definition, then the JSON document.
    pub fn for_request(request: &UpliftRequest, start: DateTime<Utc>) -> Self {
        Self::new(start)
            .with_used(
                FileProvenance::new(non_blank(&request.context_url), mime::YAML)
                    .with_label("Context definition"),
            )
            .with_used(
                FileProvenance::new(non_blank(&request.document_url), mime::JSON)
                    .with_label("JSON document"),
            )
    }

    /// Append an input.
    pub fn with_used(mut self, file: FileProvenance) -> Self {
        self.used.push(file);
        self
    }

    /// Copy with `end` set to now, unless already set.
    pub fn stamped(&self) -> Self {
        let mut stamped = self.clone();
        stamped.end.get_or_insert_with(Utc::now);
        stamped
    }

    /// Copy describing a specific output. `self` is left untouched.
    pub fn for_output(&self, output: FileProvenance) -> Self {
        let mut copy = self.clone();
        copy.output = Some(output);
        copy
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_request_lists_context_then_document() {
        let request = UpliftRequest::new()
            .with_context_url("https://a.org/ctx.yml")
            .with_document(b"{}".to_vec());
        let meta = ProvenanceMetadata::for_request(&request, Utc::now());

        assert_eq!(meta.used.len(), 2);
        assert_eq!(meta.used[0].uri.as_deref(), Some("https://a.org/ctx.yml"));
        assert_eq!(meta.used[0].mime_type, "text/yaml");
        assert_eq!(meta.used[0].label.as_deref(), Some("Context definition"));
        assert_eq!(meta.used[1].uri, None);
        assert_eq!(meta.used[1].mime_type, "application/json");
    }

    #[test]
    fn test_stamped_keeps_existing_end() {
        let meta = ProvenanceMetadata::new(Utc::now()).stamped();
        let end = meta.end.unwrap();
        assert_eq!(meta.stamped().end, Some(end));
    }

    #[test]
    fn test_for_output_does_not_touch_base() {
        let base = ProvenanceMetadata::new(Utc::now()).stamped();
        let ttl = base.for_output(FileProvenance::new(Some("#".into()), mime::TURTLE));
        let jsonld = base.for_output(FileProvenance::new(Some("#".into()), mime::JSON_LD));

        assert_eq!(base.output, None);
        assert_eq!(ttl.start, jsonld.start);
        assert_eq!(ttl.end, jsonld.end);
        assert_ne!(ttl.output, jsonld.output);
    }
}
