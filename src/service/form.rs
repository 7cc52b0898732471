//! Multipart form decoding for `POST /json-uplift`.
//!
//! | Field | Meaning |
//! |-------|---------|
//! | `context` | inline context definition |
//! | `contexturl` | context definition URL |
//! | `json` | inline JSON document |
//! | `jsonurl` | JSON document URL |
//! | `output` | `uplifted` (default), `all`, `ttl`, `expanded` |
//! | `base` | base URI |
//! | `provenance` | boolean, default `true` |

use axum::extract::Multipart;
use tracing::debug;

use crate::error::UpliftError;
use crate::types::{OutputKind, UpliftRequest};

/// Read the whole form into a request.
pub async fn read_uplift_form(mut multipart: Multipart) -> Result<UpliftRequest, UpliftError> {
    let mut request = UpliftRequest::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| UpliftError::Multipart(e.body_text()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| UpliftError::Multipart(e.body_text()))?;
        apply_field(&mut request, &name, bytes.to_vec())?;
    }
    Ok(request)
}

/// Apply one form field. Unknown fields are ignored.
pub fn apply_field(
    request: &mut UpliftRequest,
    name: &str,
    value: Vec<u8>,
) -> Result<(), UpliftError> {
    match name {
        "context" => request.context = Some(value),
        "json" => request.document = Some(value),
        "contexturl" => request.context_url = text_field(name, value)?,
        "jsonurl" => request.document_url = text_field(name, value)?,
        "base" => request.base_uri = text_field(name, value)?,
        "output" => {
            if let Some(raw) = text_field(name, value)? {
                request.output = raw
                    .parse::<OutputKind>()
                    .map_err(|e| UpliftError::UnprocessableEntity(e.to_string()))?;
            }
        }
        "provenance" => {
            if let Some(raw) = text_field(name, value)? {
                request.include_provenance = parse_bool(&raw).ok_or_else(|| {
                    UpliftError::UnprocessableEntity(format!(
                        "Invalid boolean for provenance: {raw:?}"
                    ))
                })?;
            }
        }
        other => debug!(field = other, "Ignoring unknown form field"),
    }
    Ok(())
}

/// Trimmed UTF-8 text, `None` when blank.
fn text_field(name: &str, value: Vec<u8>) -> Result<Option<String>, UpliftError> {
    let text = String::from_utf8(value).map_err(|_| {
        UpliftError::UnprocessableEntity(format!("Form field {name:?} is not valid UTF-8"))
    })?;
    let trimmed = text.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

/// Form boolean: `true/false`, `1/0`, `yes/no`, `on/off`, any case.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn apply(fields: &[(&str, &str)]) -> Result<UpliftRequest, UpliftError> {
        let mut request = UpliftRequest::new();
        for (name, value) in fields {
            apply_field(&mut request, name, value.as_bytes().to_vec())?;
        }
        Ok(request)
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" off "), Some(false));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("maybe"), None);
    }

    #[test]
    fn test_fields_fill_request() {
        let request = apply(&[
            ("json", "{}"),
            ("contexturl", " https://a.org/ctx.yml "),
            ("output", "ttl"),
            ("base", "https://a.org/"),
            ("provenance", "false"),
            ("unexpected", "x"),
        ])
        .unwrap();

        assert_eq!(request.document.as_deref(), Some(&b"{}"[..]));
        assert_eq!(request.context_url.as_deref(), Some("https://a.org/ctx.yml"));
        assert_eq!(request.output, OutputKind::Turtle);
        assert_eq!(request.base_uri.as_deref(), Some("https://a.org/"));
        assert!(!request.include_provenance);
    }

    #[test]
    fn test_blank_fields_keep_defaults() {
        let request = apply(&[("output", ""), ("provenance", " "), ("jsonurl", "")]).unwrap();
        assert_eq!(request.output, OutputKind::Uplifted);
        assert!(request.include_provenance);
        assert_eq!(request.document_url, None);
    }

    #[test]
    fn test_bad_values_are_unprocessable() {
        let err = apply(&[("output", "rdfxml")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnprocessableEntity);

        let err = apply(&[("provenance", "sometimes")]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnprocessableEntity);
    }
}
