//! Pluggable structured decoding of request bodies
//!
//! A decoder looks at the request content type and turns the raw body into
//! a [`Document`]; serde then maps the document onto the record type
//! declared by the method. Form documents keep their raw bytes so that
//! numbers and booleans are parsed against the target record, not guessed.

use crate::error::DecodeError;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::Value;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// A decoded body, not yet bound to a record type
#[derive(Debug, Clone, PartialEq)]
pub enum Document {
    Json(Value),
    /// `application/x-www-form-urlencoded` pairs
    Form(Bytes),
}

impl Document {
    /// Deserialize the document into `T`
    pub fn into_record<T: DeserializeOwned>(self) -> Result<T, DecodeError> {
        match self {
            Document::Json(value) => {
                serde_json::from_value(value).map_err(|e| DecodeError::Malformed(e.to_string()))
            }
            Document::Form(raw) => {
                serde_urlencoded::from_bytes(&raw).map_err(|e| DecodeError::Malformed(e.to_string()))
            }
        }
    }
}

/// Decodes request payloads into structured documents
pub trait StructuredDecoder: Send + Sync + 'static {
    /// Decode `raw`, choosing a format from the request content type
    fn decode(&self, content_type: Option<&str>, raw: &Bytes) -> Result<Document, DecodeError>;
}

fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase()
}

fn is_json(content_type: &str) -> bool {
    let essence = essence(content_type);
    essence == "application/json" || essence.ends_with("+json")
}

fn is_form(content_type: &str) -> bool {
    essence(content_type) == FORM_URLENCODED
}

/// JSON only
///
/// Accepts `application/json`, any `+json` media type, and requests without
/// a content type.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDecoder;

impl StructuredDecoder for JsonDecoder {
    fn decode(&self, content_type: Option<&str>, raw: &Bytes) -> Result<Document, DecodeError> {
        if let Some(content_type) = content_type {
            if !is_json(content_type) {
                return Err(DecodeError::UnsupportedContentType(content_type.to_string()));
            }
        }

        if raw.iter().all(u8::is_ascii_whitespace) {
            return Err(DecodeError::EmptyBody);
        }

        serde_json::from_slice(raw)
            .map(Document::Json)
            .map_err(|e| DecodeError::Malformed(e.to_string()))
    }
}

/// URL-encoded forms only
#[derive(Debug, Clone, Copy, Default)]
pub struct FormDecoder;

impl StructuredDecoder for FormDecoder {
    fn decode(&self, content_type: Option<&str>, raw: &Bytes) -> Result<Document, DecodeError> {
        match content_type {
            Some(content_type) if is_form(content_type) => Ok(Document::Form(raw.clone())),
            Some(content_type) => Err(DecodeError::UnsupportedContentType(content_type.to_string())),
            None => Err(DecodeError::UnsupportedContentType(String::new())),
        }
    }
}

/// The default decoder: forms by content type, JSON otherwise
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentDecoder;

impl StructuredDecoder for ContentDecoder {
    fn decode(&self, content_type: Option<&str>, raw: &Bytes) -> Result<Document, DecodeError> {
        match content_type {
            Some(content_type) if is_form(content_type) => FormDecoder.decode(Some(content_type), raw),
            _ => JsonDecoder.decode(content_type, raw),
        }
    }
}

/// Decode a body straight into a record type
pub fn decode_record<T: DeserializeOwned>(
    decoder: &dyn StructuredDecoder,
    content_type: Option<&str>,
    raw: &Bytes,
) -> Result<T, DecodeError> {
    decoder.decode(content_type, raw)?.into_record()
}
