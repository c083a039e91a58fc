//! JSON text encoding for sidecar documents.
//!
//! Decoding happens in two passes: the text is parsed into a
//! [`serde_json::Value`] (failures are [`DecodeError`]s), then the value is
//! deserialized into the typed model through `serde_path_to_error`, so that
//! schema violations name the field that is wrong ([`ValidationError`]).
//!
//! Unknown keys are ignored on the document, `meta`, `file` and annotation
//! objects. Built-in attribute payloads and their geometry are strict.

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;

use super::attributes::AnnotationAttributes;
use super::model::Document;
use crate::env::{IdGenerator, UuidV4};
use crate::error::{CodecError, DecodeError, ValidationError};

/// Decodes a document from JSON text.
///
/// `origin` identifies the text in error messages (usually a file path).
/// Annotations without a `uuid` get a random one.
pub fn decode_str(text: &str, origin: &str) -> Result<Document, CodecError> {
    decode_str_with_ids(text, origin, &UuidV4)
}

/// Like [`decode_str`], drawing missing annotation ids from `ids`.
pub fn decode_str_with_ids(
    text: &str,
    origin: &str,
    ids: &dyn IdGenerator,
) -> Result<Document, CodecError> {
    let value: Value = serde_json::from_str(text).map_err(|source| DecodeError {
        origin: origin.to_string(),
        source,
    })?;
    Ok(decode_document(value, ids)?)
}

/// Decodes a document from raw bytes.
///
/// Useful for fuzzing and for callers that have not checked UTF-8 yet.
pub fn decode_slice(bytes: &[u8], origin: &str) -> Result<Document, CodecError> {
    let value: Value = serde_json::from_slice(bytes).map_err(|source| DecodeError {
        origin: origin.to_string(),
        source,
    })?;
    Ok(decode_document(value, &UuidV4)?)
}

/// Encodes a document as JSON text.
///
/// `indent == 0` produces compact output; otherwise nested values are
/// indented by `indent` spaces.
pub fn encode(document: &Document, indent: usize) -> Result<String, serde_json::Error> {
    if indent == 0 {
        return serde_json::to_string(document);
    }

    let pad = vec![b' '; indent];
    let mut buf = Vec::new();
    {
        let formatter = PrettyFormatter::with_indent(&pad);
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        document.serialize(&mut ser)?;
    }
    String::from_utf8(buf).map_err(|err| <serde_json::Error as serde::ser::Error>::custom(err))
}

/// Validates an already parsed JSON value as a document.
///
/// Annotations without a `uuid` get one from `ids`, in document order.
pub fn decode_document(value: Value, ids: &dyn IdGenerator) -> Result<Document, ValidationError> {
    let mut document: Document =
        serde_path_to_error::deserialize(value).map_err(|err| path_error("", err))?;

    for annotation in &mut document.annotations {
        if annotation.uuid.is_empty() {
            annotation.uuid = ids.generate();
        }
    }
    Ok(document)
}

/// Decodes a standalone attributes object; error paths start at `path`.
pub fn decode_attributes(
    value: &Value,
    path: &str,
) -> Result<AnnotationAttributes, ValidationError> {
    serde_path_to_error::deserialize(value).map_err(|err| path_error(path, err))
}

fn path_error(
    prefix: &str,
    err: serde_path_to_error::Error<serde_json::Error>,
) -> ValidationError {
    // The root path prints as ".".
    let inner = err.path().to_string();
    let path = if inner == "." {
        if prefix.is_empty() {
            "document".to_string()
        } else {
            prefix.to_string()
        }
    } else if prefix.is_empty() {
        inner
    } else if inner.starts_with('[') {
        format!("{}{}", prefix, inner)
    } else {
        format!("{}.{}", prefix, inner)
    };
    ValidationError::new(path, err.into_inner().to_string())
}
