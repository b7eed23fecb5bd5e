//! Body decoders: structured payload → generic value tree.

use core::fmt;

use facet_core::Shape;
use serde_json::Value;
use tracing::debug;

use crate::{CoerceError, mime_matches};

mod assign;
pub(crate) use assign::assign;

mod json;
pub use json::JsonDecoder;

mod xml;
pub use xml::XmlDecoder;

/// Decodes a request body of some content type into a [`Value`] tree.
///
/// The binder picks the first registered decoder whose content types
/// prefix-match the request's `Content-Type`.
pub trait BodyDecoder: Send + Sync {
    /// Short name of the format, for errors and logs
    fn format(&self) -> &'static str;

    /// Media types this decoder handles, matched as prefixes
    fn content_types(&self) -> &[&'static str];

    /// Decodes a whole payload
    fn decode(&self, body: &[u8]) -> Result<Value, DecodeError>;

    /// Returns true if the format carries every scalar as text, so that
    /// strings must be accepted for numbers and booleans, and a lone value
    /// for a list.
    fn text_scalars(&self) -> bool {
        false
    }
}

/// Error returned when a body cannot be decoded into its section
#[derive(Debug)]
pub enum DecodeError {
    /// the payload is not well-formed
    Syntax {
        /// format name
        format: &'static str,
        /// parser message
        message: String,
    },

    /// a value does not have the kind its slot expects
    Mismatch {
        /// dotted path of the value in the payload
        path: String,
        /// shape of the slot
        expected: &'static Shape,
        /// kind of value found
        found: &'static str,
    },

    /// a scalar value does not fit its slot
    Coerce {
        /// dotted path of the value in the payload
        path: String,
        /// coercion error
        source: CoerceError,
    },

    /// a `#[facet(flatten)]` field of the body is not a record
    NotFlattenable {
        /// dotted path of the field
        path: String,
    },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecodeError::Syntax { format, message } => write!(f, "invalid {format}: {message}"),
            DecodeError::Mismatch {
                path,
                expected,
                found,
            } => write!(f, "expected `{expected}` at `{path}`, found {found}"),
            DecodeError::Coerce { path, source } => write!(f, "at `{path}`: {source}"),
            DecodeError::NotFlattenable { path } => {
                write!(f, "cannot flatten `{path}`, which is not a record")
            }
        }
    }
}

impl core::error::Error for DecodeError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            DecodeError::Coerce { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Picks the decoder for `content_type`
pub(crate) fn select<'d>(
    content_type: Option<&str>,
    decoders: &'d [Box<dyn BodyDecoder>],
) -> Option<&'d dyn BodyDecoder> {
    let content_type = content_type?;
    let decoder = decoders.iter().find(|decoder| {
        decoder
            .content_types()
            .iter()
            .any(|mime| mime_matches(content_type, mime))
    })?;
    debug!(content_type, format = decoder.format(), "selected body decoder");
    Some(decoder.as_ref())
}

/// The built-in decoders: JSON, then XML
pub(crate) fn default_decoders() -> Vec<Box<dyn BodyDecoder>> {
    vec![Box::new(JsonDecoder), Box::new(XmlDecoder)]
}

/// Name of a value's kind, for mismatch errors
pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
