use serde_json::Value;

use super::{BodyDecoder, DecodeError};

/// Decodes `application/json` bodies with `serde_json`
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonDecoder;

impl BodyDecoder for JsonDecoder {
    fn format(&self) -> &'static str {
        "json"
    }

    fn content_types(&self) -> &[&'static str] {
        &["application/json"]
    }

    fn decode(&self, body: &[u8]) -> Result<Value, DecodeError> {
        serde_json::from_slice(body).map_err(|err| DecodeError::Syntax {
            format: self.format(),
            message: err.to_string(),
        })
    }
}
