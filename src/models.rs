//! Data models and structures
//!
//! Request-scoped payloads exchanged between the uploader and the catify
//! handler. Nothing here outlives a single invocation.

use serde::{Deserialize, Serialize};

/// An image staged for catification, base64-encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPayload {
    #[serde(rename = "imageBase64")]
    pub image_data: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

impl UploadPayload {
    pub fn new(image_data: String, mime_type: String) -> Self {
        Self {
            image_data,
            mime_type,
        }
    }

    /// Decoded byte size of `image_data`.
    pub fn decoded_len(&self) -> crate::Result<usize> {
        use base64::Engine as _;
        Ok(base64::engine::general_purpose::STANDARD
            .decode(&self.image_data)?
            .len())
    }
}

/// Incoming request body as the handler first sees it. Fields stay optional so
/// that a missing field is told apart from malformed JSON.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub image_base64: Option<String>,
    pub mime_type: Option<String>,
}

/// Successful handler response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationResult {
    #[serde(rename = "imageBase64")]
    pub image_data: String,
}

/// Uniform failure response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

/// Success body as the uploader reads it; the image may be absent on a
/// misbehaving server.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub image_base64: Option<String>,
}
