//! Error handling and custom error types
//!
//! `Error` covers transport, configuration and client-side failures using thiserror.
//! `Failure` is what the orchestration handler returns: a tagged [`ErrorKind`] plus
//! a private detail that is logged but never sent to the caller.

use crate::models::ErrorEnvelope;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("Base64 decode error: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Result image error: {0}")]
    ResultImage(String),

    #[error("Please upload an image first!")]
    NoImage,

    #[error("{0}")]
    Server(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failure categories of a single catify invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MethodNotAllowed,
    InvalidInput,
    Configuration,
    DescriptionFailed,
    GenerationFailed,
    Internal,
}

impl ErrorKind {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::Configuration
            | ErrorKind::DescriptionFailed
            | ErrorKind::GenerationFailed
            | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// The only text that crosses the trust boundary for this kind.
    pub fn public_message(self) -> &'static str {
        match self {
            ErrorKind::MethodNotAllowed => "Method Not Allowed",
            ErrorKind::InvalidInput => "Invalid request. Both imageBase64 and mimeType are required.",
            ErrorKind::Configuration => "The server is not configured to process images.",
            ErrorKind::DescriptionFailed => "Failed to analyze the uploaded image.",
            ErrorKind::GenerationFailed => "Failed to generate the catified image.",
            ErrorKind::Internal => "An internal server error occurred.",
        }
    }
}

/// A failed invocation: what went wrong, plus diagnostics for the server log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub kind: ErrorKind,
    pub detail: String,
    /// Caller-facing override, only ever set for problems with the caller's own input.
    public: Option<String>,
}

impl Failure {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            detail: detail.into(),
            public: None,
        }
    }

    /// Invalid input whose reason is safe to echo back: it only describes the request.
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        Self {
            kind: ErrorKind::InvalidInput,
            detail: reason.clone(),
            public: Some(reason),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, detail)
    }

    pub fn public_message(&self) -> &str {
        self.public
            .as_deref()
            .unwrap_or_else(|| self.kind.public_message())
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        ErrorEnvelope {
            error: self.public_message().to_string(),
        }
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.detail)
    }
}

impl std::error::Error for Failure {}

impl IntoResponse for Failure {
    fn into_response(self) -> Response {
        match self.kind {
            ErrorKind::MethodNotAllowed | ErrorKind::InvalidInput => {
                tracing::warn!("Rejected request ({:?}): {}", self.kind, self.detail);
            }
            _ => {
                tracing::error!("Catify failed ({:?}): {}", self.kind, self.detail);
            }
        }
        (self.kind.status(), Json(self.envelope())).into_response()
    }
}
