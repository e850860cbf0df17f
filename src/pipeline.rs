//! Two-stage catify orchestration: describe the uploaded photo, then generate
//! a cat rendition of the described scene.
//!
//! Every stage returns `Result<_, Failure>` and the first failure short-circuits
//! the invocation. Nothing is shared between invocations except the read-only
//! [`Config`] and the service factory.

use crate::ai::mime::canonical_image_mime;
use crate::ai::ServiceFactory;
use crate::config::Config;
use crate::error::{ErrorKind, Failure};
use crate::models::{GenerationResult, SubmitRequest, UploadPayload};
use crate::prompts;
use axum::body::Body;
use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use http_body_util::LengthLimitError;
use std::sync::Arc;
use tracing::{debug, info, Instrument};
use uuid::Uuid;

/// Progress of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Validated,
    DescribingScene,
    DescriptionSucceeded,
    GeneratingImage,
    Done,
    Failed(ErrorKind),
}

impl Stage {
    pub fn is_terminal(self) -> bool {
        matches!(self, Stage::Done | Stage::Failed(_))
    }

    /// The stage that follows on success, `None` once terminal.
    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Received => Some(Stage::Validated),
            Stage::Validated => Some(Stage::DescribingScene),
            Stage::DescribingScene => Some(Stage::DescriptionSucceeded),
            Stage::DescriptionSucceeded => Some(Stage::GeneratingImage),
            Stage::GeneratingImage => Some(Stage::Done),
            Stage::Done | Stage::Failed(_) => None,
        }
    }
}

struct Invocation {
    stage: Stage,
}

impl Invocation {
    fn new() -> Self {
        debug!(stage = ?Stage::Received, "Invocation started");
        Self {
            stage: Stage::Received,
        }
    }

    fn advance(&mut self) {
        if let Some(next) = self.stage.next() {
            debug!(from = ?self.stage, to = ?next, "Stage transition");
            self.stage = next;
        }
    }

    fn fail(&mut self, failure: Failure) -> Failure {
        debug!(from = ?self.stage, kind = ?failure.kind, "Invocation failed");
        self.stage = Stage::Failed(failure.kind);
        failure
    }
}

/// Orchestrates one image through description and generation.
#[derive(Clone)]
pub struct Catifier {
    config: Arc<Config>,
    services: Arc<dyn ServiceFactory>,
}

impl Catifier {
    pub fn new(config: Arc<Config>, services: Arc<dyn ServiceFactory>) -> Self {
        Self { config, services }
    }

    /// Handle one catify request, always answering with a JSON envelope.
    pub async fn handle(&self, request: Request) -> Response {
        let request_id = Uuid::new_v4();
        let span = tracing::info_span!("catify", %request_id);

        async move {
            match self.run(request).await {
                Ok(result) => {
                    info!(
                        "Catify succeeded ({} base64 chars)",
                        result.image_data.len()
                    );
                    (StatusCode::OK, Json(result)).into_response()
                }
                Err(failure) => failure.into_response(),
            }
        }
        .instrument(span)
        .await
    }

    async fn run(&self, request: Request) -> Result<GenerationResult, Failure> {
        let mut invocation = Invocation::new();

        if request.method() != Method::POST {
            return Err(invocation.fail(Failure::new(
                ErrorKind::MethodNotAllowed,
                format!("{} is not accepted", request.method()),
            )));
        }

        let upload = match self.read_upload(request.into_body()).await {
            Ok(upload) => upload,
            Err(failure) => return Err(invocation.fail(failure)),
        };
        invocation.advance();

        let api_key = match self.config.api_key.as_deref() {
            Some(key) => key,
            None => {
                return Err(invocation.fail(Failure::new(
                    ErrorKind::Configuration,
                    "GEMINI_API_KEY is not set",
                )))
            }
        };

        invocation.advance();
        let description = match self.describe_scene(api_key, &upload).await {
            Ok(description) => description,
            Err(failure) => return Err(invocation.fail(failure)),
        };
        invocation.advance();

        invocation.advance();
        let image_data = match self.generate_image(api_key, &description).await {
            Ok(image_data) => image_data,
            Err(failure) => return Err(invocation.fail(failure)),
        };
        invocation.advance();

        Ok(GenerationResult { image_data })
    }

    async fn read_upload(&self, body: Body) -> Result<UploadPayload, Failure> {
        let bytes = axum::body::to_bytes(body, self.config.max_request_bytes)
            .await
            .map_err(|e| {
                let source = e.into_inner();
                if source.is::<LengthLimitError>() {
                    Failure::invalid_input(format!(
                        "Request body exceeds {} bytes.",
                        self.config.max_request_bytes
                    ))
                } else {
                    Failure::internal(format!("Failed to read request body: {}", source))
                }
            })?;

        parse_upload(&bytes, self.config.max_upload_bytes)
    }

    /// Stage 1. Any upstream problem, including an empty answer, is a
    /// description failure.
    async fn describe_scene(
        &self,
        api_key: &str,
        upload: &UploadPayload,
    ) -> Result<String, Failure> {
        let describer = self.services.describer(api_key, &self.config);
        let description = describer
            .describe(upload)
            .await
            .map_err(|e| Failure::new(ErrorKind::DescriptionFailed, e.to_string()))?;

        if description.trim().is_empty() {
            return Err(Failure::new(
                ErrorKind::DescriptionFailed,
                "Description service returned empty text",
            ));
        }

        info!("Scene described ({} chars)", description.len());
        debug!("Scene description: {}", description);
        Ok(description)
    }

    /// Stage 2. Returns the provider's base64 payload untouched.
    async fn generate_image(&self, api_key: &str, description: &str) -> Result<String, Failure> {
        let prompt = prompts::generation_prompt(description);
        let generator = self.services.generator(api_key, &self.config);
        let image = generator
            .generate(&prompt)
            .await
            .map_err(|e| Failure::new(ErrorKind::GenerationFailed, e.to_string()))?;

        if image.image_base64.is_empty() {
            return Err(Failure::new(
                ErrorKind::GenerationFailed,
                "Generation service returned no image bytes",
            ));
        }

        Ok(image.image_base64)
    }
}

/// Parse and validate a request body into an [`UploadPayload`].
///
/// Malformed JSON is an internal failure; a missing, empty or out-of-contract
/// field is invalid input.
pub fn parse_upload(body: &[u8], max_upload_bytes: usize) -> Result<UploadPayload, Failure> {
    let request: SubmitRequest = serde_json::from_slice(body)
        .map_err(|e| Failure::internal(format!("Malformed request body: {}", e)))?;

    let (image_data, mime_type) = match (request.image_base64, request.mime_type) {
        (Some(image), Some(mime)) if !image.is_empty() && !mime.trim().is_empty() => (image, mime),
        _ => {
            return Err(Failure::invalid_input(
                ErrorKind::InvalidInput.public_message(),
            ))
        }
    };

    let mime_type = canonical_image_mime(&mime_type).ok_or_else(|| {
        Failure::invalid_input(format!("Unsupported image type: {}", mime_type))
    })?;

    let upload = UploadPayload::new(image_data, mime_type.to_string());
    let size = upload
        .decoded_len()
        .map_err(|_| Failure::invalid_input("imageBase64 is not valid base64."))?;
    if size > max_upload_bytes {
        return Err(Failure::invalid_input(format!(
            "Image is too large ({} bytes). The limit is {} bytes.",
            size, max_upload_bytes
        )));
    }

    Ok(upload)
}
