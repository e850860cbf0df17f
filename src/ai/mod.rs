//! Generative AI service integration
//!
//! Two capabilities back the catify pipeline: describing an uploaded photo and
//! synthesizing a new image from text. Both sit behind traits so the pipeline
//! can run against Gemini or against in-memory mocks.

pub mod gemini;
pub mod mime;
pub mod mock;

pub use gemini::{GeminiDescriptionClient, GeminiImagenClient, GeminiServiceFactory};
pub use mock::{MockDescriptionClient, MockGenerationClient, MockServiceFactory};

use crate::config::Config;
use crate::models::UploadPayload;
use crate::Result;
use async_trait::async_trait;

/// Image synthesized by the generation service, still base64-encoded exactly
/// as the provider returned it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedImage {
    pub image_base64: String,
    pub mime_type: Option<String>,
}

#[async_trait]
pub trait DescriptionService: Send + Sync {
    /// Produce a free-text description of the uploaded image.
    async fn describe(&self, image: &UploadPayload) -> Result<String>;
}

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Synthesize one image from `prompt`.
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage>;
}

/// Builds the per-invocation service pair from the resolved credential.
pub trait ServiceFactory: Send + Sync {
    fn describer(&self, api_key: &str, config: &Config) -> Box<dyn DescriptionService>;
    fn generator(&self, api_key: &str, config: &Config) -> Box<dyn GenerationService>;
}
