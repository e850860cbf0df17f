use super::client::{Endpoint, GeminiHttpClient};
use super::types::{PredictInstance, PredictParameters, PredictRequest, PredictResponse};
use crate::ai::{GeneratedImage, GenerationService};
use crate::config::DEFAULT_GENERATION_TIMEOUT_SECS;
use crate::{Error, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Image synthesis through an Imagen model's `predict` endpoint.
pub struct GeminiImagenClient {
    http: GeminiHttpClient,
}

impl GeminiImagenClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http: GeminiHttpClient::new(
                api_key,
                model,
                Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
            ),
        }
    }

    pub fn new_with_client(
        api_key: String,
        model: String,
        timeout: Duration,
        client: reqwest::Client,
    ) -> Self {
        Self {
            http: GeminiHttpClient::new_with_client(api_key, model, timeout, client),
        }
    }
}

super::impl_with_gemini_base_url!(GeminiImagenClient);

#[async_trait]
impl GenerationService for GeminiImagenClient {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage> {
        tracing::debug!(
            "Requesting image from {} ({} char prompt)",
            self.http.model(),
            prompt.len()
        );

        let request = PredictRequest {
            instances: vec![PredictInstance {
                prompt: prompt.to_string(),
            }],
            parameters: PredictParameters { sample_count: 1 },
        };

        let response: PredictResponse = self.http.call(Endpoint::Predict, &request).await?;

        let prediction = response
            .predictions
            .into_iter()
            .next()
            .ok_or_else(|| Error::AiProvider("No predictions in Imagen response".to_string()))?;

        let image_base64 = prediction
            .bytes_base64_encoded
            .filter(|b64| !b64.is_empty())
            .ok_or_else(|| {
                Error::AiProvider("No image bytes in first Imagen prediction".to_string())
            })?;

        if let Some(mime_type) = &prediction.mime_type {
            tracing::debug!("Imagen returned image with mime_type: {}", mime_type);
        }

        Ok(GeneratedImage {
            image_base64,
            mime_type: prediction.mime_type,
        })
    }
}
