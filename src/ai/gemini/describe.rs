use super::client::{Endpoint, GeminiHttpClient};
use super::types::{Content, GenerateContentRequest, GenerateContentResponse, InlineData, Part};
use crate::ai::DescriptionService;
use crate::config::DEFAULT_DESCRIPTION_TIMEOUT_SECS;
use crate::models::UploadPayload;
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Scene description through Gemini `generateContent` with the photo inlined.
pub struct GeminiDescriptionClient {
    http: GeminiHttpClient,
}

impl GeminiDescriptionClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            http: GeminiHttpClient::new(
                api_key,
                model,
                Duration::from_secs(DEFAULT_DESCRIPTION_TIMEOUT_SECS),
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

super::impl_with_gemini_base_url!(GeminiDescriptionClient);

#[async_trait]
impl DescriptionService for GeminiDescriptionClient {
    async fn describe(&self, image: &UploadPayload) -> Result<String> {
        tracing::debug!(
            "Describing {} image ({} base64 chars) with {}",
            image.mime_type,
            image.image_data.len(),
            self.http.model()
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::Text {
                        text: prompts::SCENE_DESCRIPTION.to_string(),
                    },
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: image.mime_type.clone(),
                            data: image.image_data.clone(),
                        },
                    },
                ],
            }],
        };

        let response: GenerateContentResponse = self
            .http
            .call(Endpoint::GenerateContent, &request)
            .await?;

        match response.first_text() {
            Some(text) => Ok(text.to_string()),
            None => {
                let finish_reason = response
                    .candidates
                    .first()
                    .and_then(|c| c.finish_reason.as_deref())
                    .unwrap_or("none");
                Err(Error::AiProvider(format!(
                    "No text in Gemini description response ({} candidates, finish reason: {})",
                    response.candidates.len(),
                    finish_reason
                )))
            }
        }
    }
}
