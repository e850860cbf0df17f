use crate::config::DEFAULT_GEMINI_BASE_URL;
use crate::{Error, Result};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

/// Model methods of the `v1beta` REST surface that catify calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Text and vision completions.
    GenerateContent,
    /// Imagen image synthesis.
    Predict,
}

impl Endpoint {
    fn method(self) -> &'static str {
        match self {
            Endpoint::GenerateContent => "generateContent",
            Endpoint::Predict => "predict",
        }
    }
}

/// Gemini REST transport for one model, shared by the description and Imagen clients.
pub struct GeminiHttpClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    timeout: Duration,
}

impl GeminiHttpClient {
    /// `model` may be given bare (`gemini-2.0-flash`) or as `models/gemini-2.0-flash`.
    pub fn new(api_key: String, model: String, timeout: Duration) -> Self {
        Self::new_with_client(api_key, model, timeout, Client::new())
    }

    pub fn new_with_client(
        api_key: String,
        model: String,
        timeout: Duration,
        client: Client,
    ) -> Self {
        let model = match model.strip_prefix("models/") {
            Some(bare) => bare.to_string(),
            None => model,
        };

        Self {
            client,
            api_key,
            model,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout,
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!(
            "{}/v1beta/models/{}:{}",
            self.base_url,
            self.model,
            endpoint.method()
        )
    }

    /// POST `request` to `endpoint` under this client's timeout and decode the JSON reply.
    pub async fn call<Req: Serialize, Resp: DeserializeOwned>(
        &self,
        endpoint: Endpoint,
        request: &Req,
    ) -> Result<Resp> {
        let response = self
            .client
            .post(self.url(endpoint))
            .timeout(self.timeout)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;

        let response = self.check_status(endpoint, response).await?;

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(endpoint, e))?;
        serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Unparsable {} reply: {}\nBody: {}", endpoint.method(), e, body);
            Error::AiProvider(format!("Unparsable {} reply: {}", endpoint.method(), e))
        })
    }

    /// Non-success replies keep the upstream body in the error for the server log.
    async fn check_status(&self, endpoint: Endpoint, response: Response) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            "{} on {} returned {}: {}",
            endpoint.method(),
            self.model,
            status,
            body
        );
        Err(Error::AiProvider(format!(
            "{} returned {}: {}",
            endpoint.method(),
            status,
            body
        )))
    }

    fn transport_error(&self, endpoint: Endpoint, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            tracing::error!(
                "{} on {} timed out after {:?}",
                endpoint.method(),
                self.model,
                self.timeout
            );
            Error::Timeout(self.timeout)
        } else {
            tracing::error!("{} on {} failed: {}", endpoint.method(), self.model, e);
            Error::Http(e)
        }
    }
}
