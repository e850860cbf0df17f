macro_rules! impl_with_gemini_base_url {
    ($client:ty) => {
        impl $client {
            /// Point the client at a different Gemini host (proxies, test servers).
            pub fn with_base_url(mut self, base_url: String) -> Self {
                self.http = self.http.with_base_url(base_url);
                self
            }
        }
    };
}
pub(crate) use impl_with_gemini_base_url;

pub mod client;
pub mod describe;
pub mod imagen;
pub mod types;

pub use describe::GeminiDescriptionClient;
pub use imagen::GeminiImagenClient;

use super::{DescriptionService, GenerationService, ServiceFactory};
use crate::config::Config;

/// Builds Gemini clients per invocation on top of one shared connection pool.
#[derive(Clone, Default)]
pub struct GeminiServiceFactory {
    http_client: reqwest::Client,
}

impl GeminiServiceFactory {
    pub fn new(http_client: reqwest::Client) -> Self {
        Self { http_client }
    }
}

impl ServiceFactory for GeminiServiceFactory {
    fn describer(&self, api_key: &str, config: &Config) -> Box<dyn DescriptionService> {
        Box::new(
            GeminiDescriptionClient::new_with_client(
                api_key.to_string(),
                config.description_model.clone(),
                config.description_timeout,
                self.http_client.clone(),
            )
            .with_base_url(config.gemini_base_url.clone()),
        )
    }

    fn generator(&self, api_key: &str, config: &Config) -> Box<dyn GenerationService> {
        Box::new(
            GeminiImagenClient::new_with_client(
                api_key.to_string(),
                config.generation_model.clone(),
                config.generation_timeout,
                self.http_client.clone(),
            )
            .with_base_url(config.gemini_base_url.clone()),
        )
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use wiremock::matchers::{method, path_regex};
    use wiremock::MockBuilder;

    pub const GENERATE_CONTENT_PATH_REGEX: &str = r"^/v1beta/models/[^/]+:generateContent$";
    pub const PREDICT_PATH_REGEX: &str = r"^/v1beta/models/[^/]+:predict$";

    pub fn post_path_regex(regex: &str) -> MockBuilder {
        wiremock::Mock::given(method("POST")).and(path_regex(regex))
    }
}
