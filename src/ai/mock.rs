use super::{DescriptionService, GeneratedImage, GenerationService, ServiceFactory};
use crate::config::Config;
use crate::models::UploadPayload;
use crate::{Error, Result};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// A 1x1 transparent PNG.
pub const PLACEHOLDER_PNG_BASE64: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

type Reply = std::result::Result<String, String>;

fn next_reply(replies: &Mutex<Vec<Reply>>, count: usize) -> Option<Reply> {
    let replies = replies.lock().unwrap();
    if replies.is_empty() {
        None
    } else {
        Some(replies[(count - 1) % replies.len()].clone())
    }
}

#[derive(Clone)]
pub struct MockDescriptionClient {
    replies: Arc<Mutex<Vec<Reply>>>,
    received: Arc<Mutex<Vec<UploadPayload>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockDescriptionClient {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            received: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_description(self, description: String) -> Self {
        self.replies.lock().unwrap().push(Ok(description));
        self
    }

    pub fn with_failure(self, message: String) -> Self {
        self.replies.lock().unwrap().push(Err(message));
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    pub fn received(&self) -> Vec<UploadPayload> {
        self.received.lock().unwrap().clone()
    }
}

impl Default for MockDescriptionClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DescriptionService for MockDescriptionClient {
    async fn describe(&self, image: &UploadPayload) -> Result<String> {
        let count = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count
        };
        self.received.lock().unwrap().push(image.clone());

        match next_reply(&self.replies, count) {
            Some(Ok(description)) => Ok(description),
            Some(Err(message)) => Err(Error::AiProvider(message)),
            None => Ok("The subject stands in a sunlit park, facing the camera".to_string()),
        }
    }
}

#[derive(Clone)]
pub struct MockGenerationClient {
    replies: Arc<Mutex<Vec<Reply>>>,
    prompts: Arc<Mutex<Vec<String>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockGenerationClient {
    pub fn new() -> Self {
        Self {
            replies: Arc::new(Mutex::new(Vec::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_image_response(self, image_base64: String) -> Self {
        self.replies.lock().unwrap().push(Ok(image_base64));
        self
    }

    pub fn with_failure(self, message: String) -> Self {
        self.replies.lock().unwrap().push(Err(message));
        self
    }

    pub fn get_call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// Prompts received so far, in call order.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

impl Default for MockGenerationClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GenerationService for MockGenerationClient {
    async fn generate(&self, prompt: &str) -> Result<GeneratedImage> {
        let count = {
            let mut count = self.call_count.lock().unwrap();
            *count += 1;
            *count
        };
        self.prompts.lock().unwrap().push(prompt.to_string());

        match next_reply(&self.replies, count) {
            Some(Ok(image_base64)) => Ok(GeneratedImage {
                image_base64,
                mime_type: Some("image/png".to_string()),
            }),
            Some(Err(message)) => Err(Error::AiProvider(message)),
            None => Ok(GeneratedImage {
                image_base64: PLACEHOLDER_PNG_BASE64.to_string(),
                mime_type: Some("image/png".to_string()),
            }),
        }
    }
}

/// Hands out clones of the same mocks, so call counts survive across invocations.
#[derive(Clone, Default)]
pub struct MockServiceFactory {
    pub describer: MockDescriptionClient,
    pub generator: MockGenerationClient,
    api_keys: Arc<Mutex<Vec<String>>>,
}

impl MockServiceFactory {
    pub fn new(describer: MockDescriptionClient, generator: MockGenerationClient) -> Self {
        Self {
            describer,
            generator,
            api_keys: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Credentials the pipeline built services with.
    pub fn api_keys(&self) -> Vec<String> {
        self.api_keys.lock().unwrap().clone()
    }
}

impl ServiceFactory for MockServiceFactory {
    fn describer(&self, api_key: &str, _config: &Config) -> Box<dyn DescriptionService> {
        self.api_keys.lock().unwrap().push(api_key.to_string());
        Box::new(self.describer.clone())
    }

    fn generator(&self, _api_key: &str, _config: &Config) -> Box<dyn GenerationService> {
        Box::new(self.generator.clone())
    }
}
