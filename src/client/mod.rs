//! Uploader/invoker: stages a picked image, posts it to the catify endpoint and
//! tracks what the user should see.
//!
//! All state lives in [`UiState`]; [`render`] turns it into a [`View`]. A front
//! end (the `catify_upload` binary, or anything else) only calls the
//! operations here and draws the view.

pub mod state;

pub use state::{render, Phase, UiState, View};

use crate::ai::mime::detect_image_mime;
use crate::config::DEFAULT_MAX_UPLOAD_BYTES;
use crate::models::{SubmitResponse, UploadPayload};
use crate::{Error, Result};
use base64::Engine as _;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const SAVE_FILENAME: &str = "catified_image.png";
pub const NO_IMAGE_MESSAGE: &str = "Please upload an image first!";
pub const MISSING_IMAGE_MESSAGE: &str = "Image data was not returned from the server.";
pub const GENERIC_FAILURE_MESSAGE: &str =
    "An error occurred during image processing. Please try again.";

const RESULT_DATA_URL_PREFIX: &str = "data:image/png;base64,";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// A file the user picked.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    /// Type as declared by whatever picked the file; sniffed when absent.
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub async fn from_path(path: &Path, mime_type: Option<String>) -> Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            name,
            mime_type,
            bytes,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

pub struct Uploader {
    http: reqwest::Client,
    endpoint: String,
    max_upload_bytes: usize,
    timeout: Duration,
    state: UiState,
}

impl Uploader {
    pub fn new(endpoint: String) -> Self {
        Self::new_with_client(endpoint, reqwest::Client::new())
    }

    pub fn new_with_client(endpoint: String, http: reqwest::Client) -> Self {
        Self {
            http,
            endpoint,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            timeout: DEFAULT_REQUEST_TIMEOUT,
            state: UiState::default(),
        }
    }

    pub fn with_max_upload_bytes(mut self, max_upload_bytes: usize) -> Self {
        self.max_upload_bytes = max_upload_bytes;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn state(&self) -> &UiState {
        &self.state
    }

    pub fn view(&self) -> View<'_> {
        render(&self.state)
    }

    pub fn dismiss_alert(&mut self) {
        self.state.alert = None;
    }

    fn show_alert(&mut self, message: String) {
        info!("Alert: {}", message);
        self.state.alert = Some(message);
    }

    /// Stage `file` for submission. Oversized or unrecognized files are
    /// rejected without touching the network and the file input is reset.
    pub fn accept_file(&mut self, file: SelectedFile) -> Result<()> {
        if file.size() > self.max_upload_bytes {
            let message = format!(
                "Image is too large. Please select a file smaller than {}.",
                format_limit(self.max_upload_bytes)
            );
            self.state.selected_file = None;
            self.show_alert(message.clone());
            return Err(Error::Upload(message));
        }

        let mime_type = match file
            .mime_type
            .filter(|m| !m.trim().is_empty())
            .or_else(|| detect_image_mime(&file.bytes).map(str::to_string))
        {
            Some(mime_type) => mime_type,
            None => {
                let message = "Unrecognized image type. Please select a JPEG, PNG, WebP or GIF image."
                    .to_string();
                self.state.selected_file = None;
                self.show_alert(message.clone());
                return Err(Error::Upload(message));
            }
        };

        let image_data = base64::engine::general_purpose::STANDARD.encode(&file.bytes);
        debug!(
            "Staged {} ({} bytes, {})",
            file.name,
            file.bytes.len(),
            mime_type
        );

        self.state.preview_url = Some(format!("data:{};base64,{}", mime_type, image_data));
        self.state.staged = Some(UploadPayload::new(image_data, mime_type));
        self.state.selected_file = Some(file.name);
        self.state.phase = Phase::Ready;
        Ok(())
    }

    /// The user cleared the file picker.
    pub fn clear_selection(&mut self) {
        self.state.selected_file = None;
        self.state.preview_url = None;
        self.state.staged = None;
    }

    /// Send the staged upload and return the data URL of the generated image.
    ///
    /// Whatever happens, the loading phase is left: the state ends in either
    /// `Success` or `Failed`, with an alert on failure.
    pub async fn submit(&mut self) -> Result<String> {
        let upload = match self.state.staged.clone() {
            Some(upload) => upload,
            None => {
                self.show_alert(NO_IMAGE_MESSAGE.to_string());
                return Err(Error::NoImage);
            }
        };

        self.state.phase = Phase::Loading;
        let outcome = self.request(&upload).await;

        match outcome {
            Ok(image_url) => {
                self.state.phase = Phase::Success {
                    image_url: image_url.clone(),
                };
                Ok(image_url)
            }
            Err(e) => {
                error!("Error during catify process: {}", e);
                let message = match &e {
                    Error::Server(message) => message.clone(),
                    _ => GENERIC_FAILURE_MESSAGE.to_string(),
                };
                self.state.phase = Phase::Failed;
                self.show_alert(message);
                Err(e)
            }
        }
    }

    async fn request(&self, upload: &UploadPayload) -> Result<String> {
        let response = self
            .http
            .post(&self.endpoint)
            .timeout(self.timeout)
            .json(upload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let fallback = format!(
                "Request failed: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or_default()
            )
            .trim_end()
            .to_string();

            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error.filter(|m| !m.is_empty()).unwrap_or(fallback),
                Err(_) => {
                    warn!("Could not parse error response as JSON.");
                    fallback
                }
            };
            return Err(Error::Server(message));
        }

        let body: SubmitResponse = response.json().await?;
        match body.image_base64.filter(|b64| !b64.is_empty()) {
            Some(image_base64) => Ok(format!("{}{}", RESULT_DATA_URL_PREFIX, image_base64)),
            None => Err(Error::Server(MISSING_IMAGE_MESSAGE.to_string())),
        }
    }

    /// Write the displayed result to `dir`. Returns `None` when there is no
    /// result to save.
    pub fn save(&self, dir: &Path) -> Result<Option<PathBuf>> {
        let image_url = match &self.state.phase {
            Phase::Success { image_url } => image_url,
            _ => {
                debug!("Nothing to save");
                return Ok(None);
            }
        };

        let encoded = image_url
            .strip_prefix(RESULT_DATA_URL_PREFIX)
            .ok_or_else(|| Error::ResultImage(format!("not a PNG data URL: {}", image_url)))?;
        let bytes = base64::engine::general_purpose::STANDARD.decode(encoded)?;

        let path = dir.join(SAVE_FILENAME);
        std::fs::write(&path, bytes)?;
        info!("Saved catified image to {}", path.display());
        Ok(Some(path))
    }
}

fn format_limit(bytes: usize) -> String {
    const MIB: usize = 1024 * 1024;
    if bytes >= MIB && bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ENDPOINT_PATH: &str = "/api/catify";

    fn jpeg(size: usize) -> SelectedFile {
        let mut bytes = vec![0u8; size];
        bytes[..4].copy_from_slice(&[0xFF, 0xD8, 0xFF, 0xE0]);
        SelectedFile {
            name: "photo.jpg".to_string(),
            mime_type: Some("image/jpeg".to_string()),
            bytes,
        }
    }

    fn uploader(server: &MockServer) -> Uploader {
        Uploader::new(format!("{}{}", server.uri(), ENDPOINT_PATH))
    }

    #[tokio::test]
    async fn test_oversized_file_is_rejected_without_network() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut uploader = uploader(&server);
        uploader.accept_file(jpeg(1024)).unwrap();
        assert_eq!(uploader.state().selected_file.as_deref(), Some("photo.jpg"));

        let err = uploader
            .accept_file(jpeg(DEFAULT_MAX_UPLOAD_BYTES + 1))
            .unwrap_err();
        assert!(matches!(err, Error::Upload(_)));
        assert!(uploader.state().selected_file.is_none());
        assert_eq!(
            uploader.view().alert,
            Some("Image is too large. Please select a file smaller than 4MB.")
        );
    }

    #[test]
    fn test_file_at_limit_is_accepted() {
        let mut uploader = Uploader::new("http://unused".to_string()).with_max_upload_bytes(16);
        uploader.accept_file(jpeg(16)).unwrap();

        let staged = uploader.state().staged.as_ref().unwrap();
        assert_eq!(staged.mime_type, "image/jpeg");
        assert_eq!(staged.decoded_len().unwrap(), 16);
        assert_eq!(uploader.state().phase, Phase::Ready);
        assert!(uploader
            .view()
            .preview_src
            .starts_with("data:image/jpeg;base64,/9j/"));
    }

    #[test]
    fn test_missing_mime_type_is_sniffed() {
        let mut uploader = Uploader::new("http://unused".to_string());
        let mut file = jpeg(8);
        file.mime_type = None;

        uploader.accept_file(file).unwrap();
        assert_eq!(
            uploader.state().staged.as_ref().unwrap().mime_type,
            "image/jpeg"
        );
    }

    #[tokio::test]
    async fn test_submit_without_upload_fails_fast() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let mut uploader = uploader(&server);
        let err = uploader.submit().await.unwrap_err();

        assert!(matches!(err, Error::NoImage));
        assert_eq!(uploader.view().alert, Some(NO_IMAGE_MESSAGE));
        assert!(!uploader.view().spinner_visible);
    }

    #[tokio::test]
    async fn test_submit_success_reveals_image_and_save() {
        let server = MockServer::start().await;
        let file = jpeg(64);
        let expected_body = serde_json::json!({
            "imageBase64": base64::engine::general_purpose::STANDARD.encode(&file.bytes),
            "mimeType": "image/jpeg"
        });

        Mock::given(method("POST"))
            .and(path(ENDPOINT_PATH))
            .and(body_json(expected_body))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "imageBase64": "AAAA" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let mut uploader = uploader(&server);
        uploader.accept_file(file).unwrap();
        let url = uploader.submit().await.unwrap();

        assert_eq!(url, "data:image/png;base64,AAAA");
        let view = uploader.view();
        assert_eq!(view.result_src, "data:image/png;base64,AAAA");
        assert!(view.save_visible);
        assert!(!view.spinner_visible);
        assert!(view.alert.is_none());
    }

    #[tokio::test]
    async fn test_server_error_message_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(ENDPOINT_PATH))
            .respond_with(ResponseTemplate::new(500).set_body_json(
                serde_json::json!({ "error": "Failed to analyze the uploaded image." }),
            ))
            .mount(&server)
            .await;

        let mut uploader = uploader(&server);
        uploader.accept_file(jpeg(64)).unwrap();
        uploader.submit().await.unwrap_err();

        let view = uploader.view();
        assert_eq!(view.alert, Some("Failed to analyze the uploaded image."));
        assert_eq!(view.result_src, state::ERROR_PLACEHOLDER_URL);
        assert!(view.result_visible);
        assert!(!view.save_visible);
        assert!(!view.spinner_visible);
    }

    #[tokio::test]
    async fn test_unparsable_error_falls_back_to_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>Bad Gateway</html>"))
            .mount(&server)
            .await;

        let mut uploader = uploader(&server);
        uploader.accept_file(jpeg(64)).unwrap();
        uploader.submit().await.unwrap_err();

        assert_eq!(
            uploader.view().alert,
            Some("Request failed: 502 Bad Gateway")
        );
        assert_eq!(uploader.state().phase, Phase::Failed);
    }

    #[tokio::test]
    async fn test_success_without_image_is_a_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let mut uploader = uploader(&server);
        uploader.accept_file(jpeg(64)).unwrap();
        uploader.submit().await.unwrap_err();

        assert_eq!(uploader.view().alert, Some(MISSING_IMAGE_MESSAGE));
        assert_eq!(uploader.state().phase, Phase::Failed);
    }

    #[tokio::test]
    async fn test_unreachable_server_uses_generic_message() {
        let mut uploader = Uploader::new("http://127.0.0.1:1/api/catify".to_string());
        uploader.accept_file(jpeg(64)).unwrap();
        uploader.submit().await.unwrap_err();

        assert_eq!(uploader.view().alert, Some(GENERIC_FAILURE_MESSAGE));
        assert!(!uploader.view().spinner_visible);
    }

    #[tokio::test]
    async fn test_save_writes_result_and_is_noop_without_one() {
        let dir = tempfile::tempdir().unwrap();
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "imageBase64": "AAAA" })),
            )
            .mount(&server)
            .await;

        let mut uploader = uploader(&server);
        assert!(uploader.save(dir.path()).unwrap().is_none());

        uploader.accept_file(jpeg(64)).unwrap();
        uploader.submit().await.unwrap();
        let saved = uploader.save(dir.path()).unwrap().unwrap();

        assert_eq!(saved, dir.path().join(SAVE_FILENAME));
        assert_eq!(std::fs::read(saved).unwrap(), vec![0, 0, 0]);
    }

    #[test]
    fn test_save_rejects_non_png_result() {
        let dir = tempfile::tempdir().unwrap();
        let mut uploader = Uploader::new("http://unused".to_string());
        uploader.state.phase = Phase::Success {
            image_url: "https://example.com/cat.png".to_string(),
        };

        let err = uploader.save(dir.path()).unwrap_err();
        assert!(matches!(err, Error::ResultImage(_)));
        assert!(!dir.path().join(SAVE_FILENAME).exists());
    }

    #[test]
    fn test_clear_selection_restores_placeholder() {
        let mut uploader = Uploader::new("http://unused".to_string());
        uploader.accept_file(jpeg(8)).unwrap();
        uploader.clear_selection();

        assert!(uploader.state().staged.is_none());
        assert_eq!(uploader.view().preview_src, state::UPLOAD_PLACEHOLDER_URL);
    }

    #[test]
    fn test_dismiss_alert_keeps_state() {
        let mut uploader = Uploader::new("http://unused".to_string()).with_max_upload_bytes(4);
        uploader.accept_file(jpeg(8)).unwrap_err();
        assert!(uploader.view().alert.is_some());

        uploader.dismiss_alert();
        assert!(uploader.view().alert.is_none());
        assert_eq!(uploader.state().phase, Phase::Idle);
    }

    #[test]
    fn test_format_limit() {
        assert_eq!(format_limit(4 * 1024 * 1024), "4MB");
        assert_eq!(format_limit(1500), "1500 bytes");
    }
}
