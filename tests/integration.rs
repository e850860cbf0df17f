use catify::ai::{
    GeminiServiceFactory, MockDescriptionClient, MockGenerationClient, MockServiceFactory,
    ServiceFactory,
};
use catify::client::{SelectedFile, Uploader};
use catify::config::Config;
use catify::pipeline::Catifier;
use catify::web;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DESCRIPTION: &str = "a person waving, wearing a red jacket";

async fn spawn_server(config: Config, services: Arc<dyn ServiceFactory>) -> SocketAddr {
    let catifier = Arc::new(Catifier::new(Arc::new(config), services));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, web::router(catifier)).await.unwrap();
    });
    addr
}

fn endpoint(addr: SocketAddr) -> String {
    format!("http://{}{}", addr, web::CATIFY_PATH)
}

/// 100 KB file with a JPEG signature.
fn jpeg_100kb() -> SelectedFile {
    let mut bytes = vec![0u8; 100 * 1024];
    bytes[..4].copy_from_slice(&[0xFF, 0xD8, 0xFF, 0xE0]);
    SelectedFile {
        name: "waving.jpg".to_string(),
        mime_type: Some("image/jpeg".to_string()),
        bytes,
    }
}

async fn mock_gemini(generation_delay: Duration) -> MockServer {
    let gemini = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.0-flash:generateContent"))
        .and(header("x-goog-api-key", "integration-key"))
        .and(body_string_contains("\"mimeType\":\"image/jpeg\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "candidates": [{ "content": { "parts": [{ "text": DESCRIPTION }] } }]
        })))
        .mount(&gemini)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1beta/models/imagen-3.0-generate-002:predict"))
        .and(header("x-goog-api-key", "integration-key"))
        .and(body_string_contains(DESCRIPTION))
        .and(body_string_contains("\"sampleCount\":1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({
                    "predictions": [{ "bytesBase64Encoded": "AAAA", "mimeType": "image/png" }]
                }))
                .set_delay(generation_delay),
        )
        .mount(&gemini)
        .await;

    gemini
}

fn gemini_config(gemini: &MockServer) -> Config {
    Config {
        gemini_base_url: gemini.uri(),
        ..Config::default().with_api_key("integration-key")
    }
}

#[tokio::test]
async fn test_upload_to_display_end_to_end() {
    let gemini = mock_gemini(Duration::ZERO).await;
    let addr = spawn_server(
        gemini_config(&gemini),
        Arc::new(GeminiServiceFactory::new(reqwest::Client::new())),
    )
    .await;

    let mut uploader = Uploader::new(endpoint(addr));
    uploader.accept_file(jpeg_100kb()).unwrap();
    let url = uploader.submit().await.unwrap();

    assert_eq!(url, "data:image/png;base64,AAAA");
    let view = uploader.view();
    assert_eq!(view.result_src, "data:image/png;base64,AAAA");
    assert!(view.result_visible);
    assert!(view.save_visible);
    assert!(!view.spinner_visible);
    assert!(view.alert.is_none());

    let dir = tempfile::tempdir().unwrap();
    let saved = uploader.save(dir.path()).unwrap().unwrap();
    assert!(saved.ends_with("catified_image.png"));
}

#[tokio::test]
async fn test_generation_timeout_surfaces_generic_message() {
    let gemini = mock_gemini(Duration::from_millis(500)).await;
    let config = Config {
        generation_timeout: Duration::from_millis(50),
        ..gemini_config(&gemini)
    };
    let addr = spawn_server(
        config,
        Arc::new(GeminiServiceFactory::new(reqwest::Client::new())),
    )
    .await;

    let mut uploader = Uploader::new(endpoint(addr));
    uploader.accept_file(jpeg_100kb()).unwrap();
    uploader.submit().await.unwrap_err();

    let view = uploader.view();
    assert_eq!(view.alert, Some("Failed to generate the catified image."));
    assert!(!view.spinner_visible);
    assert!(!view.save_visible);
}

#[tokio::test]
async fn test_upstream_rejection_is_not_leaked_to_client() {
    let gemini = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(400).set_body_string("API key not valid: integration-key"),
        )
        .mount(&gemini)
        .await;

    let addr = spawn_server(
        gemini_config(&gemini),
        Arc::new(GeminiServiceFactory::new(reqwest::Client::new())),
    )
    .await;

    let mut uploader = Uploader::new(endpoint(addr));
    uploader.accept_file(jpeg_100kb()).unwrap();
    uploader.submit().await.unwrap_err();

    let alert = uploader.view().alert.unwrap().to_string();
    assert_eq!(alert, "Failed to analyze the uploaded image.");
    assert!(!alert.contains("integration-key"));
}

#[tokio::test]
async fn test_wrong_verb_over_the_wire() {
    let factory = MockServiceFactory::new(
        MockDescriptionClient::new(),
        MockGenerationClient::new(),
    );
    let addr = spawn_server(
        Config::default().with_api_key("key"),
        Arc::new(factory.clone()),
    )
    .await;

    let response = reqwest::Client::new()
        .get(endpoint(addr))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 405);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({ "error": "Method Not Allowed" }));
    assert_eq!(factory.describer.get_call_count(), 0);
    assert_eq!(factory.generator.get_call_count(), 0);
}

#[tokio::test]
async fn test_concurrent_invocations_are_independent() {
    let factory = MockServiceFactory::new(
        MockDescriptionClient::new().with_description(DESCRIPTION.to_string()),
        MockGenerationClient::new().with_image_response("AAAA".to_string()),
    );
    let addr = spawn_server(
        Config::default().with_api_key("key"),
        Arc::new(factory.clone()),
    )
    .await;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let url = endpoint(addr);
        tasks.push(tokio::spawn(async move {
            let mut uploader = Uploader::new(url);
            uploader.accept_file(jpeg_100kb()).unwrap();
            uploader.submit().await.unwrap()
        }));
    }

    for task in tasks {
        assert_eq!(task.await.unwrap(), "data:image/png;base64,AAAA");
    }
    assert_eq!(factory.describer.get_call_count(), 8);
    assert_eq!(factory.generator.get_call_count(), 8);
}
