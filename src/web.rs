//! HTTP surface: routes every catify request to [`Catifier::handle`].

use crate::error::ErrorKind;
use crate::models::ErrorEnvelope;
use crate::pipeline::Catifier;
use axum::extract::{Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;
use std::any::Any;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

pub const CATIFY_PATH: &str = "/api/catify";
/// Path the static front end posts to.
pub const LEGACY_CATIFY_PATH: &str = "/.netlify/functions/catify";

/// Every method is routed so that wrong verbs still get the JSON envelope.
pub fn router(catifier: Arc<Catifier>) -> Router {
    Router::new()
        .route(CATIFY_PATH, any(catify_handler))
        .route(LEGACY_CATIFY_PATH, any(catify_handler))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TraceLayer::new_for_http())
        .with_state(catifier)
}

async fn catify_handler(State(catifier): State<Arc<Catifier>>, request: Request) -> Response {
    catifier.handle(request).await
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };
    error!("Catify handler panicked: {}", detail);

    let body = serde_json::to_string(&ErrorEnvelope {
        error: ErrorKind::Internal.public_message().to_string(),
    })
    .unwrap_or_default();
    (
        ErrorKind::Internal.status(),
        [(CONTENT_TYPE, "application/json")],
        body,
    )
        .into_response()
}

pub async fn serve(addr: SocketAddr, catifier: Arc<Catifier>) -> Result<(), anyhow::Error> {
    let app = router(catifier);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Starting server on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
