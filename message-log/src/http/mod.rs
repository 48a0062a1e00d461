//! HTTP front-end: REST API, HTML pages and the WebSocket replay.
//!
//! [`router`] assembles every route behind the trace middleware, which gives
//! each request a fresh [`TraceId`](crate::trace::TraceId) and echoes it in
//! the `X-Trace-ID` response header.

pub mod api;
pub mod middleware;
pub mod pages;
pub mod ws;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::error::Result;
use crate::log::MessageLog;
use crate::storage::FileStorage;

pub use pages::Templates;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub log: Arc<MessageLog>,
    pub files: FileStorage,
    pub templates: Arc<Templates>,
}

impl AppState {
    pub fn new(log: Arc<MessageLog>, files: FileStorage) -> Result<Self> {
        Ok(Self {
            log,
            files,
            templates: Arc::new(Templates::new()?),
        })
    }
}

/// Builds the complete application router.
pub fn router(state: AppState) -> Router {
    let messages = get(api::list_messages)
        .post(api::create_message)
        .fallback(api::method_not_allowed);
    let health = get(api::health).fallback(api::method_not_allowed);
    let files = post(api::files).fallback(api::method_not_allowed);

    Router::new()
        .route("/", get(pages::index))
        .route("/web/messages", get(pages::messages))
        .route("/messages", messages.clone())
        .route("/api/messages", messages)
        .route("/health", health.clone())
        .route("/api/health", health)
        .route("/files", files.clone())
        .route("/api/files", files)
        .route("/ws", get(ws::replay))
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(middleware::trace_requests))
        .with_state(state)
}
