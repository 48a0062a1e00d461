//! JSON endpoints: messages, health and file storage.
//!
//! Every JSON body uses one envelope, `{success, data | error, trace_id}`,
//! except `/health`, which answers with the bare status object.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, warn};

use crate::error::Error;
use crate::message::{CreateMessageRequest, Message};
use crate::trace::TraceId;

use super::AppState;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub trace_id: TraceId,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, trace: TraceId) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
            trace_id: trace,
        })
    }
}

/// Failure answered with the error envelope.
///
/// Server-side causes are logged in full; the client only sees `message`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    trace: TraceId,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>, trace: TraceId) -> Self {
        Self {
            status,
            message: message.into(),
            trace,
        }
    }

    pub fn bad_request(message: impl Into<String>, trace: TraceId) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message, trace)
    }

    /// Maps a library error: caller mistakes become 400 with their own
    /// message, everything else becomes 500 with `internal_message`.
    fn from_error(err: Error, internal_message: &str, trace: TraceId) -> Self {
        match err {
            Error::Validation(message) => Self::bad_request(message, trace),
            Error::InvalidPath(path) => Self::bad_request(
                format!("file_path '{path}' must be a relative path inside the storage directory"),
                trace,
            ),
            other => {
                error!(trace_id = %trace, error = %other, "{internal_message}");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, internal_message, trace)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.message),
            trace_id: self.trace,
        };
        (self.status, Json(body)).into_response()
    }
}

pub async fn create_message(
    State(state): State<AppState>,
    Extension(trace): Extension<TraceId>,
    payload: Result<Json<CreateMessageRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Message>>), ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(trace_id = %trace, error = %rejection, "failed to decode request body");
        ApiError::bad_request("Invalid JSON payload", trace)
    })?;

    let message = state
        .log
        .append(&request.user, &request.message, trace)
        .await
        .map_err(|err| ApiError::from_error(err, "Failed to save message", trace))?;

    info!(trace_id = %trace, user = %message.user, message_id = message.id, "message created");
    Ok((StatusCode::CREATED, ApiResponse::ok(message, trace)))
}

pub async fn list_messages(
    State(state): State<AppState>,
    Extension(trace): Extension<TraceId>,
) -> Result<Json<ApiResponse<Vec<Message>>>, ApiError> {
    let messages = state
        .log
        .all(trace)
        .await
        .map_err(|err| ApiError::from_error(err, "Failed to read messages", trace))?;

    info!(trace_id = %trace, count = messages.len(), "messages retrieved");
    Ok(ApiResponse::ok(messages, trace))
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Local>,
    pub version: String,
}

pub async fn health() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "healthy".to_string(),
        timestamp: Local::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
pub struct FileRequest {
    #[serde(default)]
    pub file_path: String,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub action: String,
}

pub async fn files(
    State(state): State<AppState>,
    Extension(trace): Extension<TraceId>,
    payload: Result<Json<FileRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Value>>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        warn!(trace_id = %trace, error = %rejection, "failed to decode request body");
        ApiError::bad_request("Invalid JSON payload", trace)
    })?;

    if request.file_path.is_empty() || request.action.is_empty() {
        return Err(ApiError::bad_request(
            "file_path and action are required",
            trace,
        ));
    }

    match request.action.as_str() {
        "save" => {
            if request.data.is_empty() {
                return Err(ApiError::bad_request(
                    "data is required for save action",
                    trace,
                ));
            }
            state
                .files
                .save(&request.file_path, &request.data, trace)
                .await
                .map_err(|err| ApiError::from_error(err, "Failed to save file", trace))?;
            Ok(ApiResponse::ok(
                json!({
                    "message": "File saved successfully",
                    "file_path": request.file_path,
                }),
                trace,
            ))
        }
        "read" => {
            let content = state
                .files
                .read(&request.file_path, trace)
                .await
                .map_err(|err| ApiError::from_error(err, "Failed to read file", trace))?;
            Ok(ApiResponse::ok(
                json!({
                    "content": content,
                    "file_path": request.file_path,
                }),
                trace,
            ))
        }
        _ => Err(ApiError::bad_request(
            "action must be 'save' or 'read'",
            trace,
        )),
    }
}

pub async fn method_not_allowed(Extension(trace): Extension<TraceId>) -> ApiError {
    ApiError::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed", trace)
}
