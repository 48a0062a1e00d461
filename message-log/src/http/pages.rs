//! Server-rendered HTML pages.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Extension;
use chrono::Local;
use minijinja::Environment;
use serde::Serialize;
use tracing::{error, info};

use crate::codec::TIMESTAMP_FORMAT;
use crate::error::{Error, Result};
use crate::message::Message;
use crate::trace::TraceId;

use super::AppState;

const INDEX_TEMPLATE: &str = "index.html";
const MESSAGES_TEMPLATE: &str = "messages.html";

/// Templates compiled into the binary.
pub struct Templates {
    env: Environment<'static>,
}

impl Templates {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template(INDEX_TEMPLATE, include_str!("../../templates/index.html"))?;
        env.add_template(
            MESSAGES_TEMPLATE,
            include_str!("../../templates/messages.html"),
        )?;
        Ok(Self { env })
    }

    pub fn render<S: Serialize>(&self, name: &str, context: S) -> Result<String> {
        let template = self.env.get_template(name)?;
        Ok(template.render(context)?)
    }
}

#[derive(Debug, Serialize)]
struct IndexPage {
    version: &'static str,
    trace_id: TraceId,
}

#[derive(Debug, Serialize)]
struct MessageRow {
    id: u32,
    user: String,
    message: String,
    timestamp: String,
}

impl From<Message> for MessageRow {
    fn from(message: Message) -> Self {
        Self {
            timestamp: message.formatted_timestamp(),
            id: message.id,
            user: message.user,
            message: message.text,
        }
    }
}

#[derive(Debug, Serialize)]
struct MessagesPage {
    messages: Vec<MessageRow>,
    generated_at: String,
    trace_id: TraceId,
}

/// Internal failure while producing a page. Answers a plain-text 500.
pub struct PageError;

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
    }
}

fn page_error(err: Error, what: &str, trace: TraceId) -> PageError {
    error!(trace_id = %trace, error = %err, "failed to {what}");
    PageError
}

pub async fn index(
    State(state): State<AppState>,
    Extension(trace): Extension<TraceId>,
) -> std::result::Result<Html<String>, PageError> {
    let page = IndexPage {
        version: env!("CARGO_PKG_VERSION"),
        trace_id: trace,
    };
    let html = state
        .templates
        .render(INDEX_TEMPLATE, page)
        .map_err(|err| page_error(err, "render index page", trace))?;

    info!(trace_id = %trace, "served index page");
    Ok(Html(html))
}

pub async fn messages(
    State(state): State<AppState>,
    Extension(trace): Extension<TraceId>,
) -> std::result::Result<Html<String>, PageError> {
    let messages = state
        .log
        .all(trace)
        .await
        .map_err(|err| page_error(err, "read messages for page", trace))?;
    let count = messages.len();

    let page = MessagesPage {
        messages: messages.into_iter().map(MessageRow::from).collect(),
        generated_at: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        trace_id: trace,
    };
    let html = state
        .templates
        .render(MESSAGES_TEMPLATE, page)
        .map_err(|err| page_error(err, "render messages page", trace))?;

    info!(trace_id = %trace, message_count = count, "served messages page");
    Ok(Html(html))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn messages_template_escapes_content() {
        let templates = Templates::new().expect("templates compile");
        let trace = TraceId::new();
        let page = MessagesPage {
            messages: vec![MessageRow::from(Message {
                id: 1,
                user: "mallory".into(),
                text: "<script>alert(1)</script>".into(),
                timestamp: NaiveDate::from_ymd_opt(2024, 5, 1)
                    .and_then(|d| d.and_hms_opt(9, 30, 0))
                    .expect("valid date"),
                trace_id: trace,
            })],
            generated_at: "2024-05-01 09:31:00".into(),
            trace_id: trace,
        };

        let html = templates.render(MESSAGES_TEMPLATE, page).expect("render");
        assert!(html.contains("mallory"));
        assert!(html.contains("2024-05-01 09:30:00"));
        assert!(html.contains(&trace.to_string()));
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;"));
    }

    #[test]
    fn messages_template_handles_empty_log() {
        let templates = Templates::new().expect("templates compile");
        let page = MessagesPage {
            messages: Vec::new(),
            generated_at: "2024-05-01 09:31:00".into(),
            trace_id: TraceId::new(),
        };
        let html = templates.render(MESSAGES_TEMPLATE, page).expect("render");
        assert!(html.contains("No messages yet"));
    }
}
