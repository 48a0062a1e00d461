use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Request};
use axum::http::header::USER_AGENT;
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{info, info_span, Instrument};

use crate::trace::{TraceId, TRACE_HEADER};

/// Assigns a fresh [`TraceId`] to the request, logs it, and returns it in
/// the `X-Trace-ID` header.
///
/// Handlers read the id with `Extension<TraceId>`.
pub async fn trace_requests(mut req: Request, next: Next) -> Response {
    let trace = TraceId::new();
    req.extensions_mut().insert(trace);

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let remote_addr = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());
    let user_agent = req
        .headers()
        .get(USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
        .to_string();

    let span = info_span!("http_request", trace_id = %trace, %method, %path);

    async move {
        info!(%remote_addr, %user_agent, "incoming request");
        let mut response = next.run(req).await;
        if let Ok(value) = HeaderValue::from_str(&trace.to_string()) {
            response.headers_mut().insert(TRACE_HEADER, value);
        }
        response
    }
    .instrument(span)
    .await
}
