use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use futures_util::StreamExt;
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use message_log::codec::LineCodec;
use message_log::http::ws::REPLAY_DONE;
use message_log::http::{router, AppState};
use message_log::log::MessageLog;
use message_log::storage::FileStorage;
use message_log::store::MemoryStore;
use message_log::trace::{TraceId, TRACE_HEADER};

const FRAME_TIMEOUT: Duration = Duration::from_secs(3);

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn serve_log(log: Arc<MessageLog>) -> Result<SocketAddr> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let app = router(AppState::new(log, FileStorage::new(std::env::temp_dir()))?);
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(addr)
}

async fn next_frame(ws: &mut Client) -> Result<Message> {
    timeout(FRAME_TIMEOUT, ws.next())
        .await
        .map_err(|_| anyhow!("timed out waiting for frame"))?
        .context("stream ended early")?
        .context("websocket error")
}

async fn expect_text(ws: &mut Client) -> Result<String> {
    match next_frame(ws).await? {
        Message::Text(text) => Ok(text),
        other => Err(anyhow!("expected text frame, got {other:?}")),
    }
}

#[tokio::test]
async fn replays_last_ten_then_sentinel_then_close() -> Result<()> {
    let log = Arc::new(MessageLog::new(
        Arc::new(MemoryStore::new()),
        LineCodec::Timestamped,
    ));
    for i in 1..=12 {
        log.append("alice", &format!("note {i}"), TraceId::new())
            .await?;
    }
    let addr = serve_log(log).await?;

    let (mut ws, response) = connect_async(format!("ws://{addr}/ws")).await?;
    assert!(response.headers().contains_key(TRACE_HEADER));

    for expected_id in 3..=12 {
        let text = expect_text(&mut ws).await?;
        let frame: Value = serde_json::from_str(&text)?;
        assert_eq!(frame["id"], expected_id);
        assert_eq!(frame["user"], "alice");
        assert_eq!(frame["message"], format!("note {expected_id}"));
    }

    assert_eq!(expect_text(&mut ws).await?, REPLAY_DONE);
    let closing = next_frame(&mut ws).await?;
    assert!(matches!(closing, Message::Close(_)), "got {closing:?}");
    Ok(())
}

#[tokio::test]
async fn empty_log_sends_only_the_sentinel() -> Result<()> {
    let log = Arc::new(MessageLog::new(
        Arc::new(MemoryStore::new()),
        LineCodec::Timestamped,
    ));
    let addr = serve_log(log).await?;

    let (mut ws, _) = connect_async(format!("ws://{addr}/ws")).await?;
    assert_eq!(expect_text(&mut ws).await?, REPLAY_DONE);
    assert!(matches!(next_frame(&mut ws).await?, Message::Close(_)));
    Ok(())
}
