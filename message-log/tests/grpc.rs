use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tonic::Code;

use message_log::codec::LineCodec;
use message_log::grpc::{self, GrpcClient};
use message_log::log::MessageLog;
use message_log::store::MemoryStore;

struct RunningServer {
    addr: SocketAddr,
    log: Arc<MessageLog>,
    stop: oneshot::Sender<()>,
    task: JoinHandle<Result<(), tonic::transport::Error>>,
}

async fn start_server() -> Result<RunningServer> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let log = Arc::new(MessageLog::new(
        Arc::new(MemoryStore::new()),
        LineCodec::Timestamped,
    ));

    let (stop, stop_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(grpc::serve(listener, Arc::clone(&log), async move {
        let _ = stop_rx.await;
    }));

    Ok(RunningServer {
        addr,
        log,
        stop,
        task,
    })
}

impl RunningServer {
    async fn shutdown(self) -> Result<()> {
        let _ = self.stop.send(());
        timeout(Duration::from_secs(3), self.task).await???;
        Ok(())
    }
}

#[tokio::test]
async fn save_then_get_last10() -> Result<()> {
    let server = start_server().await?;
    let mut client = GrpcClient::connect(format!("http://{}", server.addr)).await?;

    for i in 0..12 {
        client.save("alice", &format!("message {i}")).await?;
    }

    let messages = client.last10().await?;
    assert_eq!(messages.len(), 10);
    assert_eq!(messages[0].id, 3);
    assert_eq!(messages[0].message, "message 2");
    assert_eq!(messages[9].id, 12);
    assert_eq!(messages[9].user, "alice");
    assert_eq!(messages[9].timestamp.len(), "2024-05-01 12:00:00".len());
    assert_eq!(messages[9].trace_id.len(), 36);

    assert_eq!(server.log.read_all().await?.len(), 12);
    server.shutdown().await
}

#[tokio::test]
async fn empty_fields_are_invalid_argument() -> Result<()> {
    let server = start_server().await?;
    let mut client = GrpcClient::connect(format!("http://{}", server.addr)).await?;

    let status = client
        .save("", "hi")
        .await
        .expect_err("empty user must be rejected");
    assert_eq!(status.code(), Code::InvalidArgument);
    assert_eq!(status.message(), "User and message are required");

    assert!(client.last10().await?.is_empty());
    server.shutdown().await
}

#[tokio::test]
async fn grpc_sees_messages_written_elsewhere() -> Result<()> {
    let server = start_server().await?;
    server
        .log
        .append("bob", "via http", message_log::trace::TraceId::new())
        .await?;

    let mut client = GrpcClient::connect(format!("http://{}", server.addr)).await?;
    let messages = client.last10().await?;
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].user, "bob");
    assert_eq!(messages[0].message, "via http");
    server.shutdown().await
}
