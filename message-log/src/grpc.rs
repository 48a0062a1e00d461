//! gRPC front-end over the same [`MessageLog`] the HTTP server uses.

use std::future::Future;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio_stream::wrappers::TcpListenerStream;
use tonic::transport::{Channel, Server};
use tonic::{Request, Response, Status};
use tracing::{error, info};

use crate::log::{MessageLog, RECENT_LIMIT};
use crate::message::Message;
use crate::trace::TraceId;

pub mod pb {
    tonic::include_proto!("messagelog.v1");
}

use pb::message_service_client::MessageServiceClient;
use pb::message_service_server::{MessageService, MessageServiceServer};

impl TryFrom<Message> for pb::Message {
    type Error = Status;

    fn try_from(message: Message) -> Result<Self, Self::Error> {
        let id = i32::try_from(message.id)
            .map_err(|_| Status::out_of_range(format!("message id {} exceeds i32", message.id)))?;
        Ok(Self {
            id,
            timestamp: message.formatted_timestamp(),
            trace_id: message.trace_id.to_string(),
            user: message.user,
            message: message.text,
        })
    }
}

pub struct GrpcMessageService {
    log: Arc<MessageLog>,
}

impl GrpcMessageService {
    pub fn new(log: Arc<MessageLog>) -> Self {
        Self { log }
    }
}

#[tonic::async_trait]
impl MessageService for GrpcMessageService {
    async fn save(
        &self,
        request: Request<pb::SaveMessageRequest>,
    ) -> Result<Response<pb::Empty>, Status> {
        let trace = TraceId::new();
        let request = request.into_inner();

        match self.log.append(&request.user, &request.message, trace).await {
            Ok(message) => {
                info!(trace_id = %trace, user = %message.user, message_id = message.id, "grpc save");
                Ok(Response::new(pb::Empty {}))
            }
            Err(err) if err.is_client_error() => Err(Status::invalid_argument(err.to_string())),
            Err(err) => {
                error!(trace_id = %trace, error = %err, "grpc save failed");
                Err(Status::internal("Failed to save message"))
            }
        }
    }

    async fn get_last10(
        &self,
        _request: Request<pb::Empty>,
    ) -> Result<Response<pb::GetLast10Response>, Status> {
        let trace = TraceId::new();
        let messages = self.log.last_n(RECENT_LIMIT, trace).await.map_err(|err| {
            error!(trace_id = %trace, error = %err, "grpc read failed");
            Status::internal("Failed to read messages")
        })?;

        let messages = messages
            .into_iter()
            .map(pb::Message::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        info!(trace_id = %trace, count = messages.len(), "grpc get_last10");
        Ok(Response::new(pb::GetLast10Response { messages }))
    }
}

/// Serves the message service on `listener` until `shutdown` resolves.
pub async fn serve<F>(
    listener: TcpListener,
    log: Arc<MessageLog>,
    shutdown: F,
) -> Result<(), tonic::transport::Error>
where
    F: Future<Output = ()> + Send,
{
    Server::builder()
        .add_service(MessageServiceServer::new(GrpcMessageService::new(log)))
        .serve_with_incoming_shutdown(TcpListenerStream::new(listener), shutdown)
        .await
}

/// Thin wrapper over the generated client.
pub struct GrpcClient {
    inner: MessageServiceClient<Channel>,
}

impl GrpcClient {
    pub async fn connect(endpoint: impl Into<String>) -> Result<Self, tonic::transport::Error> {
        let inner = MessageServiceClient::connect(endpoint.into()).await?;
        Ok(Self { inner })
    }

    pub async fn save(&mut self, user: &str, message: &str) -> Result<(), Status> {
        self.inner
            .save(pb::SaveMessageRequest {
                user: user.to_string(),
                message: message.to_string(),
            })
            .await?;
        Ok(())
    }

    pub async fn last10(&mut self) -> Result<Vec<pb::Message>, Status> {
        let response = self.inner.get_last10(pb::Empty {}).await?;
        Ok(response.into_inner().messages)
    }
}
