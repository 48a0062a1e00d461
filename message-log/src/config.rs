//! Runtime configuration assembled from the command line.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::cli::{Cli, ServeArgs};
use crate::codec::LineCodec;
use crate::log::MessageLog;
use crate::store::FileStore;

/// How long in-flight requests may run after a shutdown signal.
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct Config {
    pub messages_file: PathBuf,
    pub codec: LineCodec,
    pub files_dir: PathBuf,
    pub http_addr: SocketAddr,
    pub grpc_addr: SocketAddr,
    pub shutdown_grace: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            messages_file: PathBuf::from("messages.txt"),
            codec: LineCodec::Timestamped,
            files_dir: PathBuf::from("."),
            http_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            grpc_addr: SocketAddr::from(([0, 0, 0, 0], 50051)),
            shutdown_grace: SHUTDOWN_GRACE,
        }
    }
}

impl Config {
    /// Settings shared by every subcommand.
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            messages_file: cli.messages_file.clone(),
            codec: cli.codec,
            ..Self::default()
        }
    }

    pub fn with_serve_args(mut self, args: &ServeArgs) -> Self {
        self.files_dir = args.files_dir.clone();
        self.http_addr = SocketAddr::new(args.bind, args.port);
        self.grpc_addr = SocketAddr::new(args.bind, args.grpc_port);
        self
    }

    /// File-backed log using the configured codec.
    pub fn message_log(&self) -> MessageLog {
        MessageLog::new(Arc::new(FileStore::new(&self.messages_file)), self.codec)
    }
}
