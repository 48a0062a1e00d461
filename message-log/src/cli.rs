use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::codec::LineCodec;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// File holding one message per line.
    #[arg(long, global = true, env = "MESSAGE_LOG_FILE", default_value = "messages.txt")]
    pub messages_file: PathBuf,

    /// Line layout of the messages file. Never mix layouts in one file.
    #[arg(long, global = true, value_enum, default_value_t = LineCodec::Timestamped)]
    pub codec: LineCodec,

    /// Emit logs as newline-delimited JSON.
    #[arg(long, global = true, env = "MESSAGE_LOG_JSON")]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Append a message, then print the most recent ones.
    Post(PostArgs),
    /// Print the most recent messages.
    Show(ShowArgs),
    /// Remove every message.
    Clear,
    /// Save a file, read it back and print it.
    StorageDemo(StorageDemoArgs),
    /// Run the HTTP and gRPC servers until interrupted.
    Serve(ServeArgs),
    /// Talk to a running gRPC server.
    GrpcClient(GrpcClientArgs),
}

#[derive(Args, Debug, Clone)]
pub struct PostArgs {
    #[arg(long)]
    pub user: String,

    #[arg(long)]
    pub message: String,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// How many messages to print.
    #[arg(long, default_value_t = 10)]
    pub limit: usize,
}

#[derive(Args, Debug, Clone)]
pub struct StorageDemoArgs {
    /// File to write and read back.
    #[arg(long, default_value = "example.txt")]
    pub file: PathBuf,

    /// Contents to write. A generated banner is used when omitted.
    #[arg(long)]
    pub data: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Interface both servers bind to.
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// HTTP port. Use 0 for an ephemeral port.
    #[arg(long, default_value_t = 8080)]
    pub port: u16,

    /// gRPC port. Use 0 for an ephemeral port.
    #[arg(long, default_value_t = 50051)]
    pub grpc_port: u16,

    /// Directory the `/files` API reads and writes under.
    #[arg(long, default_value = ".")]
    pub files_dir: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct GrpcClientArgs {
    /// gRPC endpoint of a running server.
    #[arg(long, default_value = "http://127.0.0.1:50051")]
    pub server: String,

    /// Save a message as this user before listing.
    #[arg(long, requires = "message")]
    pub user: Option<String>,

    #[arg(long, requires = "user")]
    pub message: Option<String>,
}
