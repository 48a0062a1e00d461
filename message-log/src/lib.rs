//! Line-oriented message log exposed over a CLI, REST, HTML, gRPC and
//! WebSocket.
//!
//! Every front-end funnels into the same [`log::MessageLog`], which pairs one
//! [`store::MessageStore`] with one [`codec::LineCodec`]. The file on disk is
//! the only persistent state; nothing is cached between requests.
//!
//! - [`cli`] parses the command-line interface.
//! - [`codec`] turns messages into single text lines and back.
//! - [`store`] owns the raw line storage (file-backed or in-memory).
//! - [`log`] is the query layer: append, clear, read all, last N.
//! - [`storage`] is plain whole-file save/read used by the file API.
//! - [`http`] builds the axum router (REST, pages, WebSocket).
//! - [`grpc`] implements the tonic `MessageService` and a thin client.
//! - [`server`] runs HTTP and gRPC together with graceful shutdown.
//! - [`trace`] defines the per-request [`trace::TraceId`].

pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod grpc;
pub mod http;
pub mod log;
pub mod message;
pub mod server;
pub mod storage;
pub mod store;
pub mod trace;

pub use error::{Error, Result};
