//! Query layer over a [`MessageStore`].
//!
//! Ids are positional: the n-th line that decodes is message `n`. They are
//! recomputed on every read and are not stable across [`MessageLog::clear`].

use std::sync::Arc;

use chrono::Local;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::codec::LineCodec;
use crate::error::{Error, Result};
use crate::message::Message;
use crate::store::MessageStore;
use crate::trace::TraceId;

/// Number of messages the CLI, gRPC and WebSocket front-ends show.
pub const RECENT_LIMIT: usize = 10;

pub struct MessageLog {
    store: Arc<dyn MessageStore>,
    codec: LineCodec,
    // Serializes append + id lookup within this process. Other processes
    // writing the same file are not coordinated.
    write_lock: Mutex<()>,
}

impl MessageLog {
    pub fn new(store: Arc<dyn MessageStore>, codec: LineCodec) -> Self {
        Self {
            store,
            codec,
            write_lock: Mutex::new(()),
        }
    }

    /// Appends a message stamped with the current local time and returns it
    /// as a subsequent read would see it.
    ///
    /// The id is the count of decodable lines plus one, so every append reads
    /// and decodes the whole file first. A failed read leaves the file
    /// untouched.
    pub async fn append(&self, user: &str, text: &str, trace: TraceId) -> Result<Message> {
        if user.is_empty() || text.is_empty() {
            return Err(Error::Validation(
                "User and message are required".to_string(),
            ));
        }

        let now = Local::now().naive_local();
        let line = self.codec.encode(user, text, now);
        let stored = self.codec.decode_with_fallback(&line, now).ok_or_else(|| {
            Error::Validation("Message cannot be stored in the log format".to_string())
        })?;

        let guard = self.write_lock.lock().await;
        let existing = self.decode_all(trace).await?.len();
        let id = u32::try_from(existing + 1).map_err(|_| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "message count exceeds u32",
            ))
        })?;
        self.store.append_line(&line).await?;
        drop(guard);

        let message = Message {
            id,
            user: stored.user,
            text: stored.text,
            timestamp: stored.timestamp,
            trace_id: trace,
        };
        info!(trace_id = %trace, user, message_id = message.id, "message appended");
        Ok(message)
    }

    pub async fn clear(&self, trace: TraceId) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        self.store.clear().await?;
        info!(trace_id = %trace, "messages cleared");
        Ok(())
    }

    /// Raw lines in file order, including ones that would not decode.
    pub async fn read_all(&self) -> Result<Vec<String>> {
        Ok(self.store.read_lines().await?)
    }

    /// Every decodable message, oldest first.
    pub async fn all(&self, trace: TraceId) -> Result<Vec<Message>> {
        self.decode_all(trace).await
    }

    /// The final `n` decodable messages, oldest first. Ids keep their
    /// position in the whole file.
    pub async fn last_n(&self, n: usize, trace: TraceId) -> Result<Vec<Message>> {
        let mut messages = self.decode_all(trace).await?;
        let start = messages.len().saturating_sub(n);
        Ok(messages.split_off(start))
    }

    async fn decode_all(&self, trace: TraceId) -> Result<Vec<Message>> {
        let lines = self.store.read_lines().await?;
        let total = lines.iter().filter(|line| !line.is_empty()).count();

        let messages: Vec<Message> = lines
            .iter()
            .filter(|line| !line.is_empty())
            .filter_map(|line| self.codec.decode(line))
            .zip(1u32..)
            .map(|(decoded, id)| Message {
                id,
                user: decoded.user,
                text: decoded.text,
                timestamp: decoded.timestamp,
                trace_id: trace,
            })
            .collect();

        let skipped = total - messages.len();
        if skipped > 0 {
            debug!(trace_id = %trace, skipped, "skipped undecodable lines");
        }
        Ok(messages)
    }
}
