use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response header carrying the request's trace identifier.
pub const TRACE_HEADER: &str = "x-trace-id";

/// Opaque per-request correlation token.
///
/// Created once at the edge of every request (HTTP middleware, gRPC handler,
/// CLI invocation) and passed explicitly to everything that logs on its
/// behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(Uuid);

impl TraceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_ids_differ() {
        assert_ne!(TraceId::new(), TraceId::new());
    }

    #[test]
    fn serializes_as_plain_string() {
        let trace = TraceId::new();
        let json = serde_json::to_value(trace).expect("serialize");
        assert_eq!(json.as_str(), Some(trace.to_string().as_str()));
    }
}
