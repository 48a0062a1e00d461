use std::fmt;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::codec::TIMESTAMP_FORMAT;
use crate::trace::TraceId;

/// A decoded message as returned to every front-end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// 1-based position among the decodable lines of the file at read time.
    pub id: u32,
    pub user: String,
    #[serde(rename = "message")]
    pub text: String,
    pub timestamp: NaiveDateTime,
    pub trace_id: TraceId,
}

impl Message {
    /// Timestamp in the same layout the log file uses.
    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} [{}] {}: {}",
            self.id,
            self.formatted_timestamp(),
            self.user,
            self.text
        )
    }
}

/// Body of `POST /messages`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateMessageRequest {
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> Message {
        Message {
            id: 3,
            user: "alice".into(),
            text: "hi".into(),
            timestamp: NaiveDate::from_ymd_opt(2024, 5, 1)
                .and_then(|d| d.and_hms_opt(9, 30, 0))
                .expect("valid date"),
            trace_id: TraceId::new(),
        }
    }

    #[test]
    fn json_uses_message_field_name() {
        let message = sample();
        let json = serde_json::to_value(&message).expect("serialize");
        assert_eq!(json["id"], 3);
        assert_eq!(json["user"], "alice");
        assert_eq!(json["message"], "hi");
        assert_eq!(json["timestamp"], "2024-05-01T09:30:00");
        assert_eq!(json["trace_id"], message.trace_id.to_string());
    }

    #[test]
    fn display_matches_cli_listing() {
        assert_eq!(sample().to_string(), "#3 [2024-05-01 09:30:00] alice: hi");
    }

    #[test]
    fn missing_request_fields_default_to_empty() {
        let request: CreateMessageRequest =
            serde_json::from_str(r#"{"user":"alice"}"#).expect("deserialize");
        assert_eq!(request.user, "alice");
        assert!(request.message.is_empty());
    }
}
