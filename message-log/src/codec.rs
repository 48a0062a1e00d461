//! One-line text encoding of messages.
//!
//! Two layouts exist and they are not interchangeable on the same file:
//!
//! - [`LineCodec::Timestamped`]: `[2024-05-01 09:30:00] alice: hello`
//! - [`LineCodec::Plain`]: `alice: hello`
//!
//! Decoding is lenient. Lines that cannot be split into their parts are
//! skipped by the caller rather than reported, and an unparseable timestamp
//! is replaced with the current time so the message is still shown.

use chrono::{Local, NaiveDateTime};

/// `strftime` layout of the timestamp segment.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Shortest line the timestamped layout can decode:
/// 19 timestamp bytes, the brackets, the space and at least one more byte.
const MIN_TIMESTAMPED_LEN: usize = 22;

const TIMESTAMP_END: &str = "] ";
const USER_DELIMITER: &str = ": ";
const UNKNOWN_USER: &str = "unknown";

/// Parts recovered from one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedLine {
    pub user: String,
    pub text: String,
    pub timestamp: NaiveDateTime,
}

/// Versioned line layout. A [`crate::log::MessageLog`] uses exactly one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LineCodec {
    /// `[<YYYY-MM-DD HH:MM:SS>] <user>: <text>`
    #[default]
    Timestamped,
    /// `<user>: <text>`, the layout of the first message exercise.
    Plain,
}

impl LineCodec {
    /// Renders one line without the trailing newline.
    ///
    /// Embedded line breaks would split the record, so they are folded into
    /// spaces.
    pub fn encode(&self, user: &str, text: &str, timestamp: NaiveDateTime) -> String {
        let user = single_line(user);
        let text = single_line(text);
        match self {
            LineCodec::Timestamped => format!(
                "[{}] {}{}{}",
                timestamp.format(TIMESTAMP_FORMAT),
                user,
                USER_DELIMITER,
                text
            ),
            LineCodec::Plain => format!("{user}{USER_DELIMITER}{text}"),
        }
    }

    /// Decodes a line, returning `None` when it should be skipped.
    pub fn decode(&self, line: &str) -> Option<DecodedLine> {
        self.decode_with_fallback(line, Local::now().naive_local())
    }

    /// Like [`decode`](Self::decode) with an explicit stand-in for
    /// timestamps that are missing or fail to parse.
    pub fn decode_with_fallback(&self, line: &str, fallback: NaiveDateTime) -> Option<DecodedLine> {
        match self {
            LineCodec::Timestamped => {
                if line.len() < MIN_TIMESTAMPED_LEN {
                    return None;
                }
                let rest = line.strip_prefix('[')?;
                let (stamp, rest) = rest.split_once(TIMESTAMP_END)?;
                let (user, text) = rest.split_once(USER_DELIMITER)?;
                let timestamp =
                    NaiveDateTime::parse_from_str(stamp, TIMESTAMP_FORMAT).unwrap_or(fallback);
                Some(DecodedLine {
                    user: user.to_string(),
                    text: text.to_string(),
                    timestamp,
                })
            }
            LineCodec::Plain => {
                let (user, text) = line
                    .split_once(USER_DELIMITER)
                    .unwrap_or((UNKNOWN_USER, line));
                Some(DecodedLine {
                    user: user.to_string(),
                    text: text.to_string(),
                    timestamp: fallback,
                })
            }
        }
    }
}

fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1)
            .and_then(|d| d.and_hms_opt(h, m, s))
            .expect("valid date")
    }

    #[test]
    fn timestamped_layout() {
        let line = LineCodec::Timestamped.encode("alice", "hello", at(9, 30, 0));
        assert_eq!(line, "[2024-05-01 09:30:00] alice: hello");
    }

    #[test]
    fn timestamped_roundtrip_keeps_all_parts() {
        let codec = LineCodec::Timestamped;
        let line = codec.encode("bob", "re: lunch: noon?", at(12, 0, 1));
        let decoded = codec
            .decode_with_fallback(&line, at(0, 0, 0))
            .expect("decodable");
        assert_eq!(decoded.user, "bob");
        assert_eq!(decoded.text, "re: lunch: noon?");
        assert_eq!(decoded.timestamp, at(12, 0, 1));
    }

    #[test]
    fn short_lines_are_skipped() {
        assert_eq!(LineCodec::Timestamped.decode("[x] a: b"), None);
        assert_eq!(LineCodec::Timestamped.decode(""), None);
    }

    #[test]
    fn missing_delimiters_are_skipped() {
        let codec = LineCodec::Timestamped;
        assert_eq!(codec.decode("this line has no structure at all"), None);
        assert_eq!(codec.decode("[2024-05-01 09:30:00] no user delimiter"), None);
        assert_eq!(codec.decode("[2024-05-01 09:30:00]alice: glued to bracket"), None);
        assert_eq!(codec.decode("2024-05-01 09:30:00] alice: no opening bracket"), None);
    }

    #[test]
    fn garbled_timestamp_falls_back() {
        let fallback = at(23, 59, 59);
        let decoded = LineCodec::Timestamped
            .decode_with_fallback("[yesterday-ish time] carol: still here", fallback)
            .expect("decodable despite bad timestamp");
        assert_eq!(decoded.user, "carol");
        assert_eq!(decoded.text, "still here");
        assert_eq!(decoded.timestamp, fallback);
    }

    #[test]
    fn line_breaks_are_folded() {
        let line = LineCodec::Timestamped.encode("dave", "one\ntwo\r\nthree", at(1, 2, 3));
        assert!(!line.contains('\n'));
        assert!(line.ends_with("dave: one two  three"));
    }

    #[test]
    fn plain_layout_and_unknown_user() {
        let codec = LineCodec::Plain;
        assert_eq!(codec.encode("alice", "hi", at(0, 0, 0)), "alice: hi");

        let fallback = at(8, 0, 0);
        let decoded = codec
            .decode_with_fallback("alice: hi: there", fallback)
            .expect("plain always decodes");
        assert_eq!(decoded.user, "alice");
        assert_eq!(decoded.text, "hi: there");
        assert_eq!(decoded.timestamp, fallback);

        let orphan = codec
            .decode_with_fallback("no delimiter here", fallback)
            .expect("plain always decodes");
        assert_eq!(orphan.user, "unknown");
        assert_eq!(orphan.text, "no delimiter here");
    }
}
