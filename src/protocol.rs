//! Wire format for status messages from the assistant
//!
//! One JSON object per status change: `{"status": "<value>"}`. The assistant
//! may merge extra fields into the same object; they are ignored.

use crate::state::OverlayStatus;
use crate::{OverlayError, Result};
use serde_json::Value;

/// A recognized server signal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusSignal {
    /// Show the overlay in this status
    Active(OverlayStatus),
    /// The assistant went quiet; hide after the hide delay
    Idle,
}

impl StatusSignal {
    /// Map a wire value to a signal; unknown values yield `None`
    pub fn from_wire(value: &str) -> Option<Self> {
        match value {
            "listening" => Some(StatusSignal::Active(OverlayStatus::Listening)),
            "processing" => Some(StatusSignal::Active(OverlayStatus::Processing)),
            "speaking" => Some(StatusSignal::Active(OverlayStatus::Speaking)),
            "idle" => Some(StatusSignal::Idle),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusSignal::Active(status) => status.as_str(),
            StatusSignal::Idle => "idle",
        }
    }
}

/// Parse a raw text frame
///
/// Anything that is not an object with a string `status` is malformed.
/// A well-formed message with an unknown status is `Ok(None)`. If `status`
/// appears more than once, the last one counts.
pub fn parse_signal(raw: &str) -> Result<Option<StatusSignal>> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| OverlayError::MalformedPayload(e.to_string()))?;

    let Value::Object(fields) = value else {
        return Err(OverlayError::MalformedPayload(
            "expected a JSON object".to_string(),
        ));
    };

    let status = fields
        .get("status")
        .and_then(Value::as_str)
        .ok_or_else(|| OverlayError::MalformedPayload("missing string `status`".to_string()))?;

    Ok(StatusSignal::from_wire(status))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_active_statuses() {
        assert_eq!(
            parse_signal(r#"{"status":"listening"}"#).unwrap(),
            Some(StatusSignal::Active(OverlayStatus::Listening))
        );
        assert_eq!(
            parse_signal(r#"{"status":"processing"}"#).unwrap(),
            Some(StatusSignal::Active(OverlayStatus::Processing))
        );
        assert_eq!(
            parse_signal(r#"{"status":"speaking"}"#).unwrap(),
            Some(StatusSignal::Active(OverlayStatus::Speaking))
        );
    }

    #[test]
    fn test_parse_idle() {
        assert_eq!(
            parse_signal(r#"{"status":"idle"}"#).unwrap(),
            Some(StatusSignal::Idle)
        );
    }

    #[test]
    fn test_extra_fields_ignored() {
        let raw = r#"{"status":"speaking","text":"It is 4pm","lang":"en"}"#;
        assert_eq!(
            parse_signal(raw).unwrap(),
            Some(StatusSignal::Active(OverlayStatus::Speaking))
        );
    }

    #[test]
    fn test_unknown_status_is_not_an_error() {
        assert_eq!(parse_signal(r#"{"status":"banana"}"#).unwrap(), None);
        // Case matters on the wire
        assert_eq!(parse_signal(r#"{"status":"Listening"}"#).unwrap(), None);
    }

    #[test]
    fn test_duplicate_status_keeps_last() {
        assert_eq!(
            parse_signal(r#"{"status":"listening","status":"idle"}"#).unwrap(),
            Some(StatusSignal::Idle)
        );
    }

    #[test]
    fn test_malformed_payloads() {
        for raw in [
            "",
            "not json",
            "[1,2,3]",
            r#"["speaking"]"#,
            r#"["idle"]"#,
            r#""listening""#,
            r#"{"state":"listening"}"#,
            r#"{"status":42}"#,
            r#"{"status":null}"#,
            r#"{"status":"listening""#,
        ] {
            assert!(
                matches!(parse_signal(raw), Err(OverlayError::MalformedPayload(_))),
                "expected malformed: {raw:?}"
            );
        }
    }
}
