//! Server-sent event framing.

use crate::session::TurnEvent;
use actix_web::web::Bytes;
use serde_json::json;

/// Content type of turn streams.
pub const EVENT_STREAM: &str = "text/event-stream";

/// Encodes `event` as one SSE frame: `data: <json>\n\n`.
///
/// JSON never contains a raw newline, so a single `data:` line suffices.
#[must_use]
pub fn encode(event: &TurnEvent) -> Bytes {
    let payload = serde_json::to_string(event).unwrap_or_else(|err| {
        json!({ "type": "error", "message": err.to_string(), "retryable": false }).to_string()
    });
    Bytes::from(format!("data: {payload}\n\n"))
}
