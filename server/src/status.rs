//! Server-list status payload.

use serde_json::json;

pub const PROTOCOL_VERSION: i32 = 498;
pub const VERSION_NAME: &str = "1.14.4";
pub const SERVER_BRAND: &str = "lodestone";

/// Builds the status-response JSON for the current player count.
#[must_use]
pub fn status_json(online: usize, max: usize, description: &str) -> String {
    json!({
        "version": { "name": VERSION_NAME, "protocol": PROTOCOL_VERSION },
        "players": { "max": max, "online": online, "sample": [] },
        "description": { "text": description },
    })
    .to_string()
}

/// Chat-JSON body for a message with a named color.
#[must_use]
pub fn chat_json(text: &str, color: &str) -> String {
    json!({ "text": text, "color": color }).to_string()
}
