//! Relay wire protocol v1.
//!
//! The host application polls the relay over HTTP with JSON bodies:
//!
//! - `GET /hosts/{session}/poll` answers `200` with a [`PendingScript`] or
//!   `204 No Content` when nothing is queued. Every poll counts as a heartbeat.
//! - `POST /hosts/{session}/result` carries a [`ScriptResult`] whose `id`
//!   echoes the script it answers.
//!
//! The host must clear its console capture before each evaluation so that
//! `output` holds only what that one script printed. The relay crate ships a
//! host-side script that does this (`rusty-sprite bridge-script`).

use serde::{Deserialize, Serialize};

/// Protocol version implemented by this relay.
pub const RELAY_PROTOCOL_VERSION: u32 = 1;

/// Relay -> Host: a script waiting to be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingScript {
    pub id: String,
    pub script: String,
}

/// Host -> Relay: console output of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptResult {
    pub id: String,
    #[serde(default)]
    pub output: String,
    /// Set when evaluation raised an error the script itself did not catch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScriptResult {
    /// Collapse into the single text returned to the caller.
    ///
    /// An uncaught host fault is appended after whatever was printed before
    /// it, so partial output is never lost.
    pub fn into_text(self) -> String {
        match self.error {
            None => self.output,
            Some(error) if self.output.is_empty() => format!("Script error: {error}"),
            Some(error) => {
                let mut text = self.output;
                if !text.ends_with('\n') {
                    text.push('\n');
                }
                text.push_str(&format!("Script error: {error}"));
                text
            }
        }
    }
}

/// Relay acknowledgement for a delivered result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultAck {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Per-session line in the health report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostSessionStatus {
    pub session: String,
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_poll_ms_ago: Option<u64>,
    pub busy: bool,
}
