use thiserror::Error;

#[derive(Debug, Error)]
pub enum RustySpriteError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Relay error: {0}")]
    Relay(String),

    #[error("Tool error: {0}")]
    Tool(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, RustySpriteError>;

/// Failures of the bridge between this process and a host session.
///
/// Anything the host prints (including its own error messages) is a
/// successful result; only delivery and waiting problems end up here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BridgeError {
    #[error("Host session '{session}' is not available (no host has polled the relay recently)")]
    SessionUnavailable { session: String },

    #[error("Host session '{session}' did not finish the script within {timeout_ms} ms")]
    Timeout { session: String, timeout_ms: u64 },

    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Invalid script: {0}")]
    InvalidScript(String),
}

impl BridgeError {
    /// Short machine-readable code, used in logs and MCP error payloads.
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::SessionUnavailable { .. } => "session_unavailable",
            BridgeError::Timeout { .. } => "timeout",
            BridgeError::Transport(_) => "transport",
            BridgeError::InvalidScript(_) => "invalid_script",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bridge_error_codes_are_distinct() {
        let errors = [
            BridgeError::SessionUnavailable { session: "default".into() },
            BridgeError::Timeout { session: "default".into(), timeout_ms: 10 },
            BridgeError::Transport("garbled".into()),
            BridgeError::InvalidScript("empty".into()),
        ];
        let mut codes: Vec<&str> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn test_bridge_error_messages() {
        let err = BridgeError::Timeout { session: "s1".into(), timeout_ms: 250 };
        assert!(err.to_string().contains("s1"));
        assert!(err.to_string().contains("250 ms"));
    }
}
