use serde::{Deserialize, Serialize};

/// Name of the host session used when a caller does not pick one.
pub const DEFAULT_SESSION: &str = "default";

/// Correlation handle passed from the dispatcher down to the proxy.
///
/// `session` selects which running host receives the script, `request_id`
/// tags the submission so the host's answer can be matched to it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestContext {
    pub session: String,
    pub request_id: String,
}

impl RequestContext {
    /// Context for `session` with a freshly generated request id.
    pub fn new(session: impl Into<String>) -> Self {
        Self {
            session: session.into(),
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }

    /// Context for `session` reusing a caller-supplied request id.
    pub fn with_request_id(session: impl Into<String>, request_id: impl Into<String>) -> Self {
        Self {
            session: session.into(),
            request_id: request_id.into(),
        }
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION)
    }
}
