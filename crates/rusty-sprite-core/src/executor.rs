//! The seam between script producers and whatever delivers scripts to a host.

use async_trait::async_trait;

use crate::error::BridgeError;
use crate::types::RequestContext;

/// Runs one script in the host session named by the context and returns
/// everything the host printed while evaluating it.
#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    async fn run_script(
        &self,
        script: &str,
        context: &RequestContext,
    ) -> Result<String, BridgeError>;
}
