use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::params::{object_schema, parse_params, run_source};
use crate::{Tool, ToolContext, ToolOutput};

#[derive(Debug, Deserialize)]
struct RunScriptParams {
    script: String,
}

/// Forwards caller-written JavaScript to the host unchanged.
pub struct RunScriptTool;

#[async_trait]
impl Tool for RunScriptTool {
    fn name(&self) -> &str {
        "run_script"
    }

    fn description(&self) -> &str {
        "Run arbitrary JavaScript inside LibreSprite and return everything it printed with console.log. \
         Read the docs://reference resource for the scripting API and docs://examples for working scripts \
         before writing one. Prefer the dedicated drawing tools when they cover the task."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        object_schema(
            json!({
                "script": {
                    "type": "string",
                    "description": "JavaScript source to execute in LibreSprite"
                }
            }),
            &["script"],
            &[],
        )
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        context: &ToolContext,
    ) -> anyhow::Result<ToolOutput> {
        let p: RunScriptParams = match parse_params(self.name(), params) {
            Ok(p) => p,
            Err(out) => return Ok(out),
        };
        debug!(
            session = %context.request.session,
            request_id = %context.request.request_id,
            bytes = p.script.len(),
            "Forwarding raw script"
        );
        Ok(run_source(&p.script, context).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingExecutor, StubExecutor, context};
    use rusty_sprite_core::error::BridgeError;

    #[tokio::test]
    async fn test_script_is_forwarded_verbatim() {
        let exec = RecordingExecutor::answering("hello");
        let ctx = context(exec.clone());
        let source = "console.log('hello');";
        let out = RunScriptTool
            .execute(json!({"script": source}), &ctx)
            .await
            .unwrap();
        assert_eq!(out.content, "hello");
        assert_eq!(exec.scripts.lock().unwrap()[0], source);
    }

    #[tokio::test]
    async fn test_uncaught_error_keeps_partial_output() {
        let ctx = context(StubExecutor::with_sprite(2, 2));
        let out = RunScriptTool
            .execute(
                json!({"script": "console.log('before'); undefinedThing.call();"}),
                &ctx,
            )
            .await
            .unwrap();
        assert!(!out.is_error);
        assert!(out.content.starts_with("before\nScript error:"), "got: {}", out.content);
    }

    #[tokio::test]
    async fn test_missing_script_and_bridge_errors() {
        let exec = RecordingExecutor::answering("unused");
        let out = RunScriptTool
            .execute(json!({}), &context(exec.clone()))
            .await
            .unwrap();
        assert!(out.is_error);
        assert_eq!(exec.calls(), 0);

        let ctx = context(RecordingExecutor::failing(BridgeError::InvalidScript(
            "script is empty".into(),
        )));
        let out = RunScriptTool
            .execute(json!({"script": ""}), &ctx)
            .await
            .unwrap();
        assert!(out.is_error);
    }
}
