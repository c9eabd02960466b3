//! Pixel-editing tools exposed to agents.
//!
//! Each tool validates its parameters into an [`Operation`], renders the
//! host script and sends it through the [`ScriptExecutor`] in its context.
//! The host's printed output comes back verbatim as the tool result.
//!
//! [`Operation`]: rusty_sprite_scripts::Operation

pub mod draw;
pub mod methods;
pub mod params;
pub mod pixels;
pub mod prompt;
pub mod resources;
pub mod run_script;
pub mod sprite;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use rusty_sprite_core::executor::ScriptExecutor;
use rusty_sprite_core::types::RequestContext;

/// Context provided to tools during execution.
pub struct ToolContext {
    pub request: RequestContext,
    pub executor: Arc<dyn ScriptExecutor>,
}

/// Output from a tool execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub content: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: false,
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_error: true,
        }
    }
}

/// The core tool trait. Every pixel-editing tool implements this.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Tool name as exposed to the agent (e.g., "put_pixel").
    fn name(&self) -> &str;

    /// JSON Schema describing the tool's parameters.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Human-readable description for the agent.
    fn description(&self) -> &str;

    /// Whether the tool only reads host state.
    fn read_only(&self) -> bool {
        false
    }

    /// Whether repeating a call leaves the host as a single call would.
    fn idempotent(&self) -> bool {
        false
    }

    /// Execute the tool with the given parameters.
    async fn execute(
        &self,
        params: serde_json::Value,
        context: &ToolContext,
    ) -> anyhow::Result<ToolOutput>;
}

/// Registry of available tools.
#[derive(Default)]
pub struct ToolRegistry {
    tools: Vec<Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.iter().find(|t| t.name() == name).map(|t| t.as_ref())
    }

    pub fn list(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Tool definitions in the shape MCP `tools/list` returns.
    pub fn to_mcp_tools(&self) -> Vec<serde_json::Value> {
        self.tools
            .iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name(),
                    "description": t.description(),
                    "inputSchema": t.parameters_schema(),
                    "annotations": {
                        "readOnlyHint": t.read_only(),
                        "idempotentHint": t.idempotent(),
                        "destructiveHint": !t.read_only() && !t.idempotent(),
                    },
                })
            })
            .collect()
    }
}

/// Register the full tool catalog.
pub fn register_builtin_tools(registry: &mut ToolRegistry) {
    registry.register(Box::new(run_script::RunScriptTool));

    registry.register(Box::new(sprite::CreateSpriteTool));
    registry.register(Box::new(sprite::CreateLayerTool));
    registry.register(Box::new(sprite::DeleteLayerTool));
    registry.register(Box::new(sprite::SetActiveLayerTool));
    registry.register(Box::new(sprite::GetSpriteInfoTool));

    registry.register(Box::new(draw::FillLayerTool));
    registry.register(Box::new(draw::DrawCircleTool));
    registry.register(Box::new(draw::DrawRectangleTool));
    registry.register(Box::new(draw::DrawLineTool));
    registry.register(Box::new(draw::DrawEllipseTool));

    registry.register(Box::new(pixels::PutPixelTool));
    registry.register(Box::new(pixels::FloodFillTool));
    registry.register(Box::new(pixels::ReplaceColorTool));
}
