//! Sprite and layer management tools.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use rusty_sprite_scripts::{ColorMode, Operation, default_layer_name};

use crate::params::{object_schema, parse_params, run_operation};
use crate::{Tool, ToolContext, ToolOutput};

#[derive(Debug, Deserialize)]
struct CreateSpriteParams {
    width: u32,
    height: u32,
    #[serde(default)]
    color_mode: Option<String>,
}

pub struct CreateSpriteTool;

#[async_trait]
impl Tool for CreateSpriteTool {
    fn name(&self) -> &str {
        "create_sprite"
    }

    fn description(&self) -> &str {
        "Create a new sprite with the given dimensions and color mode. The new sprite becomes the active one."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        object_schema(
            json!({
                "width": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Width of the sprite in pixels"
                },
                "height": {
                    "type": "integer",
                    "minimum": 1,
                    "description": "Height of the sprite in pixels"
                },
                "color_mode": {
                    "type": "string",
                    "enum": ["RGB", "GRAYSCALE", "INDEXED"],
                    "default": "RGB",
                    "description": "Color mode (default is \"RGB\")"
                }
            }),
            &["width", "height"],
            &[],
        )
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        context: &ToolContext,
    ) -> anyhow::Result<ToolOutput> {
        let p: CreateSpriteParams = match parse_params(self.name(), params) {
            Ok(p) => p,
            Err(out) => return Ok(out),
        };

        if p.width == 0 || p.height == 0 {
            return Ok(ToolOutput::error(format!(
                "Sprite dimensions must be at least 1x1, got {}x{}",
                p.width, p.height
            )));
        }

        let color_mode = match p.color_mode.as_deref() {
            None => ColorMode::default(),
            Some(raw) => match raw.parse::<ColorMode>() {
                Ok(mode) => mode,
                Err(e) => return Ok(ToolOutput::error(e.to_string())),
            },
        };

        let op = Operation::CreateSprite {
            width: p.width,
            height: p.height,
            color_mode,
        };
        Ok(run_operation(&op, context).await)
    }
}

#[derive(Debug, Deserialize)]
struct CreateLayerParams {
    #[serde(default = "default_layer_name")]
    name: String,
}

pub struct CreateLayerTool;

#[async_trait]
impl Tool for CreateLayerTool {
    fn name(&self) -> &str {
        "create_layer"
    }

    fn description(&self) -> &str {
        "Add a new layer to the active sprite."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        object_schema(
            json!({
                "name": {
                    "type": "string",
                    "default": "New Layer",
                    "description": "Name for the new layer (default is \"New Layer\")"
                }
            }),
            &[],
            &[],
        )
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        context: &ToolContext,
    ) -> anyhow::Result<ToolOutput> {
        let p: CreateLayerParams = match parse_params(self.name(), params) {
            Ok(p) => p,
            Err(out) => return Ok(out),
        };
        let op = Operation::CreateLayer { name: p.name };
        Ok(run_operation(&op, context).await)
    }
}

#[derive(Debug, Deserialize)]
struct LayerNumberParams {
    layer_number: u32,
}

pub struct DeleteLayerTool;

#[async_trait]
impl Tool for DeleteLayerTool {
    fn name(&self) -> &str {
        "delete_layer"
    }

    fn description(&self) -> &str {
        "Delete a layer from the active sprite. The last remaining layer cannot be deleted."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        object_schema(
            json!({
                "layer_number": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Layer index to delete (0-based from bottom)"
                }
            }),
            &["layer_number"],
            &[],
        )
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        context: &ToolContext,
    ) -> anyhow::Result<ToolOutput> {
        let p: LayerNumberParams = match parse_params(self.name(), params) {
            Ok(p) => p,
            Err(out) => return Ok(out),
        };
        let op = Operation::DeleteLayer {
            index: p.layer_number,
        };
        Ok(run_operation(&op, context).await)
    }
}

pub struct SetActiveLayerTool;

#[async_trait]
impl Tool for SetActiveLayerTool {
    fn name(&self) -> &str {
        "set_active_layer"
    }

    fn description(&self) -> &str {
        "Make a layer of the active sprite the active layer, so drawing tools paint on it."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        object_schema(
            json!({
                "layer_number": {
                    "type": "integer",
                    "minimum": 0,
                    "description": "Layer index to activate (0-based from bottom)"
                }
            }),
            &["layer_number"],
            &[],
        )
    }

    fn idempotent(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        context: &ToolContext,
    ) -> anyhow::Result<ToolOutput> {
        let p: LayerNumberParams = match parse_params(self.name(), params) {
            Ok(p) => p,
            Err(out) => return Ok(out),
        };
        let op = Operation::SetActiveLayer {
            index: p.layer_number,
        };
        Ok(run_operation(&op, context).await)
    }
}

pub struct GetSpriteInfoTool;

#[async_trait]
impl Tool for GetSpriteInfoTool {
    fn name(&self) -> &str {
        "get_sprite_info"
    }

    fn description(&self) -> &str {
        "Get information about the active sprite including dimensions, color mode, layers, and the current frame."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        object_schema(json!({}), &[], &[])
    }

    fn read_only(&self) -> bool {
        true
    }

    fn idempotent(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        _params: serde_json::Value,
        context: &ToolContext,
    ) -> anyhow::Result<ToolOutput> {
        Ok(run_operation(&Operation::GetSpriteInfo, context).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{RecordingExecutor, StubExecutor, context};
    use rusty_sprite_core::error::BridgeError;

    #[tokio::test]
    async fn test_create_sprite_through_stub() {
        let ctx = context(StubExecutor::without_sprite());
        let out = CreateSpriteTool
            .execute(json!({"width": 32, "height": 32, "color_mode": "RGB"}), &ctx)
            .await
            .unwrap();
        assert!(!out.is_error);
        assert!(out.content.contains("32x32"), "got: {}", out.content);
        assert!(out.content.contains("RGB"), "got: {}", out.content);
    }

    #[tokio::test]
    async fn test_create_sprite_defaults_to_rgb() {
        let exec = RecordingExecutor::answering("ok");
        let ctx = context(exec.clone());
        CreateSpriteTool
            .execute(json!({"width": 8, "height": 8}), &ctx)
            .await
            .unwrap();
        let scripts = exec.scripts.lock().unwrap();
        assert!(scripts[0].contains("ColorMode.RGB"));
    }

    #[tokio::test]
    async fn test_create_sprite_rejects_bad_input_without_running() {
        let exec = RecordingExecutor::answering("unused");
        let ctx = context(exec.clone());

        let out = CreateSpriteTool
            .execute(json!({"width": 8, "height": 8, "color_mode": "CMYK"}), &ctx)
            .await
            .unwrap();
        assert!(out.is_error);
        assert!(out.content.contains("CMYK"));

        let out = CreateSpriteTool
            .execute(json!({"width": 0, "height": 8}), &ctx)
            .await
            .unwrap();
        assert!(out.is_error);

        let out = CreateSpriteTool
            .execute(json!({"width": -4, "height": 8}), &ctx)
            .await
            .unwrap();
        assert!(out.is_error);
        assert!(out.content.starts_with("Invalid parameters for create_sprite"));

        assert_eq!(exec.calls(), 0);
    }

    #[tokio::test]
    async fn test_layer_lifecycle_through_stub() {
        let ctx = context(StubExecutor::with_sprite(4, 4));

        let out = DeleteLayerTool
            .execute(json!({"layer_number": 0}), &ctx)
            .await
            .unwrap();
        assert_eq!(out.content, "Cannot delete the only remaining layer");
        assert!(!out.is_error);

        let out = CreateLayerTool.execute(json!({}), &ctx).await.unwrap();
        assert!(out.content.contains("Created new layer: New Layer"), "got: {}", out.content);

        let out = SetActiveLayerTool
            .execute(json!({"layer_number": 0}), &ctx)
            .await
            .unwrap();
        assert_eq!(out.content, r#"Active layer is now 0: "Layer 1""#);

        let out = DeleteLayerTool
            .execute(json!({"layer_number": 1}), &ctx)
            .await
            .unwrap();
        assert!(out.content.contains(r#"Deleted layer 1: "New Layer""#), "got: {}", out.content);

        let info = GetSpriteInfoTool.execute(json!({}), &ctx).await.unwrap();
        assert!(info.content.contains("Layer Count: 1"), "got: {}", info.content);
    }

    #[tokio::test]
    async fn test_bridge_failure_is_error_output() {
        let ctx = context(RecordingExecutor::failing(BridgeError::SessionUnavailable {
            session: "default".into(),
        }));
        let out = GetSpriteInfoTool.execute(json!({}), &ctx).await.unwrap();
        assert!(out.is_error);
        assert!(out.content.contains("not available"), "got: {}", out.content);
    }
}
