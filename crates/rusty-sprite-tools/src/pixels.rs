//! Per-pixel tools.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use rusty_sprite_scripts::Operation;

use crate::params::{
    ColorParams, NewColorParams, OldColorParams, object_schema, parse_params, run_operation,
};
use crate::{Tool, ToolContext, ToolOutput};

#[derive(Debug, Deserialize)]
struct PointColorParams {
    x: i32,
    y: i32,
    #[serde(flatten)]
    color: ColorParams,
}

pub struct PutPixelTool;

#[async_trait]
impl Tool for PutPixelTool {
    fn name(&self) -> &str {
        "put_pixel"
    }

    fn description(&self) -> &str {
        "Set a single pixel on the active layer. Coordinates outside the image are reported and nothing is written."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        object_schema(
            json!({
                "x": {"type": "integer", "description": "X coordinate"},
                "y": {"type": "integer", "description": "Y coordinate"}
            }),
            &["x", "y"],
            &[("color", "", true)],
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
        let p: PointColorParams = match parse_params(self.name(), params) {
            Ok(p) => p,
            Err(out) => return Ok(out),
        };
        let op = Operation::PutPixel {
            x: p.x,
            y: p.y,
            color: p.color.into(),
        };
        Ok(run_operation(&op, context).await)
    }
}

pub struct FloodFillTool;

#[async_trait]
impl Tool for FloodFillTool {
    fn name(&self) -> &str {
        "flood_fill"
    }

    fn description(&self) -> &str {
        "Flood fill the 4-connected region of matching color around a start pixel on the active layer."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        object_schema(
            json!({
                "x": {"type": "integer", "description": "X coordinate to start fill"},
                "y": {"type": "integer", "description": "Y coordinate to start fill"}
            }),
            &["x", "y"],
            &[("color", "", true)],
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
        let p: PointColorParams = match parse_params(self.name(), params) {
            Ok(p) => p,
            Err(out) => return Ok(out),
        };
        let op = Operation::FloodFill {
            x: p.x,
            y: p.y,
            color: p.color.into(),
        };
        Ok(run_operation(&op, context).await)
    }
}

#[derive(Debug, Deserialize)]
struct ReplaceColorParams {
    #[serde(flatten)]
    old: OldColorParams,
    #[serde(flatten)]
    new: NewColorParams,
}

pub struct ReplaceColorTool;

#[async_trait]
impl Tool for ReplaceColorTool {
    fn name(&self) -> &str {
        "replace_color"
    }

    fn description(&self) -> &str {
        "Replace every pixel of one color with another throughout the active layer. Pixels match on red, green and blue; their alpha is ignored."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        object_schema(
            json!({}),
            &[],
            &[("old_color", "Old color", false), ("new_color", "New color", true)],
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
        let p: ReplaceColorParams = match parse_params(self.name(), params) {
            Ok(p) => p,
            Err(out) => return Ok(out),
        };
        let op = Operation::ReplaceColor {
            old: p.old.into(),
            new: p.new.into(),
        };
        Ok(run_operation(&op, context).await)
    }
}
