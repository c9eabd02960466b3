//! Shape drawing tools. All of them paint on the active layer.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use rusty_sprite_scripts::Operation;

use crate::params::{ColorParams, object_schema, parse_params, run_operation};
use crate::{Tool, ToolContext, ToolOutput};

const COLOR: &[(&str, &str, bool)] = &[("color", "", true)];

fn default_true() -> bool {
    true
}

fn default_thickness() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct FillLayerParams {
    #[serde(flatten)]
    color: ColorParams,
}

pub struct FillLayerTool;

#[async_trait]
impl Tool for FillLayerTool {
    fn name(&self) -> &str {
        "fill_layer"
    }

    fn description(&self) -> &str {
        "Fill the active layer with a solid color."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        object_schema(json!({}), &[], COLOR)
    }

    fn idempotent(&self) -> bool {
        true
    }

    async fn execute(
        &self,
        params: serde_json::Value,
        context: &ToolContext,
    ) -> anyhow::Result<ToolOutput> {
        let p: FillLayerParams = match parse_params(self.name(), params) {
            Ok(p) => p,
            Err(out) => return Ok(out),
        };
        let op = Operation::FillLayer {
            color: p.color.into(),
        };
        Ok(run_operation(&op, context).await)
    }
}

#[derive(Debug, Deserialize)]
struct DrawRectangleParams {
    x: i32,
    y: i32,
    width: u32,
    height: u32,
    #[serde(flatten)]
    color: ColorParams,
    #[serde(default = "default_true")]
    filled: bool,
}

pub struct DrawRectangleTool;

#[async_trait]
impl Tool for DrawRectangleTool {
    fn name(&self) -> &str {
        "draw_rectangle"
    }

    fn description(&self) -> &str {
        "Draw a filled or outlined rectangle on the active layer. Parts outside the image are clipped."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        object_schema(
            json!({
                "x": {"type": "integer", "description": "Top-left x coordinate"},
                "y": {"type": "integer", "description": "Top-left y coordinate"},
                "width": {"type": "integer", "minimum": 0, "description": "Rectangle width"},
                "height": {"type": "integer", "minimum": 0, "description": "Rectangle height"},
                "filled": {
                    "type": "boolean",
                    "default": true,
                    "description": "Whether to fill the rectangle (default is true)"
                }
            }),
            &["x", "y", "width", "height"],
            COLOR,
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
        let p: DrawRectangleParams = match parse_params(self.name(), params) {
            Ok(p) => p,
            Err(out) => return Ok(out),
        };
        let op = Operation::DrawRectangle {
            x: p.x,
            y: p.y,
            width: p.width,
            height: p.height,
            color: p.color.into(),
            filled: p.filled,
        };
        Ok(run_operation(&op, context).await)
    }
}

#[derive(Debug, Deserialize)]
struct DrawCircleParams {
    center_x: i32,
    center_y: i32,
    radius: u32,
    #[serde(flatten)]
    color: ColorParams,
    #[serde(default = "default_true")]
    filled: bool,
}

pub struct DrawCircleTool;

#[async_trait]
impl Tool for DrawCircleTool {
    fn name(&self) -> &str {
        "draw_circle"
    }

    fn description(&self) -> &str {
        "Draw a filled or outlined circle on the active layer."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        object_schema(
            json!({
                "center_x": {"type": "integer", "description": "X coordinate of circle center"},
                "center_y": {"type": "integer", "description": "Y coordinate of circle center"},
                "radius": {"type": "integer", "minimum": 0, "description": "Circle radius in pixels"},
                "filled": {
                    "type": "boolean",
                    "default": true,
                    "description": "Whether to fill the circle (default is true)"
                }
            }),
            &["center_x", "center_y", "radius"],
            COLOR,
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
        let p: DrawCircleParams = match parse_params(self.name(), params) {
            Ok(p) => p,
            Err(out) => return Ok(out),
        };
        let op = Operation::DrawCircle {
            center_x: p.center_x,
            center_y: p.center_y,
            radius: p.radius,
            color: p.color.into(),
            filled: p.filled,
        };
        Ok(run_operation(&op, context).await)
    }
}

#[derive(Debug, Deserialize)]
struct DrawEllipseParams {
    center_x: i32,
    center_y: i32,
    width: u32,
    height: u32,
    #[serde(flatten)]
    color: ColorParams,
    #[serde(default = "default_true")]
    filled: bool,
}

pub struct DrawEllipseTool;

#[async_trait]
impl Tool for DrawEllipseTool {
    fn name(&self) -> &str {
        "draw_ellipse"
    }

    fn description(&self) -> &str {
        "Draw a filled or outlined ellipse on the active layer."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        object_schema(
            json!({
                "center_x": {"type": "integer", "description": "Center x coordinate"},
                "center_y": {"type": "integer", "description": "Center y coordinate"},
                "width": {"type": "integer", "minimum": 1, "description": "Ellipse width"},
                "height": {"type": "integer", "minimum": 1, "description": "Ellipse height"},
                "filled": {
                    "type": "boolean",
                    "default": true,
                    "description": "Whether to fill the ellipse (default is true)"
                }
            }),
            &["center_x", "center_y", "width", "height"],
            COLOR,
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
        let p: DrawEllipseParams = match parse_params(self.name(), params) {
            Ok(p) => p,
            Err(out) => return Ok(out),
        };
        // A zero axis divides by zero in the ellipse equation
        if p.width == 0 || p.height == 0 {
            return Ok(ToolOutput::error(format!(
                "Ellipse width and height must be at least 1, got {}x{}",
                p.width, p.height
            )));
        }
        let op = Operation::DrawEllipse {
            center_x: p.center_x,
            center_y: p.center_y,
            width: p.width,
            height: p.height,
            color: p.color.into(),
            filled: p.filled,
        };
        Ok(run_operation(&op, context).await)
    }
}

#[derive(Debug, Deserialize)]
struct DrawLineParams {
    x1: i32,
    y1: i32,
    x2: i32,
    y2: i32,
    #[serde(flatten)]
    color: ColorParams,
    #[serde(default = "default_thickness")]
    thickness: u32,
}

pub struct DrawLineTool;

#[async_trait]
impl Tool for DrawLineTool {
    fn name(&self) -> &str {
        "draw_line"
    }

    fn description(&self) -> &str {
        "Draw a straight line on the active layer, optionally thicker than one pixel."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        object_schema(
            json!({
                "x1": {"type": "integer", "description": "Start x coordinate"},
                "y1": {"type": "integer", "description": "Start y coordinate"},
                "x2": {"type": "integer", "description": "End x coordinate"},
                "y2": {"type": "integer", "description": "End y coordinate"},
                "thickness": {
                    "type": "integer",
                    "minimum": 1,
                    "default": 1,
                    "description": "Line thickness in pixels (default is 1)"
                }
            }),
            &["x1", "y1", "x2", "y2"],
            COLOR,
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
        let p: DrawLineParams = match parse_params(self.name(), params) {
            Ok(p) => p,
            Err(out) => return Ok(out),
        };
        if p.thickness == 0 {
            return Ok(ToolOutput::error("Line thickness must be at least 1"));
        }
        let op = Operation::DrawLine {
            x1: p.x1,
            y1: p.y1,
            x2: p.x2,
            y2: p.y2,
            color: p.color.into(),
            thickness: p.thickness,
        };
        Ok(run_operation(&op, context).await)
    }
}
