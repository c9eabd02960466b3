//! LibreSprite script generation.
//!
//! Each pixel-editing primitive is a variant of [`Operation`]. Rendering an
//! operation yields a self-contained JavaScript snippet that performs the
//! edit in the host and prints a one-line confirmation (or explanation) with
//! `console.log`. Rendering is pure: identical operations give byte-identical
//! scripts.

pub mod color;
pub mod js;
pub mod templates;

#[cfg(any(test, feature = "host-stub"))]
pub mod host_stub;

use serde::{Deserialize, Serialize};

pub use color::{ColorMode, Rgb, Rgba, UnknownColorMode};

/// A validated pixel-editing request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    CreateSprite {
        width: u32,
        height: u32,
        #[serde(default)]
        color_mode: ColorMode,
    },
    CreateLayer {
        #[serde(default = "default_layer_name")]
        name: String,
    },
    DeleteLayer {
        index: u32,
    },
    SetActiveLayer {
        index: u32,
    },
    GetSpriteInfo,
    FillLayer {
        color: Rgba,
    },
    PutPixel {
        x: i32,
        y: i32,
        color: Rgba,
    },
    DrawRectangle {
        x: i32,
        y: i32,
        width: u32,
        height: u32,
        color: Rgba,
        #[serde(default = "default_true")]
        filled: bool,
    },
    DrawCircle {
        center_x: i32,
        center_y: i32,
        radius: u32,
        color: Rgba,
        #[serde(default = "default_true")]
        filled: bool,
    },
    DrawEllipse {
        center_x: i32,
        center_y: i32,
        width: u32,
        height: u32,
        color: Rgba,
        #[serde(default = "default_true")]
        filled: bool,
    },
    DrawLine {
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
        color: Rgba,
        #[serde(default = "default_thickness")]
        thickness: u32,
    },
    FloodFill {
        x: i32,
        y: i32,
        color: Rgba,
    },
    ReplaceColor {
        old: Rgb,
        new: Rgba,
    },
}

/// Name given to a layer created without one.
pub fn default_layer_name() -> String {
    "New Layer".to_string()
}

fn default_true() -> bool {
    true
}

fn default_thickness() -> u32 {
    1
}

impl Operation {
    /// Tool name this operation is exposed under.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::CreateSprite { .. } => "create_sprite",
            Operation::CreateLayer { .. } => "create_layer",
            Operation::DeleteLayer { .. } => "delete_layer",
            Operation::SetActiveLayer { .. } => "set_active_layer",
            Operation::GetSpriteInfo => "get_sprite_info",
            Operation::FillLayer { .. } => "fill_layer",
            Operation::PutPixel { .. } => "put_pixel",
            Operation::DrawRectangle { .. } => "draw_rectangle",
            Operation::DrawCircle { .. } => "draw_circle",
            Operation::DrawEllipse { .. } => "draw_ellipse",
            Operation::DrawLine { .. } => "draw_line",
            Operation::FloodFill { .. } => "flood_fill",
            Operation::ReplaceColor { .. } => "replace_color",
        }
    }

    /// Whether running the script twice leaves the host as running it once.
    ///
    /// Only these are safe to resubmit after a timeout.
    pub fn is_idempotent(&self) -> bool {
        !matches!(
            self,
            Operation::CreateSprite { .. } | Operation::CreateLayer { .. } | Operation::DeleteLayer { .. }
        )
    }

    /// Whether the script only reads host state.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Operation::GetSpriteInfo)
    }

    /// Render the host script for this operation.
    pub fn render(&self) -> String {
        use templates::{draw, pixels, sprite};

        match self {
            Operation::CreateSprite { width, height, color_mode } => {
                sprite::create_sprite(*width, *height, *color_mode)
            }
            Operation::CreateLayer { name } => sprite::create_layer(name),
            Operation::DeleteLayer { index } => sprite::delete_layer(*index),
            Operation::SetActiveLayer { index } => sprite::set_active_layer(*index),
            Operation::GetSpriteInfo => sprite::get_sprite_info(),
            Operation::FillLayer { color } => draw::fill_layer(*color),
            Operation::PutPixel { x, y, color } => pixels::put_pixel(*x, *y, *color),
            Operation::DrawRectangle { x, y, width, height, color, filled } => {
                draw::draw_rectangle(*x, *y, *width, *height, *color, *filled)
            }
            Operation::DrawCircle { center_x, center_y, radius, color, filled } => {
                draw::draw_circle(*center_x, *center_y, *radius, *color, *filled)
            }
            Operation::DrawEllipse { center_x, center_y, width, height, color, filled } => {
                draw::draw_ellipse(*center_x, *center_y, *width, *height, *color, *filled)
            }
            Operation::DrawLine { x1, y1, x2, y2, color, thickness } => {
                draw::draw_line(*x1, *y1, *x2, *y2, *color, *thickness)
            }
            Operation::FloodFill { x, y, color } => pixels::flood_fill(*x, *y, *color),
            Operation::ReplaceColor { old, new } => pixels::replace_color(*old, *new),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host_stub::HostStub;

    const RED: Rgba = Rgba::opaque(255, 0, 0);

    fn catalog() -> Vec<Operation> {
        vec![
            Operation::CreateSprite { width: 32, height: 32, color_mode: ColorMode::Rgb },
            Operation::CreateLayer { name: "Ink".into() },
            Operation::DeleteLayer { index: 0 },
            Operation::SetActiveLayer { index: 0 },
            Operation::GetSpriteInfo,
            Operation::FillLayer { color: RED },
            Operation::PutPixel { x: 1, y: 1, color: RED },
            Operation::DrawRectangle { x: 0, y: 0, width: 4, height: 4, color: RED, filled: false },
            Operation::DrawCircle { center_x: 4, center_y: 4, radius: 2, color: RED, filled: true },
            Operation::DrawEllipse { center_x: 4, center_y: 4, width: 6, height: 4, color: RED, filled: true },
            Operation::DrawLine { x1: 0, y1: 0, x2: 5, y2: 3, color: RED, thickness: 2 },
            Operation::FloodFill { x: 0, y: 0, color: RED },
            Operation::ReplaceColor { old: Rgb::new(0, 0, 0), new: RED },
        ]
    }

    #[test]
    fn test_every_script_is_nonempty_deterministic_and_guarded() {
        for op in catalog() {
            let first = op.render();
            let second = op.render();
            assert!(!first.trim().is_empty(), "{}", op.name());
            assert_eq!(first, second, "{} is not deterministic", op.name());
            assert!(first.contains("app.activeSprite"), "{} lacks a sprite guard", op.name());
            assert!(first.contains("catch (e)"), "{} lacks a fault guard", op.name());
        }
    }

    #[test]
    fn test_every_script_reports_missing_sprite_without_faulting() {
        for op in catalog() {
            if matches!(op, Operation::CreateSprite { .. }) {
                continue;
            }
            let mut host = HostStub::new();
            let out = host.eval(&op.render());
            assert!(out.error.is_none(), "{} raised {:?}", op.name(), out.error);
            assert_eq!(out.output, "No active sprite", "{}", op.name());
        }
    }

    #[test]
    fn test_every_script_leaves_no_globals_behind() {
        for op in catalog() {
            let mut host = HostStub::with_sprite(8, 8);
            host.eval(&op.render());
            for name in ["sprite", "img", "layerNumber", "fillColor", "stack", "colorModeName"] {
                assert_eq!(
                    host.query(&format!("typeof {name}")),
                    "undefined",
                    "{} leaked `{name}`",
                    op.name()
                );
            }
        }
    }

    #[test]
    fn test_pixel_scripts_report_missing_image() {
        for op in catalog() {
            let needs_image = matches!(
                op,
                Operation::FillLayer { .. }
                    | Operation::PutPixel { .. }
                    | Operation::DrawRectangle { .. }
                    | Operation::DrawCircle { .. }
                    | Operation::DrawEllipse { .. }
                    | Operation::DrawLine { .. }
                    | Operation::FloodFill { .. }
                    | Operation::ReplaceColor { .. }
            );
            if !needs_image {
                continue;
            }
            let mut host = HostStub::with_sprite(8, 8);
            host.detach_image();
            assert_eq!(host.eval(&op.render()).output, "No active image", "{}", op.name());
        }
    }

    #[test]
    fn test_operation_json_defaults() {
        let op: Operation = serde_json::from_str(
            r#"{"op":"draw_circle","center_x":3,"center_y":4,"radius":2,"color":{"r":1,"g":2,"b":3}}"#,
        )
        .unwrap();
        assert_eq!(
            op,
            Operation::DrawCircle {
                center_x: 3,
                center_y: 4,
                radius: 2,
                color: Rgba::new(1, 2, 3, 255),
                filled: true,
            }
        );

        let op: Operation = serde_json::from_str(r#"{"op":"create_layer"}"#).unwrap();
        assert_eq!(op, Operation::CreateLayer { name: "New Layer".into() });

        let op: Operation = serde_json::from_str(r#"{"op":"get_sprite_info"}"#).unwrap();
        assert_eq!(op.name(), "get_sprite_info");
    }

    #[test]
    fn test_operation_json_rejects_bad_color_mode() {
        let result = serde_json::from_str::<Operation>(
            r#"{"op":"create_sprite","width":4,"height":4,"color_mode":"RGB;evil()"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_idempotence_flags() {
        assert!(!Operation::CreateLayer { name: "x".into() }.is_idempotent());
        assert!(!Operation::DeleteLayer { index: 1 }.is_idempotent());
        assert!(Operation::FloodFill { x: 0, y: 0, color: RED }.is_idempotent());
        assert!(Operation::PutPixel { x: 0, y: 0, color: RED }.is_idempotent());
        assert!(Operation::GetSpriteInfo.is_read_only());
    }
}
