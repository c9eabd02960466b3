//! The `libresprite` guidance prompt.

use serde_json::{Value, json};

pub const PROMPT_NAME: &str = "libresprite";

const TOOL_GUIDE: &str = "\
SPRITE & LAYER MANAGEMENT:
- create_sprite(width, height, color_mode) - create a new sprite
- create_layer(name) - add a layer above the active one
- delete_layer(layer_number) - delete a layer
- set_active_layer(layer_number) - choose the layer drawing tools paint on
- get_sprite_info() - dimensions, color mode, layers and current frame

DRAWING TOOLS:
- fill_layer(color_r, color_g, color_b, color_a) - solid color fill
- draw_circle(center_x, center_y, radius, color_*, filled) - circles
- draw_rectangle(x, y, width, height, color_*, filled) - rectangles
- draw_line(x1, y1, x2, y2, color_*, thickness) - lines
- draw_ellipse(center_x, center_y, width, height, color_*, filled) - ellipses

PIXEL OPERATIONS:
- put_pixel(x, y, color_*) - set a single pixel
- flood_fill(x, y, color_*) - fill a connected region
- replace_color(old_color_*, new_color_*) - swap one color for another";

/// Render the guidance text wrapped around the user's request.
pub fn guidance_prompt(user_prompt: &str) -> String {
    let mut parts = Vec::new();

    parts.push(
        "LibreSprite is a program for creating and editing pixel art and animations, scriptable with JavaScript."
            .to_string(),
    );
    parts.push(
        "You have dedicated tools for common edits. Use them instead of run_script whenever they cover the task:"
            .to_string(),
    );
    parts.push(TOOL_GUIDE.to_string());
    parts.push(
        "Use run_script only for custom operations the tools above cannot express. \
         Before writing a script, read the docs://reference and docs://examples resources."
            .to_string(),
    );
    parts.push(format!("Here is what you need to do:\n\n{user_prompt}"));

    parts.join("\n\n")
}

/// MCP `prompts/list` entry.
pub fn prompt_descriptor() -> Value {
    json!({
        "name": PROMPT_NAME,
        "title": "LibreSprite",
        "description": "Steer a request toward the dedicated LibreSprite tools and reference resources",
        "arguments": [
            {
                "name": "prompt",
                "description": "What to create or edit",
                "required": true
            }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_embeds_request_last() {
        let text = guidance_prompt("Draw a red apple");
        assert!(text.ends_with("Draw a red apple"));
        assert!(text.contains("docs://reference"));
        assert!(text.contains("docs://examples"));
    }

    #[test]
    fn test_prompt_names_every_dedicated_tool() {
        let text = guidance_prompt("");
        for tool in [
            "create_sprite",
            "create_layer",
            "delete_layer(layer_number)",
            "set_active_layer",
            "get_sprite_info",
            "fill_layer",
            "draw_circle",
            "draw_rectangle",
            "draw_line",
            "draw_ellipse",
            "put_pixel",
            "flood_fill",
            "replace_color",
        ] {
            assert!(text.contains(tool), "missing {tool}");
        }
        assert!(text.contains("instead of run_script"));
    }

    #[test]
    fn test_descriptor_declares_prompt_argument() {
        let d = prompt_descriptor();
        assert_eq!(d["name"], "libresprite");
        assert_eq!(d["arguments"][0]["name"], "prompt");
    }
}
