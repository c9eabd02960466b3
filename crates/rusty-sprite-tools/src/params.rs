//! Parameter parsing, schema fragments and the shared execute path.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use tracing::{debug, warn};

use rusty_sprite_scripts::{Operation, Rgb, Rgba};

use crate::{ToolContext, ToolOutput};

fn opaque() -> u8 {
    255
}

/// `color_r`, `color_g`, `color_b` and optional `color_a` (default 255).
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ColorParams {
    pub color_r: u8,
    pub color_g: u8,
    pub color_b: u8,
    #[serde(default = "opaque")]
    pub color_a: u8,
}

impl From<ColorParams> for Rgba {
    fn from(c: ColorParams) -> Self {
        Rgba::new(c.color_r, c.color_g, c.color_b, c.color_a)
    }
}

/// `old_color_r`, `old_color_g`, `old_color_b`. Alpha never takes part in matching.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OldColorParams {
    pub old_color_r: u8,
    pub old_color_g: u8,
    pub old_color_b: u8,
}

impl From<OldColorParams> for Rgb {
    fn from(c: OldColorParams) -> Self {
        Rgb::new(c.old_color_r, c.old_color_g, c.old_color_b)
    }
}

/// `new_color_r`, `new_color_g`, `new_color_b` and optional `new_color_a`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct NewColorParams {
    pub new_color_r: u8,
    pub new_color_g: u8,
    pub new_color_b: u8,
    #[serde(default = "opaque")]
    pub new_color_a: u8,
}

impl From<NewColorParams> for Rgba {
    fn from(c: NewColorParams) -> Self {
        Rgba::new(c.new_color_r, c.new_color_g, c.new_color_b, c.new_color_a)
    }
}

/// Deserialize tool arguments, turning failures into an error output that
/// names the tool. A missing argument object counts as empty.
pub fn parse_params<T: DeserializeOwned>(tool: &str, params: Value) -> Result<T, ToolOutput> {
    let params = if params.is_null() { json!({}) } else { params };
    serde_json::from_value(params)
        .map_err(|e| ToolOutput::error(format!("Invalid parameters for {tool}: {e}")))
}

/// Render `op` and run it in the host.
pub async fn run_operation(op: &Operation, context: &ToolContext) -> ToolOutput {
    let script = op.render();
    debug!(
        tool = op.name(),
        session = %context.request.session,
        request_id = %context.request.request_id,
        bytes = script.len(),
        "Rendered script"
    );
    run_source(&script, context).await
}

/// Send script text to the host and map bridge failures to error outputs.
pub async fn run_source(script: &str, context: &ToolContext) -> ToolOutput {
    match context.executor.run_script(script, &context.request).await {
        Ok(text) => ToolOutput::text(text),
        Err(e) => {
            warn!(
                code = e.code(),
                session = %context.request.session,
                request_id = %context.request.request_id,
                "Script did not run: {e}"
            );
            ToolOutput::error(e.to_string())
        }
    }
}

fn channel(description: &str) -> Value {
    json!({
        "type": "integer",
        "minimum": 0,
        "maximum": 255,
        "description": description,
    })
}

/// Add the channel properties for `prefix` (e.g. "color", "new_color").
/// The three color channels are appended to `required`; alpha stays optional
/// when `alpha` is set and is left out entirely otherwise.
pub fn add_color_properties(
    properties: &mut Map<String, Value>,
    required: &mut Vec<Value>,
    prefix: &str,
    label: &str,
    alpha: bool,
) {
    let describe = |name: &str| {
        if label.is_empty() {
            format!("{name} component (0-255)")
        } else {
            format!("{label} {} component (0-255)", name.to_lowercase())
        }
    };
    for (suffix, name) in [("r", "Red"), ("g", "Green"), ("b", "Blue")] {
        let key = format!("{prefix}_{suffix}");
        properties.insert(key.clone(), channel(&describe(name)));
        required.push(Value::String(key));
    }
    if alpha {
        let mut alpha_schema = channel(&describe("Alpha"));
        alpha_schema["default"] = json!(255);
        properties.insert(format!("{prefix}_a"), alpha_schema);
    }
}

/// Assemble an object schema from `properties` plus color channel groups.
pub fn object_schema(
    properties: Value,
    required: &[&str],
    colors: &[(&str, &str, bool)],
) -> Value {
    let mut properties = match properties {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let mut required: Vec<Value> = required.iter().map(|r| json!(r)).collect();
    for (prefix, label, alpha) in colors {
        add_color_properties(&mut properties, &mut required, prefix, label, *alpha);
    }
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct WithColor {
        x: i32,
        #[serde(flatten)]
        color: ColorParams,
    }

    #[test]
    fn test_flattened_color_defaults_alpha() {
        let p: WithColor =
            parse_params("t", json!({"x": 3, "color_r": 1, "color_g": 2, "color_b": 3})).unwrap();
        assert_eq!(p.x, 3);
        assert_eq!(Rgba::from(p.color), Rgba::new(1, 2, 3, 255));
    }

    #[test]
    fn test_out_of_range_channel_names_tool() {
        let err = parse_params::<WithColor>(
            "put_pixel",
            json!({"x": 0, "color_r": 300, "color_g": 0, "color_b": 0}),
        )
        .unwrap_err();
        assert!(err.is_error);
        assert!(err.content.starts_with("Invalid parameters for put_pixel:"), "{}", err.content);
    }

    #[test]
    fn test_null_params_are_empty_object() {
        #[derive(Debug, Deserialize)]
        struct Nothing {}
        assert!(parse_params::<Nothing>("get_sprite_info", Value::Null).is_ok());
    }

    #[test]
    fn test_object_schema_merges_colors() {
        let schema = object_schema(
            json!({"x": {"type": "integer"}}),
            &["x"],
            &[("old_color", "Old color", false), ("new_color", "New color", true)],
        );
        let props = schema["properties"].as_object().unwrap();
        assert!(props.contains_key("x"));
        assert!(props.contains_key("old_color_b"));
        assert!(!props.contains_key("old_color_a"));
        assert!(props.contains_key("new_color_a"));
        assert_eq!(
            props["new_color_r"]["description"],
            "New color red component (0-255)"
        );
        let required = schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 7);
        assert_eq!(props["new_color_a"]["default"], 255);
    }
}
