//! Sprite and layer management scripts.

use crate::color::ColorMode;
use crate::js::{COLOR_MODE_NAME_FN, Requires, guarded, string_literal};

pub fn create_sprite(width: u32, height: u32, color_mode: ColorMode) -> String {
    let mode = color_mode.token();
    let body = format!(
        r#"{COLOR_MODE_NAME_FN}app.command.setParameter("width", {width});
app.command.setParameter("height", {height});
app.command.setParameter("colorMode", ColorMode.{mode});
try {{
    app.command.NewFile();
}} finally {{
    app.command.clearParameters();
}}

const sprite = app.activeSprite;
if (!sprite) {{
    console.log('Failed to create sprite');
    return;
}}
console.log('Created new sprite: ' + sprite.width + 'x' + sprite.height + ' (' + colorModeName(sprite.colorMode) + ')');
console.log('Active sprite now has ' + sprite.layerCount + ' layer(s)');"#
    );
    guarded("creating sprite", Requires::Nothing, &body)
}

pub fn create_layer(name: &str) -> String {
    let name = string_literal(name);
    let body = format!(
        r#"const name = {name};
app.command.setParameter("name", name);
try {{
    app.command.NewLayer();
}} finally {{
    app.command.clearParameters();
}}

console.log('Created new layer: ' + name);
console.log('Sprite now has ' + sprite.layerCount + ' layer(s)');"#
    );
    guarded("creating layer", Requires::Sprite, &body)
}

pub fn delete_layer(index: u32) -> String {
    let body = format!(
        r#"const layerNumber = {index};
if (layerNumber >= sprite.layerCount) {{
    console.log('Layer number ' + layerNumber + ' is out of range (0-' + (sprite.layerCount - 1) + ')');
    return;
}}
if (sprite.layerCount <= 1) {{
    console.log('Cannot delete the only remaining layer');
    return;
}}

const layer = sprite.layer(layerNumber);
if (!layer) {{
    console.log('Layer ' + layerNumber + ' not found');
    return;
}}
const layerName = layer.name;

// RemoveLayer acts on the active layer
if (app.activeLayerNumber !== layerNumber) {{
    app.activeLayerNumber = layerNumber;
}}
if (app.activeLayerNumber !== layerNumber) {{
    console.log('Could not select layer ' + layerNumber + ' for deletion; active layer is ' + app.activeLayerNumber);
    return;
}}

app.command.RemoveLayer();
console.log('Deleted layer ' + layerNumber + ': "' + layerName + '"');
console.log('Sprite now has ' + sprite.layerCount + ' layer(s)');"#
    );
    guarded("deleting layer", Requires::Sprite, &body)
}

pub fn set_active_layer(index: u32) -> String {
    let body = format!(
        r#"const layerNumber = {index};
if (layerNumber >= sprite.layerCount) {{
    console.log('Layer number ' + layerNumber + ' is out of range (0-' + (sprite.layerCount - 1) + ')');
    return;
}}

const layer = sprite.layer(layerNumber);
if (!layer) {{
    console.log('Layer ' + layerNumber + ' not found');
    return;
}}

app.activeLayerNumber = layerNumber;
if (app.activeLayerNumber !== layerNumber) {{
    console.log('Host did not switch layers; active layer is still ' + app.activeLayerNumber);
    return;
}}
console.log('Active layer is now ' + layerNumber + ': "' + layer.name + '"');"#
    );
    guarded("switching layer", Requires::Sprite, &body)
}

pub fn get_sprite_info() -> String {
    let body = format!(
        r#"{COLOR_MODE_NAME_FN}console.log('=== SPRITE INFO ===');
console.log('Dimensions: ' + sprite.width + 'x' + sprite.height);
console.log('Color Mode: ' + colorModeName(sprite.colorMode));
console.log('Layer Count: ' + sprite.layerCount);
console.log('Current Layer: ' + app.activeLayerNumber);
console.log('Current Frame: ' + app.activeFrameNumber);

console.log('--- LAYER DETAILS ---');
for (let i = 0; i < sprite.layerCount; i++) {{
    const layer = sprite.layer(i);
    if (layer) {{
        console.log('Layer ' + i + ': "' + layer.name + '" (visible: ' + layer.isVisible + ', editable: ' + layer.isEditable + ')');
    }}
}}"#
    );
    guarded("getting sprite info", Requires::Sprite, &body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host_stub::HostStub;

    #[test]
    fn test_create_sprite_reports_size_and_mode() {
        let mut host = HostStub::new();
        let out = host.eval(&create_sprite(32, 32, ColorMode::Rgb));
        assert!(out.error.is_none(), "uncaught: {:?}", out.error);
        assert!(out.output.contains("32x32"), "got: {}", out.output);
        assert!(out.output.contains("RGB"), "got: {}", out.output);
        assert_eq!(host.layer_count(), 1);
    }

    #[test]
    fn test_create_sprite_grayscale() {
        let mut host = HostStub::new();
        let out = host.eval(&create_sprite(16, 8, ColorMode::Grayscale));
        assert!(out.output.contains("16x8 (GRAYSCALE)"), "got: {}", out.output);
    }

    #[test]
    fn test_create_sprite_clears_parameters_after_failure() {
        let mut host = HostStub::new();
        // The stub's NewFile rejects zero sizes
        let out = host.eval(&create_sprite(0, 0, ColorMode::Rgb));
        assert!(out.output.starts_with("Error creating sprite:"), "got: {}", out.output);
        assert_eq!(host.query("Object.keys(__host.params).length"), "0");
    }

    #[test]
    fn test_create_layer_needs_sprite() {
        let mut host = HostStub::new();
        let out = host.eval(&create_layer("Ink"));
        assert_eq!(out.output, "No active sprite");
    }

    #[test]
    fn test_create_layer_uses_name_verbatim() {
        let mut host = HostStub::with_sprite(4, 4);
        let tricky = r#"it's "quoted" \ and');console.log('pwned"#;
        let out = host.eval(&create_layer(tricky));
        assert!(out.error.is_none(), "uncaught: {:?}", out.error);
        assert!(!out.output.contains("\npwned"));
        assert_eq!(host.layer_count(), 2);
        assert_eq!(host.query("app.activeSprite.layer(1).name"), tricky);
        assert!(out.output.contains("Sprite now has 2 layer(s)"));
    }

    #[test]
    fn test_delete_only_layer_is_refused() {
        let mut host = HostStub::with_sprite(4, 4);
        let out = host.eval(&delete_layer(0));
        assert_eq!(out.output, "Cannot delete the only remaining layer");
        assert_eq!(host.layer_count(), 1);
    }

    #[test]
    fn test_delete_layer_out_of_range() {
        let mut host = HostStub::with_sprite(4, 4);
        host.eval(&create_layer("Second"));
        let out = host.eval(&delete_layer(5));
        assert_eq!(out.output, "Layer number 5 is out of range (0-1)");
        assert_eq!(host.layer_count(), 2);
    }

    #[test]
    fn test_delete_layer_removes_requested_index() {
        let mut host = HostStub::with_sprite(4, 4);
        host.eval(&create_layer("Second"));
        host.eval(&create_layer("Third"));
        assert_eq!(host.query("app.activeLayerNumber"), "2");

        let out = host.eval(&delete_layer(0));
        assert!(out.output.contains(r#"Deleted layer 0: "Layer 1""#), "got: {}", out.output);
        assert!(out.output.contains("Sprite now has 2 layer(s)"));
        assert_eq!(host.query("app.activeSprite.layer(0).name"), "Second");
        assert_eq!(host.query("app.activeSprite.layer(1).name"), "Third");
    }

    #[test]
    fn test_delete_layer_refuses_when_host_cannot_select() {
        let mut host = HostStub::with_sprite(4, 4);
        host.eval(&create_layer("Second"));
        host.lock_layer_selection();
        let out = host.eval(&delete_layer(0));
        assert!(out.output.starts_with("Could not select layer 0"), "got: {}", out.output);
        assert_eq!(host.layer_count(), 2);
    }

    #[test]
    fn test_set_active_layer() {
        let mut host = HostStub::with_sprite(4, 4);
        host.eval(&create_layer("Top"));
        let out = host.eval(&set_active_layer(0));
        assert_eq!(out.output, r#"Active layer is now 0: "Layer 1""#);
        assert_eq!(host.query("app.activeLayerNumber"), "0");

        let out = host.eval(&set_active_layer(9));
        assert_eq!(out.output, "Layer number 9 is out of range (0-1)");
    }

    #[test]
    fn test_sprite_info_lists_layers() {
        let mut host = HostStub::with_sprite(10, 12);
        host.eval(&create_layer("Outline"));
        let out = host.eval(&get_sprite_info());
        let lines: Vec<&str> = out.output.lines().collect();
        assert_eq!(lines[0], "=== SPRITE INFO ===");
        assert!(lines.contains(&"Dimensions: 10x12"));
        assert!(lines.contains(&"Color Mode: RGB"));
        assert!(lines.contains(&"Layer Count: 2"));
        assert!(lines.contains(&"Current Layer: 1"));
        assert!(lines.contains(&"Current Frame: 0"));
        assert!(lines.contains(&r#"Layer 0: "Layer 1" (visible: true, editable: true)"#));
        assert!(lines.contains(&r#"Layer 1: "Outline" (visible: true, editable: true)"#));
    }

    #[test]
    fn test_sprite_info_without_sprite() {
        let mut host = HostStub::new();
        assert_eq!(host.eval(&get_sprite_info()).output, "No active sprite");
    }
}
