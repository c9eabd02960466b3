//! JavaScript source helpers shared by every template.

/// What a script needs from the host before its body may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Requires {
    /// Nothing; the body checks for itself.
    Nothing,
    /// An active sprite, bound as `sprite`.
    Sprite,
    /// An active sprite and drawable image, bound as `sprite` and `img`.
    Image,
}

/// Render `text` as a JavaScript string literal.
///
/// JSON string syntax is valid JavaScript except for the two line
/// terminators JSON leaves raw, which are escaped here.
pub fn string_literal(text: &str) -> String {
    let json = serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string());
    json.replace('\u{2028}', "\\u2028")
        .replace('\u{2029}', "\\u2029")
}

/// Render a boolean as a JavaScript literal.
pub(crate) fn bool_literal(value: bool) -> &'static str {
    if value { "true" } else { "false" }
}

/// Helper that maps a host color-mode value back to its `ColorMode` member name.
pub(crate) const COLOR_MODE_NAME_FN: &str = "\
const colorModeName = function (mode) {
    if (typeof ColorMode !== 'undefined') {
        for (const key in ColorMode) {
            if (ColorMode[key] === mode) {
                return key;
            }
        }
    }
    return String(mode);
};
";

/// Wrap `body` in a self-invoking function with the precondition checks and
/// a catch-all that reports host faults as a single console line.
///
/// `activity` completes the failure line, e.g. "drawing circle" gives
/// `Error drawing circle: <message>`.
pub(crate) fn guarded(activity: &str, requires: Requires, body: &str) -> String {
    let mut script = String::with_capacity(body.len() + 512);
    script.push_str("(function () {\n    try {\n");

    if requires != Requires::Nothing {
        script.push_str(
            "        const sprite = app.activeSprite;\n\
             \x20       if (!sprite) {\n\
             \x20           console.log('No active sprite');\n\
             \x20           return;\n\
             \x20       }\n",
        );
    }
    if requires == Requires::Image {
        script.push_str(
            "        const img = app.activeImage;\n\
             \x20       if (!img) {\n\
             \x20           console.log('No active image');\n\
             \x20           return;\n\
             \x20       }\n",
        );
    }

    push_indented(&mut script, body, 8);

    script.push_str("    } catch (e) {\n");
    script.push_str(&format!(
        "        console.log('Error {activity}: ' + (e && e.message ? e.message : e));\n"
    ));
    script.push_str("    }\n})();\n");
    script
}

fn push_indented(out: &mut String, body: &str, spaces: usize) {
    let pad = " ".repeat(spaces);
    for line in body.trim_matches('\n').lines() {
        if line.trim().is_empty() {
            out.push('\n');
        } else {
            out.push_str(&pad);
            out.push_str(line);
            out.push('\n');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_literal_escapes_quotes_and_newlines() {
        assert_eq!(string_literal("Layer 1"), r#""Layer 1""#);
        assert_eq!(string_literal(r#"a"b"#), r#""a\"b""#);
        assert_eq!(string_literal("a\nb"), r#""a\nb""#);
        assert_eq!(string_literal(r"back\slash"), r#""back\\slash""#);
    }

    #[test]
    fn test_string_literal_escapes_js_line_terminators() {
        let literal = string_literal("a\u{2028}b\u{2029}c");
        assert_eq!(literal, r#""a\u2028b\u2029c""#);
    }

    #[test]
    fn test_guarded_image_checks_sprite_then_image() {
        let script = guarded("testing", Requires::Image, "console.log('body');");
        let sprite_check = script.find("app.activeSprite").unwrap();
        let image_check = script.find("app.activeImage").unwrap();
        let body = script.find("console.log('body')").unwrap();
        assert!(sprite_check < image_check && image_check < body);
        assert!(script.starts_with("(function () {"));
        assert!(script.trim_end().ends_with("})();"));
        assert!(script.contains("'Error testing: '"));
    }

    #[test]
    fn test_guarded_nothing_skips_checks() {
        let script = guarded("creating sprite", Requires::Nothing, "doIt();");
        assert!(!script.contains("No active sprite"));
        assert!(!script.contains("No active image"));
        assert!(script.contains("        doIt();\n"));
    }

    #[test]
    fn test_guarded_sprite_skips_image_check() {
        let script = guarded("creating layer", Requires::Sprite, "doIt();");
        assert!(script.contains("No active sprite"));
        assert!(!script.contains("No active image"));
    }
}
