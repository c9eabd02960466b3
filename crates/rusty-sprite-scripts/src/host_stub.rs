//! A scriptable stand-in for the LibreSprite host.
//!
//! Evaluates generated scripts with `boa_engine` against an in-memory sprite
//! that implements the scripting surface the templates use. Console output is
//! captured per evaluation, the same contract the relay expects from a real
//! host.

use boa_engine::{Context, Source};

use crate::color::{ColorMode, Rgba};

const PRELUDE: &str = include_str!("host_stub.js");

/// Outcome of one evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// Lines printed with `console.log`, joined by `\n`.
    pub output: String,
    /// Set when the script raised an error it did not catch.
    pub error: Option<String>,
}

pub struct HostStub {
    context: Context,
}

impl Default for HostStub {
    fn default() -> Self {
        Self::new()
    }
}

impl HostStub {
    /// A host with no open sprite.
    pub fn new() -> Self {
        let mut context = Context::default();
        if let Err(e) = context.eval(Source::from_bytes(PRELUDE)) {
            panic!("host stub prelude failed to load: {e}");
        }
        Self { context }
    }

    /// A host with an open RGB sprite of one blank layer.
    pub fn with_sprite(width: u32, height: u32) -> Self {
        let mut host = Self::new();
        let setup = format!(
            "app.command.setParameter('width', {width});\n\
             app.command.setParameter('height', {height});\n\
             app.command.setParameter('colorMode', ColorMode.{});\n\
             app.command.NewFile();\n\
             app.command.clearParameters();",
            ColorMode::Rgb.token()
        );
        host.run_silently(&setup);
        host
    }

    /// Evaluate a script, capturing only what it prints.
    pub fn eval(&mut self, script: &str) -> Evaluation {
        self.run_silently("__console.reset();");
        let error = self
            .context
            .eval(Source::from_bytes(script))
            .err()
            .map(|e| e.to_string());
        let output = self.query("__console.take()");
        Evaluation { output, error }
    }

    /// Evaluate an expression and return its string value.
    pub fn query(&mut self, expr: &str) -> String {
        match self.context.eval(Source::from_bytes(expr)) {
            Ok(value) => value
                .to_string(&mut self.context)
                .map(|s| s.to_std_string_escaped())
                .unwrap_or_default(),
            Err(e) => format!("<error: {e}>"),
        }
    }

    /// Encoded color of a pixel on the active layer.
    pub fn pixel(&mut self, x: i32, y: i32) -> u32 {
        self.query(&format!("app.activeSprite.layers[__host.activeLayer].image.getPixel({x}, {y})"))
            .parse()
            .unwrap_or(u32::MAX)
    }

    /// Number of pixel writes made to the active layer so far.
    pub fn writes(&mut self) -> u64 {
        self.query("app.activeSprite.layers[__host.activeLayer].image.writes")
            .parse()
            .unwrap_or(0)
    }

    pub fn layer_count(&mut self) -> usize {
        self.query("app.activeSprite ? app.activeSprite.layerCount : 0")
            .parse()
            .unwrap_or(0)
    }

    /// Coordinates of every non-zero pixel on the active layer, row-major.
    pub fn painted_pixels(&mut self) -> Vec<(i32, i32)> {
        self.query("__paintedPixels()")
            .split(';')
            .filter(|s| !s.is_empty())
            .filter_map(|pair| {
                let (x, y) = pair.split_once(',')?;
                Some((x.parse().ok()?, y.parse().ok()?))
            })
            .collect()
    }

    /// Make `app.activeImage` report no drawable surface.
    pub fn detach_image(&mut self) {
        self.run_silently("__host.imageDetached = true;");
    }

    /// Make assignments to `app.activeLayerNumber` have no effect.
    pub fn lock_layer_selection(&mut self) {
        self.run_silently("__host.selectionLocked = true;");
    }

    /// The host's native encoding of a color.
    pub fn encode(color: Rgba) -> u32 {
        u32::from(color.r)
            | (u32::from(color.g) << 8)
            | (u32::from(color.b) << 16)
            | (u32::from(color.a) << 24)
    }

    fn run_silently(&mut self, source: &str) {
        if let Err(e) = self.context.eval(Source::from_bytes(source)) {
            panic!("host stub setup failed: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_is_scoped_per_evaluation() {
        let mut host = HostStub::new();
        assert_eq!(host.eval("console.log('one');").output, "one");
        assert_eq!(host.eval("console.log('two');").output, "two");
    }

    #[test]
    fn test_uncaught_error_is_reported() {
        let mut host = HostStub::new();
        let out = host.eval("console.log('before'); undefinedThing();");
        assert_eq!(out.output, "before");
        assert!(out.error.is_some());
    }

    #[test]
    fn test_encoding_matches_pixel_color() {
        let mut host = HostStub::new();
        let js = host.query("app.pixelColor.rgba(1, 2, 3, 200)");
        assert_eq!(js, HostStub::encode(Rgba::new(1, 2, 3, 200)).to_string());
    }

    #[test]
    fn test_with_sprite() {
        let mut host = HostStub::with_sprite(5, 7);
        assert_eq!(host.layer_count(), 1);
        assert_eq!(host.query("app.activeImage.width + 'x' + app.activeImage.height"), "5x7");
        assert!(host.painted_pixels().is_empty());
    }
}
