//! Color values and sprite color modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// An RGBA color, one byte per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    255
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Host expression producing this color in the host's native encoding.
    pub(crate) fn host_expr(&self) -> String {
        format!(
            "app.pixelColor.rgba({}, {}, {}, {})",
            self.r, self.g, self.b, self.a
        )
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({},{},{},{})", self.r, self.g, self.b, self.a)
    }
}

/// An RGB color, used where alpha does not take part in matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({},{},{},*)", self.r, self.g, self.b)
    }
}

/// Sprite color mode understood by the host's `NewFile` command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ColorMode {
    #[default]
    Rgb,
    Grayscale,
    Indexed,
}

impl ColorMode {
    /// Member name on the host's `ColorMode` object.
    pub fn token(&self) -> &'static str {
        match self {
            ColorMode::Rgb => "RGB",
            ColorMode::Grayscale => "GRAYSCALE",
            ColorMode::Indexed => "INDEXED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown color mode '{0}' (expected RGB, GRAYSCALE or INDEXED)")]
pub struct UnknownColorMode(pub String);

impl FromStr for ColorMode {
    type Err = UnknownColorMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RGB" | "RGBA" => Ok(ColorMode::Rgb),
            "GRAYSCALE" | "GREYSCALE" | "GRAY" | "GREY" => Ok(ColorMode::Grayscale),
            "INDEXED" => Ok(ColorMode::Indexed),
            _ => Err(UnknownColorMode(s.to_string())),
        }
    }
}

impl TryFrom<String> for ColorMode {
    type Error = UnknownColorMode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ColorMode> for String {
    fn from(mode: ColorMode) -> Self {
        mode.token().to_string()
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_mode_parse_is_case_insensitive() {
        assert_eq!("rgb".parse::<ColorMode>().unwrap(), ColorMode::Rgb);
        assert_eq!("RGBA".parse::<ColorMode>().unwrap(), ColorMode::Rgb);
        assert_eq!(" Grayscale ".parse::<ColorMode>().unwrap(), ColorMode::Grayscale);
        assert_eq!("indexed".parse::<ColorMode>().unwrap(), ColorMode::Indexed);
    }

    #[test]
    fn test_color_mode_rejects_unknown_tokens() {
        // Never let free text reach the script as an identifier
        assert!("RGB); app.command.Exit(".parse::<ColorMode>().is_err());
        assert!("cmyk".parse::<ColorMode>().is_err());
    }

    #[test]
    fn test_color_mode_serde() {
        let mode: ColorMode = serde_json::from_str(r#""grayscale""#).unwrap();
        assert_eq!(mode, ColorMode::Grayscale);
        assert_eq!(serde_json::to_string(&ColorMode::Indexed).unwrap(), r#""INDEXED""#);
    }

    #[test]
    fn test_rgba_alpha_defaults_to_opaque() {
        let color: Rgba = serde_json::from_str(r#"{"r":1,"g":2,"b":3}"#).unwrap();
        assert_eq!(color, Rgba::new(1, 2, 3, 255));
    }

    #[test]
    fn test_rgba_rejects_out_of_range_channels() {
        assert!(serde_json::from_str::<Rgba>(r#"{"r":256,"g":0,"b":0}"#).is_err());
        assert!(serde_json::from_str::<Rgba>(r#"{"r":-1,"g":0,"b":0}"#).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(Rgba::new(255, 0, 0, 128).to_string(), "rgba(255,0,0,128)");
        assert_eq!(Rgb::new(1, 2, 3).to_string(), "rgba(1,2,3,*)");
    }
}
