use anyhow::{anyhow, Result};
use plotters::style::RGBColor;

/// Ordered series colours; indices wrap around
#[derive(Debug, Clone, PartialEq)]
pub struct ColorPalette {
    colors: Vec<RGBColor>,
}

impl ColorPalette {
    pub fn category10() -> Self {
        Self {
            colors: vec![
                RGBColor(0x1f, 0x77, 0xb4),
                RGBColor(0xff, 0x7f, 0x0e),
                RGBColor(0x2c, 0xa0, 0x2c),
                RGBColor(0xd6, 0x27, 0x28),
                RGBColor(0x94, 0x67, 0xbd),
                RGBColor(0x8c, 0x56, 0x4b),
                RGBColor(0xe3, 0x77, 0xc2),
                RGBColor(0x7f, 0x7f, 0x7f),
                RGBColor(0xbc, 0xbd, 0x22),
                RGBColor(0x17, 0xbe, 0xcf),
            ],
        }
    }

    /// Build from colour names or `#rrggbb` strings
    pub fn from_specs(specs: &[String]) -> Result<Self> {
        if specs.is_empty() {
            return Err(anyhow!("Palette needs at least one colour"));
        }
        let colors = specs
            .iter()
            .map(|s| parse_color(s).ok_or_else(|| anyhow!("Unrecognised colour '{}'", s)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { colors })
    }

    pub fn color(&self, index: usize) -> RGBColor {
        self.colors[index % self.colors.len()]
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::category10()
    }
}

/// Parse a colour name or `#rrggbb` hex string
pub fn parse_color(color: &str) -> Option<RGBColor> {
    let color = color.trim();
    if let Some(hex) = color.strip_prefix('#') {
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        return Some(RGBColor(channel(0)?, channel(2)?, channel(4)?));
    }

    match color.to_ascii_lowercase().as_str() {
        "red" => Some(RGBColor(255, 0, 0)),
        "green" => Some(RGBColor(0, 255, 0)),
        "blue" => Some(RGBColor(0, 0, 255)),
        "black" => Some(RGBColor(0, 0, 0)),
        "yellow" => Some(RGBColor(255, 255, 0)),
        "cyan" => Some(RGBColor(0, 255, 255)),
        "magenta" => Some(RGBColor(255, 0, 255)),
        "white" => Some(RGBColor(255, 255, 255)),
        "gray" | "grey" => Some(RGBColor(128, 128, 128)),
        _ => None,
    }
}
