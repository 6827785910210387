// Color palettes for groups and density bands

use plotters::style::RGBColor;
use std::collections::HashMap;

/// Qualitative palette for categorical groups
#[derive(Debug, Clone)]
pub struct ColorPalette {
    colors: Vec<RGBColor>,
}

impl ColorPalette {
    pub fn category10() -> Self {
        Self {
            colors: vec![
                RGBColor(31, 119, 180),
                RGBColor(255, 127, 14),
                RGBColor(44, 160, 44),
                RGBColor(214, 39, 40),
                RGBColor(148, 103, 189),
                RGBColor(140, 86, 75),
                RGBColor(227, 119, 194),
                RGBColor(127, 127, 127),
                RGBColor(188, 189, 34),
                RGBColor(23, 190, 207),
            ],
        }
    }

    /// Color for the i-th group, cycling once the palette runs out
    pub fn color(&self, index: usize) -> RGBColor {
        self.colors[index % self.colors.len()]
    }

    /// Assign colors to keys in the given order
    pub fn assign_colors(&self, keys: &[String]) -> HashMap<String, RGBColor> {
        keys.iter()
            .enumerate()
            .map(|(i, k)| (k.clone(), self.color(i)))
            .collect()
    }
}

/// Sequential colormaps for banded density and count fills
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Colormap {
    Viridis,
    Jet,
}

impl Colormap {
    fn stops(&self) -> &'static [RGBColor] {
        const VIRIDIS: [RGBColor; 5] = [
            RGBColor(68, 1, 84),
            RGBColor(59, 82, 139),
            RGBColor(33, 145, 140),
            RGBColor(94, 201, 98),
            RGBColor(253, 231, 37),
        ];
        const JET: [RGBColor; 5] = [
            RGBColor(0, 0, 131),
            RGBColor(0, 60, 170),
            RGBColor(5, 255, 255),
            RGBColor(255, 255, 0),
            RGBColor(128, 0, 0),
        ];
        match self {
            Colormap::Viridis => &VIRIDIS,
            Colormap::Jet => &JET,
        }
    }

    /// Sample the colormap at `t` in [0, 1]
    pub fn sample(&self, t: f64) -> RGBColor {
        let stops = self.stops();
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let segments = stops.len() - 1;
        let segment = ((t * segments as f64).floor() as usize).min(segments - 1);
        let local_t = t * segments as f64 - segment as f64;
        lerp(stops[segment], stops[segment + 1], local_t)
    }

    /// Fill color for band `level` of `levels`
    pub fn band_color(&self, level: usize, levels: usize) -> RGBColor {
        if levels <= 1 {
            return self.sample(1.0);
        }
        self.sample(level as f64 / (levels - 1) as f64)
    }
}

fn lerp(a: RGBColor, b: RGBColor, t: f64) -> RGBColor {
    let mix = |x: u8, y: u8| (f64::from(x) * (1.0 - t) + f64::from(y) * t).round() as u8;
    RGBColor(mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Parse a color name or `#rrggbb` / `#rgb` hex string
pub fn parse_color(color: &str) -> Option<RGBColor> {
    let color = color.trim();
    if let Some(hex) = color.strip_prefix('#') {
        return parse_hex(hex);
    }
    match color.to_ascii_lowercase().as_str() {
        "red" => Some(RGBColor(255, 0, 0)),
        "green" => Some(RGBColor(0, 128, 0)),
        "blue" => Some(RGBColor(0, 0, 255)),
        "black" => Some(RGBColor(0, 0, 0)),
        "white" => Some(RGBColor(255, 255, 255)),
        "yellow" => Some(RGBColor(255, 255, 0)),
        "cyan" => Some(RGBColor(0, 255, 255)),
        "magenta" => Some(RGBColor(255, 0, 255)),
        "orange" => Some(RGBColor(255, 165, 0)),
        "gray" | "grey" => Some(RGBColor(128, 128, 128)),
        _ => None,
    }
}

fn parse_hex(hex: &str) -> Option<RGBColor> {
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some(RGBColor(
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        )),
        3 => {
            let c = |i: usize| channel(&hex[i..i + 1]).map(|v| v * 17);
            Some(RGBColor(c(0)?, c(1)?, c(2)?))
        }
        _ => None,
    }
}
