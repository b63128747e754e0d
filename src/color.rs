//! Chart colors in the `rgb(r, g, b)` / `rgba(r, g, b, a)` string encoding.
//!
//! Every color handed to a renderer must be written exactly as
//! `rgb(INT, INT, INT)`. Transparency is only ever added by re-emitting the
//! parsed components as `rgba(...)`.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Serialize, Serializer};
use thiserror::Error;

/// Plotly's default qualitative palette.
pub const DEFAULT_COLORS: [&str; 10] = [
    "rgb(31, 119, 180)",
    "rgb(255, 127, 14)",
    "rgb(44, 160, 44)",
    "rgb(214, 39, 40)",
    "rgb(148, 103, 189)",
    "rgb(140, 86, 75)",
    "rgb(227, 119, 194)",
    "rgb(127, 127, 127)",
    "rgb(188, 189, 34)",
    "rgb(23, 190, 207)",
];

static RGB_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^rgb\(([0-9]+), ([0-9]+), ([0-9]+)\)$").expect("rgb pattern compiles")
});

/// Errors raised for color strings outside the accepted encoding.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ColorError {
    /// The string is not of the form `rgb(INT, INT, INT)`.
    #[error("Unrecognized color format: {0:?}")]
    Unrecognized(String),
    /// A component does not fit in a byte.
    #[error("Color component out of range in {0:?}")]
    OutOfRange(String),
    /// Alpha is not a finite value in `[0, 1]`.
    #[error("Invalid alpha {0}: expected a value between 0 and 1")]
    InvalidAlpha(f64),
}

/// Opaque color parsed from `rgb(r, g, b)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse the strict `rgb(INT, INT, INT)` form.
    pub fn parse(color: &str) -> Result<Self, ColorError> {
        let Some(captures) = RGB_PATTERN.captures(color) else {
            tracing::error!("Unrecognized color format: {color:?}");
            return Err(ColorError::Unrecognized(color.to_string()));
        };
        let component = |idx: usize| {
            captures[idx]
                .parse::<u8>()
                .map_err(|_| ColorError::OutOfRange(color.to_string()))
        };
        Ok(Self::new(component(1)?, component(2)?, component(3)?))
    }

    /// Attach a checked alpha channel.
    pub fn try_with_alpha(self, alpha: f64) -> Result<Rgba, ColorError> {
        if !(0.0..=1.0).contains(&alpha) {
            tracing::error!("Invalid alpha {alpha} for {self}");
            return Err(ColorError::InvalidAlpha(alpha));
        }
        Ok(Rgba { rgb: self, alpha })
    }

    /// Attach an alpha channel, clamped into `[0, 1]`; for fixed chart alphas.
    pub fn with_alpha(self, alpha: f64) -> Rgba {
        Rgba {
            rgb: self,
            alpha: alpha.clamp(0.0, 1.0),
        }
    }

    pub fn components(self) -> [f64; 3] {
        [self.r as f64, self.g as f64, self.b as f64]
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Color with transparency, emitted as `rgba(r, g, b, alpha)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub rgb: Rgb,
    pub alpha: f64,
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Rgb { r, g, b } = self.rgb;
        write!(f, "rgba({r}, {g}, {b}, {})", self.alpha)
    }
}

impl Serialize for Rgba {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Either an opaque or a translucent color, as stored on chart traces.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Paint {
    Solid(Rgb),
    Translucent(Rgba),
}

impl Paint {
    pub fn rgb(self) -> Rgb {
        match self {
            Paint::Solid(rgb) => rgb,
            Paint::Translucent(rgba) => rgba.rgb,
        }
    }

    pub fn alpha(self) -> f64 {
        match self {
            Paint::Solid(_) => 1.0,
            Paint::Translucent(rgba) => rgba.alpha,
        }
    }
}

impl From<Rgb> for Paint {
    fn from(value: Rgb) -> Self {
        Paint::Solid(value)
    }
}

impl From<Rgba> for Paint {
    fn from(value: Rgba) -> Self {
        Paint::Translucent(value)
    }
}

impl fmt::Display for Paint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Paint::Solid(rgb) => rgb.fmt(f),
            Paint::Translucent(rgba) => rgba.fmt(f),
        }
    }
}

impl Serialize for Paint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Paint::Solid(rgb) => rgb.serialize(serializer),
            Paint::Translucent(rgba) => rgba.serialize(serializer),
        }
    }
}

/// Turn `rgb(r, g, b)` into `rgba(r, g, b, alpha)`; `alpha` must lie in `[0, 1]`.
pub fn add_transparency(color: &str, alpha: f64) -> Result<String, ColorError> {
    Ok(Rgb::parse(color)?.try_with_alpha(alpha)?.to_string())
}

/// Numeric components of an `rgb(r, g, b)` string.
pub fn extract_values(color: &str) -> Result<[f64; 3], ColorError> {
    Ok(Rgb::parse(color)?.components())
}

/// Parsed default palette.
pub fn default_palette() -> Vec<Rgb> {
    DEFAULT_COLORS
        .iter()
        .filter_map(|color| Rgb::parse(color).ok())
        .collect()
}

/// Palette entry by index, wrapping around the palette length.
pub fn palette_color(index: usize) -> Rgb {
    let palette = default_palette();
    palette[index % palette.len()]
}

/// Stored network → color assignment.
///
/// Pinned colors come from configuration. Other names take the next palette
/// entry the first time they are requested and keep it afterwards, so chart
/// colors do not depend on the order files are discovered in.
#[derive(Debug, Clone)]
pub struct ColorMap {
    palette: Vec<Rgb>,
    assigned: BTreeMap<String, Rgb>,
    next: usize,
}

impl Default for ColorMap {
    fn default() -> Self {
        Self::new(default_palette())
    }
}

impl ColorMap {
    pub fn new(palette: Vec<Rgb>) -> Self {
        let palette = if palette.is_empty() {
            default_palette()
        } else {
            palette
        };
        Self {
            palette,
            assigned: BTreeMap::new(),
            next: 0,
        }
    }

    /// Build a map with pinned assignments.
    pub fn with_pins(pins: &BTreeMap<String, Rgb>) -> Self {
        let mut map = Self::default();
        for (name, color) in pins {
            map.assigned.insert(name.clone(), *color);
        }
        map
    }

    /// Color for `name`, assigning one on first use.
    pub fn color_for(&mut self, name: &str) -> Rgb {
        if let Some(color) = self.assigned.get(name) {
            return *color;
        }
        let color = self.next_unused();
        self.assigned.insert(name.to_string(), color);
        color
    }

    /// Assigned color without registering a new one.
    pub fn get(&self, name: &str) -> Option<Rgb> {
        self.assigned.get(name).copied()
    }

    pub fn assignments(&self) -> impl Iterator<Item = (&str, Rgb)> {
        self.assigned.iter().map(|(name, color)| (name.as_str(), *color))
    }

    fn next_unused(&mut self) -> Rgb {
        let len = self.palette.len();
        for offset in 0..len {
            let candidate = self.palette[(self.next + offset) % len];
            if !self.assigned.values().any(|used| *used == candidate) {
                self.next = (self.next + offset + 1) % len;
                return candidate;
            }
        }
        // Palette exhausted: reuse in order.
        let color = self.palette[self.next % len];
        self.next = (self.next + 1) % len;
        color
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_transparency_rewrites_rgb_as_rgba() {
        assert_eq!(
            add_transparency("rgb(31, 119, 180)", 0.5).unwrap(),
            "rgba(31, 119, 180, 0.5)"
        );
        assert_eq!(
            add_transparency("rgb(255, 127, 14)", 0.0).unwrap(),
            "rgba(255, 127, 14, 0)"
        );
        assert_eq!(
            add_transparency("rgb(44, 160, 44)", 0.1).unwrap(),
            "rgba(44, 160, 44, 0.1)"
        );
    }

    #[test]
    fn rejects_anything_but_strict_rgb() {
        for bad in [
            "#1f77b4",
            "rgb(31,119,180)",
            "rgba(31, 119, 180, 0.5)",
            "rgb(31, 119)",
            " rgb(31, 119, 180)",
            "blue",
        ] {
            assert_eq!(
                add_transparency(bad, 0.5),
                Err(ColorError::Unrecognized(bad.to_string())),
                "{bad}"
            );
        }
        assert_eq!(
            Rgb::parse("rgb(256, 0, 0)"),
            Err(ColorError::OutOfRange("rgb(256, 0, 0)".to_string()))
        );
    }

    #[test]
    fn alpha_outside_unit_range_is_rejected() {
        let color = "rgb(31, 119, 180)";
        assert_eq!(
            add_transparency(color, 1.5),
            Err(ColorError::InvalidAlpha(1.5))
        );
        assert_eq!(
            add_transparency(color, -0.1),
            Err(ColorError::InvalidAlpha(-0.1))
        );
        assert!(matches!(
            add_transparency(color, f64::NAN),
            Err(ColorError::InvalidAlpha(alpha)) if alpha.is_nan()
        ));
        assert!(add_transparency(color, f64::INFINITY).is_err());
        assert_eq!(add_transparency(color, 1.0).unwrap(), "rgba(31, 119, 180, 1)");
    }

    #[test]
    fn extract_values_returns_components() {
        assert_eq!(
            extract_values("rgb(31, 119, 180)").unwrap(),
            [31.0, 119.0, 180.0]
        );
    }

    #[test]
    fn default_palette_parses_fully() {
        assert_eq!(default_palette().len(), DEFAULT_COLORS.len());
        assert_eq!(palette_color(10), palette_color(0));
    }

    #[test]
    fn color_map_is_stable_and_respects_pins() {
        let mut pins = BTreeMap::new();
        pins.insert("real net".to_string(), Rgb::parse(DEFAULT_COLORS[0]).unwrap());
        let mut map = ColorMap::with_pins(&pins);

        let complex = map.color_for("complex net");
        assert_ne!(complex, map.color_for("real net"));
        assert_eq!(complex, palette_color(1));
        assert_eq!(map.color_for("complex net"), complex);
        assert_eq!(map.color_for("real net"), palette_color(0));
    }

    #[test]
    fn paint_serializes_as_plotly_strings() {
        let rgb = Rgb::new(1, 2, 3);
        let solid = serde_json::to_string(&Paint::from(rgb)).unwrap();
        let translucent = serde_json::to_string(&Paint::from(rgb.with_alpha(0.25))).unwrap();
        assert_eq!(solid, "\"rgb(1, 2, 3)\"");
        assert_eq!(translucent, "\"rgba(1, 2, 3, 0.25)\"");
    }
}
