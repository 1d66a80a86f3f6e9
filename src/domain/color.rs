// Color domain model - CSS colors carried by chart datasets
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
#[error("unrecognized color `{0}`")]
pub struct ColorParseError(pub String);

/// An sRGB color with a straight (non-premultiplied) alpha in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub alpha: f64,
}

impl Rgba {
    pub const fn new(red: u8, green: u8, blue: u8, alpha: f64) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Same hue with full opacity (used for border colors).
    pub fn opaque(self) -> Self {
        Self {
            alpha: 1.0,
            ..self
        }
    }

    pub fn with_alpha(self, alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Converts HSL (hue in degrees, saturation and lightness in `0.0..=1.0`).
    pub fn from_hsl(hue: f64, saturation: f64, lightness: f64) -> Self {
        let hue = hue.rem_euclid(360.0) / 360.0;
        let saturation = saturation.clamp(0.0, 1.0);
        let lightness = lightness.clamp(0.0, 1.0);

        if saturation == 0.0 {
            let v = (lightness * 255.0).round() as u8;
            return Self::new(v, v, v, 1.0);
        }

        let q = if lightness < 0.5 {
            lightness * (1.0 + saturation)
        } else {
            lightness + saturation - lightness * saturation
        };
        let p = 2.0 * lightness - q;

        let channel = |t: f64| {
            let t = t.rem_euclid(1.0);
            let v = if t < 1.0 / 6.0 {
                p + (q - p) * 6.0 * t
            } else if t < 0.5 {
                q
            } else if t < 2.0 / 3.0 {
                p + (q - p) * (2.0 / 3.0 - t) * 6.0
            } else {
                p
            };
            (v * 255.0).round() as u8
        };

        Self::new(
            channel(hue + 1.0 / 3.0),
            channel(hue),
            channel(hue - 1.0 / 3.0),
            1.0,
        )
    }

    /// Scales the RGB channels, keeping alpha. Factors above 1 lighten.
    pub fn shade(self, factor: f64) -> Self {
        let scale = |c: u8| (c as f64 * factor).round().clamp(0.0, 255.0) as u8;
        Self::new(scale(self.red), scale(self.green), scale(self.blue), self.alpha)
    }

    /// `#rrggbb` without alpha, for SVG `fill`/`stroke` attributes.
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rgba({}, {}, {}, {})",
            self.red, self.green, self.blue, self.alpha
        )
    }
}

impl FromStr for Rgba {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let err = || ColorParseError(trimmed.to_string());

        if let Some(hex) = trimmed.strip_prefix('#') {
            if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(err());
            }
            let expanded: String = match hex.len() {
                3 => hex.chars().flat_map(|c| [c, c]).collect(),
                6 => hex.to_string(),
                _ => return Err(err()),
            };
            let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).map_err(|_| err());
            return Ok(Self::new(channel(0)?, channel(2)?, channel(4)?, 1.0));
        }

        let (args, has_alpha) = if let Some(rest) = trimmed.strip_prefix("rgba(") {
            (rest, true)
        } else if let Some(rest) = trimmed.strip_prefix("rgb(") {
            (rest, false)
        } else {
            return Err(err());
        };

        let args = args.strip_suffix(')').ok_or_else(err)?;
        let parts: Vec<&str> = args.split(',').map(str::trim).collect();
        let expected = if has_alpha { 4 } else { 3 };
        if parts.len() != expected {
            return Err(err());
        }

        let channel = |raw: &str| raw.parse::<u8>().map_err(|_| err());
        let alpha = if has_alpha {
            let alpha: f64 = parts[3].parse().map_err(|_| err())?;
            if !(0.0..=1.0).contains(&alpha) {
                return Err(err());
            }
            alpha
        } else {
            1.0
        };

        Ok(Self::new(
            channel(parts[0])?,
            channel(parts[1])?,
            channel(parts[2])?,
            alpha,
        ))
    }
}
