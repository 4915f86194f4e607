use crate::foundation::error::{PapercutError, PapercutResult};

/// Solid background color: normalized 0..1 channels, straight alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorDef {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

/// Default editor background (`#0b0e14`).
pub const DEFAULT_BACKGROUND_HEX: &str = "#0b0e14";

fn unit_to_u8(x: f64) -> u8 {
    (x.clamp(0.0, 1.0) * 255.0).round() as u8
}

impl ColorDef {
    pub fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgba8([r, g, b, a]: [u8; 4]) -> Self {
        let f = |c: u8| f64::from(c) / 255.0;
        Self::rgba(f(r), f(g), f(b), f(a))
    }

    pub fn default_background() -> Self {
        Self::from_rgba8([0x0b, 0x0e, 0x14, 0xff])
    }

    /// Parse a `#rgb`, `#rrggbb` or `#rrggbbaa` string. The `#` is optional.
    pub fn parse(s: &str) -> PapercutResult<Self> {
        let digits = s.trim();
        let digits = digits.strip_prefix('#').unwrap_or(digits);
        let bad = || PapercutError::validation(format!("invalid hex color \"{s}\""));

        if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(bad());
        }
        let expanded: String = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).chain("ff".chars()).collect(),
            6 => format!("{digits}ff"),
            8 => digits.to_owned(),
            _ => return Err(bad()),
        };
        let packed = u32::from_str_radix(&expanded, 16).map_err(|_| bad())?;
        Ok(Self::from_rgba8(packed.to_be_bytes()))
    }

    /// Straight-alpha `[r, g, b, a]` bytes, as paint colors expect.
    pub fn to_rgba8_straight(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a].map(unit_to_u8)
    }

    /// Canonical lowercase hex used when saving; alpha is omitted when opaque.
    pub fn to_hex(self) -> String {
        let [r, g, b, a] = self.to_rgba8_straight();
        if a == 0xff {
            format!("#{r:02x}{g:02x}{b:02x}")
        } else {
            format!("#{r:02x}{g:02x}{b:02x}{a:02x}")
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/color.rs"]
mod tests;
