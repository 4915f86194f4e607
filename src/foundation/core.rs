use crate::foundation::error::{PapercutError, PapercutResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Output raster dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Validate and build a canvas. Both sides must fit a raster surface (`1..=65535`).
    pub fn new(width: u32, height: u32) -> PapercutResult<Self> {
        let max = u32::from(u16::MAX);
        if width == 0 || height == 0 {
            return Err(PapercutError::validation("canvas width/height must be > 0"));
        }
        if width > max || height > max {
            return Err(PapercutError::validation(format!(
                "canvas {width}x{height} exceeds the {max}px surface limit"
            )));
        }
        Ok(Self { width, height })
    }

    /// Canvas center in canvas coordinates.
    pub fn center(self) -> Point {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 960,
            height: 540,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
