use std::time::Duration;

use crate::assets::store::{AssetId, AssetStore};
use crate::foundation::core::{Canvas, Point};
use crate::foundation::error::{PapercutError, PapercutResult};
use crate::scene::model::{Background, Scene};

pub const DEFAULT_FPS: f64 = 12.0;
pub const DEFAULT_ONION_DEPTH: u32 = 2;
pub const DEFAULT_ONION_ALPHA: f64 = 0.3;

pub const MIN_FPS: f64 = 1.0;
pub const MAX_FPS: f64 = 60.0;
pub const MAX_ONION_DEPTH: u32 = 10;

/// A whole animation: timing, onion-skin settings, canvas, backdrop, assets and frames.
///
/// This is the unit of persistence.
#[derive(Clone, Debug)]
pub struct Project {
    fps: f64,
    onion_depth: u32,
    onion_alpha: f64,
    canvas: Canvas,
    background: Background,
    assets: AssetStore,
    scene: Scene,
}

impl Default for Project {
    fn default() -> Self {
        Self::new(Canvas::default())
    }
}

impl Project {
    pub fn new(canvas: Canvas) -> Self {
        Self {
            fps: DEFAULT_FPS,
            onion_depth: DEFAULT_ONION_DEPTH,
            onion_alpha: DEFAULT_ONION_ALPHA,
            canvas,
            background: Background::default(),
            assets: AssetStore::new(),
            scene: Scene::new(),
        }
    }

    pub(crate) fn from_parts(canvas: Canvas, background: Background, assets: AssetStore, scene: Scene) -> Self {
        Self {
            background,
            assets,
            scene,
            ..Self::new(canvas)
        }
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    /// Set frames-per-second, clamped to `[MIN_FPS, MAX_FPS]`. Non-finite input is rejected.
    pub fn set_fps(&mut self, fps: f64) -> PapercutResult<()> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(PapercutError::validation("fps must be finite and > 0"));
        }
        self.fps = fps.clamp(MIN_FPS, MAX_FPS);
        Ok(())
    }

    /// Wall-clock wait between two playback steps (`1000/fps` ms).
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.fps)
    }

    pub fn onion_depth(&self) -> u32 {
        self.onion_depth
    }

    pub fn set_onion_depth(&mut self, depth: u32) {
        self.onion_depth = depth.min(MAX_ONION_DEPTH);
    }

    pub fn onion_alpha(&self) -> f64 {
        self.onion_alpha
    }

    pub fn set_onion_alpha(&mut self, alpha: f64) -> PapercutResult<()> {
        if !alpha.is_finite() {
            return Err(PapercutError::validation("onion alpha must be finite"));
        }
        self.onion_alpha = alpha.clamp(0.0, 1.0);
        Ok(())
    }

    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// Project-wide backdrop, used by every frame without an override.
    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn set_background(&mut self, background: Background) {
        self.background = background;
    }

    /// Backdrop for `frame_index`: the frame override when present, else the project background.
    pub fn background_for(&self, frame_index: usize) -> &Background {
        self.scene
            .frame(frame_index)
            .and_then(|f| f.background.as_ref())
            .unwrap_or(&self.background)
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut AssetStore {
        &mut self.assets
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// Place a registered asset on a frame, at `position` or the canvas center.
    pub fn add_sprite(
        &mut self,
        frame_index: usize,
        asset_id: AssetId,
        position: Option<Point>,
    ) -> PapercutResult<usize> {
        if !self.assets.contains(&asset_id) {
            return Err(PapercutError::validation(format!(
                "unknown asset '{asset_id}'"
            )));
        }
        let position = position.unwrap_or_else(|| self.canvas.center());
        self.scene.add_sprite_to_frame(frame_index, asset_id, position)
    }

    /// Onion-skin layers drawn beneath `frame_index`, oldest first, with their opacity.
    ///
    /// Layer `k` frames back gets `onion_alpha * (1 - (k-1)/onion_depth)`: the nearest earlier
    /// frame is the most opaque. Empty when `onion_depth == 0`.
    pub fn onion_layers(&self, frame_index: usize) -> Vec<(usize, f32)> {
        let depth = self.onion_depth;
        (1..=depth)
            .rev()
            .filter_map(|k| {
                let prev = frame_index.checked_sub(k as usize)?;
                self.scene.frame(prev)?;
                let alpha = self.onion_alpha * (1.0 - f64::from(k - 1) / f64::from(depth));
                Some((prev, alpha as f32))
            })
            .collect()
    }

    /// Reset to an empty timeline, keeping settings, canvas, background and assets.
    pub fn clear_frames(&mut self) {
        self.scene.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/project.rs"]
mod tests;
