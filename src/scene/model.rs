use std::sync::Arc;

use crate::assets::color::ColorDef;
use crate::assets::decode::decode_image;
use crate::assets::store::{AssetId, AssetStore, PreparedImage};
use crate::foundation::core::{Affine, Point, Vec2};
use crate::foundation::error::{PapercutError, PapercutResult};

/// Lower bound applied to sprite scale by interactive transforms.
pub const SCALE_MIN: f64 = 0.1;
/// Upper bound applied to sprite scale by interactive transforms.
pub const SCALE_MAX: f64 = 5.0;

/// One sprite instance on one frame.
///
/// Placements are plain values: duplicating a frame clones them, so edits to a copy never reach
/// the original.
#[derive(Clone, Debug, PartialEq)]
pub struct SpritePlacement {
    pub asset_id: AssetId,
    pub x: f64,
    pub y: f64,
    pub scale: f64,
    pub rotation: f64,
}

impl SpritePlacement {
    pub fn new(asset_id: AssetId, position: Point) -> Self {
        Self {
            asset_id,
            x: position.x,
            y: position.y,
            scale: 1.0,
            rotation: 0.0,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    /// Map asset pixel space to canvas space.
    ///
    /// `T(x,y) * R(rotation) * S(scale) * T(-w*pivot.x, -h*pivot.y)`, so the pivot lands on the
    /// placement position.
    pub fn to_affine(&self, asset_w: u32, asset_h: u32, pivot_x: f64, pivot_y: f64) -> Affine {
        let offset = Vec2::new(
            -f64::from(asset_w) * pivot_x,
            -f64::from(asset_h) * pivot_y,
        );
        Affine::translate(Vec2::new(self.x, self.y))
            * Affine::rotate(self.rotation)
            * Affine::scale(self.scale)
            * Affine::translate(offset)
    }

    /// Unrotated hit box of `w*scale × h*scale` centered on the placement position.
    pub fn hit_test(&self, asset_w: u32, asset_h: u32, p: Point) -> bool {
        let half_w = f64::from(asset_w) * self.scale / 2.0;
        let half_h = f64::from(asset_h) * self.scale / 2.0;
        (p.x - self.x).abs() <= half_w && (p.y - self.y).abs() <= half_h
    }
}

/// Decoded background photo together with its encoded bytes.
#[derive(Clone, Debug)]
pub struct BackgroundImage {
    bytes: Arc<Vec<u8>>,
    image: PreparedImage,
}

impl BackgroundImage {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn image(&self) -> &PreparedImage {
        &self.image
    }
}

/// Frame backdrop: a solid color or a letterboxed image.
#[derive(Clone, Debug)]
pub enum Background {
    Color(ColorDef),
    Image(BackgroundImage),
}

impl Background {
    /// Decode `bytes` up front; fails with [`PapercutError::Decode`] and builds nothing on error.
    pub fn image(bytes: impl Into<Vec<u8>>) -> PapercutResult<Self> {
        let bytes = bytes.into();
        let image = decode_image(&bytes)?;
        Ok(Self::Image(BackgroundImage {
            bytes: Arc::new(bytes),
            image,
        }))
    }

    pub fn color(color: ColorDef) -> Self {
        Self::Color(color)
    }
}

impl Default for Background {
    fn default() -> Self {
        Self::Color(ColorDef::default_background())
    }
}

impl PartialEq for Background {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Color(a), Self::Color(b)) => a == b,
            (Self::Image(a), Self::Image(b)) => a.bytes == b.bytes,
            _ => false,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    /// Drawn in order; later entries are on top.
    pub sprites: Vec<SpritePlacement>,
    /// Replaces the project background for this frame only.
    pub background: Option<Background>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the placement list only; a background override stays with its frame.
    fn duplicate_sprites(&self) -> Self {
        Self {
            sprites: self.sprites.clone(),
            background: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MoveDirection {
    /// Toward index 0.
    Up,
    /// Toward the end of the timeline.
    Down,
}

/// Transform applied relative to the placement captured when a gesture started.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SpriteDelta {
    Drag { dx: f64, dy: f64 },
    Rotate { radians: f64 },
    Scale { factor: f64 },
}

/// Which transform a pointer gesture drives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum GestureMode {
    #[default]
    Drag,
    Rotate,
    Scale,
}

impl SpriteDelta {
    /// Derive the delta of a pointer gesture that started at `start` and is now at `current`.
    ///
    /// Rotation and scale are measured around `anchor` (the placement position at gesture start).
    /// Returns `None` when the gesture is degenerate (e.g. scaling from the anchor itself).
    pub fn from_gesture(mode: GestureMode, anchor: Point, start: Point, current: Point) -> Option<Self> {
        match mode {
            GestureMode::Drag => Some(Self::Drag {
                dx: current.x - start.x,
                dy: current.y - start.y,
            }),
            GestureMode::Rotate => {
                let a1 = (start.y - anchor.y).atan2(start.x - anchor.x);
                let a2 = (current.y - anchor.y).atan2(current.x - anchor.x);
                Some(Self::Rotate { radians: a2 - a1 })
            }
            GestureMode::Scale => {
                let d1 = (start - anchor).hypot();
                let d2 = (current - anchor).hypot();
                if d1 <= f64::EPSILON {
                    return None;
                }
                Some(Self::Scale { factor: d2 / d1 })
            }
        }
    }

    fn is_finite(self) -> bool {
        match self {
            Self::Drag { dx, dy } => dx.is_finite() && dy.is_finite(),
            Self::Rotate { radians } => radians.is_finite(),
            Self::Scale { factor } => factor.is_finite(),
        }
    }
}

/// Ordered frames plus the active frame index.
///
/// The active index is always `< len()`, or `0` when there are no frames.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    frames: Vec<Frame>,
    active: usize,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_frames(frames: Vec<Frame>) -> Self {
        Self { frames, active: 0 }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn frame(&self, index: usize) -> Option<&Frame> {
        self.frames.get(index)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn set_active(&mut self, index: usize) -> PapercutResult<()> {
        self.check_frame(index)?;
        self.active = index;
        Ok(())
    }

    /// Advance the active index by one, wrapping to the first frame.
    pub(crate) fn advance_active(&mut self) {
        if self.frames.is_empty() {
            self.active = 0;
        } else {
            self.active = (self.active + 1) % self.frames.len();
        }
    }

    /// Append a frame and make it active.
    ///
    /// The first frame is empty; later frames start as a copy of the last frame's placements.
    pub fn append_frame(&mut self) -> usize {
        let frame = self
            .frames
            .last()
            .map(Frame::duplicate_sprites)
            .unwrap_or_default();
        self.frames.push(frame);
        self.active = self.frames.len() - 1;
        tracing::debug!(frames = self.frames.len(), "frame appended");
        self.active
    }

    /// Insert a copy of frame `index`'s placements right after it. Returns the new index.
    pub fn insert_frame_after(&mut self, index: usize) -> PapercutResult<usize> {
        let copy = self.frame_ref(index)?.duplicate_sprites();
        self.frames.insert(index + 1, copy);
        if self.active > index {
            self.active += 1;
        }
        Ok(index + 1)
    }

    /// Swap frame `index` with its neighbor. Returns `false` (and does nothing) at a boundary.
    pub fn move_frame(&mut self, index: usize, dir: MoveDirection) -> PapercutResult<bool> {
        self.check_frame(index)?;
        let other = match dir {
            MoveDirection::Up if index > 0 => index - 1,
            MoveDirection::Down if index + 1 < self.frames.len() => index + 1,
            _ => return Ok(false),
        };
        self.frames.swap(index, other);
        Ok(true)
    }

    /// Remove frame `index`, clamping the active index into the shrunk timeline.
    pub fn delete_frame(&mut self, index: usize) -> PapercutResult<Frame> {
        self.check_frame(index)?;
        let removed = self.frames.remove(index);
        if self.active >= self.frames.len() {
            self.active = self.frames.len().saturating_sub(1);
        }
        tracing::debug!(index, frames = self.frames.len(), "frame deleted");
        Ok(removed)
    }

    /// Drop every frame (new project).
    pub fn clear(&mut self) {
        self.frames.clear();
        self.active = 0;
    }

    /// Append a placement with `scale=1, rotation=0`. Returns the sprite index (top of the stack).
    pub fn add_sprite_to_frame(
        &mut self,
        frame_index: usize,
        asset_id: AssetId,
        position: Point,
    ) -> PapercutResult<usize> {
        if !position.x.is_finite() || !position.y.is_finite() {
            return Err(PapercutError::validation("sprite position must be finite"));
        }
        let frame = self.frame_mut(frame_index)?;
        frame.sprites.push(SpritePlacement::new(asset_id, position));
        Ok(frame.sprites.len() - 1)
    }

    pub fn remove_sprite(
        &mut self,
        frame_index: usize,
        sprite_index: usize,
    ) -> PapercutResult<SpritePlacement> {
        let frame = self.frame_mut(frame_index)?;
        if sprite_index >= frame.sprites.len() {
            return Err(PapercutError::validation(format!(
                "sprite index {sprite_index} out of range"
            )));
        }
        Ok(frame.sprites.remove(sprite_index))
    }

    pub fn sprite(&self, frame_index: usize, sprite_index: usize) -> Option<&SpritePlacement> {
        self.frames.get(frame_index)?.sprites.get(sprite_index)
    }

    /// Apply `delta` to the snapshot `original` and store the result in place.
    ///
    /// Scale is clamped to `[SCALE_MIN, SCALE_MAX]`.
    pub fn transform_sprite(
        &mut self,
        frame_index: usize,
        sprite_index: usize,
        original: &SpritePlacement,
        delta: SpriteDelta,
    ) -> PapercutResult<()> {
        if !delta.is_finite() {
            return Err(PapercutError::validation("sprite delta must be finite"));
        }
        let frame = self.frame_mut(frame_index)?;
        let sprite = frame.sprites.get_mut(sprite_index).ok_or_else(|| {
            PapercutError::validation(format!("sprite index {sprite_index} out of range"))
        })?;
        match delta {
            SpriteDelta::Drag { dx, dy } => {
                sprite.x = original.x + dx;
                sprite.y = original.y + dy;
            }
            SpriteDelta::Rotate { radians } => {
                sprite.rotation = original.rotation + radians;
            }
            SpriteDelta::Scale { factor } => {
                sprite.scale = (original.scale * factor).clamp(SCALE_MIN, SCALE_MAX);
            }
        }
        Ok(())
    }

    /// Topmost placement on `frame_index` whose unrotated box contains `point`.
    ///
    /// Placements whose asset is unknown are never hit.
    pub fn pick_topmost_sprite_at(
        &self,
        frame_index: usize,
        point: Point,
        assets: &AssetStore,
    ) -> Option<usize> {
        let frame = self.frames.get(frame_index)?;
        frame.sprites.iter().enumerate().rev().find_map(|(i, s)| {
            let asset = assets.get(&s.asset_id)?;
            s.hit_test(asset.width(), asset.height(), point).then_some(i)
        })
    }

    pub fn set_frame_background(
        &mut self,
        frame_index: usize,
        background: Option<Background>,
    ) -> PapercutResult<()> {
        self.frame_mut(frame_index)?.background = background;
        Ok(())
    }

    fn check_frame(&self, index: usize) -> PapercutResult<()> {
        if index >= self.frames.len() {
            return Err(PapercutError::validation(format!(
                "frame index {index} out of range (frames: {})",
                self.frames.len()
            )));
        }
        Ok(())
    }

    fn frame_ref(&self, index: usize) -> PapercutResult<&Frame> {
        self.check_frame(index)?;
        Ok(&self.frames[index])
    }

    fn frame_mut(&mut self, index: usize) -> PapercutResult<&mut Frame> {
        self.check_frame(index)?;
        Ok(&mut self.frames[index])
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/model.rs"]
mod tests;
