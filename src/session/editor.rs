use std::io::Write;

use crate::assets::color::ColorDef;
use crate::assets::cutout::cutout;
use crate::assets::decode::decode_image;
use crate::assets::store::AssetId;
use crate::encode::export::{export_gif, export_video};
use crate::encode::ffmpeg::FfmpegSinkOpts;
use crate::encode::gif::GifOpts;
use crate::foundation::core::{Canvas, Point};
use crate::foundation::error::PapercutResult;
use crate::playback::scheduler::{CancelToken, FramePresenter, PlaybackState, Scheduler};
use crate::render::backend::FrameRGBA;
use crate::render::cpu::{Compositor, RenderOpts};
use crate::scene::model::{Background, GestureMode, MoveDirection, SpriteDelta, SpritePlacement};
use crate::scene::project::Project;
use crate::scene::storage::ProjectStore;

/// Options for a new [`Editor`].
#[derive(Clone, Debug, Default)]
pub struct EditorOpts {
    pub canvas: Canvas,
    pub render: RenderOpts,
    pub gif: GifOpts,
}

/// Which pointer tool is active.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Tool {
    /// Pick and transform sprites.
    #[default]
    Select,
    /// Draw a polygon to cut a sprite out of the lasso source image.
    Lasso,
}

/// Supplies still photos for stop-motion capture.
pub trait CameraSource {
    /// Capture one still as encoded image bytes.
    fn capture_still(&mut self) -> PapercutResult<Vec<u8>>;
}

impl<F> CameraSource for F
where
    F: FnMut() -> PapercutResult<Vec<u8>>,
{
    fn capture_still(&mut self) -> PapercutResult<Vec<u8>> {
        self()
    }
}

/// A sprite on a specific frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpriteRef {
    pub frame: usize,
    pub sprite: usize,
}

#[derive(Clone, Debug)]
struct Gesture {
    target: SpriteRef,
    start: Point,
    original: SpritePlacement,
}

#[derive(Clone, Debug, Default)]
struct Lasso {
    points: Vec<Point>,
    drawing: bool,
    source: Option<Vec<u8>>,
}

/// Interactive editing session over one [`Project`].
///
/// All edits go through here; a failed operation returns an error and leaves the project and
/// the editor state exactly as before.
pub struct Editor {
    project: Project,
    compositor: Compositor,
    scheduler: Scheduler,
    gif_opts: GifOpts,

    tool: Tool,
    gesture_mode: GestureMode,
    selection: Option<SpriteRef>,
    gesture: Option<Gesture>,
    lasso: Lasso,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorOpts::default())
    }
}

impl Editor {
    pub fn new(opts: EditorOpts) -> Self {
        let project = Project::new(opts.canvas);
        Self::with_project(project, opts)
    }

    /// Edit an existing project. `opts.canvas` is ignored in favor of the project's canvas.
    pub fn with_project(project: Project, opts: EditorOpts) -> Self {
        Self {
            project,
            compositor: Compositor::new(opts.render),
            scheduler: Scheduler::new(),
            gif_opts: opts.gif,
            tool: Tool::Select,
            gesture_mode: GestureMode::Drag,
            selection: None,
            gesture: None,
            lasso: Lasso::default(),
        }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// Direct access for settings (fps, onion skin, background).
    pub fn project_mut(&mut self) -> &mut Project {
        &mut self.project
    }

    pub fn into_project(self) -> Project {
        self.project
    }

    pub fn active_frame(&self) -> usize {
        self.project.scene().active_index()
    }

    pub fn selection(&self) -> Option<SpriteRef> {
        self.selection
    }

    // --- tools -----------------------------------------------------------------------------

    pub fn tool(&self) -> Tool {
        self.tool
    }

    /// Switch tools. Any lasso in progress is discarded; the lasso source survives.
    pub fn set_tool(&mut self, tool: Tool) {
        self.tool = tool;
        self.gesture = None;
        self.lasso.points.clear();
        self.lasso.drawing = false;
    }

    pub fn gesture_mode(&self) -> GestureMode {
        self.gesture_mode
    }

    pub fn set_gesture_mode(&mut self, mode: GestureMode) {
        self.gesture_mode = mode;
    }

    /// Load the image the next lasso will cut from, and switch to the lasso tool.
    pub fn set_lasso_source(&mut self, bytes: impl Into<Vec<u8>>) -> PapercutResult<()> {
        let bytes = bytes.into();
        decode_image(&bytes)?;
        self.lasso.source = Some(bytes);
        self.set_tool(Tool::Lasso);
        Ok(())
    }

    pub fn has_lasso_source(&self) -> bool {
        self.lasso.source.is_some()
    }

    /// Points of the lasso being drawn, in canvas coordinates.
    pub fn lasso_points(&self) -> &[Point] {
        &self.lasso.points
    }

    // --- pointer input ---------------------------------------------------------------------

    pub fn on_pointer_down(&mut self, p: Point) {
        match self.tool {
            Tool::Lasso => {
                self.lasso.points.clear();
                self.lasso.points.push(p);
                self.lasso.drawing = true;
            }
            Tool::Select => {
                let frame = self.active_frame();
                let picked =
                    self.project
                        .scene()
                        .pick_topmost_sprite_at(frame, p, self.project.assets());
                self.selection = picked.map(|sprite| SpriteRef { frame, sprite });
                self.gesture = self.selection.and_then(|target| {
                    let original = self.project.scene().sprite(target.frame, target.sprite)?;
                    Some(Gesture {
                        target,
                        start: p,
                        original: original.clone(),
                    })
                });
            }
        }
    }

    pub fn on_pointer_move(&mut self, p: Point) -> PapercutResult<()> {
        match self.tool {
            Tool::Lasso => {
                if self.lasso.drawing {
                    self.lasso.points.push(p);
                }
                Ok(())
            }
            Tool::Select => {
                let Some(g) = &self.gesture else {
                    return Ok(());
                };
                let Some(delta) =
                    SpriteDelta::from_gesture(self.gesture_mode, g.original.position(), g.start, p)
                else {
                    return Ok(());
                };
                self.project.scene_mut().transform_sprite(
                    g.target.frame,
                    g.target.sprite,
                    &g.original,
                    delta,
                )
            }
        }
    }

    /// Finish the current gesture.
    ///
    /// Finishing a lasso of at least three points with a source loaded cuts the enclosed region
    /// out, places it at the canvas center of the active frame (creating a frame if needed) and
    /// returns to the select tool. Returns the new asset id in that case.
    pub fn on_pointer_up(&mut self, _p: Point) -> PapercutResult<Option<AssetId>> {
        match self.tool {
            Tool::Select => {
                self.gesture = None;
                Ok(None)
            }
            Tool::Lasso => {
                self.lasso.drawing = false;
                if self.lasso.points.len() < 3 {
                    self.lasso.points.clear();
                    return Ok(None);
                }
                let Some(source) = self.lasso.source.as_deref() else {
                    return Ok(None);
                };
                let id = cutout(self.project.assets_mut(), source, &self.lasso.points)?;
                let (frame, sprite) = self.place_at_center(id.clone())?;
                self.selection = Some(SpriteRef { frame, sprite });
                self.lasso = Lasso::default();
                self.tool = Tool::Select;
                Ok(Some(id))
            }
        }
    }

    // --- assets and backgrounds ------------------------------------------------------------

    /// Register `bytes` as a sprite asset and place it at the canvas center of the active frame.
    ///
    /// A first frame is created when the timeline is empty.
    pub fn import_sprite(&mut self, bytes: impl Into<Vec<u8>>) -> PapercutResult<(AssetId, SpriteRef)> {
        let id = self.project.assets_mut().create_asset(bytes)?;
        let (frame, sprite) = self.place_at_center(id.clone())?;
        let placed = SpriteRef { frame, sprite };
        self.selection = Some(placed);
        Ok((id, placed))
    }

    fn place_at_center(&mut self, id: AssetId) -> PapercutResult<(usize, usize)> {
        if self.project.scene().is_empty() {
            self.project.scene_mut().append_frame();
        }
        let frame = self.active_frame();
        let sprite = self.project.add_sprite(frame, id, None)?;
        Ok((frame, sprite))
    }

    /// Use an image as the project-wide background.
    pub fn set_background_image(&mut self, bytes: impl Into<Vec<u8>>) -> PapercutResult<()> {
        let bg = Background::image(bytes)?;
        self.project.set_background(bg);
        Ok(())
    }

    pub fn set_background_color(&mut self, color: ColorDef) {
        self.project.set_background(Background::color(color));
    }

    /// Capture a still and append it as a new frame whose background is the photo.
    pub fn snap_from_camera(&mut self, camera: &mut dyn CameraSource) -> PapercutResult<usize> {
        let photo = camera.capture_still()?;
        let bg = Background::image(photo)?;
        self.scheduler.stop();
        let index = self.project.scene_mut().append_frame();
        self.project.scene_mut().set_frame_background(index, Some(bg))?;
        tracing::info!(frame = index, "camera frame captured");
        Ok(index)
    }

    // --- timeline --------------------------------------------------------------------------

    pub fn append_frame(&mut self) -> usize {
        self.clear_selection();
        self.project.scene_mut().append_frame()
    }

    pub fn insert_frame_after(&mut self, index: usize) -> PapercutResult<usize> {
        let new = self.project.scene_mut().insert_frame_after(index)?;
        self.clear_selection();
        Ok(new)
    }

    pub fn move_frame(&mut self, index: usize, dir: MoveDirection) -> PapercutResult<bool> {
        let moved = self.project.scene_mut().move_frame(index, dir)?;
        if moved {
            self.clear_selection();
        }
        Ok(moved)
    }

    pub fn delete_frame(&mut self, index: usize) -> PapercutResult<()> {
        self.project.scene_mut().delete_frame(index)?;
        self.clear_selection();
        Ok(())
    }

    /// Make `index` the active frame. Stops playback.
    pub fn select_frame(&mut self, index: usize) -> PapercutResult<()> {
        self.project.scene_mut().set_active(index)?;
        self.scheduler.stop();
        self.clear_selection();
        Ok(())
    }

    /// Drop all frames; assets and settings are kept.
    pub fn new_project(&mut self) {
        self.scheduler.stop();
        self.project.clear_frames();
        self.clear_selection();
        self.lasso.points.clear();
        self.lasso.drawing = false;
        tracing::info!("timeline cleared");
    }

    fn clear_selection(&mut self) {
        self.selection = None;
        self.gesture = None;
    }

    // --- rendering and playback ------------------------------------------------------------

    /// Render the active frame as the editor shows it, including the lasso overlay.
    pub fn render_current(&mut self) -> PapercutResult<FrameRGBA> {
        let overlay = (self.tool == Tool::Lasso && !self.lasso.points.is_empty())
            .then_some(self.lasso.points.as_slice());
        self.compositor
            .render(&self.project, self.project.scene().active_index(), overlay)
    }

    /// Render any frame without overlays.
    pub fn render_frame(&mut self, index: usize) -> PapercutResult<FrameRGBA> {
        self.compositor.render(&self.project, index, None)
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.scheduler.state()
    }

    /// Play from the active frame until `token` is cancelled.
    pub async fn play(
        &mut self,
        presenter: &mut dyn FramePresenter,
        token: CancelToken,
    ) -> PapercutResult<usize> {
        self.clear_selection();
        self.scheduler
            .play(&mut self.project, &mut self.compositor, presenter, token)
            .await
    }

    /// [`Editor::play`] on a private single-threaded runtime.
    pub fn play_blocking(
        &mut self,
        presenter: &mut dyn FramePresenter,
        token: CancelToken,
    ) -> PapercutResult<usize> {
        self.clear_selection();
        self.scheduler
            .play_blocking(&mut self.project, &mut self.compositor, presenter, token)
    }

    pub fn stop(&mut self) -> bool {
        self.scheduler.stop()
    }

    // --- export ----------------------------------------------------------------------------

    /// Stop playback and write every frame as an animated GIF.
    pub fn export_gif<W: Write + Send>(&mut self, writer: W) -> PapercutResult<usize> {
        self.scheduler.stop();
        export_gif(
            &mut self.compositor,
            &self.project,
            writer,
            self.gif_opts.clone(),
        )
    }

    /// Stop playback and record every frame into an MP4.
    pub fn export_video(&mut self, opts: FfmpegSinkOpts) -> PapercutResult<usize> {
        self.scheduler.stop();
        export_video(&mut self.compositor, &self.project, opts)
    }

    // --- persistence -----------------------------------------------------------------------

    pub fn save(&self, store: &mut dyn ProjectStore) -> PapercutResult<()> {
        let json = self.project.to_json()?;
        store.save(&json)
    }

    /// Replace the project with the saved one. The current project is untouched on failure.
    pub fn load(&mut self, store: &dyn ProjectStore) -> PapercutResult<()> {
        let json = store.load()?;
        let project = Project::from_json(&json)?;
        self.scheduler.stop();
        self.project = project;
        self.clear_selection();
        self.lasso = Lasso::default();
        self.tool = Tool::Select;
        tracing::info!(
            frames = self.project.scene().len(),
            assets = self.project.assets().len(),
            "project loaded"
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/editor.rs"]
mod tests;
