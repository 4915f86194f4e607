//! Papercut is the core of a stop-motion cutout animation editor.
//!
//! A project holds a store of cutout sprites (raster images cut from photos with a lasso
//! polygon), an ordered list of frames placing those sprites on a fixed-size canvas, and
//! playback settings. Papercut composites frames on the CPU with onion-skin ghosts of the
//! preceding frames, plays them back on a timer, and exports the sequence as an animated GIF
//! or an MP4 through an external `ffmpeg` process.
//!
//! The main entry point for interactive use is [`Editor`]. Lower-level pieces ([`Project`],
//! [`Compositor`], [`Scheduler`], the export sinks) are public for headless pipelines.
//!
//! Projects persist as camelCase JSON with embedded PNG data URLs ([`ProjectDoc`]), stored
//! through a [`ProjectStore`].
#![forbid(unsafe_code)]

mod assets;
mod encode;
mod foundation;
mod playback;
mod render;
mod scene;
mod session;

pub use assets::color::{ColorDef, DEFAULT_BACKGROUND_HEX};
pub use assets::cutout::{MIN_POLYGON_POINTS, cutout};
pub use assets::decode::{decode_image, from_data_url, to_data_url};
pub use assets::store::{Asset, AssetId, AssetStore, Pivot, PreparedImage};
pub use encode::export::{export_frames, export_gif, export_video};
pub use encode::ffmpeg::{FFMPEG_ENV, FfmpegSink, FfmpegSinkOpts, is_ffmpeg_available};
pub use encode::gif::{GifOpts, GifSink};
pub use encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use foundation::core::{Affine, BezPath, Canvas, Point, Rect, Vec2};
pub use foundation::error::{PapercutError, PapercutResult};
pub use playback::scheduler::{CancelToken, FramePresenter, PlaybackState, Scheduler};
pub use render::backend::FrameRGBA;
pub use render::cpu::{Compositor, RenderOpts};
pub use scene::doc::{AssetDoc, BackgroundDoc, BackgroundKind, FrameDoc, ProjectDoc, SpriteDoc};
pub use scene::model::{
    Background, BackgroundImage, Frame, GestureMode, MoveDirection, SCALE_MAX, SCALE_MIN, Scene,
    SpriteDelta, SpritePlacement,
};
pub use scene::project::{
    DEFAULT_FPS, DEFAULT_ONION_ALPHA, DEFAULT_ONION_DEPTH, MAX_FPS, MAX_ONION_DEPTH, MIN_FPS,
    Project,
};
pub use scene::storage::{FileStore, MemoryStore, PROJECT_FILE_NAME, ProjectStore};
pub use session::editor::{CameraSource, Editor, EditorOpts, SpriteRef, Tool};
