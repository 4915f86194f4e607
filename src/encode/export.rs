use std::io::Write;

use crate::encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts};
use crate::encode::gif::{GifOpts, GifSink};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::error::{PapercutError, PapercutResult};
use crate::render::cpu::Compositor;
use crate::scene::project::Project;

/// Render every frame of `project` in order (without overlays) into `sink`.
///
/// Returns the number of frames written. A project without frames is rejected before the sink
/// is started. When rendering or encoding fails mid-way the sink is aborted.
#[tracing::instrument(skip_all, fields(frames = project.scene().len()))]
pub fn export_frames(
    compositor: &mut Compositor,
    project: &Project,
    sink: &mut dyn FrameSink,
) -> PapercutResult<usize> {
    let frame_count = project.scene().len();
    if frame_count == 0 {
        return Err(PapercutError::validation("nothing to export: project has no frames"));
    }
    let canvas = project.canvas();
    sink.begin(SinkConfig {
        width: canvas.width,
        height: canvas.height,
        fps: project.fps(),
        frame_count,
    })?;

    let pushed = (0..frame_count).try_for_each(|i| {
        let frame = compositor.render(project, i, None)?;
        sink.push_frame(i, &frame)
    });
    if let Err(e) = pushed {
        tracing::warn!(error = %e, "export failed, discarding output");
        sink.abort();
        return Err(e);
    }
    sink.end()?;
    tracing::info!(frames = frame_count, "export finished");
    Ok(frame_count)
}

/// Write `project` as an animated GIF into `writer`.
pub fn export_gif<W: Write + Send>(
    compositor: &mut Compositor,
    project: &Project,
    writer: W,
    opts: GifOpts,
) -> PapercutResult<usize> {
    let mut sink = GifSink::new(writer, opts);
    export_frames(compositor, project, &mut sink)
}

/// Write `project` as an MP4 through the system recorder.
pub fn export_video(
    compositor: &mut Compositor,
    project: &Project,
    opts: FfmpegSinkOpts,
) -> PapercutResult<usize> {
    let mut sink = FfmpegSink::new(opts);
    export_frames(compositor, project, &mut sink)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/export.rs"]
mod tests;
