use crate::foundation::error::PapercutResult;
use crate::render::backend::FrameRGBA;

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Clone, Debug, PartialEq)]
pub struct SinkConfig {
    /// Canvas width.
    pub width: u32,
    /// Canvas height.
    pub height: u32,
    /// Playback rate of the artifact.
    pub fps: f64,
    /// Number of frames that will be pushed.
    pub frame_count: usize,
}

impl SinkConfig {
    /// Display time of one frame, `round(1000/fps)` ms.
    pub fn frame_delay_ms(&self) -> u32 {
        (1000.0 / self.fps).round() as u32
    }
}

/// Destination of an export: receives composited frames one by one.
///
/// `push_frame` sees indices `0..frame_count` in increasing order, between one `begin` and one
/// `end` (or `abort`).
pub trait FrameSink: Send {
    /// Open the artifact.
    fn begin(&mut self, cfg: SinkConfig) -> PapercutResult<()>;
    fn push_frame(&mut self, idx: usize, frame: &FrameRGBA) -> PapercutResult<()>;
    /// Flush and close the artifact.
    fn end(&mut self) -> PapercutResult<()>;
    /// Called instead of `end` when the export fails part way; discards partial output.
    fn abort(&mut self) {}
}

/// Keeps every pushed frame; useful for previews and tests.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(usize, FrameRGBA)>,
    finished: bool,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    pub fn frames(&self) -> &[(usize, FrameRGBA)] {
        &self.frames
    }

    /// Whether `end` ran after the last `begin`.
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> PapercutResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.finished = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: usize, frame: &FrameRGBA) -> PapercutResult<()> {
        self.frames.push((idx, frame.to_owned()));
        Ok(())
    }

    fn end(&mut self) -> PapercutResult<()> {
        self.finished = true;
        Ok(())
    }

    fn abort(&mut self) {
        self.frames.clear();
    }
}
