use std::io::Write;

use image::codecs::gif::{GifEncoder, Repeat};

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::error::{PapercutError, PapercutResult};
use crate::render::backend::FrameRGBA;

/// Options for [`GifSink`].
#[derive(Clone, Debug)]
pub struct GifOpts {
    /// NeuQuant speed, `1` (best palette) to `30` (fastest).
    pub speed: i32,
    /// Loop forever instead of playing once.
    pub infinite_loop: bool,
}

impl Default for GifOpts {
    fn default() -> Self {
        Self {
            speed: 20,
            infinite_loop: true,
        }
    }
}

/// Streams frames into an animated GIF.
///
/// Every frame gets the same delay of `round(1000 / fps)` milliseconds. The GIF trailer is
/// written by `end`.
pub struct GifSink<W: Write + Send> {
    opts: GifOpts,
    writer: Option<W>,
    encoder: Option<GifEncoder<W>>,
    cfg: Option<SinkConfig>,
    delay_ms: u32,
    last_idx: Option<usize>,
}

impl<W: Write + Send> GifSink<W> {
    pub fn new(writer: W, opts: GifOpts) -> Self {
        Self {
            opts,
            writer: Some(writer),
            encoder: None,
            cfg: None,
            delay_ms: 0,
            last_idx: None,
        }
    }
}

impl<W: Write + Send> FrameSink for GifSink<W> {
    fn begin(&mut self, cfg: SinkConfig) -> PapercutResult<()> {
        if !(cfg.fps.is_finite() && cfg.fps > 0.0) {
            return Err(PapercutError::validation("fps must be finite and > 0"));
        }
        if cfg.width == 0 || cfg.height == 0 || cfg.width > 65_535 || cfg.height > 65_535 {
            return Err(PapercutError::validation(format!(
                "gif dimensions {}x{} out of range",
                cfg.width, cfg.height
            )));
        }
        let writer = self
            .writer
            .take()
            .ok_or_else(|| PapercutError::encode("gif sink was already started"))?;

        let speed = self.opts.speed.clamp(1, 30);
        let mut encoder = GifEncoder::new_with_speed(writer, speed);
        if self.opts.infinite_loop {
            encoder
                .set_repeat(Repeat::Infinite)
                .map_err(|e| PapercutError::encode(format!("gif loop extension: {e}")))?;
        }

        self.delay_ms = cfg.frame_delay_ms();
        tracing::debug!(
            w = cfg.width,
            h = cfg.height,
            delay_ms = self.delay_ms,
            speed,
            "gif encoder started"
        );
        self.encoder = Some(encoder);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: usize, frame: &FrameRGBA) -> PapercutResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| PapercutError::encode("gif sink not started"))?;
        if self.last_idx.is_some_and(|last| idx <= last) {
            return Err(PapercutError::encode(
                "gif sink received out-of-order frame index",
            ));
        }
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(PapercutError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }
        let encoder = self
            .encoder
            .as_mut()
            .ok_or_else(|| PapercutError::encode("gif sink is already finalized"))?;

        let delay = image::Delay::from_numer_denom_ms(self.delay_ms, 1);
        let gif_frame = image::Frame::from_parts(frame.to_rgba_image()?, 0, 0, delay);
        encoder
            .encode_frame(gif_frame)
            .map_err(|e| PapercutError::encode(format!("gif frame {idx}: {e}")))?;
        self.last_idx = Some(idx);
        Ok(())
    }

    fn end(&mut self) -> PapercutResult<()> {
        // Dropping the encoder writes the trailer.
        let encoder = self
            .encoder
            .take()
            .ok_or_else(|| PapercutError::encode("gif sink not started"))?;
        drop(encoder);
        self.cfg = None;
        Ok(())
    }

    fn abort(&mut self) {
        self.encoder = None;
        self.cfg = None;
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/gif.rs"]
mod tests;
