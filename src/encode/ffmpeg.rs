use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};

use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::error::{PapercutError, PapercutResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::backend::FrameRGBA;

/// Environment variable that overrides the recorder binary.
pub const FFMPEG_ENV: &str = "PAPERCUT_FFMPEG";

/// Where and how [`FfmpegSink`] writes its MP4.
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Destination file.
    pub out_path: PathBuf,
    /// Replace an existing file at `out_path`.
    pub overwrite: bool,
    /// Opaque color that translucent pixels are flattened onto (straight RGBA8).
    pub bg_rgba: [u8; 4],
    /// Recorder executable; `$PAPERCUT_FFMPEG` or `ffmpeg` from `PATH` by default.
    pub ffmpeg_bin: OsString,
}

impl FfmpegSinkOpts {
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            overwrite: true,
            bg_rgba: [0, 0, 0, 255],
            ffmpeg_bin: std::env::var_os(FFMPEG_ENV).unwrap_or_else(|| OsString::from("ffmpeg")),
        }
    }
}

/// Spawns the recorder and streams raw frames to its stdin, producing an H.264 MP4.
///
/// Frames are stamped at `fps` by the container, so no wall-clock pacing is involved. If the
/// export fails or is aborted, the partial output file is removed.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<std::io::Result<Vec<u8>>>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<usize>,
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            child: None,
            stdin: None,
            stderr_drain: None,
            scratch: Vec::new(),
            cfg: None,
            last_idx: None,
        }
    }

    fn recorder_command(&self, cfg: &SinkConfig) -> Command {
        let fps = format_fps(cfg.fps);
        let size = format!("{}x{}", cfg.width, cfg.height);

        let mut cmd = Command::new(&self.opts.ffmpeg_bin);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .arg(if self.opts.overwrite { "-y" } else { "-n" })
            .args(["-loglevel", "error"]);
        // Raw opaque RGBA frames on stdin; push_frame flattens alpha first.
        cmd.args(["-f", "rawvideo", "-pix_fmt", "rgba", "-s", &size])
            .args(["-framerate", &fps, "-i", "pipe:0", "-an"]);
        // yuv420p wants even dimensions, so odd canvases gain one padded row or column.
        cmd.args(["-vf", "pad=ceil(iw/2)*2:ceil(ih/2)*2", "-r", &fps])
            .args(["-c:v", "libx264", "-pix_fmt", "yuv420p", "-movflags", "+faststart"])
            .arg(&self.opts.out_path);
        cmd
    }

    fn discard_output(&self) {
        match std::fs::remove_file(&self.opts.out_path) {
            Ok(()) => {
                tracing::debug!(path = %self.opts.out_path.display(), "removed partial video");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.opts.out_path.display(), error = %e, "could not remove partial video");
            }
        }
    }

    fn finish(&mut self) -> PapercutResult<()> {
        drop(self.stdin.take());
        let Some(mut child) = self.child.take() else {
            return Err(PapercutError::encode("video export was never started"));
        };
        let status = child
            .wait()
            .map_err(|e| PapercutError::encode(format!("waiting for recorder: {e}")))?;
        let log = self
            .stderr_drain
            .take()
            .and_then(|handle| handle.join().ok())
            .and_then(Result::ok)
            .unwrap_or_default();

        if status.success() {
            return Ok(());
        }
        Err(PapercutError::encode(format!(
            "recorder exited with {status}: {}",
            String::from_utf8_lossy(&log).trim()
        )))
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> PapercutResult<()> {
        if !(cfg.fps.is_finite() && cfg.fps > 0.0) || cfg.width == 0 || cfg.height == 0 {
            return Err(PapercutError::validation(format!(
                "cannot record {}x{} at {} fps",
                cfg.width, cfg.height, cfg.fps
            )));
        }
        if !is_ffmpeg_available(&self.opts.ffmpeg_bin) {
            return Err(PapercutError::unsupported(format!(
                "video export needs '{}', which could not be run (set {FFMPEG_ENV} to override)",
                self.opts.ffmpeg_bin.to_string_lossy()
            )));
        }
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(PapercutError::validation(format!(
                "output file '{}' already exists",
                self.opts.out_path.display()
            )));
        }
        ensure_parent_dir(&self.opts.out_path)?;

        let mut cmd = self.recorder_command(&cfg);
        let mut child = cmd
            .spawn()
            .map_err(|e| PapercutError::unsupported(format!("could not start recorder: {e}")))?;
        let (Some(stdin), Some(mut stderr)) = (child.stdin.take(), child.stderr.take()) else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(PapercutError::encode("recorder pipes were not created"));
        };
        let stderr_drain = std::thread::spawn(move || {
            let mut log = Vec::new();
            stderr.read_to_end(&mut log).map(|_| log)
        });

        tracing::info!(path = %self.opts.out_path.display(), size = %format!("{}x{}", cfg.width, cfg.height), fps = cfg.fps, "recording video");
        self.scratch = vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(stderr_drain);
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: usize, frame: &FrameRGBA) -> PapercutResult<()> {
        let (Some(cfg), Some(stdin)) = (self.cfg.as_ref(), self.stdin.as_mut()) else {
            return Err(PapercutError::encode("video export is not running"));
        };
        if self.last_idx.is_some_and(|last| idx <= last) {
            return Err(PapercutError::encode(format!(
                "frame {idx} pushed after frame {}",
                self.last_idx.unwrap_or_default()
            )));
        }
        if (frame.width, frame.height) != (cfg.width, cfg.height)
            || frame.data.len() != self.scratch.len()
        {
            return Err(PapercutError::validation(format!(
                "frame is {}x{} ({} bytes), export is {}x{}",
                frame.width,
                frame.height,
                frame.data.len(),
                cfg.width,
                cfg.height
            )));
        }
        self.last_idx = Some(idx);

        flatten_onto_backdrop(&mut self.scratch, &frame.data, self.opts.bg_rgba)?;
        stdin
            .write_all(&self.scratch)
            .map_err(|e| PapercutError::encode(format!("writing frame {idx} to recorder: {e}")))
    }

    fn end(&mut self) -> PapercutResult<()> {
        let result = self.finish();
        self.cfg = None;
        match result {
            Ok(()) => {
                tracing::info!(path = %self.opts.out_path.display(), "video written");
                Ok(())
            }
            Err(e) => {
                self.discard_output();
                Err(e)
            }
        }
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        if let Some(handle) = self.stderr_drain.take() {
            let _ = handle.join();
        }
        if self.cfg.take().is_some() {
            self.discard_output();
        }
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.abort();
        }
    }
}

fn format_fps(fps: f64) -> String {
    if fps.fract() == 0.0 {
        format!("{}", fps as u64)
    } else {
        format!("{fps:.6}")
    }
}

/// `src_premul` over `bg_rgba`; every output pixel is opaque.
fn flatten_onto_backdrop(
    dst: &mut [u8],
    src_premul: &[u8],
    bg_rgba: [u8; 4],
) -> PapercutResult<()> {
    if dst.len() != src_premul.len() || !dst.len().is_multiple_of(4) {
        return Err(PapercutError::validation(format!(
            "cannot flatten {} bytes into {}",
            src_premul.len(),
            dst.len()
        )));
    }

    let bg = bg_rgba.map(u16::from);
    for (out, px) in dst.chunks_exact_mut(4).zip(src_premul.chunks_exact(4)) {
        let inv = 255 - u16::from(px[3]);
        for c in 0..3 {
            out[c] = (u16::from(px[c]) + mul_div255_u16(bg[c], inv)).min(255) as u8;
        }
        out[3] = 255;
    }
    Ok(())
}

pub fn ensure_parent_dir(path: &Path) -> PapercutResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create directory '{}' for export", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `bin -version` runs successfully.
pub fn is_ffmpeg_available(bin: &std::ffi::OsStr) -> bool {
    Command::new(bin)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
