//! Export sinks.
//!
//! Sinks consume rendered frames in timeline order and are driven by [`export::export_frames`].

pub(crate) mod export;
pub(crate) mod ffmpeg;
pub(crate) mod gif;
pub(crate) mod sink;
