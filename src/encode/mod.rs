//! Encoding sinks.
//!
//! Sinks consume rendered frames in index order and hand them to the system `ffmpeg`.

use std::str::FromStr;

use crate::foundation::error::WheelError;

/// `ffmpeg` process plumbing and the stdin-pipe sink.
pub mod ffmpeg;
/// PNG image-sequence sink (default).
pub mod sequence;
/// Generic frame sink trait and the in-memory sink.
pub mod sink;

/// Which sink the pipeline uses for MP4 output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncoderMode {
    /// Write PNG frames to scratch, then encode them in one `ffmpeg` run.
    #[default]
    Sequence,
    /// Stream raw frames to `ffmpeg` stdin while rendering.
    Pipe,
}

impl FromStr for EncoderMode {
    type Err = WheelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequence" | "png" => Ok(Self::Sequence),
            "pipe" | "stdin" => Ok(Self::Pipe),
            other => Err(WheelError::validation(format!(
                "unknown encoder mode '{other}' (expected 'sequence' or 'pipe')"
            ))),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/mod.rs"]
mod tests;
