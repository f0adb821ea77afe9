//! Environment-driven application configuration.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::animation::spin::SpinTiming;
use crate::assets::AssetPaths;
use crate::encode::ffmpeg::EncodeSettings;
use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{WheelError, WheelResult};
use crate::pipeline::VideoSettings;
use crate::session::SessionSettings;

/// Server and generation configuration.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Catalog JSON file.
    pub catalog_path: PathBuf,
    /// Optional background, wheel and font files.
    pub assets: AssetPaths,
    /// Output, encoder and video settings for sessions.
    pub session: SessionSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            catalog_path: PathBuf::from("data/g1000.json"),
            assets: AssetPaths::default(),
            session: SessionSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load from process environment variables.
    ///
    /// | Env var | Default |
    /// |---|---|
    /// | `HOST` / `PORT` | `0.0.0.0` / `3000` |
    /// | `CATALOG_PATH` | `data/g1000.json` |
    /// | `OUTPUT_DIR` / `SCRATCH_DIR` | `output` / `temp` |
    /// | `BACKGROUND_PATH`, `WHEEL_PATH`, `AUDIO_PATH`, `FONT_PATH` | unset |
    /// | `FFMPEG_BIN` | `ffmpeg` |
    /// | `VIDEO_WIDTH` / `VIDEO_HEIGHT` / `VIDEO_FPS` | `1920` / `1080` / `25` |
    /// | `VIDEO_TOTAL_FRAMES` / `VIDEO_SPIN_FRAMES` | `400` / `150` |
    /// | `VIDEO_REVEAL_FRAMES` | unset |
    /// | `VIDEO_CRF` / `VIDEO_PRESET` | `23` / `medium` |
    /// | `ENCODER_MODE` | `sequence` |
    /// | `RENDER_CHUNK` | `8` |
    /// | `SESSION_TTL_SECS` | `3600` |
    pub fn from_env() -> WheelResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load from an arbitrary key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> WheelResult<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        let video = defaults.session.video;
        let encode = defaults.session.encode;

        let canvas = Canvas {
            width: parse_or(&get, "VIDEO_WIDTH", video.canvas.width)?,
            height: parse_or(&get, "VIDEO_HEIGHT", video.canvas.height)?,
        };
        canvas.validate()?;
        let fps = Fps::new(parse_or(&get, "VIDEO_FPS", video.fps.num)?, 1)?;
        let timing = SpinTiming {
            total_frames: parse_or(&get, "VIDEO_TOTAL_FRAMES", video.timing.total_frames)?,
            spin_frames: parse_or(&get, "VIDEO_SPIN_FRAMES", video.timing.spin_frames)?,
            reveal_frames: parse_opt(&get, "VIDEO_REVEAL_FRAMES")?,
        };
        timing.validate()?;
        let render_chunk: usize = parse_or(&get, "RENDER_CHUNK", video.render_chunk)?;
        if render_chunk == 0 {
            return Err(WheelError::validation("RENDER_CHUNK must be > 0"));
        }
        let crf: u8 = parse_or(&get, "VIDEO_CRF", encode.crf)?;
        if crf > 51 {
            return Err(WheelError::validation("VIDEO_CRF must be in 0..=51"));
        }

        Ok(Self {
            host: get("HOST").unwrap_or(defaults.host),
            port: parse_or(&get, "PORT", defaults.port)?,
            catalog_path: get("CATALOG_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.catalog_path),
            assets: AssetPaths {
                background: get("BACKGROUND_PATH").map(PathBuf::from),
                wheel: get("WHEEL_PATH").map(PathBuf::from),
                font: get("FONT_PATH").map(PathBuf::from),
            },
            session: SessionSettings {
                output_dir: get("OUTPUT_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.session.output_dir),
                scratch_dir: get("SCRATCH_DIR")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.session.scratch_dir),
                ttl: Duration::from_secs(parse_or(
                    &get,
                    "SESSION_TTL_SECS",
                    defaults.session.ttl.as_secs(),
                )?),
                encoder: parse_or(&get, "ENCODER_MODE", defaults.session.encoder)?,
                encode: EncodeSettings {
                    ffmpeg_bin: get("FFMPEG_BIN")
                        .map(PathBuf::from)
                        .unwrap_or(encode.ffmpeg_bin),
                    crf,
                    preset: get("VIDEO_PRESET").unwrap_or(encode.preset),
                    bg_rgba: encode.bg_rgba,
                },
                video: VideoSettings {
                    canvas,
                    fps,
                    timing,
                    render_chunk,
                    audio: get("AUDIO_PATH").map(PathBuf::from),
                },
            },
        })
    }
}

fn parse_opt<T>(get: &impl Fn(&str) -> Option<String>, key: &str) -> WheelResult<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| WheelError::validation(format!("{key}='{raw}': {e}")))
        })
        .transpose()
}

fn parse_or<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> WheelResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_opt(get, key)?.unwrap_or(default))
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
