//! Prize-wheel video generator.
//!
//! Picks a winner from a fixed catalog, renders a spinning wheel that lands on it, and encodes the
//! frames to MP4 with ffmpeg. The HTTP API runs each generation as a background session:
//!
//! - `POST /api/generate-wheel` resolves the winner and starts a session
//! - `/api/progress` and `/api/status` report on it
//! - `/api/download` streams the finished video
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

#[cfg(test)]
#[path = "../tests/common/mod.rs"]
mod test_common;

/// Spin schedule and easing.
pub mod animation;
/// Background/wheel images, procedural fallbacks and overlay text.
pub mod assets;
/// Entry catalog and its loader.
pub mod catalog;
/// Environment configuration.
pub mod config;
/// Frame sinks: ffmpeg pipe, PNG sequence and in-memory.
pub mod encode;
/// Render-then-encode pipeline.
pub mod pipeline;
pub mod render;
/// Winner selection.
pub mod selection;
pub mod server;
pub mod session;

pub use crate::foundation::core::{
    Affine, BezPath, Canvas, Fps, FrameIndex, Point, Rect, Rgba8Premul, Vec2,
};
pub use crate::foundation::error::{WheelError, WheelResult};

pub use crate::animation::ease::Ease;
pub use crate::animation::spin::{RenderParameters, SpeedLevel, SpinSchedule, SpinTiming};
pub use crate::assets::{AssetPaths, RenderAssets};
pub use crate::catalog::load::{load_catalog, load_or_empty, parse_catalog};
pub use crate::catalog::model::{Catalog, Entry};
pub use crate::config::AppConfig;
pub use crate::encode::EncoderMode;
pub use crate::encode::ffmpeg::{EncodeSettings, FfmpegSink, FfmpegSinkOpts};
pub use crate::encode::sequence::{ImageSequenceSink, SequenceSinkOpts};
pub use crate::encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use crate::pipeline::{
    GenerationOutcome, Job, Progress, Stage, VideoSettings, generate, make_sink, render_frame,
};
pub use crate::render::cpu::FrameRenderer;
pub use crate::render::frame::FrameRGBA;
pub use crate::selection::{GenerateWheelBody, GenerationRequest, Selection, resolve};
pub use crate::server::{AppState, router, serve};
pub use crate::session::{SessionId, SessionManager, SessionSettings, StatusReport};
