//! Generation pipeline: spin schedule → frame renderer → frame sink.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tokio_util::sync::CancellationToken;

use crate::animation::spin::{SpeedLevel, SpinSchedule, SpinTiming};
use crate::assets::RenderAssets;
use crate::assets::text::OverlayText;
use crate::catalog::model::Entry;
use crate::encode::EncoderMode;
use crate::encode::ffmpeg::{EncodeSettings, FfmpegSink, FfmpegSinkOpts};
use crate::encode::sequence::{ImageSequenceSink, SequenceSinkOpts};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::foundation::core::{Canvas, Fps, FrameIndex};
use crate::foundation::error::{WheelError, WheelResult};
use crate::render::cpu::FrameRenderer;
use crate::render::frame::FrameRGBA;

/// Progress reporting and stages.
pub mod progress;

pub use progress::{Progress, Stage};

/// Video-wide settings shared by every generation.
#[derive(Clone, Debug)]
pub struct VideoSettings {
    /// Output size.
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: Fps,
    /// Default frame budget; `spin_duration_ms` re-times its spin phase.
    pub timing: SpinTiming,
    /// Frames rasterized in parallel before being pushed in order.
    pub render_chunk: usize,
    /// Optional audio track.
    pub audio: Option<PathBuf>,
}

impl Default for VideoSettings {
    fn default() -> Self {
        Self {
            canvas: Canvas {
                width: 1920,
                height: 1080,
            },
            fps: Fps { num: 25, den: 1 },
            timing: SpinTiming {
                total_frames: 400,
                spin_frames: 150,
                reveal_frames: None,
            },
            render_chunk: 8,
            audio: None,
        }
    }
}

/// What to render: the resolved winner and the spin options.
#[derive(Clone, Debug)]
pub struct Job {
    /// Winning entry; its position drives the final angle and the overlay.
    pub entry: Entry,
    /// Spin intensity.
    pub speed: SpeedLevel,
    /// Optional spin-phase duration in milliseconds.
    pub spin_duration_ms: Option<u64>,
}

/// Summary of a finished generation.
#[derive(Clone, Debug, PartialEq)]
pub struct GenerationOutcome {
    /// Entry that was rendered.
    pub entry: Entry,
    /// Frames pushed to the sink.
    pub frames: u64,
    /// Final wheel rotation in degrees.
    pub final_rotation: f64,
}

impl VideoSettings {
    /// Spin schedule for `job` under these settings.
    pub fn schedule(&self, job: &Job) -> WheelResult<SpinSchedule> {
        let timing = match job.spin_duration_ms {
            Some(ms) => self.timing.with_spin_millis(self.fps, ms),
            None => self.timing,
        };
        SpinSchedule::new(job.entry.position, timing, job.speed)
    }

    /// Renderer for `job`, with its overlay text shaped once.
    pub fn renderer(&self, assets: &RenderAssets, job: &Job) -> WheelResult<FrameRenderer> {
        let font = assets.font.as_deref().map(Vec::as_slice);
        let overlay = OverlayText::shape(font, &job.entry, self.canvas);
        FrameRenderer::new(self.canvas, assets, overlay)
    }
}

/// Render every frame of `job` into `sink` and finish the encode.
///
/// `cancel` is checked between frames; on any error or cancellation the sink is aborted so no
/// scratch or partial output survives.
#[tracing::instrument(skip_all, fields(position = job.entry.position, speed = job.speed.get()))]
pub fn generate(
    settings: &VideoSettings,
    assets: &RenderAssets,
    job: &Job,
    sink: &mut dyn FrameSink,
    cancel: &CancellationToken,
    on_progress: &mut dyn FnMut(Progress),
) -> WheelResult<GenerationOutcome> {
    let schedule = settings.schedule(job)?;
    let renderer = settings.renderer(assets, job)?;
    let total = schedule.len();

    on_progress(Progress::rendering(0, total));
    let cfg = SinkConfig {
        width: settings.canvas.width,
        height: settings.canvas.height,
        fps: settings.fps,
        total_frames: total,
        audio: settings.audio.clone(),
    };

    let result = drive(&schedule, &renderer, cfg, settings.render_chunk, sink, cancel, on_progress);
    if let Err(e) = result {
        sink.abort();
        match &e {
            WheelError::Cancelled => tracing::info!("generation cancelled"),
            other => tracing::error!(error = %other, "generation failed"),
        }
        return Err(e);
    }

    on_progress(Progress::done());
    Ok(GenerationOutcome {
        entry: job.entry.clone(),
        frames: total,
        final_rotation: schedule.final_rotation(),
    })
}

fn drive(
    schedule: &SpinSchedule,
    renderer: &FrameRenderer,
    cfg: SinkConfig,
    render_chunk: usize,
    sink: &mut dyn FrameSink,
    cancel: &CancellationToken,
    on_progress: &mut dyn FnMut(Progress),
) -> WheelResult<()> {
    sink.begin(cfg)?;
    push_all_frames(schedule, renderer, render_chunk, sink, cancel, on_progress)?;
    if cancel.is_cancelled() {
        return Err(WheelError::Cancelled);
    }
    tracing::info!(frames = schedule.len(), "frames rendered, encoding");
    on_progress(Progress::encoding(0.0));
    sink.end(&mut |f| on_progress(Progress::encoding(f)))
}

fn push_all_frames(
    schedule: &SpinSchedule,
    renderer: &FrameRenderer,
    render_chunk: usize,
    sink: &mut dyn FrameSink,
    cancel: &CancellationToken,
    on_progress: &mut dyn FnMut(Progress),
) -> WheelResult<()> {
    let total = schedule.len();
    let chunk_size = render_chunk.max(1);
    let mut frames = schedule.iter();
    let mut done = 0u64;

    loop {
        let chunk: Vec<_> = frames.by_ref().take(chunk_size).collect();
        if chunk.is_empty() {
            break;
        }
        if cancel.is_cancelled() {
            return Err(WheelError::Cancelled);
        }

        let rendered: Vec<WheelResult<FrameRGBA>> = chunk
            .par_iter()
            .map_init(
                || renderer.new_context(),
                |ctx, params| renderer.render_with(ctx, params),
            )
            .collect();

        for (params, frame) in chunk.iter().zip(rendered) {
            if cancel.is_cancelled() {
                return Err(WheelError::Cancelled);
            }
            sink.push_frame(params.frame, &frame?)?;
        }

        done += chunk.len() as u64;
        tracing::debug!(frames = done, total, "chunk pushed");
        on_progress(Progress::rendering(done, total));
    }
    Ok(())
}

/// Render a single frame of `job`, for previews and debugging.
pub fn render_frame(
    settings: &VideoSettings,
    assets: &RenderAssets,
    job: &Job,
    idx: FrameIndex,
) -> WheelResult<FrameRGBA> {
    let schedule = settings.schedule(job)?;
    let renderer = settings.renderer(assets, job)?;
    renderer.render(&schedule.params(idx))
}

/// Build the MP4 sink for `mode`.
pub fn make_sink(
    mode: EncoderMode,
    encode: &EncodeSettings,
    scratch_dir: &Path,
    out_path: &Path,
    cancel: &CancellationToken,
) -> Box<dyn FrameSink> {
    match mode {
        EncoderMode::Sequence => Box::new(ImageSequenceSink::new(SequenceSinkOpts {
            scratch_dir: scratch_dir.to_path_buf(),
            out_path: out_path.to_path_buf(),
            settings: encode.clone(),
            cancel: Some(cancel.clone()),
        })),
        EncoderMode::Pipe => Box::new(FfmpegSink::new(FfmpegSinkOpts {
            out_path: out_path.to_path_buf(),
            settings: encode.clone(),
            cancel: Some(cancel.clone()),
        })),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/mod.rs"]
mod tests;
