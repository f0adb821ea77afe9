/// Coarse phase of a generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Accepted, pipeline not started yet.
    Queued,
    /// Frames are being rasterized.
    Rendering,
    /// The encoder is producing the MP4.
    Encoding,
    /// The MP4 is available for download.
    Done,
    /// The pipeline stopped with an error.
    Failed,
    /// The session was deleted or evicted before completion.
    Cancelled,
}

impl Stage {
    /// `true` for stages that will not change anymore.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Cancelled)
    }
}

/// Snapshot reported by `/api/progress`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Progress {
    /// Percentage in `0..=100`.
    pub progress: u8,
    /// Human-readable status line.
    pub message: String,
    /// Current phase.
    pub stage: Stage,
}

/// Share of the bar given to frame rendering; encoding fills the rest up to 99.
pub const RENDER_SHARE: f64 = 80.0;

impl Progress {
    /// Initial state of a new session.
    pub fn queued() -> Self {
        Self {
            progress: 0,
            message: "Waiting to start".to_string(),
            stage: Stage::Queued,
        }
    }

    /// Rendering progress after `done` of `total` frames.
    pub fn rendering(done: u64, total: u64) -> Self {
        let frac = if total == 0 {
            0.0
        } else {
            done as f64 / total as f64
        };
        Self {
            progress: percent(frac * RENDER_SHARE),
            message: format!("Rendering frames ({done}/{total})"),
            stage: Stage::Rendering,
        }
    }

    /// Encoding progress for an encoder-reported fraction in `[0, 1]`.
    pub fn encoding(fraction: f64) -> Self {
        let p = RENDER_SHARE + fraction.clamp(0.0, 1.0) * (99.0 - RENDER_SHARE);
        Self {
            progress: percent(p).min(99),
            message: "Encoding video".to_string(),
            stage: Stage::Encoding,
        }
    }

    /// Final state of a successful run.
    pub fn done() -> Self {
        Self {
            progress: 100,
            message: "Video ready".to_string(),
            stage: Stage::Done,
        }
    }

    /// Terminal failure state; keeps the last reached percentage.
    pub fn failed(last: u8, error: &str) -> Self {
        Self {
            progress: last,
            message: format!("Generation failed: {error}"),
            stage: Stage::Failed,
        }
    }

    /// Terminal cancellation state.
    pub fn cancelled(last: u8) -> Self {
        Self {
            progress: last,
            message: "Generation cancelled".to_string(),
            stage: Stage::Cancelled,
        }
    }
}

fn percent(p: f64) -> u8 {
    p.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/progress.rs"]
mod tests;
