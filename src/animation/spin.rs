use crate::animation::ease::Ease;
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{WheelError, WheelResult};
use crate::foundation::math::wrap_degrees;

/// Number of catalog slots mapped onto one full wheel turn.
pub const WHEEL_SLOTS: u32 = 1000;

/// Degrees of wheel rotation per catalog position.
pub const DEGREES_PER_SLOT: f64 = 360.0 / WHEEL_SLOTS as f64;

/// Spin intensity; controls how many full turns precede settling.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub struct SpeedLevel(u8);

impl SpeedLevel {
    /// Slowest accepted level.
    pub const MIN: u8 = 1;
    /// Fastest accepted level.
    pub const MAX: u8 = 5;

    /// Clamp an arbitrary requested level into `MIN..=MAX`.
    pub fn clamped(level: i64) -> Self {
        Self(level.clamp(i64::from(Self::MIN), i64::from(Self::MAX)) as u8)
    }

    /// Raw level value.
    pub fn get(self) -> u8 {
        self.0
    }

    /// Full extra turns before the wheel settles: `2 + 2 * level`.
    pub fn extra_turns(self) -> u32 {
        2 + 2 * u32::from(self.0)
    }
}

impl Default for SpeedLevel {
    fn default() -> Self {
        Self(3)
    }
}

/// Frame budget for one video: spin phase followed by the reveal phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SpinTiming {
    /// Total frames `F` in the video.
    pub total_frames: u64,
    /// Frames `S` of the spin phase, `1 <= S <= F`.
    pub spin_frames: u64,
    /// Length of the overlay reveal; `None` stretches it over `F - S`.
    pub reveal_frames: Option<u64>,
}

impl SpinTiming {
    /// Validate frame counts.
    pub fn validate(&self) -> WheelResult<()> {
        if self.total_frames == 0 {
            return Err(WheelError::validation("total_frames must be > 0"));
        }
        if self.spin_frames == 0 || self.spin_frames > self.total_frames {
            return Err(WheelError::validation(format!(
                "spin_frames must be in 1..={}, got {}",
                self.total_frames, self.spin_frames
            )));
        }
        if self.reveal_frames == Some(0) {
            return Err(WheelError::validation("reveal_frames must be > 0 when set"));
        }
        Ok(())
    }

    /// Re-time the spin phase to `millis` inside the fixed total.
    ///
    /// At least one reveal frame is kept when the total allows it.
    pub fn with_spin_millis(self, fps: Fps, millis: u64) -> Self {
        let upper = if self.total_frames > 1 {
            self.total_frames - 1
        } else {
            1
        };
        let spin_frames = fps.millis_to_frames_round(millis).clamp(1, upper);
        Self {
            spin_frames,
            ..self
        }
    }
}

/// Per-frame inputs for the frame renderer.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct RenderParameters {
    /// Frame this parameter set belongs to.
    pub frame: FrameIndex,
    /// Clockwise wheel rotation in degrees (not wrapped).
    pub rotation_degrees: f64,
    /// Whether the winner overlay is drawn.
    pub show_overlay: bool,
    /// Overlay scale, `>= 0`; may exceed `1.0` while the elastic reveal overshoots.
    pub overlay_scale: f64,
}

/// Deterministic rotation/reveal schedule for one winning position.
#[derive(Clone, Debug, PartialEq)]
pub struct SpinSchedule {
    timing: SpinTiming,
    winning_degrees: f64,
    extra_turns: u32,
}

impl SpinSchedule {
    /// Build a schedule for `position` with validated timing.
    pub fn new(position: u32, timing: SpinTiming, speed: SpeedLevel) -> WheelResult<Self> {
        timing.validate()?;
        if position > WHEEL_SLOTS {
            return Err(WheelError::validation(format!(
                "position must be in 0..={WHEEL_SLOTS}, got {position}"
            )));
        }
        Ok(Self {
            timing,
            winning_degrees: winning_degrees(position),
            extra_turns: speed.extra_turns(),
        })
    }

    /// Frame budget of this schedule.
    pub fn timing(&self) -> SpinTiming {
        self.timing
    }

    /// Winning angle in `[0, 360)`.
    pub fn winning_degrees(&self) -> f64 {
        self.winning_degrees
    }

    /// Rotation at which the wheel settles: `extra_turns * 360 + winning_degrees`.
    pub fn final_rotation(&self) -> f64 {
        f64::from(self.extra_turns) * 360.0 + self.winning_degrees
    }

    /// Number of frames in the schedule.
    pub fn len(&self) -> u64 {
        self.timing.total_frames
    }

    /// Always `false`; validated schedules contain at least one frame.
    pub fn is_empty(&self) -> bool {
        self.timing.total_frames == 0
    }

    /// Wheel rotation at frame `i`.
    pub fn rotation_at(&self, i: u64) -> f64 {
        let s = self.timing.spin_frames;
        if i + 1 >= s {
            return self.final_rotation();
        }
        // Denominator S-1 so frame S-1 lands exactly on the final angle.
        let progress = i as f64 / (s - 1) as f64;
        Ease::OutCubic.apply(progress) * self.final_rotation()
    }

    /// Overlay scale at frame `i`; zero during the spin phase.
    pub fn overlay_scale_at(&self, i: u64) -> f64 {
        let s = self.timing.spin_frames;
        if i < s {
            return 0.0;
        }
        let elapsed = (i - s) as f64;
        let t = match self.timing.reveal_frames {
            Some(n) => (elapsed / n as f64).min(1.0),
            None => {
                let span = self.timing.total_frames.saturating_sub(s).max(1);
                elapsed / span as f64
            }
        };
        Ease::OutElastic.apply(t).max(0.0)
    }

    /// Render parameters for frame `idx`. Indices past the end hold the last frame.
    pub fn params(&self, idx: FrameIndex) -> RenderParameters {
        let i = idx.0.min(self.timing.total_frames.saturating_sub(1));
        let show_overlay = i >= self.timing.spin_frames;
        RenderParameters {
            frame: idx,
            rotation_degrees: self.rotation_at(i),
            show_overlay,
            overlay_scale: self.overlay_scale_at(i),
        }
    }

    /// Lazy iterator over every frame's parameters. Cloning restarts nothing; each clone is
    /// independent and a fresh `iter()` always starts at frame 0.
    pub fn iter(&self) -> SpinFrames<'_> {
        SpinFrames {
            schedule: self,
            next: 0,
        }
    }
}

/// Winning angle for a catalog position, wrapped into `[0, 360)`.
pub fn winning_degrees(position: u32) -> f64 {
    wrap_degrees(f64::from(position) * DEGREES_PER_SLOT)
}

/// Iterator returned by [`SpinSchedule::iter`].
#[derive(Clone, Debug)]
pub struct SpinFrames<'a> {
    schedule: &'a SpinSchedule,
    next: u64,
}

impl Iterator for SpinFrames<'_> {
    type Item = RenderParameters;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next >= self.schedule.len() {
            return None;
        }
        let p = self.schedule.params(FrameIndex(self.next));
        self.next += 1;
        Some(p)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rem = self.schedule.len().saturating_sub(self.next) as usize;
        (rem, Some(rem))
    }
}

impl ExactSizeIterator for SpinFrames<'_> {}

#[cfg(test)]
#[path = "../../tests/unit/animation/spin.rs"]
mod tests;
