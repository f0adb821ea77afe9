use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc;
use std::time::Duration;

use anyhow::Context;
use tokio_util::sync::CancellationToken;

use crate::encode::ffmpeg::{
    EncodeSettings, ensure_parent_dir, finalize_output, fps_arg, join_stderr, part_path,
    remove_file_quiet, spawn_stderr_drain,
};
use crate::encode::sink::{EncodeProgress, FrameSink, SinkConfig, check_frame};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{WheelError, WheelResult};
use crate::render::frame::FrameRGBA;

/// `printf`-style pattern handed to `ffmpeg` for scratch frames.
pub const FRAME_PATTERN: &str = "frame_%06d.png";

/// File name of the `n`-th scratch frame.
pub fn frame_file_name(n: u64) -> String {
    format!("frame_{n:06}.png")
}

/// Options for [`ImageSequenceSink`].
#[derive(Clone, Debug)]
pub struct SequenceSinkOpts {
    /// Directory receiving PNG frames; created on `begin`, removed on `end`/`abort`.
    pub scratch_dir: PathBuf,
    /// Final MP4 path; written as `<out_path>.part` and renamed on success.
    pub out_path: PathBuf,
    /// Encoder settings.
    pub settings: EncodeSettings,
    /// Kills the encoder when fired.
    pub cancel: Option<CancellationToken>,
}

/// Sink that writes numbered PNG frames to a scratch directory, then encodes them with a single
/// `ffmpeg` run whose `-progress` output drives the progress callback.
pub struct ImageSequenceSink {
    opts: SequenceSinkOpts,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
    written: u64,
    child: Option<Child>,
}

impl ImageSequenceSink {
    /// Create a sink; nothing touches the filesystem until `begin`.
    pub fn new(opts: SequenceSinkOpts) -> Self {
        Self {
            opts,
            cfg: None,
            last_idx: None,
            written: 0,
            child: None,
        }
    }

    /// Number of frames written to scratch so far.
    pub fn frames_written(&self) -> u64 {
        self.written
    }

    fn cleanup_scratch(&self) {
        match std::fs::remove_dir_all(&self.opts.scratch_dir) {
            Ok(()) => {
                tracing::debug!(dir = %self.opts.scratch_dir.display(), "scratch removed");
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                dir = %self.opts.scratch_dir.display(),
                error = %e,
                "failed to remove scratch directory"
            ),
        }
    }

    fn encode(&mut self, cfg: &SinkConfig, progress: EncodeProgress<'_>) -> WheelResult<()> {
        if self.written == 0 {
            return Err(WheelError::encoding("no frames were written"));
        }
        ensure_parent_dir(&self.opts.out_path)?;
        let part = part_path(&self.opts.out_path);

        let mut cmd = Command::new(&self.opts.settings.ffmpeg_bin);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        cmd.args([
            "-y",
            "-hide_banner",
            "-loglevel",
            "error",
            "-nostats",
            "-progress",
            "pipe:1",
        ]);
        cmd.args(["-framerate", &fps_arg(cfg.fps)]);
        cmd.arg("-i").arg(self.opts.scratch_dir.join(FRAME_PATTERN));
        if let Some(audio) = cfg.audio.as_ref() {
            cmd.arg("-i").arg(audio);
        }
        cmd.args(self.opts.settings.output_args(cfg.audio.is_some()));
        cmd.arg(&part);

        let mut child = cmd.spawn().map_err(|e| {
            WheelError::encoding(format!(
                "failed to spawn {} (is it installed and on PATH?): {e}",
                self.opts.settings.ffmpeg_bin.display()
            ))
        })?;
        tracing::info!(pid = child.id(), frames = self.written, "ffmpeg encode started");

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| WheelError::encoding("failed to capture ffmpeg stdout"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| WheelError::encoding("failed to capture ffmpeg stderr"))?;
        let stderr_drain = spawn_stderr_drain(stderr);
        self.child = Some(child);

        let (tx, rx) = mpsc::channel::<ProgressState>();
        let reader = std::thread::spawn(move || {
            let mut state = ProgressState::default();
            for line in BufReader::new(stdout).lines() {
                let Ok(line) = line else { break };
                if let Some((key, value)) = line.trim().split_once('=') {
                    let key = key.trim();
                    state.update(key, value.trim());
                    if key == "progress" && tx.send(state).is_err() {
                        break;
                    }
                }
            }
        });

        let total = self.written;
        let cancel = self.opts.cancel.clone();
        let status = loop {
            match rx.recv_timeout(Duration::from_millis(50)) {
                Ok(state) => progress(state.fraction(total)),
                Err(mpsc::RecvTimeoutError::Timeout) => {}
                // Reader finished; ffmpeg closed stdout and is about to exit.
                Err(mpsc::RecvTimeoutError::Disconnected) => {
                    std::thread::sleep(Duration::from_millis(10));
                }
            }
            if cancel.as_ref().is_some_and(CancellationToken::is_cancelled) {
                self.kill_child();
                let _ = reader.join();
                let _ = join_stderr(Some(stderr_drain));
                remove_file_quiet(&part);
                return Err(WheelError::Cancelled);
            }
            let Some(child) = self.child.as_mut() else {
                return Err(WheelError::encoding("ffmpeg child vanished"));
            };
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {}
                Err(e) => {
                    self.kill_child();
                    remove_file_quiet(&part);
                    return Err(WheelError::encoding(format!("failed to wait for ffmpeg: {e}")));
                }
            }
        };
        self.child = None;
        let _ = reader.join();
        // Flush progress blocks that raced with process exit.
        while let Ok(state) = rx.try_recv() {
            progress(state.fraction(total));
        }
        let stderr = join_stderr(Some(stderr_drain));

        if !status.success() {
            remove_file_quiet(&part);
            return Err(WheelError::encoding(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }
        finalize_output(&part, &self.opts.out_path)?;
        progress(1.0);
        tracing::info!(out = %self.opts.out_path.display(), "ffmpeg encode finished");
        Ok(())
    }

    fn kill_child(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

impl FrameSink for ImageSequenceSink {
    fn begin(&mut self, cfg: SinkConfig) -> WheelResult<()> {
        cfg.validate()?;
        std::fs::create_dir_all(&self.opts.scratch_dir).with_context(|| {
            format!(
                "create scratch directory '{}'",
                self.opts.scratch_dir.display()
            )
        })?;
        self.cfg = Some(cfg);
        self.last_idx = None;
        self.written = 0;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> WheelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| WheelError::encoding("image sequence sink not started"))?;
        check_frame(cfg, self.last_idx, idx, frame)?;
        self.last_idx = Some(idx);

        // Numbered by write order so the pattern input stays contiguous from 0.
        let path = self.opts.scratch_dir.join(frame_file_name(self.written));
        frame
            .write_png(&path, self.opts.settings.bg_rgba)
            .map_err(|e| WheelError::encoding(format!("write scratch frame: {e}")))?;
        self.written += 1;
        Ok(())
    }

    fn end(&mut self, progress: EncodeProgress<'_>) -> WheelResult<()> {
        let cfg = self
            .cfg
            .take()
            .ok_or_else(|| WheelError::encoding("image sequence sink not started"))?;
        let out = self.encode(&cfg, progress);
        self.cleanup_scratch();
        out
    }

    fn abort(&mut self) {
        self.kill_child();
        self.cleanup_scratch();
        remove_file_quiet(&part_path(&self.opts.out_path));
        self.cfg = None;
    }
}

impl Drop for ImageSequenceSink {
    fn drop(&mut self) {
        if self.cfg.is_some() || self.child.is_some() {
            self.abort();
        }
    }
}

/// Latest values from one `ffmpeg -progress` block.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ProgressState {
    pub(crate) frame: u64,
    pub(crate) complete: bool,
}

impl ProgressState {
    pub(crate) fn update(&mut self, key: &str, value: &str) {
        match key {
            "frame" => {
                if let Ok(n) = value.parse::<u64>() {
                    self.frame = n;
                }
            }
            "progress" => self.complete = value == "end",
            _ => {}
        }
    }

    pub(crate) fn fraction(&self, total: u64) -> f64 {
        if self.complete {
            return 1.0;
        }
        if total == 0 {
            return 0.0;
        }
        (self.frame as f64 / total as f64).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sequence.rs"]
mod tests;
