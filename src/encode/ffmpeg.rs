use crate::encode::sink::{EncodeProgress, FrameSink, SinkConfig, check_frame};
use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::{WheelError, WheelResult};
use crate::foundation::math::flatten_premul_over_bg;
use crate::render::frame::FrameRGBA;
use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Encoder knobs shared by both `ffmpeg` sinks.
#[derive(Clone, Debug)]
pub struct EncodeSettings {
    /// `ffmpeg` executable (name on `PATH` or absolute path).
    pub ffmpeg_bin: PathBuf,
    /// x264 constant rate factor.
    pub crf: u8,
    /// x264 preset name.
    pub preset: String,
    /// Background color used to flatten alpha (RGBA8, straight alpha).
    pub bg_rgba: [u8; 4],
}

impl Default for EncodeSettings {
    fn default() -> Self {
        Self {
            ffmpeg_bin: PathBuf::from("ffmpeg"),
            crf: 23,
            preset: "medium".to_string(),
            bg_rgba: [0, 0, 0, 255],
        }
    }
}

impl EncodeSettings {
    /// `-c:v libx264 -preset P -crf C -pix_fmt yuv420p`, plus audio and container flags.
    pub(crate) fn output_args(&self, has_audio: bool) -> Vec<OsString> {
        let mut args: Vec<OsString> = Vec::new();
        let mut push = |s: &str| args.push(s.into());
        push("-c:v");
        push("libx264");
        push("-preset");
        push(&self.preset);
        push("-crf");
        push(&self.crf.to_string());
        push("-pix_fmt");
        push("yuv420p");
        if has_audio {
            for a in ["-c:a", "aac", "-af", "apad", "-shortest"] {
                push(a);
            }
        } else {
            push("-an");
        }
        for a in ["-movflags", "+faststart", "-f", "mp4"] {
            push(a);
        }
        args
    }
}

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    /// Final MP4 path; written as `<out_path>.part` and renamed on success.
    pub out_path: PathBuf,
    /// Encoder settings.
    pub settings: EncodeSettings,
    /// Kills the encoder while waiting for it to finish.
    pub cancel: Option<CancellationToken>,
}

impl FfmpegSinkOpts {
    /// Options for outputting an MP4 to `out_path` with default settings.
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        Self {
            out_path: out_path.into(),
            settings: EncodeSettings::default(),
            cancel: None,
        }
    }
}

/// Sink that spawns `ffmpeg` and streams flattened raw frames to its stdin.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,

    child: Option<Child>,
    stdin: Option<ChildStdin>,
    stderr_drain: Option<std::thread::JoinHandle<String>>,

    scratch: Vec<u8>,
    cfg: Option<SinkConfig>,
    last_idx: Option<FrameIndex>,
}

impl FfmpegSink {
    /// Create a new sink that streams into `ffmpeg`.
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

    fn part_path(&self) -> PathBuf {
        part_path(&self.opts.out_path)
    }

    /// A failed stdin write usually means `ffmpeg` exited; report its diagnostics instead.
    fn collect_write_failure(&mut self, write_err: std::io::Error) -> WheelError {
        drop(self.stdin.take());
        let Some(mut child) = self.child.take() else {
            return WheelError::encoding(format!(
                "failed to write frame to ffmpeg stdin: {write_err}"
            ));
        };
        let status = wait_with_cancel(&mut child, self.opts.cancel.as_ref());
        let stderr = join_stderr(self.stderr_drain.take());
        remove_file_quiet(&self.part_path());
        self.cfg = None;
        match status {
            Ok(status) if !status.success() => WheelError::encoding(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )),
            Ok(_) => WheelError::encoding(format!(
                "failed to write frame to ffmpeg stdin: {write_err}: {}",
                stderr.trim()
            )),
            Err(e) => e,
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> WheelResult<()> {
        cfg.validate()?;
        ensure_parent_dir(&self.opts.out_path)?;

        let mut cmd = Command::new(&self.opts.settings.ffmpeg_bin);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        // Input: raw RGBA8, already flattened to opaque in push_frame.
        cmd.args(["-y", "-hide_banner", "-loglevel", "error"]);
        cmd.args([
            "-f",
            "rawvideo",
            "-pix_fmt",
            "rgba",
            "-s",
            &format!("{}x{}", cfg.width, cfg.height),
        ]);
        cmd.args(["-framerate", &fps_arg(cfg.fps)]);
        cmd.args(["-i", "pipe:0"]);
        if let Some(audio) = cfg.audio.as_ref() {
            cmd.arg("-i").arg(audio);
        }
        cmd.args(self.opts.settings.output_args(cfg.audio.is_some()));
        cmd.arg(self.part_path());

        tracing::debug!(out = %self.opts.out_path.display(), "spawning ffmpeg (pipe)");
        let mut child = cmd.spawn().map_err(|e| {
            WheelError::encoding(format!(
                "failed to spawn {} (is it installed and on PATH?): {e}",
                self.opts.settings.ffmpeg_bin.display()
            ))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| WheelError::encoding("failed to open ffmpeg stdin"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| WheelError::encoding("failed to open ffmpeg stderr"))?;

        self.scratch = vec![0u8; cfg.frame_len()];
        self.child = Some(child);
        self.stdin = Some(stdin);
        self.stderr_drain = Some(spawn_stderr_drain(stderr));
        self.cfg = Some(cfg);
        self.last_idx = None;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> WheelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| WheelError::encoding("ffmpeg sink not started"))?;
        check_frame(cfg, self.last_idx, idx, frame)?;
        self.last_idx = Some(idx);

        if frame.premultiplied {
            flatten_premul_over_bg(&mut self.scratch, &frame.data, self.opts.settings.bg_rgba);
        } else {
            self.scratch = frame.to_opaque_rgba(self.opts.settings.bg_rgba);
        }

        let Some(stdin) = self.stdin.as_mut() else {
            return Err(WheelError::encoding("ffmpeg sink is already finalized"));
        };
        if let Err(e) = stdin.write_all(&self.scratch) {
            return Err(self.collect_write_failure(e));
        }
        Ok(())
    }

    fn end(&mut self, progress: EncodeProgress<'_>) -> WheelResult<()> {
        drop(self.stdin.take());
        let mut child = self
            .child
            .take()
            .ok_or_else(|| WheelError::encoding("ffmpeg sink not started"))?;

        let status = wait_with_cancel(&mut child, self.opts.cancel.as_ref());
        let stderr = join_stderr(self.stderr_drain.take());
        let part = self.part_path();
        let status = match status {
            Ok(s) => s,
            Err(e) => {
                remove_file_quiet(&part);
                return Err(e);
            }
        };
        if !status.success() {
            remove_file_quiet(&part);
            return Err(WheelError::encoding(format!(
                "ffmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        finalize_output(&part, &self.opts.out_path)?;
        self.cfg = None;
        progress(1.0);
        Ok(())
    }

    fn abort(&mut self) {
        drop(self.stdin.take());
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        let _ = join_stderr(self.stderr_drain.take());
        remove_file_quiet(&self.part_path());
        self.cfg = None;
    }
}

impl Drop for FfmpegSink {
    fn drop(&mut self) {
        if self.child.is_some() {
            self.abort();
        }
    }
}

/// `num/den` as accepted by `-framerate`.
pub(crate) fn fps_arg(fps: Fps) -> String {
    format!("{}/{}", fps.num, fps.den)
}

/// Sibling path `<out>.part` that `ffmpeg` writes before the final rename.
pub fn part_path(out: &Path) -> PathBuf {
    let mut s = out.as_os_str().to_os_string();
    s.push(".part");
    PathBuf::from(s)
}

/// Atomically publish a finished encode.
pub(crate) fn finalize_output(part: &Path, out: &Path) -> WheelResult<()> {
    use anyhow::Context as _;
    std::fs::rename(part, out)
        .with_context(|| format!("rename '{}' -> '{}'", part.display(), out.display()))?;
    Ok(())
}

pub(crate) fn remove_file_quiet(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => tracing::debug!(path = %path.display(), "removed partial output"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %path.display(), error = %e, "failed to remove file"),
    }
}

/// Drain stderr concurrently so `ffmpeg` never blocks on a full pipe.
pub(crate) fn spawn_stderr_drain(
    mut stderr: std::process::ChildStderr,
) -> std::thread::JoinHandle<String> {
    std::thread::spawn(move || {
        let mut out = String::new();
        match stderr.read_to_string(&mut out) {
            Ok(_) => out,
            Err(e) => format!("<failed to read ffmpeg stderr: {e}>"),
        }
    })
}

pub(crate) fn join_stderr(handle: Option<std::thread::JoinHandle<String>>) -> String {
    match handle {
        Some(h) => h
            .join()
            .unwrap_or_else(|_| "<ffmpeg stderr drain thread panicked>".to_string()),
        None => String::new(),
    }
}

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Wait for `child`, killing it if `cancel` fires first.
pub(crate) fn wait_with_cancel(
    child: &mut Child,
    cancel: Option<&CancellationToken>,
) -> WheelResult<ExitStatus> {
    loop {
        if let Some(status) = child
            .try_wait()
            .map_err(|e| WheelError::encoding(format!("failed to wait for ffmpeg: {e}")))?
        {
            return Ok(status);
        }
        if cancel.is_some_and(CancellationToken::is_cancelled) {
            let _ = child.kill();
            let _ = child.wait();
            tracing::info!("ffmpeg killed after cancellation");
            return Err(WheelError::Cancelled);
        }
        std::thread::sleep(POLL_INTERVAL);
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> WheelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg_bin -version` runs successfully.
pub fn is_ffmpeg_available(ffmpeg_bin: &Path) -> bool {
    Command::new(ffmpeg_bin)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    is_ffmpeg_available(Path::new("ffmpeg"))
}

#[cfg(test)]
#[path = "../../tests/unit/encode/ffmpeg.rs"]
mod tests;
