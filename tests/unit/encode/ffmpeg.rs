use super::*;

fn cfg(audio: Option<PathBuf>) -> SinkConfig {
    SinkConfig {
        width: 16,
        height: 16,
        fps: Fps::new(25, 1).unwrap(),
        total_frames: 5,
        audio,
    }
}

fn solid(rgba: [u8; 4]) -> FrameRGBA {
    FrameRGBA {
        width: 16,
        height: 16,
        data: rgba.repeat(16 * 16),
        premultiplied: true,
    }
}

fn strings(args: Vec<OsString>) -> Vec<String> {
    args.into_iter()
        .map(|a| a.to_string_lossy().into_owned())
        .collect()
}

#[test]
fn output_args_without_audio() {
    let args = strings(EncodeSettings::default().output_args(false));
    assert_eq!(
        args,
        [
            "-c:v", "libx264", "-preset", "medium", "-crf", "23", "-pix_fmt", "yuv420p", "-an",
            "-movflags", "+faststart", "-f", "mp4"
        ]
    );
}

#[test]
fn output_args_with_audio_pad_and_shortest() {
    let settings = EncodeSettings {
        crf: 18,
        preset: "veryfast".to_string(),
        ..EncodeSettings::default()
    };
    let args = strings(settings.output_args(true));
    let joined = args.join(" ");
    assert!(joined.contains("-preset veryfast -crf 18"));
    assert!(joined.contains("-c:a aac -af apad -shortest"));
    assert!(!args.contains(&"-an".to_string()));
}

#[test]
fn part_path_appends_suffix() {
    assert_eq!(
        part_path(Path::new("/out/wheel_x.mp4")),
        PathBuf::from("/out/wheel_x.mp4.part")
    );
    assert_eq!(fps_arg(Fps::new(30000, 1001).unwrap()), "30000/1001");
}

#[test]
fn missing_binary_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let bogus = dir.path().join("no-such-ffmpeg");
    assert!(!is_ffmpeg_available(&bogus));

    let mut opts = FfmpegSinkOpts::new(dir.path().join("out.mp4"));
    opts.settings.ffmpeg_bin = bogus;
    let mut sink = FfmpegSink::new(opts);
    let err = sink.begin(cfg(None)).unwrap_err();
    assert!(matches!(err, WheelError::Encoding(_)));
}

#[test]
fn ensure_parent_dir_creates_nested_dirs() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("a/b/c.mp4");
    ensure_parent_dir(&out).unwrap();
    assert!(dir.path().join("a/b").is_dir());
    ensure_parent_dir(Path::new("relative.mp4")).unwrap();
}

#[cfg(unix)]
#[test]
fn wait_with_cancel_kills_child() {
    let mut child = Command::new("sleep").arg("30").spawn().unwrap();
    let token = CancellationToken::new();
    token.cancel();
    let err = wait_with_cancel(&mut child, Some(&token)).unwrap_err();
    assert!(matches!(err, WheelError::Cancelled));
}

#[cfg(unix)]
#[test]
fn wait_with_cancel_returns_exit_status() {
    let mut child = Command::new("true").spawn().unwrap();
    let status = wait_with_cancel(&mut child, Some(&CancellationToken::new())).unwrap();
    assert!(status.success());
}

#[test]
fn pipe_sink_writes_mp4_when_ffmpeg_available() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("pipe.mp4");
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&out));
    sink.begin(cfg(None)).unwrap();
    for i in 0..5u8 {
        sink.push_frame(FrameIndex(u64::from(i)), &solid([i * 40, 0, 0, 255]))
            .unwrap();
    }
    let mut last = 0.0;
    sink.end(&mut |p| last = p).unwrap();
    assert_eq!(last, 1.0);
    assert!(std::fs::metadata(&out).unwrap().len() > 0);
    assert!(!part_path(&out).exists());
}

#[test]
fn pipe_sink_abort_leaves_nothing_behind() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("aborted.mp4");
    let mut sink = FfmpegSink::new(FfmpegSinkOpts::new(&out));
    sink.begin(cfg(None)).unwrap();
    sink.push_frame(FrameIndex(0), &solid([0, 0, 0, 255])).unwrap();
    sink.abort();
    assert!(!out.exists());
    assert!(!part_path(&out).exists());
}

#[cfg(unix)]
#[test]
fn encoder_exit_mid_stream_reports_its_stderr() {
    use crate::test_common::{FFMPEG_FAIL, fake_ffmpeg};

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out.mp4");
    let mut opts = FfmpegSinkOpts::new(&out);
    opts.settings.ffmpeg_bin = fake_ffmpeg(dir.path(), FFMPEG_FAIL);
    let mut sink = FfmpegSink::new(opts);

    // Frames larger than a pipe buffer, so a write blocks until the encoder exits.
    let (w, h) = (256, 128);
    sink.begin(SinkConfig {
        width: w,
        height: h,
        fps: Fps::new(25, 1).unwrap(),
        total_frames: 50,
        audio: None,
    })
    .unwrap();
    let frame = FrameRGBA {
        width: w,
        height: h,
        data: [0, 0, 0, 255].repeat((w * h) as usize),
        premultiplied: true,
    };

    let mut failure = None;
    for i in 0..50 {
        if let Err(e) = sink.push_frame(FrameIndex(i), &frame) {
            failure = Some(e);
            break;
        }
    }
    let err = match failure {
        Some(e) => e,
        None => sink.end(&mut |_| {}).unwrap_err(),
    };
    let msg = err.to_string();
    assert!(matches!(err, WheelError::Encoding(_)));
    assert!(msg.contains("bad pipe"), "{msg}");
    assert!(!out.exists());
    assert!(!part_path(&out).exists());
}

#[cfg(unix)]
#[test]
fn pipe_sink_publishes_encoder_output() {
    use crate::test_common::{FFMPEG_OK, fake_ffmpeg};

    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("pipe.mp4");
    let mut opts = FfmpegSinkOpts::new(&out);
    opts.settings.ffmpeg_bin = fake_ffmpeg(dir.path(), FFMPEG_OK);
    let mut sink = FfmpegSink::new(opts);
    sink.begin(cfg(None)).unwrap();
    for i in 0..5u8 {
        sink.push_frame(FrameIndex(u64::from(i)), &solid([i * 40, 0, 0, 255]))
            .unwrap();
    }
    let mut last = 0.0;
    sink.end(&mut |p| last = p).unwrap();
    assert_eq!(last, 1.0);
    assert_eq!(std::fs::read(&out).unwrap(), b"fakemp4");
    assert!(!part_path(&out).exists());
}
