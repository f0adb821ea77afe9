use super::*;
use crate::encode::ffmpeg::is_ffmpeg_on_path;
use crate::foundation::core::Fps;

fn cfg() -> SinkConfig {
    SinkConfig {
        width: 16,
        height: 8,
        fps: Fps::new(25, 1).unwrap(),
        total_frames: 6,
        audio: None,
    }
}

fn frame(v: u8) -> FrameRGBA {
    FrameRGBA {
        width: 16,
        height: 8,
        data: [v, v, v, 255].repeat(16 * 8),
        premultiplied: true,
    }
}

fn opts(dir: &std::path::Path) -> SequenceSinkOpts {
    SequenceSinkOpts {
        scratch_dir: dir.join("scratch/session"),
        out_path: dir.join("output/wheel_session.mp4"),
        settings: EncodeSettings::default(),
        cancel: None,
    }
}

#[test]
fn frame_names_are_zero_padded() {
    assert_eq!(frame_file_name(0), "frame_000000.png");
    assert_eq!(frame_file_name(1234), "frame_001234.png");
}

#[test]
fn progress_state_parses_key_value_blocks() {
    let mut s = ProgressState::default();
    s.update("frame", "30");
    s.update("fps", "61.2");
    s.update("progress", "continue");
    assert_eq!(s.frame, 30);
    assert!(!s.complete);
    assert_eq!(s.fraction(120), 0.25);
    s.update("frame", "garbage");
    assert_eq!(s.frame, 30);
    s.update("progress", "end");
    assert_eq!(s.fraction(120), 1.0);
    assert_eq!(ProgressState::default().fraction(0), 0.0);
}

#[test]
fn frames_land_in_scratch_as_pngs() {
    let dir = tempfile::tempdir().unwrap();
    let o = opts(dir.path());
    let scratch = o.scratch_dir.clone();
    let mut sink = ImageSequenceSink::new(o);
    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(0), &frame(10)).unwrap();
    sink.push_frame(FrameIndex(1), &frame(20)).unwrap();
    assert_eq!(sink.frames_written(), 2);

    let png = image::open(scratch.join("frame_000001.png")).unwrap().to_rgba8();
    assert_eq!(png.dimensions(), (16, 8));
    assert_eq!(png.get_pixel(3, 3).0, [20, 20, 20, 255]);
}

#[test]
fn abort_removes_scratch_and_partial_output() {
    let dir = tempfile::tempdir().unwrap();
    let o = opts(dir.path());
    let scratch = o.scratch_dir.clone();
    let part = part_path(&o.out_path);
    let mut sink = ImageSequenceSink::new(o);
    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(0), &frame(0)).unwrap();
    std::fs::create_dir_all(part.parent().unwrap()).unwrap();
    std::fs::write(&part, b"partial").unwrap();
    sink.abort();
    assert!(!scratch.exists());
    assert!(!part.exists());
}

#[test]
fn dropping_an_unfinished_sink_cleans_scratch() {
    let dir = tempfile::tempdir().unwrap();
    let o = opts(dir.path());
    let scratch = o.scratch_dir.clone();
    {
        let mut sink = ImageSequenceSink::new(o);
        sink.begin(cfg()).unwrap();
        sink.push_frame(FrameIndex(0), &frame(0)).unwrap();
    }
    assert!(!scratch.exists());
}

#[test]
fn encoder_failure_surfaces_and_cleans_up() {
    let dir = tempfile::tempdir().unwrap();
    let mut o = opts(dir.path());
    o.settings.ffmpeg_bin = dir.path().join("missing-ffmpeg");
    let scratch = o.scratch_dir.clone();
    let out = o.out_path.clone();
    let mut sink = ImageSequenceSink::new(o);
    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(0), &frame(0)).unwrap();
    let err = sink.end(&mut |_| {}).unwrap_err();
    assert!(matches!(err, WheelError::Encoding(_)));
    assert!(!scratch.exists());
    assert!(!out.exists());
}

#[test]
fn end_without_frames_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = ImageSequenceSink::new(opts(dir.path()));
    sink.begin(cfg()).unwrap();
    assert!(sink.end(&mut |_| {}).is_err());
}

#[test]
fn encodes_mp4_with_progress_when_ffmpeg_available() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let o = opts(dir.path());
    let scratch = o.scratch_dir.clone();
    let out = o.out_path.clone();
    let mut sink = ImageSequenceSink::new(o);
    sink.begin(cfg()).unwrap();
    for i in 0..6u8 {
        sink.push_frame(FrameIndex(u64::from(i)), &frame(i * 40)).unwrap();
    }
    let mut seen = Vec::new();
    sink.end(&mut |p| seen.push(p)).unwrap();
    assert_eq!(seen.last().copied(), Some(1.0));
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert!(std::fs::metadata(&out).unwrap().len() > 0);
    assert!(!part_path(&out).exists());
    assert!(!scratch.exists());
}

#[test]
fn cancellation_before_encode_returns_cancelled() {
    if !is_ffmpeg_on_path() {
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let mut o = opts(dir.path());
    let token = CancellationToken::new();
    o.cancel = Some(token.clone());
    let out = o.out_path.clone();
    let mut sink = ImageSequenceSink::new(o);
    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(0), &frame(0)).unwrap();
    token.cancel();
    let err = sink.end(&mut |_| {}).unwrap_err();
    assert!(matches!(err, WheelError::Cancelled));
    assert!(!out.exists());
    assert!(!part_path(&out).exists());
}

#[cfg(unix)]
#[test]
fn encode_reports_progress_blocks_and_publishes_output() {
    use crate::test_common::{FFMPEG_OK, fake_ffmpeg};

    let dir = tempfile::tempdir().unwrap();
    let mut o = opts(dir.path());
    o.settings.ffmpeg_bin = fake_ffmpeg(dir.path(), FFMPEG_OK);
    let scratch = o.scratch_dir.clone();
    let out = o.out_path.clone();
    let mut sink = ImageSequenceSink::new(o);
    sink.begin(cfg()).unwrap();
    for i in 0..6u8 {
        sink.push_frame(FrameIndex(u64::from(i)), &frame(i * 40)).unwrap();
    }

    let mut seen = Vec::new();
    sink.end(&mut |p| seen.push(p)).unwrap();
    assert!(seen.contains(&0.5), "{seen:?}");
    assert_eq!(seen.last().copied(), Some(1.0));
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(std::fs::read(&out).unwrap(), b"fakemp4");
    assert!(!part_path(&out).exists());
    assert!(!scratch.exists());
}

#[cfg(unix)]
#[test]
fn encoder_diagnostics_are_carried_in_the_error() {
    use crate::test_common::{FFMPEG_FAIL, fake_ffmpeg};

    let dir = tempfile::tempdir().unwrap();
    let mut o = opts(dir.path());
    o.settings.ffmpeg_bin = fake_ffmpeg(dir.path(), FFMPEG_FAIL);
    let out = o.out_path.clone();
    let mut sink = ImageSequenceSink::new(o);
    sink.begin(cfg()).unwrap();
    sink.push_frame(FrameIndex(0), &frame(0)).unwrap();
    let err = sink.end(&mut |_| {}).unwrap_err();
    assert!(err.to_string().contains("bad pipe"), "{err}");
    assert!(!out.exists());
}
