use super::*;
use crate::encode::sink::{EncodeProgress, InMemorySink};

fn settings(total: u64, spin: u64) -> VideoSettings {
    VideoSettings {
        canvas: Canvas {
            width: 96,
            height: 54,
        },
        fps: Fps::new(25, 1).unwrap(),
        timing: SpinTiming {
            total_frames: total,
            spin_frames: spin,
            reveal_frames: None,
        },
        render_chunk: 4,
        audio: None,
    }
}

fn job(position: u32) -> Job {
    Job {
        entry: Entry {
            position,
            artist: "A".to_string(),
            title: "T".to_string(),
        },
        speed: SpeedLevel::default(),
        spin_duration_ms: None,
    }
}

fn assets(s: &VideoSettings) -> RenderAssets {
    RenderAssets::builtin(s.canvas).unwrap()
}

#[test]
fn pushes_every_frame_in_order_with_monotone_progress() {
    let s = settings(10, 6);
    let mut sink = InMemorySink::new();
    let mut seen = Vec::new();
    let out = generate(
        &s,
        &assets(&s),
        &job(7),
        &mut sink,
        &CancellationToken::new(),
        &mut |p| seen.push(p),
    )
    .unwrap();

    assert_eq!(out.frames, 10);
    assert_eq!(out.entry, job(7).entry);
    let idx: Vec<u64> = sink.frames().iter().map(|(i, _)| i.0).collect();
    assert_eq!(idx, (0..10).collect::<Vec<_>>());
    assert!(sink.is_ended());

    assert_eq!(seen.first().map(|p| p.progress), Some(0));
    assert_eq!(seen.last(), Some(&Progress::done()));
    assert!(seen.windows(2).all(|w| w[0].progress <= w[1].progress));
    assert!(seen.iter().any(|p| p.stage == Stage::Encoding));
}

#[test]
fn pushed_frames_match_single_frame_rendering() {
    let s = settings(6, 3);
    let a = assets(&s);
    let mut sink = InMemorySink::new();
    generate(&s, &a, &job(500), &mut sink, &CancellationToken::new(), &mut |_| {}).unwrap();
    for (idx, frame) in sink.frames() {
        let single = render_frame(&s, &a, &job(500), *idx).unwrap();
        assert_eq!(&single, frame, "frame {} differs", idx.0);
    }
}

#[test]
fn final_rotation_targets_the_winning_slot() {
    let s = settings(4, 2);
    let mut sink = InMemorySink::new();
    let cancel = CancellationToken::new();
    let out = generate(&s, &assets(&s), &job(250), &mut sink, &cancel, &mut |_| {}).unwrap();
    assert!((out.final_rotation.rem_euclid(360.0) - 90.0).abs() < 1e-9);
}

#[test]
fn cancelled_token_aborts_the_sink() {
    let s = settings(10, 5);
    let token = CancellationToken::new();
    token.cancel();
    let mut sink = InMemorySink::new();
    let err = generate(&s, &assets(&s), &job(1), &mut sink, &token, &mut |_| {}).unwrap_err();
    assert!(matches!(err, WheelError::Cancelled));
    assert!(sink.is_aborted());
    assert!(!sink.is_ended());
}

#[test]
fn spin_duration_retimes_the_spin_phase() {
    let s = settings(100, 50);
    let mut j = job(1);
    j.spin_duration_ms = Some(1000);
    let schedule = s.schedule(&j).unwrap();
    assert_eq!(schedule.timing().spin_frames, 25);
    assert_eq!(schedule.len(), 100);
}

struct FailingSink {
    fail_at: u64,
    aborted: bool,
}

impl FrameSink for FailingSink {
    fn begin(&mut self, _cfg: SinkConfig) -> WheelResult<()> {
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, _frame: &FrameRGBA) -> WheelResult<()> {
        if idx.0 == self.fail_at {
            return Err(WheelError::encoding("disk full"));
        }
        Ok(())
    }

    fn end(&mut self, _progress: EncodeProgress<'_>) -> WheelResult<()> {
        Ok(())
    }

    fn abort(&mut self) {
        self.aborted = true;
    }
}

#[test]
fn sink_failure_aborts_and_propagates() {
    let s = settings(10, 5);
    let mut sink = FailingSink {
        fail_at: 5,
        aborted: false,
    };
    let err = generate(&s, &assets(&s), &job(1), &mut sink, &CancellationToken::new(), &mut |_| {})
        .unwrap_err();
    assert!(matches!(err, WheelError::Encoding(_)));
    assert!(sink.aborted);
}

#[test]
fn make_sink_builds_both_modes() {
    let dir = tempfile::tempdir().unwrap();
    let token = CancellationToken::new();
    for mode in [EncoderMode::Sequence, EncoderMode::Pipe] {
        let mut sink = make_sink(
            mode,
            &EncodeSettings::default(),
            &dir.path().join("scratch"),
            &dir.path().join("out.mp4"),
            &token,
        );
        sink.abort();
    }
}
