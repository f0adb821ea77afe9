use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(25, 0).is_err());
    assert_eq!(Fps::new(25, 1).unwrap().as_f64(), 25.0);
}

#[test]
fn fps_millis_to_frames_rounds() {
    let fps = Fps::new(25, 1).unwrap();
    assert_eq!(fps.millis_to_frames_round(6000), 150);
    assert_eq!(fps.millis_to_frames_round(20), 1);
    assert_eq!(fps.millis_to_frames_round(0), 0);
    assert!((fps.frames_to_secs(400) - 16.0).abs() < 1e-9);
}

#[test]
fn canvas_validation_catches_bad_values() {
    assert!(Canvas { width: 0, height: 10 }.validate().is_err());
    assert!(Canvas { width: 11, height: 10 }.validate().is_err());
    assert!(Canvas { width: 70_000, height: 10 }.validate().is_err());
    assert!(Canvas { width: 1920, height: 1080 }.validate().is_ok());
}

#[test]
fn opaque_hex_splits_channels() {
    let c = Rgba8Premul::opaque_hex(0xee7204);
    assert_eq!(c.to_array(), [0xee, 0x72, 0x04, 255]);
    let half = Rgba8Premul::from_straight_rgba(255, 0, 0, 128);
    assert_eq!(half.to_array(), [128, 0, 0, 128]);
}
