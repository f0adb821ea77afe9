use super::*;

fn frame(data: Vec<u8>, premultiplied: bool) -> FrameRGBA {
    FrameRGBA {
        width: 2,
        height: 1,
        data,
        premultiplied,
    }
}

#[test]
fn pixel_lookup_is_bounds_checked() {
    let f = frame(vec![1, 2, 3, 4, 5, 6, 7, 8], true);
    assert_eq!(f.pixel(1, 0), Some([5, 6, 7, 8]));
    assert_eq!(f.pixel(2, 0), None);
    assert_eq!(f.pixel(0, 1), None);
}

#[test]
fn flattens_transparency_over_background() {
    let f = frame(vec![0, 0, 0, 0, 10, 20, 30, 255], true);
    let out = f.to_opaque_rgba([100, 100, 100, 255]);
    assert_eq!(out, vec![100, 100, 100, 255, 10, 20, 30, 255]);
}

#[test]
fn straight_alpha_is_premultiplied_first() {
    let f = frame(vec![255, 0, 0, 0, 255, 0, 0, 255], false);
    let out = f.to_opaque_rgba([0, 0, 255, 255]);
    assert_eq!(out, vec![0, 0, 255, 255, 255, 0, 0, 255]);
}

#[test]
fn png_round_trips_through_image_crate() {
    let dir = tempfile::tempdir().unwrap();
    let p = dir.path().join("f.png");
    let f = frame(vec![1, 2, 3, 255, 4, 5, 6, 255], true);
    f.write_png(&p, [0, 0, 0, 255]).unwrap();
    let back = image::open(&p).unwrap().to_rgba8();
    assert_eq!(back.dimensions(), (2, 1));
    assert_eq!(back.into_raw(), f.data);
}

#[test]
fn png_rejects_mismatched_buffer() {
    let dir = tempfile::tempdir().unwrap();
    let f = frame(vec![0; 4], true);
    assert!(f.write_png(&dir.path().join("bad.png"), [0, 0, 0, 255]).is_err());
}
