use super::*;

#[test]
fn premultiply_zero_alpha_clears_rgb() {
    let mut px = vec![200u8, 100, 50, 0, 255, 0, 0, 128];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(px, vec![0, 0, 0, 0, 128, 0, 0, 128]);
}

#[test]
fn flatten_premul_alpha_0_returns_bg() {
    let src = vec![0u8, 0, 0, 0];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg(&mut dst, &src, [10, 20, 30, 255]);
    assert_eq!(dst, vec![10, 20, 30, 255]);
}

#[test]
fn flatten_premul_alpha_255_is_identity() {
    let src = vec![1u8, 2, 3, 255];
    let mut dst = vec![0u8; 4];
    flatten_premul_over_bg(&mut dst, &src, [10, 20, 30, 255]);
    assert_eq!(dst, src);
}

#[test]
fn wrap_degrees_stays_in_range() {
    assert_eq!(wrap_degrees(360.0), 0.0);
    assert_eq!(wrap_degrees(0.0), 0.0);
    assert!((wrap_degrees(-90.0) - 270.0).abs() < 1e-12);
    assert!((wrap_degrees(725.0) - 5.0).abs() < 1e-12);
    assert!(wrap_degrees(-1e-18) < 360.0);
}
