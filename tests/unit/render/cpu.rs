use super::*;
use crate::foundation::core::FrameIndex;

const CANVAS: Canvas = Canvas {
    width: 320,
    height: 180,
};

fn renderer() -> FrameRenderer {
    let assets = RenderAssets::builtin(CANVAS).unwrap();
    FrameRenderer::new(CANVAS, &assets, OverlayText::default()).unwrap()
}

fn params(rotation: f64, show_overlay: bool, scale: f64) -> RenderParameters {
    RenderParameters {
        frame: FrameIndex(0),
        rotation_degrees: rotation,
        show_overlay,
        overlay_scale: scale,
    }
}

fn badge_center(r: &FrameRenderer) -> (u32, u32) {
    let c = r.canvas().center();
    let y = c.y + BADGE_OFFSET_Y_1080 * f64::from(CANVAS.height) / 1080.0;
    (c.x as u32, y as u32)
}

#[test]
fn output_is_opaque_premultiplied_and_sized() {
    let f = renderer().render(&params(0.0, false, 0.0)).unwrap();
    assert_eq!((f.width, f.height), (320, 180));
    assert_eq!(f.data.len(), CANVAS.rgba_len());
    assert!(f.premultiplied);
    assert!(f.data.chunks_exact(4).all(|px| px[3] == 255));
}

#[test]
fn corners_show_fallback_background() {
    let f = renderer().render(&params(0.0, false, 0.0)).unwrap();
    let bg = FALLBACK_BACKGROUND.to_array();
    assert_eq!(f.pixel(0, 0), Some(bg));
    assert_eq!(f.pixel(319, 179), Some(bg));
}

#[test]
fn rendering_is_idempotent() {
    let r = renderer();
    let p = params(1234.5, true, 0.8);
    let a = r.render(&p).unwrap();
    let b = r.render(&p).unwrap();
    assert_eq!(a, b);

    let mut ctx = r.new_context();
    let c = r.render_with(&mut ctx, &p).unwrap();
    let d = r.render_with(&mut ctx, &p).unwrap();
    assert_eq!(a, c);
    assert_eq!(c, d);
}

#[test]
fn rotation_changes_the_wheel() {
    let r = renderer();
    let a = r.render(&params(0.0, false, 0.0)).unwrap();
    let b = r.render(&params(9.0, false, 0.0)).unwrap();
    assert_ne!(a, b);
}

#[test]
fn overlay_draws_orange_badge() {
    let r = renderer();
    let (x, y) = badge_center(&r);
    let shown = r.render(&params(0.0, true, 1.0)).unwrap();
    assert_eq!(shown.pixel(x, y), Some(BADGE_ORANGE.to_array()));

    let hidden = r.render(&params(0.0, false, 1.0)).unwrap();
    assert_ne!(hidden.pixel(x, y), Some(BADGE_ORANGE.to_array()));
}

#[test]
fn zero_scale_overlay_draws_nothing() {
    let r = renderer();
    let a = r.render(&params(42.0, true, 0.0)).unwrap();
    let b = r.render(&params(42.0, false, 0.0)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn mismatched_context_is_rejected() {
    let r = renderer();
    let mut ctx = vello_cpu::RenderContext::new(16, 16);
    assert!(r.render_with(&mut ctx, &params(0.0, false, 0.0)).is_err());
}

#[test]
fn non_finite_parameters_are_rejected() {
    let r = renderer();
    assert!(r.render(&params(f64::NAN, false, 0.0)).is_err());
    assert!(r.render(&params(0.0, true, f64::INFINITY)).is_err());
}

#[test]
fn background_image_is_stretched_to_frame() {
    let mut assets = RenderAssets::builtin(CANVAS).unwrap();
    assets.background = Some(PreparedImage {
        width: 2,
        height: 2,
        rgba8_premul: std::sync::Arc::new([10u8, 200, 30, 255].repeat(4)),
    });
    let r = FrameRenderer::new(CANVAS, &assets, OverlayText::default()).unwrap();
    let f = r.render(&params(0.0, false, 0.0)).unwrap();
    assert_eq!(f.pixel(0, 0), Some([10, 200, 30, 255]));
    assert_eq!(f.pixel(319, 0), Some([10, 200, 30, 255]));
}

#[test]
fn pixmap_conversion_checks_lengths() {
    assert!(pixmap_from_premul_bytes(&[0; 8], 2, 1).is_ok());
    assert!(pixmap_from_premul_bytes(&[0; 7], 2, 1).is_err());
    assert!(pixmap_from_premul_bytes(&[], 0, 0).is_err());
}

#[test]
fn wheel_sits_above_the_frame_centre() {
    let mut assets = RenderAssets::builtin(CANVAS).unwrap();
    assets.wheel = PreparedImage {
        width: 2,
        height: 2,
        rgba8_premul: std::sync::Arc::new([0u8, 180, 0, 255].repeat(4)),
    };
    assets.wheel_is_procedural = false;
    let r = FrameRenderer::new(CANVAS, &assets, OverlayText::default()).unwrap();
    let f = r.render(&params(0.0, false, 0.0)).unwrap();

    // Diameter 133 px, pivot at y = 90 - 50/6.
    let (x, d) = (160, f64::from(wheel_diameter_px(CANVAS)));
    let cy = 90.0 + WHEEL_OFFSET_Y_1080 / 6.0;
    let top = (cy - d / 2.0).ceil() as u32 + 1;
    let bottom = (cy + d / 2.0).ceil() as u32 + 2;
    assert_eq!(f.pixel(x, top), Some([0, 180, 0, 255]));
    assert_eq!(f.pixel(x, bottom), Some(FALLBACK_BACKGROUND.to_array()));
    assert!(f64::from(bottom) < 90.0 + d / 2.0 - 2.0);
}
