use std::sync::Arc;

use crate::animation::spin::RenderParameters;
use crate::assets::text::{OverlayText, ShapedText};
use crate::assets::{PreparedImage, RenderAssets, wheel_diameter_px};
use crate::foundation::core::{Affine, BezPath, Canvas, Point, Rect, Rgba8Premul, Vec2};
use crate::foundation::error::{WheelError, WheelResult};
use crate::render::frame::FrameRGBA;

/// Solid background used when no background image is configured.
pub const FALLBACK_BACKGROUND: Rgba8Premul = Rgba8Premul::opaque_hex(0x1a1a2e);
/// Winner badge fill.
pub const BADGE_ORANGE: Rgba8Premul = Rgba8Premul::opaque_hex(0xee7204);
const WHITE: Rgba8Premul = Rgba8Premul::opaque_hex(0xffffff);
const POINTER_RED: Rgba8Premul = Rgba8Premul::opaque_hex(0xff4757);

// Layout constants, in pixels at a 1080-pixel-high frame.
const BADGE_SIDE_1080: f64 = 300.0;
const BADGE_BORDER_1080: f64 = 5.0;
const BADGE_OFFSET_Y_1080: f64 = -200.0;
const WHEEL_OFFSET_Y_1080: f64 = -50.0;
const CAPTION_GAP_1080: f64 = 24.0;

#[derive(Clone)]
struct ImagePaint {
    paint: vello_cpu::Image,
    w: u32,
    h: u32,
}

impl ImagePaint {
    fn from_prepared(img: &PreparedImage) -> WheelResult<Self> {
        let pixmap = pixmap_from_premul_bytes(&img.rgba8_premul, img.width, img.height)?;
        Ok(Self {
            paint: vello_cpu::Image {
                image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
                sampler: vello_cpu::peniko::ImageSampler::default(),
            },
            w: img.width,
            h: img.height,
        })
    }
}

/// Rasterizes wheel frames for one session.
///
/// Rendering is a pure function of [`RenderParameters`]: the renderer holds only immutable
/// paints and shaped text, so it is shared by reference across rayon workers.
pub struct FrameRenderer {
    canvas: Canvas,
    background: Option<ImagePaint>,
    wheel: ImagePaint,
    wheel_diameter: f64,
    draw_pointer: bool,
    overlay: OverlayText,
}

impl FrameRenderer {
    /// Prepare paints for `assets` on `canvas`.
    pub fn new(canvas: Canvas, assets: &RenderAssets, overlay: OverlayText) -> WheelResult<Self> {
        canvas.validate()?;
        let background = assets
            .background
            .as_ref()
            .map(ImagePaint::from_prepared)
            .transpose()?;
        Ok(Self {
            canvas,
            background,
            wheel: ImagePaint::from_prepared(&assets.wheel)?,
            wheel_diameter: f64::from(wheel_diameter_px(canvas)),
            draw_pointer: assets.wheel_is_procedural,
            overlay,
        })
    }

    /// Output dimensions.
    pub fn canvas(&self) -> Canvas {
        self.canvas
    }

    /// A render context sized for this renderer; reuse it across frames on one thread.
    pub fn new_context(&self) -> vello_cpu::RenderContext {
        // `Canvas::validate` guarantees both dimensions fit in u16.
        vello_cpu::RenderContext::new(self.canvas.width as u16, self.canvas.height as u16)
    }

    /// Render one frame with a fresh context.
    pub fn render(&self, params: &RenderParameters) -> WheelResult<FrameRGBA> {
        let mut ctx = self.new_context();
        self.render_with(&mut ctx, params)
    }

    /// Render one frame, reusing `ctx`.
    pub fn render_with(
        &self,
        ctx: &mut vello_cpu::RenderContext,
        params: &RenderParameters,
    ) -> WheelResult<FrameRGBA> {
        let (w, h) = (self.canvas.width, self.canvas.height);
        if u32::from(ctx.width()) != w || u32::from(ctx.height()) != h {
            return Err(WheelError::render("render context size does not match canvas"));
        }
        if !params.rotation_degrees.is_finite() || !params.overlay_scale.is_finite() {
            return Err(WheelError::render("render parameters must be finite"));
        }
        ctx.reset();

        self.draw_background(ctx);
        self.draw_wheel(ctx, params.rotation_degrees);
        if self.draw_pointer {
            self.draw_pointer(ctx);
        }
        if params.show_overlay && params.overlay_scale > 0.0 {
            self.draw_overlay(ctx, params.overlay_scale);
        }

        ctx.flush();
        let mut pixmap = vello_cpu::Pixmap::new(w as u16, h as u16);
        ctx.render_to_pixmap(&mut pixmap);
        Ok(FrameRGBA {
            width: w,
            height: h,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }

    fn unit(&self) -> f64 {
        f64::from(self.canvas.height) / 1080.0
    }

    /// Wheel pivot: the canvas centre, raised slightly.
    fn wheel_center(&self) -> Point {
        let c = self.canvas.center();
        Point::new(c.x, c.y + WHEEL_OFFSET_Y_1080 * self.unit())
    }

    fn draw_background(&self, ctx: &mut vello_cpu::RenderContext) {
        let (w, h) = (f64::from(self.canvas.width), f64::from(self.canvas.height));
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        set_color(ctx, FALLBACK_BACKGROUND);
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, w, h));

        if let Some(bg) = &self.background {
            let tr = Affine::scale_non_uniform(w / f64::from(bg.w), h / f64::from(bg.h));
            draw_image(ctx, bg, tr);
        }
    }

    fn draw_wheel(&self, ctx: &mut vello_cpu::RenderContext, rotation_degrees: f64) {
        let c = self.wheel_center();
        let (ww, wh) = (f64::from(self.wheel.w), f64::from(self.wheel.h));
        let d = self.wheel_diameter;
        // Positive angles turn clockwise in y-down screen space.
        let tr = Affine::translate(c.to_vec2())
            * Affine::rotate(rotation_degrees.to_radians())
            * Affine::scale_non_uniform(d / ww, d / wh)
            * Affine::translate(Vec2::new(-ww / 2.0, -wh / 2.0));
        draw_image(ctx, &self.wheel, tr);
    }

    fn draw_pointer(&self, ctx: &mut vello_cpu::RenderContext) {
        let c = self.wheel_center();
        let d = self.wheel_diameter;
        let top = c.y - d / 2.0;
        let half = d * 0.04;

        let triangle = |grow: f64| {
            let mut p = BezPath::new();
            p.move_to((c.x, top + d * 0.07 + grow));
            p.line_to((c.x - half - grow, top - d * 0.03 - grow));
            p.line_to((c.x + half + grow, top - d * 0.03 - grow));
            p.close_path();
            p
        };

        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        set_color(ctx, WHITE);
        ctx.fill_path(&bezpath_to_cpu(&triangle(2.0 * self.unit())));
        set_color(ctx, POINTER_RED);
        ctx.fill_path(&bezpath_to_cpu(&triangle(0.0)));
    }

    fn draw_overlay(&self, ctx: &mut vello_cpu::RenderContext, scale: f64) {
        let u = self.unit();
        let c = self.canvas.center();
        let cx = c.x;
        let cy = c.y + BADGE_OFFSET_Y_1080 * u;
        let side = BADGE_SIDE_1080 * u * scale;
        let border = BADGE_BORDER_1080 * u * scale;

        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        set_color(ctx, WHITE);
        ctx.fill_rect(&rect_to_cpu(centered_square(cx, cy, side + border)));
        set_color(ctx, BADGE_ORANGE);
        ctx.fill_rect(&rect_to_cpu(centered_square(cx, cy, side - border)));

        if let Some(number) = &self.overlay.number {
            draw_text_centered(ctx, number, cx, cy, scale);
        }

        if let Some(caption) = &self.overlay.caption {
            let max_w = f64::from(self.canvas.width) * 0.9;
            let natural_w = f64::from(caption.width) * scale;
            let fit = if natural_w > max_w {
                scale * max_w / natural_w
            } else {
                scale
            };
            let top = cy + side / 2.0 + border + CAPTION_GAP_1080 * u * scale;
            let caption_cy = top + f64::from(caption.height) * fit / 2.0;
            draw_text_centered(ctx, caption, cx, caption_cy, fit);
        }
    }
}

fn centered_square(cx: f64, cy: f64, side: f64) -> Rect {
    let half = side.max(0.0) / 2.0;
    Rect::new(cx - half, cy - half, cx + half, cy + half)
}

fn draw_text_centered(
    ctx: &mut vello_cpu::RenderContext,
    text: &ShapedText,
    cx: f64,
    cy: f64,
    scale: f64,
) {
    let tr = Affine::translate(Vec2::new(cx, cy))
        * Affine::scale(scale)
        * Affine::translate(Vec2::new(
            -f64::from(text.width) / 2.0,
            -f64::from(text.height) / 2.0,
        ));
    ctx.set_transform(affine_to_cpu(tr));
    for run in &text.runs {
        let [r, g, b, a] = run.color;
        ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(r, g, b, a));
        ctx.glyph_run(&text.font)
            .font_size(run.font_size)
            .fill_glyphs(run.glyphs.iter().cloned());
    }
}

fn draw_image(ctx: &mut vello_cpu::RenderContext, img: &ImagePaint, tr: Affine) {
    ctx.set_transform(affine_to_cpu(tr));
    ctx.set_paint(img.paint.clone());
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
        0.0,
        0.0,
        f64::from(img.w),
        f64::from(img.h),
    ));
}

fn set_color(ctx: &mut vello_cpu::RenderContext, c: Rgba8Premul) {
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a));
}

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

pub(crate) fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let pt = |p: kurbo::Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(pt(p)),
            PathEl::LineTo(p) => out.line_to(pt(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(pt(p1), pt(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(pt(p1), pt(p2), pt(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

pub(crate) fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> WheelResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| WheelError::render("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| WheelError::render("pixmap height exceeds u16"))?;
    if w == 0 || h == 0 {
        return Err(WheelError::render("pixmap must be non-empty"));
    }
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(WheelError::render("pixmap byte len mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| {
            vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]])
        })
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
