use std::sync::Arc;

use kurbo::{Circle, CircleSegment, Shape};

use crate::assets::decode::PreparedImage;
use crate::foundation::core::{Point, Rgba8Premul};
use crate::foundation::error::{WheelError, WheelResult};
use crate::render::cpu::bezpath_to_cpu;

/// Segments on the built-in wheel.
pub const SEGMENTS: usize = 20;

const PALETTE: [Rgba8Premul; 7] = [
    Rgba8Premul::opaque_hex(0xff6b6b),
    Rgba8Premul::opaque_hex(0x4ecdc4),
    Rgba8Premul::opaque_hex(0x45b7d1),
    Rgba8Premul::opaque_hex(0x96ceb4),
    Rgba8Premul::opaque_hex(0xffeaa7),
    Rgba8Premul::opaque_hex(0xdda0dd),
    Rgba8Premul::opaque_hex(0x98d8c8),
];

const RIM: Rgba8Premul = Rgba8Premul::opaque_hex(0xffffff);
const HUB_RING: Rgba8Premul = Rgba8Premul::opaque_hex(0x333333);

const TOLERANCE: f64 = 0.1;

/// Draw the built-in wheel: coloured segments on a white rim with a hub.
///
/// Pixels outside the disc are fully transparent.
pub fn procedural_wheel(diameter: u32) -> WheelResult<PreparedImage> {
    let side: u16 = diameter
        .try_into()
        .map_err(|_| WheelError::render("wheel diameter exceeds u16"))?;
    if side < 2 {
        return Err(WheelError::render("wheel diameter must be >= 2"));
    }

    let d = f64::from(side);
    let c = Point::new(d / 2.0, d / 2.0);
    let r = d / 2.0 - 1.0;

    let mut ctx = vello_cpu::RenderContext::new(side, side);
    fill(&mut ctx, &Circle::new(c, r), RIM);

    let sweep = std::f64::consts::TAU / SEGMENTS as f64;
    // Leave a thin gap so the white rim shows through as separators.
    let gap = sweep * 0.04;
    for i in 0..SEGMENTS {
        // Segment 0 starts at 12 o'clock.
        let start = -std::f64::consts::FRAC_PI_2 + sweep * i as f64 + gap / 2.0;
        let seg = CircleSegment::new(c, r * 0.97, 0.0, start, sweep - gap);
        fill(&mut ctx, &seg, PALETTE[i % PALETTE.len()]);
    }

    fill(&mut ctx, &Circle::new(c, r * 0.09), HUB_RING);
    fill(&mut ctx, &Circle::new(c, r * 0.075), RIM);

    ctx.flush();
    let mut pixmap = vello_cpu::Pixmap::new(side, side);
    ctx.render_to_pixmap(&mut pixmap);

    Ok(PreparedImage {
        width: diameter,
        height: diameter,
        rgba8_premul: Arc::new(pixmap.data_as_u8_slice().to_vec()),
    })
}

fn fill(ctx: &mut vello_cpu::RenderContext, shape: &impl Shape, color: Rgba8Premul) {
    ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
        color.r, color.g, color.b, color.a,
    ));
    ctx.fill_path(&bezpath_to_cpu(&shape.to_path(TOLERANCE)));
}

#[cfg(test)]
#[path = "../../tests/unit/assets/procedural.rs"]
mod tests;
