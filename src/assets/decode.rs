use std::sync::Arc;

use anyhow::Context;

use crate::foundation::error::{WheelError, WheelResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Decoded raster, premultiplied RGBA8, shared between render workers.
#[derive(Clone, Debug)]
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Tightly packed premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Decode PNG/JPEG bytes.
pub fn decode_image(bytes: &[u8]) -> WheelResult<PreparedImage> {
    let dyn_img = image::load_from_memory(bytes).context("decode image from memory")?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Parse an SVG and rasterize it at its intrinsic size.
pub fn rasterize_svg(bytes: &[u8]) -> WheelResult<PreparedImage> {
    let opts = usvg::Options::default();
    let tree = usvg::Tree::from_data(bytes, &opts).context("parse svg tree")?;

    let size = tree.size();
    let width = to_px(size.width())?;
    let height = to_px(size.height())?;

    // Avoid pathological allocations from hostile width/height attributes.
    const MAX_DIM: u32 = 8192;
    if width > MAX_DIM || height > MAX_DIM {
        return Err(WheelError::render(format!(
            "svg raster size too large: {width}x{height} (max {MAX_DIM}x{MAX_DIM})"
        )));
    }

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| WheelError::render("failed to allocate svg pixmap"))?;
    let sx = (width as f32) / size.width();
    let sy = (height as f32) / size.height();
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );

    // tiny-skia pixmaps are already premultiplied RGBA8.
    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(pixmap.take()),
    })
}

fn to_px(v: f32) -> WheelResult<u32> {
    if !v.is_finite() || v <= 0.0 {
        return Err(WheelError::render("svg has invalid width/height"));
    }
    Ok((v.ceil() as u32).max(1))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
