use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{WheelError, WheelResult};
use crate::foundation::math::flatten_premul_over_bg;

/// A rendered frame as RGBA8 pixels.
///
/// Frames coming out of [`crate::FrameRenderer`] are premultiplied and fully opaque.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        let px = self.data.get(i..i + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }

    /// Opaque straight-alpha RGBA8, flattening any transparency over `bg_rgba`.
    pub fn to_opaque_rgba(&self, bg_rgba: [u8; 4]) -> Vec<u8> {
        let mut out = vec![0u8; self.data.len()];
        if self.premultiplied {
            flatten_premul_over_bg(&mut out, &self.data, bg_rgba);
        } else {
            let mut premul = self.data.clone();
            crate::foundation::math::premultiply_rgba8_in_place(&mut premul);
            flatten_premul_over_bg(&mut out, &premul, bg_rgba);
        }
        out
    }

    /// Write the frame as an opaque PNG.
    pub fn write_png(&self, path: &Path, bg_rgba: [u8; 4]) -> WheelResult<()> {
        let img = image::RgbaImage::from_raw(self.width, self.height, self.to_opaque_rgba(bg_rgba))
            .ok_or_else(|| WheelError::render("frame buffer size does not match dimensions"))?;
        img.save_with_format(path, image::ImageFormat::Png)
            .with_context(|| format!("write png '{}'", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
