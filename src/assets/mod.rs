//! Render assets: background and wheel images, the overlay font, and shaped overlay text.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::foundation::core::Canvas;
use crate::foundation::error::WheelResult;

/// Image/SVG decoding into premultiplied RGBA8.
pub mod decode;
/// Overlay font discovery.
pub mod font;
/// Built-in wheel artwork used when no wheel image is configured.
pub mod procedural;
/// Text shaping into drawable glyph runs.
pub mod text;

pub use decode::PreparedImage;

/// Where to look for the optional asset files.
#[derive(Clone, Debug, Default)]
pub struct AssetPaths {
    /// Background image (PNG/JPEG/SVG).
    pub background: Option<PathBuf>,
    /// Wheel image (PNG/JPEG/SVG); transparent outside the disc.
    pub wheel: Option<PathBuf>,
    /// TrueType/OpenType font for overlay text.
    pub font: Option<PathBuf>,
}

/// Decoded, shareable assets for one process.
#[derive(Clone, Debug)]
pub struct RenderAssets {
    /// Background; `None` renders the solid fallback color.
    pub background: Option<PreparedImage>,
    /// Wheel artwork.
    pub wheel: PreparedImage,
    /// `true` when `wheel` is the built-in artwork, which is drawn with a pointer.
    pub wheel_is_procedural: bool,
    /// Raw overlay font bytes.
    pub font: Option<Arc<Vec<u8>>>,
}

impl RenderAssets {
    /// Built-in assets only: solid background, procedural wheel, no font.
    pub fn builtin(canvas: Canvas) -> WheelResult<Self> {
        Ok(Self {
            background: None,
            wheel: procedural::procedural_wheel(wheel_diameter_px(canvas))?,
            wheel_is_procedural: true,
            font: None,
        })
    }

    /// Load configured assets, falling back to built-ins for anything missing or unreadable.
    pub fn load(paths: &AssetPaths, canvas: Canvas) -> WheelResult<Self> {
        let background = paths
            .background
            .as_deref()
            .and_then(|p| load_image_logged(p, "background"));

        let (wheel, wheel_is_procedural) =
            match paths.wheel.as_deref().and_then(|p| load_image_logged(p, "wheel")) {
                Some(img) => (img, false),
                None => (procedural::procedural_wheel(wheel_diameter_px(canvas))?, true),
            };

        let font = match font::resolve_font_path(paths.font.as_deref()) {
            Some(p) => match std::fs::read(&p) {
                Ok(bytes) => {
                    tracing::info!(path = %p.display(), "overlay font loaded");
                    Some(Arc::new(bytes))
                }
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "overlay font unreadable");
                    None
                }
            },
            None => None,
        };
        if font.is_none() {
            tracing::warn!("no overlay font available; badge text will not be drawn");
        }

        Ok(Self {
            background,
            wheel,
            wheel_is_procedural,
            font,
        })
    }
}

/// Wheel diameter in pixels for a canvas (800 px at 1080p).
pub fn wheel_diameter_px(canvas: Canvas) -> u32 {
    ((f64::from(canvas.height) * 800.0 / 1080.0).round() as u32).max(2)
}

/// Read and decode an image or SVG file.
pub fn load_image(path: &Path) -> WheelResult<PreparedImage> {
    let bytes = std::fs::read(path).with_context(|| format!("read image '{}'", path.display()))?;
    let is_svg = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"));
    if is_svg {
        decode::rasterize_svg(&bytes)
    } else {
        decode::decode_image(&bytes)
    }
}

fn load_image_logged(path: &Path, what: &str) -> Option<PreparedImage> {
    match load_image(path) {
        Ok(img) => {
            tracing::info!(
                asset = what,
                path = %path.display(),
                width = img.width,
                height = img.height,
                "image loaded"
            );
            Some(img)
        }
        Err(e) => {
            tracing::warn!(
                asset = what,
                path = %path.display(),
                error = %e,
                "image unavailable, using built-in"
            );
            None
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/mod.rs"]
mod tests;
