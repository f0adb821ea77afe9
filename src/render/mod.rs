//! Frame rasterization on the CPU via `vello_cpu`.

/// `vello_cpu` frame renderer and kurbo/pixmap conversions.
pub mod cpu;
/// Rendered frame buffer.
pub mod frame;
