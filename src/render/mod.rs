//! The rendering pipeline: buffers, geometry stage, rasterizer, renderer.

pub mod framebuffer;
pub mod geometry;
pub mod renderer;
pub mod scanline;
pub mod stats;

pub use framebuffer::FrameBuffer;
pub use geometry::{ScreenVertex, Vertex, NEAR_PLANE};
pub use renderer::{Fog, RenderError, Renderer};
pub use stats::FrameStats;
