//! A CPU software 3D rasterizer.
//!
//! This crate renders indexed triangle meshes into an RGBA8 framebuffer
//! entirely on the CPU: vertices are transformed by a caller-supplied
//! model-view-projection matrix, clipped against the near plane, projected,
//! and filled scanline by scanline with perspective-correct texture mapping
//! and a depth buffer. Presentation, asset loading, and scene management
//! are left to the caller; the finished frame is read back as raw bytes.
//!
//! # Quick Start
//!
//! ```ignore
//! use rastr::prelude::*;
//!
//! let mut renderer = Renderer::new(320, 240);
//! let texture = Texture::from_file("checker.png")?;
//! let mvp = Mat4::perspective(1.0, 320.0 / 240.0, 0.1, 100.0);
//!
//! renderer.clear_buffers();
//! renderer.set_matrices(mvp, Vec3::ZERO);
//! for [a, b, c] in mesh_triangles {
//!     renderer.draw_triangle_3d(&a, &b, &c, &texture)?;
//! }
//! present(renderer.framebuffer().as_bytes());
//! ```

pub mod colors;
pub mod light;
pub mod math;
pub mod render;
pub mod texture;

// Re-export the types most callers touch directly.
pub use colors::Color;
pub use render::{Fog, FrameBuffer, FrameStats, RenderError, Renderer, ScreenVertex, Vertex};
pub use texture::{Texture, TextureError};

/// Prelude module for convenient imports.
///
/// # Example
/// ```ignore
/// use rastr::prelude::*;
/// ```
pub mod prelude {
    pub use crate::colors::Color;
    pub use crate::light::DirectionalLight;
    pub use crate::math::mat4::Mat4;
    pub use crate::math::vec2::Vec2;
    pub use crate::math::vec3::Vec3;
    pub use crate::math::vec4::Vec4;
    pub use crate::render::{
        FrameBuffer, FrameStats, RenderError, Renderer, ScreenVertex, Vertex,
    };
    pub use crate::texture::{Texture, TextureError};
}
