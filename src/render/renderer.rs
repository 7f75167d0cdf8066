//! The renderer: owns the pixel and depth buffers, the current transform,
//! fog and lighting configuration, and per-frame statistics.
//!
//! One `Renderer` is created per output resolution and reused across
//! frames. A frame is: `clear_buffers`, then per mesh `set_matrices`
//! followed by `draw_triangle_3d` for each triangle, then read the result
//! back with [`Renderer::framebuffer`]. Everything runs synchronously on
//! the caller's thread.

use log::debug;
use thiserror::Error;

use crate::colors::Color;
use crate::math::mat4::Mat4;
use crate::math::vec3::Vec3;
use crate::math::vec4::Vec4;
use crate::render::framebuffer::FrameBuffer;
use crate::render::geometry::{self, ClipVertex, NearClip, ScreenVertex, Vertex};
use crate::render::scanline;
use crate::render::stats::FrameStats;
use crate::texture::Texture;

/// Caller mistakes surfaced by the draw entry points.
///
/// Geometric degeneracies (zero area, back-facing, behind the camera) are
/// not errors; they are counted in [`FrameStats`] and skipped.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RenderError {
    #[error("draw call issued before set_matrices")]
    MissingMatrices,
    #[error("texture has zero width or height")]
    NoTexture,
}

/// Depth fog configuration.
///
/// When enabled, pixels are blended toward `color` by how far their
/// view-space depth sits between `near` and `far`.
#[derive(Debug, Clone, Copy)]
pub struct Fog {
    pub enabled: bool,
    pub near: f32,
    pub far: f32,
    pub color: Color,
}

impl Default for Fog {
    fn default() -> Self {
        Self {
            enabled: false,
            near: 1.0,
            far: 100.0,
            color: Color::BLACK,
        }
    }
}

impl Fog {
    /// Blend a shaded pixel toward the fog color by linear view depth.
    ///
    /// A checkerboard nudge of one color step hides banding in the
    /// gradient; a factor of exactly 0 or 1 is left untouched so fully
    /// clear and fully fogged surfaces keep exact colors.
    #[inline]
    pub(crate) fn blend(&self, color: Color, view_depth: f32, col: i32, row: i32) -> Color {
        let mut t = ((view_depth - self.near) / (self.far - self.near)).clamp(0.0, 1.0);
        if t > 0.0 && t < 1.0 && (col + row) & 1 == 1 {
            t = (t + 1.0 / 255.0).min(1.0);
        }
        color.lerp(self.color, t)
    }
}

struct Matrices {
    mvp: Mat4,
    camera_pos: Vec3,
}

/// A software rasterizer bound to one fixed-size framebuffer.
pub struct Renderer {
    framebuffer: FrameBuffer,
    matrices: Option<Matrices>,
    fog: Fog,
    ambient: f32,
    stats: FrameStats,
}

impl Renderer {
    /// Create a renderer with a `width` x `height` framebuffer, cleared to
    /// opaque black with the depth buffer at its far sentinel.
    pub fn new(width: u32, height: u32) -> Self {
        debug!("renderer created at {width}x{height}");
        Self {
            framebuffer: FrameBuffer::new(width, height),
            matrices: None,
            fog: Fog::default(),
            ambient: 0.0,
            stats: FrameStats::default(),
        }
    }

    pub fn width(&self) -> u32 {
        self.framebuffer.width()
    }

    pub fn height(&self) -> u32 {
        self.framebuffer.height()
    }

    /// The finished frame; `as_bytes` on the result is ready for upload.
    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    /// Reset color, depth, and statistics for a new frame.
    pub fn clear_buffers(&mut self) {
        self.framebuffer.clear();
        self.stats.reset();
    }

    /// Bind the model-view-projection matrix and camera position used by
    /// every following `draw_triangle_3d` call.
    pub fn set_matrices(&mut self, mvp: Mat4, camera_pos: Vec3) {
        self.matrices = Some(Matrices { mvp, camera_pos });
    }

    /// Camera position from the last `set_matrices`, if any.
    pub fn camera_position(&self) -> Option<Vec3> {
        self.matrices.as_ref().map(|m| m.camera_pos)
    }

    /// Configure depth fog. `near` and `far` are view-space depths at which
    /// fog begins and saturates.
    pub fn set_fog(&mut self, enabled: bool, near: f32, far: f32, color: Color) {
        debug!("fog {} ({near}..{far})", if enabled { "on" } else { "off" });
        self.fog = Fog {
            enabled,
            near,
            far,
            color,
        };
    }

    /// Minimum lighting intensity applied when vertices carry intensities.
    pub fn set_ambient(&mut self, ambient: f32) {
        self.ambient = ambient.clamp(0.0, 1.0);
    }

    /// Counters accumulated since the last `clear_buffers`.
    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Transform, clip, project, cull, and rasterize one mesh triangle.
    ///
    /// Vertices are taken counter-clockwise facing the camera; a triangle
    /// crossing the near plane is split and every visible part drawn.
    /// Requires `set_matrices` to have been called for this frame.
    pub fn draw_triangle_3d(
        &mut self,
        v1: &Vertex,
        v2: &Vertex,
        v3: &Vertex,
        texture: &Texture,
    ) -> Result<(), RenderError> {
        let mvp = self
            .matrices
            .as_ref()
            .ok_or(RenderError::MissingMatrices)?
            .mvp;
        if texture.width() == 0 || texture.height() == 0 {
            return Err(RenderError::NoTexture);
        }

        let tri = [
            to_clip(&mvp, v1),
            to_clip(&mvp, v2),
            to_clip(&mvp, v3),
        ];

        match geometry::clip_near(tri) {
            NearClip::Culled => self.stats.triangles_culled += 1,
            NearClip::Inside => self.cull_and_fill(&tri, texture),
            NearClip::One(out) => {
                self.stats.triangles_clipped += 1;
                self.cull_and_fill(&out, texture);
            }
            NearClip::Two(fan) => {
                self.stats.triangles_clipped += 1;
                for out in &fan {
                    self.cull_and_fill(out, texture);
                }
            }
        }
        Ok(())
    }

    /// Rasterize vertices the caller has already projected. No clipping or
    /// culling is applied; only the depth test guards the write.
    pub fn draw_triangle(
        &mut self,
        a: ScreenVertex,
        b: ScreenVertex,
        c: ScreenVertex,
        texture: &Texture,
    ) -> Result<(), RenderError> {
        if texture.width() == 0 || texture.height() == 0 {
            return Err(RenderError::NoTexture);
        }
        self.stats.pixels_drawn += scanline::fill_triangle(
            &mut self.framebuffer,
            texture,
            a,
            b,
            c,
            &self.fog,
            self.ambient,
        );
        Ok(())
    }

    /// Project one clip-space triangle, cull back faces, and fill.
    fn cull_and_fill(&mut self, tri: &[ClipVertex; 3], texture: &Texture) {
        let width = self.framebuffer.width() as f32;
        let height = self.framebuffer.height() as f32;
        let tex_width = texture.width() as f32;
        let tex_height = texture.height() as f32;

        let a = geometry::project(&tri[0], width, height, tex_width, tex_height);
        let b = geometry::project(&tri[1], width, height, tex_width, tex_height);
        let c = geometry::project(&tri[2], width, height, tex_width, tex_height);

        if geometry::signed_area(&a, &b, &c) <= 0.0 {
            self.stats.triangles_culled += 1;
            return;
        }
        self.stats.triangles_drawn += 1;
        self.stats.pixels_drawn += scanline::fill_triangle(
            &mut self.framebuffer,
            texture,
            a,
            b,
            c,
            &self.fog,
            self.ambient,
        );
    }
}

#[inline]
fn to_clip(mvp: &Mat4, v: &Vertex) -> ClipVertex {
    ClipVertex::new(
        *mvp * Vec4::from_vec3(v.position, 1.0),
        v.uv,
        v.intensity,
    )
}
