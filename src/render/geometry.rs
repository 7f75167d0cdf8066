//! Per-triangle geometry stage: clip-space transform, near-plane clipping,
//! perspective divide, and viewport mapping.
//!
//! Clipping happens in homogeneous clip space before the divide, against a
//! single plane: w = [`NEAR_PLANE`]. With the projection used here w equals
//! eye-space z, so this discards geometry at or behind the camera without
//! ever dividing by a non-positive w. A triangle crossing the plane is
//! replaced by one or two triangles covering its visible part; the fan-out
//! is bounded, there is no recursion.

use crate::math::vec2::Vec2;
use crate::math::vec3::Vec3;
use crate::math::vec4::Vec4;

/// Clip-space w at and below which a vertex counts as behind the camera.
pub const NEAR_PLANE: f32 = 0.01;

/// A mesh vertex as submitted by the caller.
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Vec3,
    pub uv: Vec2,
    /// Lighting intensity in [0, 1]; 1.0 when lighting is unused.
    pub intensity: f32,
}

impl Vertex {
    pub const fn new(position: Vec3, uv: Vec2) -> Self {
        Self {
            position,
            uv,
            intensity: 1.0,
        }
    }

    pub const fn with_intensity(position: Vec3, uv: Vec2, intensity: f32) -> Self {
        Self {
            position,
            uv,
            intensity,
        }
    }
}

/// A vertex ready for span rasterization: projected to the screen with its
/// attributes premultiplied by 1/w.
///
/// `u_over_w` and `v_over_w` carry the texture dimensions baked in, so
/// recovering a texel coordinate in the inner loop is a single multiply.
#[derive(Debug, Clone, Copy)]
pub struct ScreenVertex {
    pub x: f32,
    pub y: f32,
    /// 1 / clip-space w. Interpolates linearly in screen space.
    pub inv_w: f32,
    /// u * texture_width / w.
    pub u_over_w: f32,
    /// v * texture_height / w.
    pub v_over_w: f32,
    /// Post-divide depth, compared and stored by the depth buffer.
    pub z: f32,
    /// Lighting intensity, interpolated without perspective correction.
    pub intensity: f32,
}

/// A vertex in clip space with the attributes clipping must interpolate.
#[derive(Clone, Copy)]
pub(crate) struct ClipVertex {
    pub position: Vec4,
    pub uv: Vec2,
    pub intensity: f32,
}

impl ClipVertex {
    pub fn new(position: Vec4, uv: Vec2, intensity: f32) -> Self {
        Self {
            position,
            uv,
            intensity,
        }
    }

    /// Interpolate all attributes toward `other` at parameter `t`.
    fn lerp(&self, other: &Self, t: f32) -> Self {
        Self {
            position: self.position.lerp(other.position, t),
            uv: self.uv + (other.uv - self.uv) * t,
            intensity: self.intensity + (other.intensity - self.intensity) * t,
        }
    }
}

/// Outcome of clipping one triangle against the near plane.
pub(crate) enum NearClip {
    /// Every vertex is in front; rasterize the triangle as-is.
    Inside,
    /// Every vertex is behind; nothing to draw.
    Culled,
    /// One vertex survived; the visible part is a single triangle.
    One([ClipVertex; 3]),
    /// Two vertices survived; the visible quad is split into two triangles.
    Two([[ClipVertex; 3]; 2]),
}

/// Clip a triangle against w = [`NEAR_PLANE`].
///
/// Intersection vertices are placed where the edge crosses the plane:
/// `t = (near - front.w) / (back.w - front.w)` along the front-to-back
/// edge. Both emitted orderings keep the original winding.
pub(crate) fn clip_near(tri: [ClipVertex; 3]) -> NearClip {
    let behind = [
        tri[0].position.w <= NEAR_PLANE,
        tri[1].position.w <= NEAR_PLANE,
        tri[2].position.w <= NEAR_PLANE,
    ];

    match behind.iter().filter(|&&b| b).count() {
        0 => NearClip::Inside,
        3 => NearClip::Culled,
        1 => {
            // Rotate so the behind vertex comes first, then replace it with
            // the two crossing points. (back, f1, f2) -> (f1, f2, a) + (f2, b, a)
            let i = behind.iter().position(|&b| b).unwrap();
            let back = tri[i];
            let f1 = tri[(i + 1) % 3];
            let f2 = tri[(i + 2) % 3];

            let a = f1.lerp(&back, crossing(&f1, &back));
            let b = f2.lerp(&back, crossing(&f2, &back));
            NearClip::Two([[f1, f2, a], [f2, b, a]])
        }
        _ => {
            // One vertex in front: shrink the triangle onto the plane.
            let i = behind.iter().position(|&b| !b).unwrap();
            let front = tri[i];
            let b1 = tri[(i + 1) % 3];
            let b2 = tri[(i + 2) % 3];

            let a = front.lerp(&b1, crossing(&front, &b1));
            let b = front.lerp(&b2, crossing(&front, &b2));
            NearClip::One([front, a, b])
        }
    }
}

/// Parameter along front->back at which w reaches the near plane.
#[inline]
fn crossing(front: &ClipVertex, back: &ClipVertex) -> f32 {
    (NEAR_PLANE - front.position.w) / (back.position.w - front.position.w)
}

/// Perspective divide and viewport mapping for one clip-space vertex.
///
/// Screen y grows downward, so ndc y is flipped. The texture dimensions are
/// folded into the perspective-divided uv here.
#[inline]
pub(crate) fn project(
    cv: &ClipVertex,
    width: f32,
    height: f32,
    tex_width: f32,
    tex_height: f32,
) -> ScreenVertex {
    let inv_w = 1.0 / cv.position.w;
    ScreenVertex {
        x: (cv.position.x * inv_w + 1.0) * (width * 0.5),
        y: (1.0 - cv.position.y * inv_w) * (height * 0.5),
        inv_w,
        u_over_w: cv.uv.x * tex_width * inv_w,
        v_over_w: cv.uv.y * tex_height * inv_w,
        z: cv.position.z * inv_w,
        intensity: cv.intensity,
    }
}

/// Signed double area of a screen-space triangle.
///
/// Positive when the mesh winding is counter-clockwise facing the camera:
/// the y-down viewport mapping reverses on-screen orientation, so the
/// operands are ordered to restore the mesh-side sign. Zero or negative
/// means back-facing or degenerate.
#[inline]
pub(crate) fn signed_area(a: &ScreenVertex, b: &ScreenVertex, c: &ScreenVertex) -> f32 {
    (c.x - a.x) * (b.y - a.y) - (c.y - a.y) * (b.x - a.x)
}
