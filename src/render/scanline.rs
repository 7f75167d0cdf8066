//! Scanline triangle filling with perspective-correct texturing.
//!
//! Triangles are walked one row at a time between two active edges: the
//! long edge from the topmost to the bottommost vertex, and a short edge
//! that switches from top->middle to middle->bottom when the row passes the
//! middle vertex. Every attribute is advanced by a fixed per-row delta down
//! the edges and a fixed per-column delta across each span.
//!
//! # Perspective correction
//!
//! Attributes that live on the 3D surface (texture coordinates, depth) do
//! not interpolate linearly in screen space, but their quotients by w do.
//! The edges therefore carry u/w, v/w, and 1/w; the inner loop divides once
//! per pixel to recover the texel coordinate. Lighting intensity is walked
//! without the correction, which is fine at the poly counts this renderer
//! is built for.
//!
//! Rows and columns are stepped at integer centers: each edge or span is
//! pre-stepped from its fractional start to the first covered integer
//! coordinate, which keeps adjacent triangles meeting at a shared edge from
//! double-filling pixels.

use crate::render::framebuffer::FrameBuffer;
use crate::render::geometry::ScreenVertex;
use crate::render::renderer::Fog;
use crate::texture::Texture;

/// Edge runs shorter than this many rows are not walked.
const MIN_EDGE_HEIGHT: f32 = 1.0 / 256.0;
/// Spans narrower than this many columns are not filled.
const MIN_SPAN_WIDTH: f32 = 1.0 / 2048.0;

/// The attribute bundle advanced along an edge or across a span.
///
/// `u` and `v` are u/w and v/w with the texture dimensions baked in; `z` is
/// post-divide depth; `light` is the uncorrected lighting intensity.
#[derive(Clone, Copy, Default)]
struct Interp {
    x: f32,
    inv_w: f32,
    u: f32,
    v: f32,
    z: f32,
    light: f32,
}

impl Interp {
    #[inline]
    fn at(v: &ScreenVertex) -> Self {
        Self {
            x: v.x,
            inv_w: v.inv_w,
            u: v.u_over_w,
            v: v.v_over_w,
            z: v.z,
            light: v.intensity,
        }
    }

    /// Per-row deltas between two vertices `d` rows apart.
    #[inline]
    fn edge_slope(from: &ScreenVertex, to: &ScreenVertex, d: f32) -> Self {
        Self {
            x: (to.x - from.x) / d,
            inv_w: (to.inv_w - from.inv_w) / d,
            u: (to.u_over_w - from.u_over_w) / d,
            v: (to.v_over_w - from.v_over_w) / d,
            z: (to.z - from.z) / d,
            light: (to.intensity - from.intensity) / d,
        }
    }

    /// Per-column deltas across a span `width` columns wide.
    #[inline]
    fn span_slope(left: &Self, right: &Self, width: f32) -> Self {
        Self {
            x: 0.0,
            inv_w: (right.inv_w - left.inv_w) / width,
            u: (right.u - left.u) / width,
            v: (right.v - left.v) / width,
            z: (right.z - left.z) / width,
            light: (right.light - left.light) / width,
        }
    }

    /// The bundle `t` steps further along.
    #[inline]
    fn offset(&self, step: &Self, t: f32) -> Self {
        Self {
            x: self.x + step.x * t,
            inv_w: self.inv_w + step.inv_w * t,
            u: self.u + step.u * t,
            v: self.v + step.v * t,
            z: self.z + step.z * t,
            light: self.light + step.light * t,
        }
    }

    #[inline]
    fn advance(&mut self, step: &Self) {
        self.x += step.x;
        self.inv_w += step.inv_w;
        self.u += step.u;
        self.v += step.v;
        self.z += step.z;
        self.light += step.light;
    }
}

/// Fill one triangle, returning the number of pixels written.
///
/// Vertices may arrive in any order; they are sorted top to bottom here.
/// Depth testing is strict less-than, so at exactly tied depths the first
/// writer wins.
pub(crate) fn fill_triangle(
    fb: &mut FrameBuffer,
    texture: &Texture,
    a: ScreenVertex,
    b: ScreenVertex,
    c: ScreenVertex,
    fog: &Fog,
    ambient: f32,
) -> u64 {
    let (mut a, mut b, mut c) = (a, b, c);
    if b.y < a.y {
        std::mem::swap(&mut a, &mut b);
    }
    if c.y < b.y {
        std::mem::swap(&mut b, &mut c);
    }
    if b.y < a.y {
        std::mem::swap(&mut a, &mut b);
    }

    let height = fb.height() as i32;
    let min_row = (a.y.ceil() as i32).max(0);
    let max_row = (c.y.ceil() as i32 - 1).min(height - 1);
    if max_row < min_row {
        return 0;
    }

    let full_height = c.y - a.y;
    if full_height < MIN_EDGE_HEIGHT {
        return 0;
    }

    // Long edge, walked for the whole triangle.
    let major_step = Interp::edge_slope(&a, &c, full_height);
    let mut major = Interp::at(&a).offset(&major_step, min_row as f32 - a.y);

    // Short edges, one above and one below the middle vertex.
    let top_height = b.y - a.y;
    let bottom_height = c.y - b.y;
    let has_top = top_height.abs() >= MIN_EDGE_HEIGHT;
    let has_bottom = bottom_height.abs() >= MIN_EDGE_HEIGHT;
    let split_row = b.y.ceil() as i32;

    let top_step = if has_top {
        Interp::edge_slope(&a, &b, top_height)
    } else {
        Interp::default()
    };
    let bottom_step = if has_bottom {
        Interp::edge_slope(&b, &c, bottom_height)
    } else {
        Interp::default()
    };

    let (mut minor, mut minor_step, mut on_bottom) = if has_top && min_row < split_row {
        let start = Interp::at(&a).offset(&top_step, min_row as f32 - a.y);
        (start, top_step, false)
    } else if has_bottom {
        let start = Interp::at(&b).offset(&bottom_step, min_row as f32 - b.y);
        (start, bottom_step, true)
    } else {
        return 0;
    };

    let mut drawn = 0u64;

    for row in min_row..=max_row {
        if !on_bottom && row >= split_row {
            if !has_bottom {
                break;
            }
            minor_step = bottom_step;
            minor = Interp::at(&b).offset(&bottom_step, row as f32 - b.y);
            on_bottom = true;
        }

        drawn += fill_span(fb, texture, row, &minor, &major, fog, ambient);

        minor.advance(&minor_step);
        major.advance(&major_step);
    }

    drawn
}

/// Fill the pixels of one row between two edge crossings.
fn fill_span(
    fb: &mut FrameBuffer,
    texture: &Texture,
    row: i32,
    e1: &Interp,
    e2: &Interp,
    fog: &Fog,
    ambient: f32,
) -> u64 {
    let (left, right) = if e1.x <= e2.x { (e1, e2) } else { (e2, e1) };

    let span = right.x - left.x;
    if span < MIN_SPAN_WIDTH {
        return 0;
    }

    let fb_width = fb.width() as i32;
    let min_col = (left.x.ceil() as i32).max(0);
    let max_col = (right.x.ceil() as i32 - 1).min(fb_width - 1);
    if max_col < min_col {
        return 0;
    }

    let step = Interp::span_slope(left, right, span);
    let mut cursor = left.offset(&step, min_col as f32 - left.x);

    let tex_width = texture.width() as f32;
    let tex_height = texture.height() as f32;
    let row_base = row as usize * fb_width as usize;

    let mut drawn = 0;
    for col in min_col..=max_col {
        let index = row_base + col as usize;
        if fb.test_and_set_depth(index, cursor.z) {
            // Recover surface-space values: one divide per pixel, then a
            // wrap into the texture.
            let w = 1.0 / cursor.inv_w;
            let tex_x = (cursor.u * w).rem_euclid(tex_width) as u32;
            let tex_y = (cursor.v * w).rem_euclid(tex_height) as u32;
            let mut color = texture.texel(tex_x, tex_y);

            let brightness = cursor.light.max(ambient);
            if brightness < 1.0 {
                color = color.shade(brightness);
            }
            if fog.enabled {
                color = fog.blend(color, w, col, row);
            }

            fb.write_rgb(index, color);
            drawn += 1;
        }
        cursor.advance(&step);
    }

    drawn
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colors::Color;

    fn sv(x: f32, y: f32, w: f32, u: f32, v: f32, tex: &Texture) -> ScreenVertex {
        sv_lit(x, y, w, u, v, tex, 1.0)
    }

    fn sv_lit(
        x: f32,
        y: f32,
        w: f32,
        u: f32,
        v: f32,
        tex: &Texture,
        intensity: f32,
    ) -> ScreenVertex {
        ScreenVertex {
            x,
            y,
            inv_w: 1.0 / w,
            u_over_w: u * tex.width() as f32 / w,
            v_over_w: v * tex.height() as f32 / w,
            z: 0.5,
            intensity,
        }
    }

    fn no_fog() -> Fog {
        Fog::default()
    }

    #[test]
    fn fills_interior_and_leaves_exterior() {
        let mut fb = FrameBuffer::new(64, 64);
        let tex = Texture::solid(4, 4, Color::RED).unwrap();
        let drawn = fill_triangle(
            &mut fb,
            &tex,
            sv(10.0, 10.0, 1.0, 0.0, 0.0, &tex),
            sv(50.0, 10.0, 1.0, 1.0, 0.0, &tex),
            sv(30.0, 50.0, 1.0, 0.5, 1.0, &tex),
            &no_fog(),
            0.0,
        );
        assert!(drawn > 0);
        assert_eq!(fb.pixel(30, 20), Some(Color::RED));
        assert_eq!(fb.pixel(5, 5), Some(Color::BLACK));
        assert_eq!(fb.pixel(60, 60), Some(Color::BLACK));
    }

    #[test]
    fn vertex_order_does_not_matter() {
        let tex = Texture::solid(4, 4, Color::WHITE).unwrap();
        let verts = [
            sv(10.0, 10.0, 1.0, 0.0, 0.0, &tex),
            sv(50.0, 10.0, 1.0, 1.0, 0.0, &tex),
            sv(30.0, 50.0, 1.0, 0.5, 1.0, &tex),
        ];

        let mut reference = FrameBuffer::new(64, 64);
        fill_triangle(
            &mut reference,
            &tex,
            verts[0],
            verts[1],
            verts[2],
            &no_fog(),
            0.0,
        );

        for order in [[1, 2, 0], [2, 0, 1], [2, 1, 0]] {
            let mut fb = FrameBuffer::new(64, 64);
            fill_triangle(
                &mut fb,
                &tex,
                verts[order[0]],
                verts[order[1]],
                verts[order[2]],
                &no_fog(),
                0.0,
            );
            assert_eq!(fb.as_bytes(), reference.as_bytes());
        }
    }

    #[test]
    fn degenerate_triangles_draw_nothing() {
        let mut fb = FrameBuffer::new(64, 64);
        let tex = Texture::solid(4, 4, Color::RED).unwrap();

        // Flatter than the minimum edge height.
        let drawn = fill_triangle(
            &mut fb,
            &tex,
            sv(10.0, 10.0, 1.0, 0.0, 0.0, &tex),
            sv(50.0, 10.001, 1.0, 1.0, 0.0, &tex),
            sv(30.0, 10.002, 1.0, 0.5, 1.0, &tex),
            &no_fog(),
            0.0,
        );
        assert_eq!(drawn, 0);

        // Narrower than the minimum span width.
        let drawn = fill_triangle(
            &mut fb,
            &tex,
            sv(10.0, 10.0, 1.0, 0.0, 0.0, &tex),
            sv(10.0001, 10.0, 1.0, 1.0, 0.0, &tex),
            sv(10.0, 50.0, 1.0, 0.5, 1.0, &tex),
            &no_fog(),
            0.0,
        );
        assert_eq!(drawn, 0);
    }

    #[test]
    fn offscreen_triangles_are_safely_clipped() {
        let mut fb = FrameBuffer::new(32, 32);
        let tex = Texture::solid(4, 4, Color::GREEN).unwrap();

        // Entirely above, below, left, right: nothing drawn, no panic.
        for (dx, dy) in [(0.0, -100.0), (0.0, 100.0), (-100.0, 0.0), (100.0, 0.0)] {
            let drawn = fill_triangle(
                &mut fb,
                &tex,
                sv(10.0 + dx, 10.0 + dy, 1.0, 0.0, 0.0, &tex),
                sv(20.0 + dx, 10.0 + dy, 1.0, 1.0, 0.0, &tex),
                sv(15.0 + dx, 20.0 + dy, 1.0, 0.5, 1.0, &tex),
                &no_fog(),
                0.0,
            );
            assert_eq!(drawn, 0);
        }

        // Partially visible: clamped to the buffer, still draws.
        let drawn = fill_triangle(
            &mut fb,
            &tex,
            sv(-20.0, -20.0, 1.0, 0.0, 0.0, &tex),
            sv(40.0, -10.0, 1.0, 1.0, 0.0, &tex),
            sv(10.0, 40.0, 1.0, 0.5, 1.0, &tex),
            &no_fog(),
            0.0,
        );
        assert!(drawn > 0);
        assert!(drawn <= 32 * 32);
    }

    #[test]
    fn depth_test_keeps_the_closer_surface() {
        let mut fb = FrameBuffer::new(64, 64);
        let red = Texture::solid(4, 4, Color::RED).unwrap();
        let blue = Texture::solid(4, 4, Color::BLUE).unwrap();

        let tri = |tex: &Texture, z: f32| {
            let mut v = [
                sv(10.0, 10.0, 1.0, 0.0, 0.0, tex),
                sv(50.0, 10.0, 1.0, 1.0, 0.0, tex),
                sv(30.0, 50.0, 1.0, 0.5, 1.0, tex),
            ];
            for vert in &mut v {
                vert.z = z;
            }
            v
        };

        // Far blue first, near red second: red wins.
        let [a, b, c] = tri(&blue, 0.9);
        fill_triangle(&mut fb, &blue, a, b, c, &no_fog(), 0.0);
        let [a, b, c] = tri(&red, 0.1);
        fill_triangle(&mut fb, &red, a, b, c, &no_fog(), 0.0);
        assert_eq!(fb.pixel(30, 20), Some(Color::RED));

        // Drawing the far surface again changes nothing.
        let [a, b, c] = tri(&blue, 0.9);
        let drawn = fill_triangle(&mut fb, &blue, a, b, c, &no_fog(), 0.0);
        assert_eq!(drawn, 0);
        assert_eq!(fb.pixel(30, 20), Some(Color::RED));
    }

    #[test]
    fn equal_depth_first_writer_wins() {
        let mut fb = FrameBuffer::new(64, 64);
        let red = Texture::solid(4, 4, Color::RED).unwrap();
        let blue = Texture::solid(4, 4, Color::BLUE).unwrap();

        let verts = |tex: &Texture| {
            [
                sv(10.0, 10.0, 1.0, 0.0, 0.0, tex),
                sv(50.0, 10.0, 1.0, 1.0, 0.0, tex),
                sv(30.0, 50.0, 1.0, 0.5, 1.0, tex),
            ]
        };

        let [a, b, c] = verts(&red);
        fill_triangle(&mut fb, &red, a, b, c, &no_fog(), 0.0);
        let [a, b, c] = verts(&blue);
        let drawn = fill_triangle(&mut fb, &blue, a, b, c, &no_fog(), 0.0);
        assert_eq!(drawn, 0);
        assert_eq!(fb.pixel(30, 20), Some(Color::RED));
    }

    #[test]
    fn texture_sampling_is_perspective_correct() {
        // Left half red, right half blue.
        let tex = Texture::from_rgba8(
            2,
            1,
            vec![255, 0, 0, 255, 0, 0, 255, 255],
        )
        .unwrap();

        // A triangle whose top row runs from w = 1 on the left to w = 3 on
        // the right. With u going 0 -> 1, the u = 0.5 boundary sits at 75%
        // of the span under perspective, not 50%.
        let mut fb = FrameBuffer::new(128, 128);
        fill_triangle(
            &mut fb,
            &tex,
            sv(0.0, -1.0, 1.0, 0.0, 0.0, &tex),
            sv(100.0, -1.0, 3.0, 1.0, 0.0, &tex),
            sv(0.0, 101.0, 1.0, 0.0, 1.0, &tex),
            &no_fog(),
            0.0,
        );

        // 60% across the top span: affine interpolation would already be
        // blue, perspective correction keeps it red.
        assert_eq!(fb.pixel(60, 0), Some(Color::RED));
        assert_eq!(fb.pixel(49, 0), Some(Color::RED));
        // Past the 75% boundary it turns blue.
        assert_eq!(fb.pixel(88, 0), Some(Color::BLUE));
    }

    #[test]
    fn uv_outside_unit_range_wraps() {
        // 2x2 checker: red green / green red.
        let tex = Texture::from_rgba8(
            2,
            2,
            vec![
                255, 0, 0, 255, 0, 255, 0, 255, //
                0, 255, 0, 255, 255, 0, 0, 255,
            ],
        )
        .unwrap();

        let mut fb = FrameBuffer::new(32, 32);
        // uv from -1 to +1 over the triangle tiles the checker twice.
        fill_triangle(
            &mut fb,
            &tex,
            sv(0.0, 0.0, 1.0, -1.0, -1.0, &tex),
            sv(30.0, 0.0, 1.0, 1.0, -1.0, &tex),
            sv(0.0, 30.0, 1.0, -1.0, 1.0, &tex),
            &no_fog(),
            0.0,
        );
        // Sampled colors must come from the texture, never out of bounds.
        for y in 0..32 {
            for x in 0..32 {
                let c = fb.pixel(x, y).unwrap();
                assert!(c == Color::RED || c == Color::GREEN || c == Color::BLACK);
            }
        }
    }

    #[test]
    fn brightness_scales_sampled_color() {
        let tex = Texture::solid(4, 4, Color::new(200, 100, 50)).unwrap();
        let mut fb = FrameBuffer::new(64, 64);
        fill_triangle(
            &mut fb,
            &tex,
            sv_lit(10.0, 10.0, 1.0, 0.0, 0.0, &tex, 0.5),
            sv_lit(50.0, 10.0, 1.0, 1.0, 0.0, &tex, 0.5),
            sv_lit(30.0, 50.0, 1.0, 0.5, 1.0, &tex, 0.5),
            &no_fog(),
            0.0,
        );
        assert_eq!(fb.pixel(30, 20), Some(Color::new(100, 50, 25)));
    }

    #[test]
    fn ambient_floor_limits_darkness() {
        let tex = Texture::solid(4, 4, Color::new(200, 100, 50)).unwrap();
        let mut fb = FrameBuffer::new(64, 64);
        fill_triangle(
            &mut fb,
            &tex,
            sv_lit(10.0, 10.0, 1.0, 0.0, 0.0, &tex, 0.0),
            sv_lit(50.0, 10.0, 1.0, 1.0, 0.0, &tex, 0.0),
            sv_lit(30.0, 50.0, 1.0, 0.5, 1.0, &tex, 0.0),
            &no_fog(),
            0.5,
        );
        assert_eq!(fb.pixel(30, 20), Some(Color::new(100, 50, 25)));
    }

    #[test]
    fn alpha_stays_opaque_after_drawing() {
        let tex = Texture::solid(4, 4, Color::RED).unwrap();
        let mut fb = FrameBuffer::new(32, 32);
        fill_triangle(
            &mut fb,
            &tex,
            sv(0.0, 0.0, 1.0, 0.0, 0.0, &tex),
            sv(31.0, 0.0, 1.0, 1.0, 0.0, &tex),
            sv(0.0, 31.0, 1.0, 0.0, 1.0, &tex),
            &no_fog(),
            0.0,
        );
        for px in fb.as_bytes().chunks_exact(4) {
            assert_eq!(px[3], 255);
        }
    }
}
