//! Texture storage and texel access.
//!
//! A [`Texture`] is an immutable, tightly packed RGBA8 image. The rasterizer
//! resolves wrap-mode addressing itself and fetches texels by integer
//! coordinate, so the only sampling mode here is nearest.

use std::path::Path;

use log::debug;
use thiserror::Error;

use crate::colors::Color;

/// Errors from texture construction.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("pixel data length {actual} does not match {width}x{height} RGBA ({expected})")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
    #[error("texture dimensions must be non-zero")]
    ZeroDimension,
}

/// A 2D RGBA8 image, immutable after construction.
#[derive(Debug)]
pub struct Texture {
    pixels: Vec<u8>,
    width: u32,
    height: u32,
}

impl Texture {
    /// Decode a texture from an image file (PNG, JPG, ...).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let img = image::open(path.as_ref())?.to_rgba8();
        let (width, height) = img.dimensions();
        debug!(
            "loaded texture {} ({}x{})",
            path.as_ref().display(),
            width,
            height
        );
        Self::from_rgba8(width, height, img.into_raw())
    }

    /// Build a texture from tightly packed RGBA8 bytes, row-major.
    pub fn from_rgba8(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::ZeroDimension);
        }
        let expected = (width * height * 4) as usize;
        if pixels.len() != expected {
            return Err(TextureError::SizeMismatch {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    /// A single-color texture, handy for untextured geometry and tests.
    pub fn solid(width: u32, height: u32, color: Color) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::ZeroDimension);
        }
        let mut pixels = Vec::with_capacity((width * height * 4) as usize);
        for _ in 0..width * height {
            pixels.extend_from_slice(&color.to_bytes());
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Fetch the texel at integer coordinates. Coordinates past the edge are
    /// clamped; the caller is expected to have wrapped them already.
    #[inline]
    pub fn texel(&self, x: u32, y: u32) -> Color {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let idx = ((y * self.width + x) * 4) as usize;
        Color::with_alpha(
            self.pixels[idx],
            self.pixels[idx + 1],
            self.pixels[idx + 2],
            self.pixels[idx + 3],
        )
    }
}
