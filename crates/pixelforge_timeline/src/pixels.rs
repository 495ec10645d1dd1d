// SPDX-License-Identifier: MIT OR Apache-2.0
//! RGBA pixel buffers shared by keyframes, reels and stage rendering.

use crate::error::{TimelineError, TimelineResult};
use serde::{Deserialize, Serialize};

/// Bytes per RGBA pixel
pub const BYTES_PER_PIXEL: usize = 4;

/// A straight-alpha RGBA8 pixel buffer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelBuffer {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Row-major RGBA bytes, `width * height * 4` long
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Create a fully transparent buffer
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * BYTES_PER_PIXEL],
        }
    }

    /// Wrap existing RGBA bytes, checking the length
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> TimelineResult<Self> {
        let expected = width as usize * height as usize * BYTES_PER_PIXEL;
        if data.len() != expected {
            return Err(TimelineError::DimensionMismatch {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self { width, height, data })
    }

    /// Buffer filled with a single color
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut buffer = Self::new(width, height);
        for px in buffer.data.chunks_exact_mut(BYTES_PER_PIXEL) {
            px.copy_from_slice(&rgba);
        }
        buffer
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume into raw bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    /// Byte length
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Whether both buffers have the same dimensions
    pub fn same_size(&self, other: &PixelBuffer) -> bool {
        self.width == other.width && self.height == other.height
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL)
    }

    /// Read a pixel, `None` when out of bounds
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let i = self.offset(x, y)?;
        Some([self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]])
    }

    /// Write a pixel; out of bounds writes are ignored
    pub fn set_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        if let Some(i) = self.offset(x, y) {
            self.data[i..i + BYTES_PER_PIXEL].copy_from_slice(&rgba);
        }
    }

    /// Overwrite this buffer with `source`, which must have the same byte length
    pub fn copy_from(&mut self, source: &PixelBuffer) -> TimelineResult<()> {
        if source.data.len() != self.data.len() {
            return Err(TimelineError::DimensionMismatch {
                expected: self.data.len(),
                actual: source.data.len(),
            });
        }
        self.data.copy_from_slice(&source.data);
        Ok(())
    }

    /// Copy a rectangle out of this buffer; areas outside stay transparent
    pub fn region(&self, x: i32, y: i32, width: u32, height: u32) -> PixelBuffer {
        let mut out = PixelBuffer::new(width, height);
        for dy in 0..height {
            for dx in 0..width {
                let sx = x + dx as i32;
                let sy = y + dy as i32;
                if sx < 0 || sy < 0 {
                    continue;
                }
                if let Some(px) = self.pixel(sx as u32, sy as u32) {
                    out.set_pixel(dx, dy, px);
                }
            }
        }
        out
    }

    /// Source-over composite `top` onto this buffer at an offset with extra opacity
    pub fn blend_over(&mut self, top: &PixelBuffer, x: i32, y: i32, opacity: u8) {
        for ty in 0..top.height {
            for tx in 0..top.width {
                let dx = x + tx as i32;
                let dy = y + ty as i32;
                if dx < 0 || dy < 0 {
                    continue;
                }
                let (Some(src), Some(dst)) = (top.pixel(tx, ty), self.pixel(dx as u32, dy as u32))
                else {
                    continue;
                };
                let sa = src[3] as u32 * opacity as u32 / 255;
                if sa == 0 {
                    continue;
                }
                let da = dst[3] as u32;
                let out_a = sa + da * (255 - sa) / 255;
                let mut out = [0u8; 4];
                for c in 0..3 {
                    let blended =
                        (src[c] as u32 * sa + dst[c] as u32 * da * (255 - sa) / 255) / out_a.max(1);
                    out[c] = blended.min(255) as u8;
                }
                out[3] = out_a.min(255) as u8;
                self.set_pixel(dx as u32, dy as u32, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rgba_checks_length() {
        assert!(PixelBuffer::from_rgba(2, 2, vec![0; 16]).is_ok());
        let err = PixelBuffer::from_rgba(2, 2, vec![0; 15]).unwrap_err();
        assert!(matches!(err, TimelineError::DimensionMismatch { expected: 16, actual: 15 }));
    }

    #[test]
    fn test_copy_from_rejects_other_sizes() {
        let mut target = PixelBuffer::new(2, 2);
        let source = PixelBuffer::filled(2, 2, [1, 2, 3, 4]);
        target.copy_from(&source).unwrap();
        assert_eq!(target.pixel(1, 1), Some([1, 2, 3, 4]));

        let wrong = PixelBuffer::new(3, 2);
        assert!(target.copy_from(&wrong).is_err());
    }

    #[test]
    fn test_region_outside_is_transparent() {
        let source = PixelBuffer::filled(2, 2, [255, 0, 0, 255]);
        let region = source.region(1, 1, 2, 2);
        assert_eq!(region.pixel(0, 0), Some([255, 0, 0, 255]));
        assert_eq!(region.pixel(1, 1), Some([0, 0, 0, 0]));
    }

    #[test]
    fn test_blend_over_opaque() {
        let mut base = PixelBuffer::filled(1, 1, [0, 0, 255, 255]);
        let top = PixelBuffer::filled(1, 1, [255, 0, 0, 255]);
        base.blend_over(&top, 0, 0, 255);
        assert_eq!(base.pixel(0, 0), Some([255, 0, 0, 255]));
    }
}
