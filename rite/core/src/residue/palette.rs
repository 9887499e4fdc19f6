//! Palette extraction over a rendered frame
//!
//! Samples the frame on a coarse grid, quantizes each channel to its top
//! three bits and ranks the resulting 512 possible buckets by hit count.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::color::Color;

/// Default number of colors kept in a residue
pub const DEFAULT_PALETTE_BUCKETS: usize = 6;

/// Pixels with alpha below this are invisible and skipped
pub const VISIBILITY_THRESHOLD: u8 = 16;

/// Channel mask keeping 8 levels per channel
pub const QUANTIZE_MASK: u8 = 0xE0;

/// Target number of samples along the shorter side
pub const SAMPLES_PER_SIDE: u32 = 80;

/// Returned when no sampled pixel is visible
pub const FALLBACK_PALETTE: [&str; 3] = ["#8f79f9", "#f6cf6b", "#6bdcff"];

/// Errors building a pixel buffer from raw bytes
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BufferError {
    /// Byte count does not match `width * height * 4`
    #[error("RGBA buffer of {width}x{height} needs {expected} bytes, got {actual}")]
    LengthMismatch {
        /// Buffer width
        width: u32,
        /// Buffer height
        height: u32,
        /// Required byte count
        expected: usize,
        /// Supplied byte count
        actual: usize,
    },
}

/// RGBA8 pixel buffer, row-major
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl PixelBuffer {
    /// Fully transparent buffer
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; byte_len(width, height)],
        }
    }

    /// Buffer filled with one color
    #[must_use]
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        let mut buffer = Self::new(width, height);
        buffer.fill(color);
        buffer
    }

    /// Wrap raw RGBA bytes
    ///
    /// # Errors
    ///
    /// Returns [`BufferError::LengthMismatch`] if `data` is not exactly
    /// `width * height * 4` bytes.
    pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Result<Self, BufferError> {
        let expected = byte_len(width, height);
        if data.len() != expected {
            return Err(BufferError::LengthMismatch {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Width in pixels
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGBA bytes
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume into raw RGBA bytes
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }

    /// Pixel at a coordinate, `None` outside the buffer
    #[must_use]
    pub fn get(&self, x: u32, y: u32) -> Option<Color> {
        let i = self.offset(x, y)?;
        let px = self.data.get(i..i + 4)?;
        Some(Color::rgba(px[0], px[1], px[2], px[3]))
    }

    /// Overwrite a pixel; writes outside the buffer are ignored
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        if let Some(i) = self.offset(x, y) {
            self.data[i..i + 4].copy_from_slice(&[color.r, color.g, color.b, color.a]);
        }
    }

    /// Overwrite every pixel
    pub fn fill(&mut self, color: Color) {
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&[color.r, color.g, color.b, color.a]);
        }
    }

    /// Make every pixel transparent
    pub fn clear(&mut self) {
        self.data.fill(0);
    }
}

fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

/// Sampling stride for a frame: about [`SAMPLES_PER_SIDE`] samples along the
/// shorter side, never below 1
#[must_use]
pub fn sample_stride(width: u32, height: u32) -> u32 {
    (width.min(height) / SAMPLES_PER_SIDE).max(1)
}

/// Quantize a color to its histogram bucket
#[must_use]
pub const fn quantize(color: Color) -> Color {
    Color::rgb(
        color.r & QUANTIZE_MASK,
        color.g & QUANTIZE_MASK,
        color.b & QUANTIZE_MASK,
    )
}

/// Dominant quantized colors of a frame, at most `buckets`
///
/// Never empty: if nothing survives (no sampled pixel reaches
/// [`VISIBILITY_THRESHOLD`], or `buckets` is zero) the [`FALLBACK_PALETTE`]
/// is returned instead.
#[must_use]
pub fn extract_palette(buffer: &PixelBuffer, buckets: usize) -> Vec<String> {
    let top: Vec<String> = dominant_colors(buffer)
        .into_iter()
        .take(buckets)
        .map(|(color, _)| color.to_css_rgb())
        .collect();
    if top.is_empty() {
        return FALLBACK_PALETTE.iter().map(|s| (*s).to_string()).collect();
    }
    top
}

/// Full histogram of quantized colors, ranked by count then first-seen
#[must_use]
pub fn dominant_colors(buffer: &PixelBuffer) -> Vec<(Color, usize)> {
    let stride = sample_stride(buffer.width(), buffer.height()) as usize;

    let mut counts: Vec<(Color, usize)> = Vec::new();
    let mut index: HashMap<Color, usize> = HashMap::new();

    for y in (0..buffer.height()).step_by(stride) {
        for x in (0..buffer.width()).step_by(stride) {
            let Some(px) = buffer.get(x, y) else {
                continue;
            };
            if px.a < VISIBILITY_THRESHOLD {
                continue;
            }
            let bucket = quantize(px);
            match index.get(&bucket).copied() {
                Some(i) => counts[i].1 += 1,
                None => {
                    index.insert(bucket, counts.len());
                    counts.push((bucket, 1));
                }
            }
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_transparent_buffer_yields_fallback() {
        let buffer = PixelBuffer::new(64, 48);
        assert_eq!(
            extract_palette(&buffer, DEFAULT_PALETTE_BUCKETS),
            vec!["#8f79f9", "#f6cf6b", "#6bdcff"]
        );
    }

    #[test]
    fn test_nearly_invisible_pixels_are_skipped() {
        let buffer = PixelBuffer::filled(10, 10, Color::rgba(255, 0, 0, 15));
        assert_eq!(extract_palette(&buffer, 6).len(), 3);
        let visible = PixelBuffer::filled(10, 10, Color::rgba(255, 0, 0, 16));
        assert_eq!(extract_palette(&visible, 6), vec!["rgb(224, 0, 0)"]);
    }

    #[test]
    fn test_solid_color_is_its_quantized_bucket() {
        let c = Color::rgb(0x8f, 0x79, 0xf9);
        let buffer = PixelBuffer::filled(200, 120, c);
        let palette = extract_palette(&buffer, 6);
        assert_eq!(palette, vec!["rgb(128, 96, 224)"]);
    }

    #[test]
    fn test_ranking_by_count_with_first_seen_ties() {
        // Left third blue, rest red; stride is 1 for a 30x10 frame
        let mut buffer = PixelBuffer::filled(30, 10, Color::rgb(250, 10, 10));
        for y in 0..10 {
            for x in 0..10 {
                buffer.set(x, y, Color::rgb(10, 10, 250));
            }
        }
        let ranked = dominant_colors(&buffer);
        assert_eq!(ranked[0], (Color::rgb(224, 0, 0), 200));
        assert_eq!(ranked[1], (Color::rgb(0, 0, 224), 100));

        let mut tied = PixelBuffer::filled(2, 1, Color::rgb(0, 255, 0));
        tied.set(1, 0, Color::rgb(255, 255, 255));
        assert_eq!(extract_palette(&tied, 6), vec!["rgb(0, 224, 0)", "rgb(224, 224, 224)"]);
    }

    #[test]
    fn test_bucket_limit() {
        let mut buffer = PixelBuffer::new(16, 1);
        for x in 0..16 {
            #[allow(clippy::cast_possible_truncation)]
            let level = (x * 16) as u8;
            buffer.set(x, 0, Color::rgb(level, 0, 0));
        }
        assert_eq!(extract_palette(&buffer, 6).len(), 6);
        assert_eq!(dominant_colors(&buffer).len(), 8);
    }

    #[test]
    fn test_zero_buckets_on_visible_frame_is_fallback() {
        let buffer = PixelBuffer::filled(8, 8, Color::rgb(250, 10, 10));
        assert_eq!(
            extract_palette(&buffer, 0),
            vec!["#8f79f9", "#f6cf6b", "#6bdcff"]
        );
    }

    #[test]
    fn test_stride_policy() {
        assert_eq!(sample_stride(10, 10), 1);
        assert_eq!(sample_stride(800, 600), 7);
        assert_eq!(sample_stride(1920, 1080), 13);
        assert_eq!(sample_stride(0, 0), 1);
    }

    #[test]
    fn test_from_raw_validates_length() {
        assert!(PixelBuffer::from_raw(2, 2, vec![0; 16]).is_ok());
        assert_eq!(
            PixelBuffer::from_raw(2, 2, vec![0; 15]),
            Err(BufferError::LengthMismatch {
                width: 2,
                height: 2,
                expected: 16,
                actual: 15,
            })
        );
    }

    #[test]
    fn test_empty_buffer_is_fallback() {
        let buffer = PixelBuffer::new(0, 0);
        assert_eq!(extract_palette(&buffer, 6).len(), 3);
    }
}
