//! Video frames and the preprocessing applied before decoding.
//!
//! Only a centered square of the frame is sampled, downscaled to a fixed
//! size and converted to luma, which bounds the work per decode attempt
//! regardless of camera resolution.

use crate::error::{Error, Result};

/// One RGBA video frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl Frame {
    /// Wrap an RGBA buffer of `width * height * 4` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFrame`] if the buffer length does not match.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(Error::InvalidFrame {
                expected,
                actual: rgba.len(),
            });
        }
        Ok(Self {
            width,
            height,
            rgba,
        })
    }

    /// Frame width in pixels.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Whether the frame has no pixels (camera not ready yet).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Centered square covering `fraction` of the shorter side.
    #[must_use]
    pub fn center_square(&self, fraction: f32) -> Region {
        let shorter = self.width.min(self.height);
        // Truncation is intended; the result never exceeds `shorter`.
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let size = ((shorter as f32 * fraction.clamp(0.0, 1.0)).round() as u32).clamp(1, shorter.max(1));
        Region {
            x: (self.width.saturating_sub(size)) / 2,
            y: (self.height.saturating_sub(size)) / 2,
            size,
        }
    }

    /// Sample `region` into a `target` x `target` luma image.
    ///
    /// Nearest-neighbour sampling; luma is `0.299 R + 0.587 G + 0.114 B`.
    /// Returns `None` for an empty frame or a zero target.
    #[must_use]
    pub fn sample_luma(&self, region: Region, target: u32) -> Option<LumaImage> {
        if self.is_empty() || target == 0 {
            return None;
        }
        let size = u64::from(region.size);
        let target_u64 = u64::from(target);
        let mut pixels = Vec::with_capacity(target as usize * target as usize);

        for ty in 0..target_u64 {
            let sy = u64::from(region.y) + ty * size / target_u64;
            let sy = sy.min(u64::from(self.height) - 1);
            for tx in 0..target_u64 {
                let sx = u64::from(region.x) + tx * size / target_u64;
                let sx = sx.min(u64::from(self.width) - 1);
                #[allow(clippy::cast_possible_truncation)]
                let offset = ((sy * u64::from(self.width) + sx) * 4) as usize;
                pixels.push(luma(
                    self.rgba[offset],
                    self.rgba[offset + 1],
                    self.rgba[offset + 2],
                ));
            }
        }

        Some(LumaImage {
            width: target,
            height: target,
            pixels,
        })
    }
}

/// A square sub-region of a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Left edge.
    pub x: u32,
    /// Top edge.
    pub y: u32,
    /// Side length.
    pub size: u32,
}

/// A single-channel 8-bit image handed to the decoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LumaImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl LumaImage {
    /// Wrap a luma buffer of `width * height` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFrame`] if the buffer length does not match.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(Error::InvalidFrame {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Image width.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major luma values.
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// The same image with light and dark swapped.
    #[must_use]
    pub fn inverted(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            pixels: self.pixels.iter().map(|p| 255 - p).collect(),
        }
    }
}

// At most 255_500 / 1000, so the cast cannot truncate.
#[allow(clippy::cast_possible_truncation)]
fn luma(r: u8, g: u8, b: u8) -> u8 {
    let weighted = 299 * u32::from(r) + 587 * u32::from(g) + 114 * u32::from(b);
    ((weighted + 500) / 1000) as u8
}
