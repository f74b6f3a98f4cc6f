//! Shared RGB8 frame buffer.
//!
//! Workers write each scanline with relaxed atomic stores, no locks. The
//! harness can read at any time for a live preview. A read taken mid-render
//! may mix old and new bytes, which only shows up as a visual artifact.

use crate::{RenderError, RenderResult};
use std::sync::atomic::{AtomicU8, Ordering};

/// Row-major RGB8 image, 3 bytes per pixel, top row first.
#[derive(Debug)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    data: Box<[AtomicU8]>,
}

impl FrameBuffer {
    /// Create a new frame buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        let len = 3 * width as usize * height as usize;
        Self {
            width,
            height,
            data: (0..len).map(|_| AtomicU8::new(0)).collect(),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of bytes, `3 * width * height`.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Reset every pixel to black.
    pub fn clear(&self) {
        for byte in self.data.iter() {
            byte.store(0, Ordering::Relaxed);
        }
    }

    /// Get the pixel at column `x`, row `y` (row 0 is the top).
    ///
    /// Returns `None` outside the frame.
    pub fn get(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        let pixel = self.pixel(x, y)?;
        Some([
            pixel[0].load(Ordering::Relaxed),
            pixel[1].load(Ordering::Relaxed),
            pixel[2].load(Ordering::Relaxed),
        ])
    }

    /// Set the pixel at column `x`, row `y`. Writes outside the frame are
    /// dropped.
    pub(crate) fn set(&self, x: u32, y: u32, rgb: [u8; 3]) {
        if let Some(pixel) = self.pixel(x, y) {
            for (byte, value) in pixel.iter().zip(rgb) {
                byte.store(value, Ordering::Relaxed);
            }
        }
    }

    /// Copy the current contents into `out`, which must hold `len()` bytes.
    pub fn copy_to(&self, out: &mut [u8]) -> RenderResult<()> {
        if out.len() != self.data.len() {
            return Err(RenderError::BufferSizeMismatch {
                expected: self.data.len(),
                actual: out.len(),
            });
        }
        for (dst, src) in out.iter_mut().zip(self.data.iter()) {
            *dst = src.load(Ordering::Relaxed);
        }
        Ok(())
    }

    /// Copy of the current contents, for upload to a display surface.
    pub fn snapshot(&self) -> Vec<u8> {
        self.data.iter().map(|b| b.load(Ordering::Relaxed)).collect()
    }

    /// The three bytes of pixel `(x, y)`, if it lies inside the frame.
    fn pixel(&self, x: u32, y: u32) -> Option<&[AtomicU8]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = 3 * (y as usize * self.width as usize + x as usize);
        self.data.get(offset..offset + 3)
    }
}
