use std::sync::atomic::{AtomicU32, Ordering};

use crate::foundation::config::MAX_SCREEN_HEIGHT;
use crate::foundation::error::{DrawerError, DrawerResult};

/// Framebuffer shared by every worker of a batch.
///
/// Pixels are `0xAARRGGBB` words stored in atomics so concurrent commands can write through a
/// shared reference. Writes use relaxed ordering; scanline ownership keeps workers on disjoint
/// pixels and the pool's barriers and completion wait publish the results.
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Box<[AtomicU32]>,
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl Surface {
    /// Surface of `width x height` pixels cleared to zero.
    pub fn new(width: u32, height: u32) -> DrawerResult<Self> {
        if width == 0 || height == 0 {
            return Err(DrawerError::validation(format!(
                "surface size must be non-zero, got {width}x{height}"
            )));
        }
        if height > MAX_SCREEN_HEIGHT as u32 {
            return Err(DrawerError::validation(format!(
                "surface height {height} exceeds {MAX_SCREEN_HEIGHT}"
            )));
        }
        let len = (width as usize)
            .checked_mul(height as usize)
            .ok_or_else(|| DrawerError::validation("surface size overflows"))?;
        Ok(Self {
            width,
            height,
            pixels: (0..len).map(|_| AtomicU32::new(0)).collect(),
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Words between the starts of two consecutive rows.
    pub fn pitch(&self) -> usize {
        self.width as usize
    }

    /// Pixels of row `y`, or `None` when `y` is outside the surface.
    pub fn row(&self, y: i32) -> Option<&[AtomicU32]> {
        if y < 0 || y >= self.height as i32 {
            return None;
        }
        let start = y as usize * self.pitch();
        Some(&self.pixels[start..start + self.pitch()])
    }

    /// Pixel at `(x, y)`, or `None` when out of bounds.
    pub fn get(&self, x: i32, y: i32) -> Option<u32> {
        if x < 0 || x >= self.width as i32 {
            return None;
        }
        self.row(y).map(|row| row[x as usize].load(Ordering::Relaxed))
    }

    /// Store `color` at `(x, y)`. Out-of-bounds writes are ignored.
    pub fn put(&self, x: i32, y: i32, color: u32) {
        if x < 0 || x >= self.width as i32 {
            return;
        }
        if let Some(row) = self.row(y) {
            row[x as usize].store(color, Ordering::Relaxed);
        }
    }

    /// Fill `x0..x1` of row `y`, clipped to the surface.
    pub fn fill_span(&self, y: i32, x0: i32, x1: i32, color: u32) {
        let Some(row) = self.row(y) else {
            return;
        };
        let x0 = x0.clamp(0, self.width as i32) as usize;
        let x1 = x1.clamp(0, self.width as i32) as usize;
        for px in row.iter().take(x1).skip(x0) {
            px.store(color, Ordering::Relaxed);
        }
    }

    /// Fill the whole surface. Only call while no batch targeting it is in flight.
    pub fn clear(&self, color: u32) {
        for px in self.pixels.iter() {
            px.store(color, Ordering::Relaxed);
        }
    }

    /// Copy of all pixels in row-major order.
    pub fn snapshot(&self) -> Vec<u32> {
        self.pixels
            .iter()
            .map(|px| px.load(Ordering::Relaxed))
            .collect()
    }

    /// Pixels as straight RGBA8 bytes, suitable for image encoders.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.pixels.len() * 4);
        for px in self.pixels.iter() {
            let [a, r, g, b] = px.load(Ordering::Relaxed).to_be_bytes();
            out.extend_from_slice(&[r, g, b, a]);
        }
        out
    }
}

/// Pack an opaque color as `0xAARRGGBB`.
pub fn rgb(r: u8, g: u8, b: u8) -> u32 {
    u32::from_be_bytes([0xff, r, g, b])
}

#[cfg(test)]
#[path = "../../tests/unit/draw/surface.rs"]
mod tests;
