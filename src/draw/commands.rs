//! Solid-color rasterization commands.
//!
//! Every command writes only the scanlines its worker owns, so a batch of them can run on any
//! number of workers against one [`Surface`].

use std::sync::Arc;
use std::sync::atomic::Ordering;

use kurbo::Point;

use crate::draw::surface::Surface;
use crate::foundation::error::{DrawerError, DrawerResult};
use crate::threads::command::DrawCommand;
use crate::threads::context::DrawerThread;

/// Vertical run of `count` pixels starting at `(x, y)`.
#[derive(Debug, Clone)]
pub struct FillColumn {
    /// Destination surface.
    pub dest: Arc<Surface>,
    /// Column.
    pub x: i32,
    /// First scanline.
    pub y: i32,
    /// Number of scanlines.
    pub count: i32,
    /// Packed `0xAARRGGBB` color.
    pub color: u32,
}

impl DrawCommand for FillColumn {
    fn execute(&self, thread: &mut DrawerThread) {
        let count = thread.count_for_thread(self.y, self.count);
        if count <= 0 {
            return;
        }

        let first = self.y + thread.skipped_by_thread(self.y);
        for y in (first..).step_by(thread.num_cores()).take(count as usize) {
            self.dest.put(self.x, y, self.color);
        }
    }
}

/// Horizontal span `x1..x2` on scanline `y`.
#[derive(Debug, Clone)]
pub struct FillSpan {
    /// Destination surface.
    pub dest: Arc<Surface>,
    /// Scanline.
    pub y: i32,
    /// First column.
    pub x1: i32,
    /// One past the last column.
    pub x2: i32,
    /// Packed `0xAARRGGBB` color.
    pub color: u32,
}

impl DrawCommand for FillSpan {
    fn execute(&self, thread: &mut DrawerThread) {
        if thread.line_skipped_by_thread(self.y) {
            return;
        }
        self.dest.fill_span(self.y, self.x1, self.x2, self.color);
    }
}

/// Axis-aligned rectangle `x0..x1` by `y0..y1`.
#[derive(Debug, Clone)]
pub struct FillRect {
    /// Destination surface.
    pub dest: Arc<Surface>,
    /// Left edge (inclusive).
    pub x0: i32,
    /// Top edge (inclusive).
    pub y0: i32,
    /// Right edge (exclusive).
    pub x1: i32,
    /// Bottom edge (exclusive).
    pub y1: i32,
    /// Packed `0xAARRGGBB` color.
    pub color: u32,
}

impl DrawCommand for FillRect {
    fn execute(&self, thread: &mut DrawerThread) {
        let y0 = self.y0.max(0);
        let y1 = self.y1.min(self.dest.height() as i32);
        for y in thread.owned_lines(y0, y1) {
            self.dest.fill_span(y, self.x0, self.x1, self.color);
        }
    }
}

/// Flat-shaded triangle.
///
/// A pixel is covered when its center lies inside the triangle, with the left and top edges
/// inclusive.
#[derive(Debug, Clone)]
pub struct FillTriangle {
    /// Destination surface.
    pub dest: Arc<Surface>,
    /// Vertices in pixel coordinates, any winding.
    pub vertices: [Point; 3],
    /// Packed `0xAARRGGBB` color.
    pub color: u32,
}

impl DrawCommand for FillTriangle {
    fn execute(&self, thread: &mut DrawerThread) {
        let mut v = self.vertices;
        if v.iter().any(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return;
        }
        v.sort_by(|a, b| a.y.total_cmp(&b.y));
        let [top, mid, bottom] = v;

        let height = self.dest.height() as i32;
        let width = self.dest.width() as i32;
        let y0 = pixel_start(top.y).clamp(0, height);
        let y1 = pixel_start(bottom.y).clamp(0, height);

        for y in thread.owned_lines(y0, y1) {
            let cy = y as f64 + 0.5;
            let long = edge_x(top, bottom, cy);
            let short = if cy < mid.y {
                edge_x(top, mid, cy)
            } else {
                edge_x(mid, bottom, cy)
            };
            let (left, right) = if long <= short {
                (long, short)
            } else {
                (short, long)
            };
            let x0 = pixel_start(left).clamp(0, width);
            let x1 = pixel_start(right).clamp(0, width);
            if x0 < x1 {
                self.dest.fill_span(y, x0, x1, self.color);
            }
        }
    }
}

/// First pixel index whose center is at or past `coord`.
fn pixel_start(coord: f64) -> i32 {
    (coord - 0.5).ceil().clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

fn edge_x(a: Point, b: Point, y: f64) -> f64 {
    if b.y == a.y {
        return a.x;
    }
    a.x + (b.x - a.x) * (y - a.y) / (b.y - a.y)
}

/// Copy every owned row of `src` into `dest`.
///
/// Rows are staged through the worker's scratch buffer so the destination is written in one
/// pass per row.
#[derive(Debug, Clone)]
pub struct CopyRows {
    src: Arc<Surface>,
    dest: Arc<Surface>,
}

impl CopyRows {
    /// Copy command between two surfaces of the same size.
    pub fn new(src: Arc<Surface>, dest: Arc<Surface>) -> DrawerResult<Self> {
        if src.width() != dest.width() || src.height() != dest.height() {
            return Err(DrawerError::validation(format!(
                "copy size mismatch: {}x{} -> {}x{}",
                src.width(),
                src.height(),
                dest.width(),
                dest.height()
            )));
        }
        Ok(Self { src, dest })
    }
}

impl DrawCommand for CopyRows {
    fn execute(&self, thread: &mut DrawerThread) {
        let width = self.src.pitch();
        for y in thread.owned_lines(0, self.src.height() as i32) {
            let (Some(src), Some(dest)) = (self.src.row(y), self.dest.row(y)) else {
                continue;
            };
            let staging = thread.scratch_u32(width);
            for (s, px) in staging.iter_mut().zip(src) {
                *s = px.load(Ordering::Relaxed);
            }
            for (px, &s) in dest.iter().zip(staging.iter()) {
                px.store(s, Ordering::Relaxed);
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/draw/commands.rs"]
mod tests;
