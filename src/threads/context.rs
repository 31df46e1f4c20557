use crate::foundation::config::MAX_SCREEN_HEIGHT;

/// Per-worker execution context handed to every [`DrawCommand`](crate::DrawCommand).
///
/// A worker owns scanline `y` of the current pass when `y % num_cores == core` and
/// `pass_start_y <= y < pass_end_y`. Commands must restrict their writes to owned scanlines; the
/// helpers below do the arithmetic for a vertical run starting at some first line.
#[derive(Debug)]
pub struct DrawerThread {
    core: i32,
    num_cores: i32,

    pass_start_y: i32,
    pass_end_y: i32,

    numa_node: usize,
    num_numa_nodes: usize,
    numa_start_y: i32,
    numa_end_y: i32,

    scratch: Vec<u32>,
}

impl DrawerThread {
    /// Context for worker `core` of `num_cores`, covering the full pass range.
    ///
    /// Panics if `core >= num_cores`.
    pub fn new(core: usize, num_cores: usize) -> Self {
        assert!(
            core < num_cores,
            "core index {core} out of range for {num_cores} core(s)"
        );
        Self {
            core: core as i32,
            num_cores: num_cores as i32,
            pass_start_y: 0,
            pass_end_y: MAX_SCREEN_HEIGHT,
            numa_node: 0,
            num_numa_nodes: 1,
            numa_start_y: 0,
            numa_end_y: MAX_SCREEN_HEIGHT,
            scratch: Vec::new(),
        }
    }

    pub(crate) fn with_numa_band(
        mut self,
        node: usize,
        num_nodes: usize,
        start_y: i32,
        end_y: i32,
    ) -> Self {
        self.numa_node = node;
        self.num_numa_nodes = num_nodes.max(1);
        self.numa_start_y = start_y;
        self.numa_end_y = end_y;
        self
    }

    /// Restrict the owned scanlines to `start_y..end_y` for the next batch.
    pub fn set_pass(&mut self, start_y: i32, end_y: i32) {
        self.pass_start_y = start_y.max(0);
        self.pass_end_y = end_y.clamp(self.pass_start_y, MAX_SCREEN_HEIGHT);
    }

    /// Zero-based index of this worker.
    pub fn core(&self) -> usize {
        self.core as usize
    }

    /// Number of workers the current batch was dispatched to.
    pub fn num_cores(&self) -> usize {
        self.num_cores as usize
    }

    /// First scanline of the current pass.
    pub fn pass_start_y(&self) -> i32 {
        self.pass_start_y
    }

    /// One past the last scanline of the current pass.
    pub fn pass_end_y(&self) -> i32 {
        self.pass_end_y
    }

    /// NUMA node this worker was placed on (`0` without a topology).
    pub fn numa_node(&self) -> usize {
        self.numa_node
    }

    /// Number of NUMA nodes the pool was spread over.
    pub fn num_numa_nodes(&self) -> usize {
        self.num_numa_nodes
    }

    /// First scanline of this worker's NUMA band.
    pub fn numa_start_y(&self) -> i32 {
        self.numa_start_y
    }

    /// One past the last scanline of this worker's NUMA band.
    pub fn numa_end_y(&self) -> i32 {
        self.numa_end_y
    }

    /// `true` when `line` belongs to another worker or lies outside the pass.
    pub fn line_skipped_by_thread(&self, line: i32) -> bool {
        line < self.pass_start_y
            || line >= self.pass_end_y
            || line.rem_euclid(self.num_cores) != self.core
    }

    /// Lines to skip from `first_line` until the first line this worker owns.
    ///
    /// Saturates at `i32::MAX` when the first owned line is out of reach.
    pub fn skipped_by_thread(&self, first_line: i32) -> i32 {
        self.skip_wide(first_line).min(i32::MAX as i64) as i32
    }

    /// Number of lines this worker owns in the run `first_line..first_line + count`.
    pub fn count_for_thread(&self, first_line: i32, count: i32) -> i32 {
        let n = self.num_cores as i64;
        let count = (count as i64).min(self.pass_end_y as i64 - first_line as i64);
        ((count - self.skip_wide(first_line) + n - 1) / n).max(0) as i32
    }

    fn skip_wide(&self, first_line: i32) -> i64 {
        let n = self.num_cores as i64;
        let first_line = first_line as i64;
        let clip_first_line = first_line.max(self.pass_start_y as i64);
        let core_skip = (n - (clip_first_line - self.core as i64).rem_euclid(n)) % n;
        clip_first_line + core_skip - first_line
    }

    /// Buffer offset of the first owned line of a run starting at `dest` on `first_line`.
    pub fn dest_for_thread(&self, first_line: i32, pitch: usize, dest: usize) -> usize {
        dest + self.skipped_by_thread(first_line).max(0) as usize * pitch
    }

    /// Owned scanlines within `start_y..end_y`, in increasing order.
    pub fn owned_lines(&self, start_y: i32, end_y: i32) -> impl Iterator<Item = i32> + use<> {
        let first = start_y as i64 + self.skip_wide(start_y);
        let end = end_y.min(self.pass_end_y) as i64;
        (first..end.max(first))
            .step_by(self.num_cores as usize)
            .map(|y| y as i32)
    }

    /// Worker-local scratch memory of at least `len` words.
    ///
    /// The buffer is reused across commands and batches; its contents are unspecified on entry.
    pub fn scratch_u32(&mut self, len: usize) -> &mut [u32] {
        if self.scratch.len() < len {
            self.scratch.resize(len, 0);
        }
        &mut self.scratch[..len]
    }
}

#[cfg(test)]
#[path = "../../tests/unit/threads/context.rs"]
mod tests;
