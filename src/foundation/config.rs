use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::foundation::error::{DrawerError, DrawerResult};

/// Tallest framebuffer the scanline partitioning helpers are sized for.
pub const MAX_SCREEN_HEIGHT: i32 = 8192;

/// Worker count used when the platform cannot report its hardware concurrency.
pub const FALLBACK_THREAD_COUNT: usize = 4;

/// Options controlling [`DrawerPool`](crate::DrawerPool) startup and stall detection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DrawerPoolOpts {
    /// Requested worker count. `None` uses the detected hardware thread count; `Some(0)` and
    /// `Some(1)` both select a single worker.
    pub threads: Option<usize>,
    /// Upper bound for [`DrawerPool::wait_for_completion`](crate::DrawerPool::wait_for_completion).
    pub stall_timeout_ms: u64,
    /// Distribute workers across NUMA nodes when the topology is available.
    pub numa: bool,
    /// Screen height used to derive each NUMA node's scanline band.
    pub screen_height: u32,
    /// Initial debug draw count. `0` disables single-step replay.
    pub debug_draw_count: usize,
}

impl Default for DrawerPoolOpts {
    fn default() -> Self {
        Self {
            threads: None,
            stall_timeout_ms: 5_000,
            numa: true,
            screen_height: 1080,
            debug_draw_count: 0,
        }
    }
}

impl DrawerPoolOpts {
    /// Parse a settings document. Missing keys keep their defaults.
    pub fn from_json_str(s: &str) -> DrawerResult<Self> {
        let opts: Self = serde_json::from_str(s).map_err(|e| DrawerError::serde(e.to_string()))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Reject option combinations the pool cannot run with.
    pub fn validate(&self) -> DrawerResult<()> {
        if self.stall_timeout_ms == 0 {
            return Err(DrawerError::validation("stall_timeout_ms must be >= 1"));
        }
        if self.screen_height == 0 {
            return Err(DrawerError::validation("screen_height must be >= 1"));
        }
        Ok(())
    }

    pub(crate) fn stall_timeout(&self) -> Duration {
        Duration::from_millis(self.stall_timeout_ms)
    }
}

/// Hardware thread count, or [`FALLBACK_THREAD_COUNT`] when the platform does not report one.
pub fn hardware_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(FALLBACK_THREAD_COUNT)
}

/// Map a requested render thread count onto an actual worker count.
pub fn normalize_thread_count(requested: Option<usize>) -> usize {
    match requested {
        None => hardware_concurrency(),
        Some(n) => n.max(1),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/config.rs"]
mod tests;
