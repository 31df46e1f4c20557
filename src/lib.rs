//! drawpool runs software-rasterizer draw commands on a fixed pool of worker threads.
//!
//! A producer records a frame's rasterization work as [`CommandBatch`]es, submits them to a
//! [`DrawerPool`] and waits for completion. Every worker executes every command of a batch; each
//! command restricts itself to the scanlines its worker owns (`y % num_cores == core`), so
//! workers never write the same pixel and the destination needs no locking.
//!
//! # Pieces
//!
//! - [`DrawerPool`]: worker lifecycle, batch dispatch, stall detection, debug replay.
//! - [`DrawerThread`]: per-worker context with the scanline partitioning helpers.
//! - [`DrawCommand`]: the trait rasterization commands implement. Closures taking
//!   `&mut DrawerThread` implement it too.
//! - [`GroupBarrier`]: synchronizes all workers inside a batch.
//! - [`NumaTopology`]: optional worker placement across memory nodes.
//! - [`Surface`] and the bundled fill commands: a shared framebuffer and solid-color drawers.
//!
//! # Constraints
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Fail fast on stalls**: [`DrawerPool::wait_for_completion`] returns
//!   [`DrawerError::Stalled`] instead of hanging; hosts decide whether to abort.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod draw;
mod foundation;
mod threads;

pub use crate::draw::commands::{CopyRows, FillColumn, FillRect, FillSpan, FillTriangle};
pub use crate::draw::surface::{Surface, rgb};
pub use crate::foundation::config::{
    DrawerPoolOpts, FALLBACK_THREAD_COUNT, MAX_SCREEN_HEIGHT, hardware_concurrency,
    normalize_thread_count,
};
pub use crate::foundation::error::{DrawerError, DrawerResult};
pub use crate::threads::barrier::GroupBarrier;
pub use crate::threads::command::{CommandBatch, DrawCommand};
pub use crate::threads::context::DrawerThread;
pub use crate::threads::numa::{NoNuma, NumaTopology, SysfsNuma, parse_cpulist};
pub use crate::threads::pool::DrawerPool;
pub use crate::threads::worker::WorkerInfo;
