use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, mpsc};
use std::thread::{JoinHandle, ThreadId};

use crate::foundation::error::{DrawerError, DrawerResult};
use crate::threads::command::CommandBatch;
use crate::threads::context::DrawerThread;
use crate::threads::numa::{NumaPlacement, NumaTopology};
use crate::threads::sync::TaskCounter;

/// State shared between the pool and all of its workers.
#[derive(Debug, Default)]
pub(crate) struct WorkerShared {
    pub(crate) tasks: TaskCounter,
    /// Highest per-worker command count seen in the current frame.
    pub(crate) frame_steps: AtomicUsize,
    panic: Mutex<Option<WorkerPanic>>,
}

#[derive(Debug, Clone)]
pub(crate) struct WorkerPanic {
    pub(crate) core: usize,
    pub(crate) message: String,
}

impl WorkerShared {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn record_panic(&self, panic: WorkerPanic) {
        let mut slot = self.panic.lock().unwrap_or_else(PoisonError::into_inner);
        slot.get_or_insert(panic);
    }

    pub(crate) fn take_panic(&self) -> Option<WorkerPanic> {
        self.panic
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// One batch handed to one worker.
pub(crate) struct Dispatch {
    pub(crate) batch: Arc<CommandBatch>,
    /// Frame generation the batch belongs to. Debug step counting restarts when it changes.
    pub(crate) frame: u64,
    pub(crate) debug_draw_count: usize,
}

/// Public description of a running worker.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerInfo {
    /// Zero-based core index.
    pub core: usize,
    /// Worker count of the pool generation this worker belongs to.
    pub num_cores: usize,
    /// NUMA node the worker was placed on.
    pub numa_node: usize,
    /// OS thread id.
    pub thread_id: ThreadId,
}

pub(crate) struct WorkerHandle {
    pub(crate) info: WorkerInfo,
    pub(crate) tx: mpsc::Sender<Dispatch>,
    pub(crate) join: JoinHandle<()>,
}

pub(crate) fn spawn_worker(
    thread: DrawerThread,
    shared: Arc<WorkerShared>,
    topology: Arc<dyn NumaTopology>,
    placement: Option<NumaPlacement>,
) -> DrawerResult<WorkerHandle> {
    let core = thread.core();
    let num_cores = thread.num_cores();
    let numa_node = thread.numa_node();
    let (tx, rx) = mpsc::channel::<Dispatch>();

    let join = std::thread::Builder::new()
        .name(format!("drawer-{core}"))
        .spawn(move || {
            if let Some(p) = placement
                && !topology.pin_current_thread(p.node, p.slot)
            {
                tracing::debug!(core, node = p.node, "numa pinning unavailable, running unpinned");
            }
            worker_main(thread, rx, &shared);
        })
        .map_err(DrawerError::Spawn)?;

    Ok(WorkerHandle {
        info: WorkerInfo {
            core,
            num_cores,
            numa_node,
            thread_id: join.thread().id(),
        },
        tx,
        join,
    })
}

/// Worker loop: run batches in submission order until the pool drops its sender.
fn worker_main(mut thread: DrawerThread, rx: mpsc::Receiver<Dispatch>, shared: &WorkerShared) {
    let mut frame = None;
    let mut executed = 0usize;

    while let Ok(dispatch) = rx.recv() {
        if frame != Some(dispatch.frame) {
            frame = Some(dispatch.frame);
            executed = 0;
        }

        let (start_y, end_y) = dispatch.batch.pass();
        thread.set_pass(start_y, end_y);

        run_batch(
            &mut thread,
            &dispatch.batch,
            dispatch.debug_draw_count,
            &mut executed,
            shared,
        );

        shared.frame_steps.fetch_max(executed, Ordering::Relaxed);
        // The producer must hold the last reference once the counter reaches zero.
        drop(dispatch);
        shared.tasks.complete_one();
    }

    tracing::trace!(core = thread.core(), "drawer thread exiting");
}

/// Execute the batch on this worker. A panicking command is recorded and skipped so the worker
/// still reaches any later barrier of the batch.
fn run_batch(
    thread: &mut DrawerThread,
    batch: &CommandBatch,
    debug_draw_count: usize,
    executed: &mut usize,
    shared: &WorkerShared,
) {
    for command in batch.commands() {
        if debug_draw_count == 0 || *executed < debug_draw_count {
            let result = catch_unwind(AssertUnwindSafe(|| command.execute(thread)));
            if let Err(payload) = result {
                let message = panic_message(payload.as_ref());
                tracing::error!(core = thread.core(), %message, "draw command panicked");
                shared.record_panic(WorkerPanic {
                    core: thread.core(),
                    message,
                });
            }
        }
        *executed += 1;
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    }
}
