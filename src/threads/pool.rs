use std::sync::Arc;
use std::sync::atomic::Ordering;

use crate::foundation::config::{DrawerPoolOpts, normalize_thread_count};
use crate::foundation::error::{DrawerError, DrawerResult};
use crate::threads::command::CommandBatch;
use crate::threads::context::DrawerThread;
use crate::threads::numa::{NoNuma, NumaTopology, SysfsNuma, numa_band, plan_placement};
use crate::threads::worker::{Dispatch, WorkerHandle, WorkerInfo, WorkerShared, spawn_worker};

/// Fixed-size pool of drawer threads that executes [`CommandBatch`]es.
///
/// Every submitted batch runs on every worker; each worker executes each command with its own
/// [`DrawerThread`] context. The pool is owned by one producer: submit the batches for a frame,
/// then call [`wait_for_completion`](Self::wait_for_completion) before touching the destination
/// buffers or building the next frame.
///
/// Threads start lazily on the first non-empty submit and are restarted when the configured
/// thread count changes, but only between frames.
pub struct DrawerPool {
    opts: DrawerPoolOpts,
    topology: Arc<dyn NumaTopology>,
    shared: Arc<WorkerShared>,
    workers: Vec<WorkerHandle>,
    in_flight: Vec<Arc<CommandBatch>>,
    frame: u64,
    debug_draw_count: usize,
    last_frame_draw_steps: usize,
}

impl std::fmt::Debug for DrawerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DrawerPool")
            .field("opts", &self.opts)
            .field("workers", &self.workers.len())
            .field("in_flight", &self.in_flight.len())
            .field("frame", &self.frame)
            .finish()
    }
}

impl DrawerPool {
    /// Pool using the machine's NUMA topology when `opts.numa` is set and one is available.
    pub fn new(opts: DrawerPoolOpts) -> DrawerResult<Self> {
        let topology: Arc<dyn NumaTopology> = if opts.numa {
            match SysfsNuma::detect() {
                Some(t) => Arc::new(t),
                None => Arc::new(NoNuma),
            }
        } else {
            Arc::new(NoNuma)
        };
        Self::with_topology(opts, topology)
    }

    /// Pool placing workers according to `topology`.
    pub fn with_topology(
        opts: DrawerPoolOpts,
        topology: Arc<dyn NumaTopology>,
    ) -> DrawerResult<Self> {
        opts.validate()?;
        Ok(Self {
            debug_draw_count: opts.debug_draw_count,
            opts,
            topology,
            shared: Arc::new(WorkerShared::new()),
            workers: Vec::new(),
            in_flight: Vec::new(),
            frame: 0,
            last_frame_draw_steps: 0,
        })
    }

    /// Options the pool was built with, including the current thread request.
    pub fn opts(&self) -> &DrawerPoolOpts {
        &self.opts
    }

    /// Change the requested render thread count. Applied at the next submit that starts a frame.
    pub fn set_render_threads(&mut self, threads: Option<usize>) {
        self.opts.threads = threads;
    }

    /// Number of running workers (`0` before the first submit or after a stop).
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Running workers in core order.
    pub fn workers(&self) -> impl Iterator<Item = WorkerInfo> + '_ {
        self.workers.iter().map(|w| w.info)
    }

    /// Outstanding worker-batch completions.
    pub fn tasks_left(&self) -> usize {
        self.shared.tasks.left()
    }

    /// Batches submitted since the last completed frame.
    pub fn batches_in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Set the debug draw count. `0` runs every command; otherwise each worker stops executing
    /// commands once it has seen that many in the current frame.
    pub fn set_debug_draw_count(&mut self, count: usize) {
        self.debug_draw_count = count;
    }

    /// Current debug draw count.
    pub fn debug_draw_count(&self) -> usize {
        self.debug_draw_count
    }

    /// Commands each worker saw in the last completed frame, counting skipped ones.
    pub fn last_frame_draw_steps(&self) -> usize {
        self.last_frame_draw_steps
    }

    /// Queue `batch` on every worker.
    ///
    /// Empty batches are ignored. Starting a frame (no batch in flight) applies any pending
    /// thread-count change first.
    pub fn submit(&mut self, batch: CommandBatch) -> DrawerResult<()> {
        if batch.is_empty() {
            return Ok(());
        }
        if self.in_flight.is_empty() {
            self.start_threads(normalize_thread_count(self.opts.threads))?;
        }

        let batch = Arc::new(batch);
        self.shared.tasks.add(self.workers.len());
        self.in_flight.push(batch.clone());

        let mut gone = Vec::new();
        for worker in &self.workers {
            let dispatch = Dispatch {
                batch: batch.clone(),
                frame: self.frame,
                debug_draw_count: self.debug_draw_count,
            };
            if worker.tx.send(dispatch).is_err() {
                self.shared.tasks.complete_one();
                gone.push(worker.info.core);
            }
        }
        if !gone.is_empty() {
            return Err(DrawerError::Other(anyhow::anyhow!(
                "drawer thread(s) {gone:?} are no longer running"
            )));
        }
        Ok(())
    }

    /// Block until every submitted batch has run on every worker, then end the frame.
    ///
    /// Returns [`DrawerError::Stalled`] if the workers do not finish within the configured stall
    /// timeout. The in-flight batches are kept in that case; the caller is expected to treat the
    /// stall as fatal. Returns immediately when nothing is in flight.
    pub fn wait_for_completion(&mut self) -> DrawerResult<()> {
        if self.in_flight.is_empty() {
            return Ok(());
        }

        let timeout = self.opts.stall_timeout();
        if let Err(tasks_left) = self.shared.tasks.wait_zero(timeout) {
            tracing::warn!(
                tasks_left,
                batches = self.in_flight.len(),
                workers = self.workers.len(),
                ?timeout,
                "drawer threads did not finish in time"
            );
            return Err(DrawerError::Stalled {
                timeout,
                tasks_left,
                batches_in_flight: self.in_flight.len(),
                workers: self.workers.len(),
            });
        }

        // Workers release their references before completing, so this runs command drops here.
        self.in_flight.clear();
        self.last_frame_draw_steps = self.shared.frame_steps.swap(0, Ordering::Relaxed);
        self.frame = self.frame.wrapping_add(1);

        match self.shared.take_panic() {
            Some(p) => Err(DrawerError::WorkerPanicked {
                core: p.core,
                message: p.message,
            }),
            None => Ok(()),
        }
    }

    /// Ensure exactly `threads` workers are running (values below 1 clamp to 1).
    ///
    /// Does nothing when the pool already has that many workers. Otherwise finishes in-flight
    /// work, joins the current workers and spawns new ones with core indices `0..threads`.
    #[tracing::instrument(skip(self), fields(current = self.workers.len()))]
    pub fn start_threads(&mut self, threads: usize) -> DrawerResult<()> {
        let threads = threads.max(1);
        if self.workers.len() == threads {
            return Ok(());
        }
        self.stop_threads()?;

        let placements = plan_placement(self.topology.as_ref(), threads);
        let num_nodes = match &placements {
            Some(_) => self.topology.node_count(),
            None => 1,
        };

        let mut workers = Vec::with_capacity(threads);
        for core in 0..threads {
            let placement = placements.as_ref().map(|p| p[core]);
            let thread = match placement {
                Some(p) => {
                    let (start_y, end_y) = numa_band(p.node, num_nodes, self.opts.screen_height);
                    DrawerThread::new(core, threads).with_numa_band(
                        p.node, num_nodes, start_y, end_y,
                    )
                }
                None => DrawerThread::new(core, threads),
            };
            match spawn_worker(
                thread,
                self.shared.clone(),
                self.topology.clone(),
                placement,
            ) {
                Ok(handle) => workers.push(handle),
                Err(e) => {
                    self.workers = workers;
                    let _ = self.stop_threads();
                    return Err(e);
                }
            }
        }
        self.workers = workers;

        tracing::info!(
            threads,
            numa_nodes = if placements.is_some() { num_nodes } else { 0 },
            "drawer threads started"
        );
        Ok(())
    }

    /// Finish in-flight work, then join every worker. The pool restarts on the next submit.
    pub fn stop_threads(&mut self) -> DrawerResult<()> {
        let finished = self.wait_for_completion();
        if let Err(e) = &finished
            && e.is_stall()
        {
            return finished;
        }
        if self.workers.is_empty() {
            return finished;
        }

        let workers = std::mem::take(&mut self.workers);
        let count = workers.len();
        for worker in workers {
            // Closing the channel is the shutdown signal.
            drop(worker.tx);
            if worker.join.join().is_err() {
                tracing::error!(core = worker.info.core, "drawer thread panicked on exit");
            }
        }
        tracing::debug!(threads = count, "drawer threads stopped");
        finished
    }
}

impl Drop for DrawerPool {
    fn drop(&mut self) {
        if self.tasks_left() > 0 && self.shared.tasks.wait_zero(self.opts.stall_timeout()).is_err()
        {
            // Joining stuck workers would hang; leave them detached.
            tracing::error!(
                tasks_left = self.tasks_left(),
                "dropping drawer pool with stalled workers"
            );
            for worker in self.workers.drain(..) {
                drop(worker.tx);
            }
            return;
        }
        if let Err(e) = self.stop_threads() {
            tracing::error!(error = %e, "failed to stop drawer threads");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/threads/pool.rs"]
mod tests;
