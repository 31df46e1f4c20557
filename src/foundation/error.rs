use std::time::Duration;

/// Convenience result type used across drawpool.
pub type DrawerResult<T> = Result<T, DrawerError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum DrawerError {
    /// Invalid user-provided configuration or command data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Workers did not finish the in-flight batches within the stall timeout.
    ///
    /// The worker threads are still blocked when this is returned. Hosts are expected to treat
    /// it as fatal.
    #[error(
        "drawer threads stalled: {tasks_left} task(s) left across {batches_in_flight} batch(es) \
         on {workers} worker(s) after {timeout:?}"
    )]
    Stalled {
        /// Wait bound that expired.
        timeout: Duration,
        /// Outstanding worker-batch completions at the time of the timeout.
        tasks_left: usize,
        /// Batches submitted since the last successful wait.
        batches_in_flight: usize,
        /// Worker count the batches were dispatched to.
        workers: usize,
    },

    /// A draw command panicked on a worker. The frame completed but its output is incomplete.
    #[error("draw command panicked on drawer thread {core}: {message}")]
    WorkerPanicked {
        /// Core index of the worker that caught the panic.
        core: usize,
        /// Panic payload, when it was a string.
        message: String,
    },

    /// The OS refused to spawn a worker thread.
    #[error("failed to spawn drawer thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// Errors when serializing or deserializing configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DrawerError {
    /// Build a [`DrawerError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`DrawerError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Returns `true` for [`DrawerError::Stalled`].
    pub fn is_stall(&self) -> bool {
        matches!(self, Self::Stalled { .. })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
