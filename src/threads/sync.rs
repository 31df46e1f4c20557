use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// Counting latch for outstanding worker-batch completions.
///
/// The producer adds one task per worker per submitted batch; each worker completes one task when
/// it finishes a batch. Waiters are released when the count reaches zero.
#[derive(Debug, Default)]
pub(crate) struct TaskCounter {
    left: Mutex<usize>,
    zero: Condvar,
}

impl TaskCounter {
    fn lock(&self) -> MutexGuard<'_, usize> {
        self.left.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn add(&self, tasks: usize) {
        *self.lock() += tasks;
    }

    pub(crate) fn complete_one(&self) {
        let mut left = self.lock();
        *left = left.saturating_sub(1);
        if *left == 0 {
            self.zero.notify_all();
        }
    }

    pub(crate) fn left(&self) -> usize {
        *self.lock()
    }

    /// Block until the count is zero. On timeout returns the number of tasks still left.
    pub(crate) fn wait_zero(&self, timeout: Duration) -> Result<(), usize> {
        let deadline = Instant::now() + timeout;
        let mut left = self.lock();
        while *left != 0 {
            let now = Instant::now();
            if now >= deadline {
                return Err(*left);
            }
            let (guard, _) = self
                .zero
                .wait_timeout(left, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            left = guard;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/threads/sync.rs"]
mod tests;
