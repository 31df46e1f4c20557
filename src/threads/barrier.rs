use std::sync::{Condvar, Mutex, PoisonError};

use crate::threads::command::DrawCommand;
use crate::threads::context::DrawerThread;

#[derive(Debug, Default)]
struct BarrierState {
    arrived: usize,
    generation: u64,
}

/// Command that holds every worker of a batch until all of them have reached it.
///
/// Writes made before the barrier are visible to every worker after it, which lets a batch run a
/// dependent pass (for example depth first, then color) without a round trip through the
/// producer. The arrival target is the batch's worker count, read from the context, so the
/// barrier stays correct across pool restarts.
#[derive(Debug, Default)]
pub struct GroupBarrier {
    state: Mutex<BarrierState>,
    released: Condvar,
}

impl GroupBarrier {
    /// New barrier with no arrivals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until `parties` callers have arrived in the current generation.
    pub(crate) fn arrive_and_wait(&self, parties: usize) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let generation = state.generation;
        state.arrived += 1;
        if state.arrived >= parties {
            state.arrived = 0;
            state.generation = state.generation.wrapping_add(1);
            self.released.notify_all();
            return;
        }

        while state.generation == generation {
            state = self
                .released
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

impl DrawCommand for GroupBarrier {
    fn execute(&self, thread: &mut DrawerThread) {
        self.arrive_and_wait(thread.num_cores());
    }
}

#[cfg(test)]
#[path = "../../tests/unit/threads/barrier.rs"]
mod tests;
