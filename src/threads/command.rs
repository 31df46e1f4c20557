use crate::foundation::config::MAX_SCREEN_HEIGHT;
use crate::threads::context::DrawerThread;

/// A unit of rasterization work executed by every worker of a batch.
///
/// `execute` runs once per worker, concurrently, with each worker's own [`DrawerThread`]. An
/// implementation must only write the destination scanlines the context says it owns; the pool
/// never splits a command on its own.
pub trait DrawCommand: Send + Sync {
    /// Run this worker's share of the command.
    fn execute(&self, thread: &mut DrawerThread);
}

impl<F> DrawCommand for F
where
    F: Fn(&mut DrawerThread) + Send + Sync,
{
    fn execute(&self, thread: &mut DrawerThread) {
        self(thread)
    }
}

/// Ordered list of commands submitted together.
///
/// Built by a single producer. Once handed to [`DrawerPool::submit`](crate::DrawerPool::submit)
/// the batch is shared read-only by all workers and dropped on the producer thread when the
/// frame completes.
pub struct CommandBatch {
    commands: Vec<Box<dyn DrawCommand>>,
    pass_start_y: i32,
    pass_end_y: i32,
}

impl Default for CommandBatch {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CommandBatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandBatch")
            .field("len", &self.commands.len())
            .field("pass_start_y", &self.pass_start_y)
            .field("pass_end_y", &self.pass_end_y)
            .finish()
    }
}

impl CommandBatch {
    /// Empty batch covering every scanline.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Empty batch with room for `capacity` commands.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
            pass_start_y: 0,
            pass_end_y: MAX_SCREEN_HEIGHT,
        }
    }

    /// Limit the scanlines workers own while executing this batch.
    pub fn with_pass(mut self, start_y: i32, end_y: i32) -> Self {
        self.pass_start_y = start_y;
        self.pass_end_y = end_y;
        self
    }

    /// Append a command.
    pub fn push(&mut self, command: impl DrawCommand + 'static) {
        self.commands.push(Box::new(command));
    }

    /// Append an already boxed command.
    pub fn push_boxed(&mut self, command: Box<dyn DrawCommand>) {
        self.commands.push(command);
    }

    /// Number of recorded commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// `true` when no command has been recorded.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Pass range as `(start_y, end_y)`.
    pub fn pass(&self) -> (i32, i32) {
        (self.pass_start_y, self.pass_end_y)
    }

    pub(crate) fn commands(&self) -> impl Iterator<Item = &dyn DrawCommand> {
        self.commands.iter().map(|c| c.as_ref())
    }
}
