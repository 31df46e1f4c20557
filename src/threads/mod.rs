pub(crate) mod barrier;
pub(crate) mod command;
pub(crate) mod context;
pub(crate) mod numa;
pub(crate) mod pool;
pub(crate) mod sync;
pub(crate) mod worker;
