//! Streaming iteration and parallel replay over a substate store.
//! Neither module depends on an EVM or any execution semantics beyond
//! what's already recorded in a `Substate`.

mod iterator;
mod task_pool;

pub use iterator::SubstateIterator;
pub use task_pool::{execute, execute_block, BlockFn, Tally, TaskFn, TaskPoolConfig};
