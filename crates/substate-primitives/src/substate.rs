//! The self-contained record of one transaction's substate.

use crate::env::Env;
use crate::message::Message;
use crate::result::ExecutionResult;
use crate::world_state::WorldState;

/// A self-contained snapshot of the world-state slice a transaction
/// read (`input_state`) and produced (`output_state`), together with
/// the environment, the message, and the execution result. Logically
/// immutable once written.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Substate {
    pub input_state: WorldState,
    pub output_state: WorldState,
    pub env: Env,
    pub message: Message,
    pub result: ExecutionResult,
    pub block: u64,
    pub tx: u32,
}
