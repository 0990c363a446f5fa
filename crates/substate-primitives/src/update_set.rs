//! Per-block world-state delta plus the accounts deleted during that
//! block.

use crate::hash::Address;
use crate::world_state::WorldState;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct UpdateSet {
    pub world_state: WorldState,
    pub block: u64,
    pub deleted_accounts: Vec<Address>,
}
