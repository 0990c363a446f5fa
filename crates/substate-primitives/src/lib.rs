//! Domain model for the substate store.
//!
//! Entities here are value types: built by a producer, written once,
//! and read many times. None of them hold a reference
//! back to any store.

mod account;
mod destroyed;
mod env;
mod error;
mod hash;
mod message;
mod result;
mod substate;
mod update_set;
mod world_state;

pub use account::Account;
pub use destroyed::DestroyedAccountRecord;
pub use env::Env;
pub use error::{Error, Result, ResultExt};
pub use hash::{Address, Hash, KECCAK_EMPTY};
pub use message::{AccessList, Message};
pub use result::{ExecutionResult, Log};
pub use substate::Substate;
pub use update_set::UpdateSet;
pub use world_state::WorldState;
