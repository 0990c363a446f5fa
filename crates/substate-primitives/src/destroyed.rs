//! Per-(block, tx) record of self-destructed and resurrected accounts.

use crate::hash::Address;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DestroyedAccountRecord {
    pub destroyed: Vec<Address>,
    pub resurrected: Vec<Address>,
}
