//! The receipt-shaped outcome of executing a transaction.

use ethereum_types::Bloom;

use crate::hash::{Address, Hash};

/// A single `LOG` record, grounded on
/// `crates/ethcore/types/src/log_entry.rs::LogEntry`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<Hash>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecutionResult {
    pub status: u64,
    pub bloom: Bloom,
    pub logs: Vec<Log>,
    pub contract_address: Option<Address>,
    pub gas_used: u64,
}
