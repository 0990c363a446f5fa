//! Wire shape for `Result`/`Log`. Version-invariant.
//!
//! `contract_address` has no optional slot on the wire — absence is
//! the zero address, matching the original encoding's use of a plain
//! (non-pointer) `common.Address` for this field.

use ethereum_types::Bloom;
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use substate_primitives::{Address, ExecutionResult, Hash, Log};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct WireLog {
    pub address: Address,
    pub topics: Vec<Hash>,
    pub data: Vec<u8>,
}

impl Encodable for WireLog {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(3);
        s.append(&self.address);
        s.append_list(&self.topics);
        s.append(&self.data);
    }
}

impl Decodable for WireLog {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 3 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(WireLog {
            address: rlp.val_at(0)?,
            topics: rlp.list_at(1)?,
            data: rlp.val_at(2)?,
        })
    }
}

impl From<&Log> for WireLog {
    fn from(log: &Log) -> Self {
        WireLog {
            address: log.address,
            topics: log.topics.clone(),
            data: log.data.clone(),
        }
    }
}

impl From<WireLog> for Log {
    fn from(wire: WireLog) -> Self {
        Log {
            address: wire.address,
            topics: wire.topics,
            data: wire.data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct WireResult {
    pub status: u64,
    pub bloom: Bloom,
    pub logs: Vec<WireLog>,
    pub contract_address: Address,
    pub gas_used: u64,
}

impl Encodable for WireResult {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(5);
        s.append(&self.status);
        s.append(&self.bloom);
        s.append_list(&self.logs);
        s.append(&self.contract_address);
        s.append(&self.gas_used);
    }
}

impl Decodable for WireResult {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 5 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(WireResult {
            status: rlp.val_at(0)?,
            bloom: rlp.val_at(1)?,
            logs: rlp.list_at(2)?,
            contract_address: rlp.val_at(3)?,
            gas_used: rlp.val_at(4)?,
        })
    }
}

impl From<&ExecutionResult> for WireResult {
    fn from(r: &ExecutionResult) -> Self {
        WireResult {
            status: r.status,
            bloom: r.bloom,
            logs: r.logs.iter().map(WireLog::from).collect(),
            contract_address: r.contract_address.unwrap_or_default(),
            gas_used: r.gas_used,
        }
    }
}

impl From<WireResult> for ExecutionResult {
    fn from(wire: WireResult) -> Self {
        let contract_address = if wire.contract_address.is_zero() {
            None
        } else {
            Some(wire.contract_address)
        };
        ExecutionResult {
            status: wire.status,
            bloom: wire.bloom,
            logs: wire.logs.into_iter().map(Log::from).collect(),
            contract_address,
            gas_used: wire.gas_used,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_without_a_created_contract_round_trips_through_the_zero_address() {
        let r = ExecutionResult {
            status: 1,
            bloom: Bloom::zero(),
            logs: vec![Log {
                address: Address::from_slice(&[9; 20]),
                topics: vec![Hash::keccak256(b"topic")],
                data: vec![1, 2, 3],
            }],
            contract_address: None,
            gas_used: 21_000,
        };
        let wire = WireResult::from(&r);
        assert!(wire.contract_address.is_zero());
        let back = ExecutionResult::from(wire);
        assert_eq!(back, r);
    }
}
