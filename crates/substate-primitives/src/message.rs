//! The call or contract-creation message a substate was recorded for.

use ethereum_types::U256;

use crate::hash::{Address, Hash};

/// `(address, storage keys)` pairs touched by a transaction (EIP-2930).
/// Writer-supplied order is preserved; no ordering invariant is placed
/// on it (unlike `storage` and `block_hashes`, which must be sorted for
/// byte-stable encoding).
pub type AccessList = Vec<(Address, Vec<Hash>)>;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    pub nonce: u64,
    pub check_nonce: bool,
    pub gas_price: U256,
    pub gas: u64,
    pub from: Address,
    /// `None` means contract creation; `data` is then the init code.
    pub to: Option<Address>,
    pub value: U256,
    pub data: Vec<u8>,
    pub access_list: AccessList,
    /// `gas_price` if EIP-1559 is not activated.
    pub gas_fee_cap: U256,
    /// `gas_price` if EIP-1559 is not activated.
    pub gas_tip_cap: U256,
    /// Absent pre-Cancun (EIP-4844).
    pub blob_gas_fee_cap: Option<U256>,
    /// Absent pre-Cancun (EIP-4844).
    pub blob_hashes: Option<Vec<Hash>>,
}

impl Message {
    /// `true` when this message is a contract-creation message.
    pub fn is_create(&self) -> bool {
        self.to.is_none()
    }

    /// `keccak256(data)`. Not stored on the struct (unlike the Go
    /// original's private `dataHash` cache) so that `Message` keeps
    /// plain structural equality; the RLP codec memoises it on the
    /// wire as `init_code_hash` when externalising init code.
    pub fn data_hash(&self) -> Hash {
        Hash::keccak256(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_absent_marks_contract_creation() {
        let m = Message {
            to: None,
            data: vec![0x01],
            ..Default::default()
        };
        assert!(m.is_create());
        assert_eq!(m.data_hash(), Hash::keccak256(&[0x01]));
    }
}
