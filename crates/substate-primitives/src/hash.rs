//! 20-byte addresses and 32-byte hashes.
//!
//! Thin newtypes over `ethereum_types::{H160, H256}` so ordering, hex
//! rendering and RLP encode/decode all come from that crate, rather
//! than hand-rolling fixed-size byte wrappers.

use std::fmt;
use std::str::FromStr;

use ethereum_types::{H160, H256};
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};

#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub H160);

#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Hash(pub H256);

/// keccak256(b"") — the well-known empty-code hash.
pub const KECCAK_EMPTY: Hash = Hash(H256([
    0xc5, 0xd2, 0x46, 0x01, 0x86, 0xf7, 0x23, 0x3c, 0x92, 0x7e, 0x7d, 0xb2, 0xdc, 0xc7, 0x03, 0xc0,
    0xe5, 0x00, 0xb6, 0x53, 0xca, 0x82, 0x27, 0x3b, 0x7b, 0xfa, 0xd8, 0x04, 0x5d, 0x85, 0xa4, 0x70,
]));

impl Address {
    pub const LEN: usize = 20;

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn from_slice(bytes: &[u8]) -> Self {
        Address(H160::from_slice(bytes))
    }
}

impl Hash {
    pub const LEN: usize = 32;

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn from_slice(bytes: &[u8]) -> Self {
        Hash(H256::from_slice(bytes))
    }

    pub fn keccak256(data: &[u8]) -> Self {
        Hash(keccak_hash::keccak(data))
    }
}

impl From<H160> for Address {
    fn from(h: H160) -> Self {
        Address(h)
    }
}

impl From<Address> for H160 {
    fn from(a: Address) -> Self {
        a.0
    }
}

impl From<H256> for Hash {
    fn from(h: H256) -> Self {
        Hash(h)
    }
}

impl From<Hash> for H256 {
    fn from(h: Hash) -> Self {
        h.0
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.as_bytes()))
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0.as_bytes()))
    }
}

impl FromStr for Address {
    type Err = rustc_hex_like::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        rustc_hex_like::parse_fixed(s, Self::LEN).map(|b| Address::from_slice(&b))
    }
}

impl FromStr for Hash {
    type Err = rustc_hex_like::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        rustc_hex_like::parse_fixed(s, Self::LEN).map(|b| Hash::from_slice(&b))
    }
}

impl Encodable for Address {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.encoder().encode_value(self.0.as_bytes());
    }
}

impl Decodable for Address {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        rlp.decoder()
            .decode_value(|bytes| match bytes.len() {
                Self::LEN => Ok(Address::from_slice(bytes)),
                _ => Err(DecoderError::RlpInvalidLength),
            })
    }
}

impl Encodable for Hash {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.encoder().encode_value(self.0.as_bytes());
    }
}

impl Decodable for Hash {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        rlp.decoder()
            .decode_value(|bytes| match bytes.len() {
                Self::LEN => Ok(Hash::from_slice(bytes)),
                _ => Err(DecoderError::RlpInvalidLength),
            })
    }
}

/// Minimal fixed-length hex parsing, kept local so this crate does not
/// need to pull in `rustc-hex` just for `FromStr`.
mod rustc_hex_like {
    use std::fmt;

    #[derive(Debug)]
    pub struct FromHexError(pub String);

    impl fmt::Display for FromHexError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "invalid hex: {}", self.0)
        }
    }

    impl std::error::Error for FromHexError {}

    pub fn parse_fixed(s: &str, len: usize) -> Result<Vec<u8>, FromHexError> {
        let s = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(s).map_err(|e| FromHexError(e.to_string()))?;
        if bytes.len() != len {
            return Err(FromHexError(format!(
                "expected {len} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_empty_matches_well_known_constant() {
        assert_eq!(Hash::keccak256(&[]), KECCAK_EMPTY);
    }

    #[test]
    fn address_round_trips_through_display_and_from_str() {
        let a = Address::from_slice(&[0xAB; 20]);
        let s = a.to_string();
        assert_eq!(s.parse::<Address>().unwrap(), a);
    }

    #[test]
    fn ordering_is_lexicographic_over_raw_bytes() {
        let a = Address::from_slice(&[0x00; 20]);
        let b = Address::from_slice(&[0x01; 20]);
        assert!(a < b);
    }
}
