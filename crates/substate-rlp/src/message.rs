//! Wire shapes for `Message`. Three shapes, growing monotonically:
//! Legacy (9 fields) → Berlin (+`access_list`) → Modern (+fee caps,
//! +nil-taggable blob fields; shared by London and Cancun).

use ethereum_types::U256;
use rlp::{Decodable, DecoderError, Encodable, Rlp, RlpStream};
use substate_primitives::{AccessList, Address, Hash, Message};

use crate::convert::{hash_to_u256, u256_to_hash};
use crate::optional::{append_opt, append_opt_list, decode_opt, decode_opt_list};
use crate::traits::{CodeSink, CodeSource};

fn encode_access_list(s: &mut RlpStream, list: &AccessList) {
    s.begin_list(list.len());
    for (addr, keys) in list {
        s.begin_list(2);
        s.append(addr);
        s.append_list(keys);
    }
}

fn decode_access_list(rlp: &Rlp) -> Result<AccessList, DecoderError> {
    let mut out = Vec::with_capacity(rlp.item_count()?);
    for entry in rlp.iter() {
        if entry.item_count()? != 2 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        out.push((entry.val_at(0)?, entry.list_at(1)?));
    }
    Ok(out)
}

/// Fields common to every version, with contract-creation init data
/// already externalised to `init_code_hash`.
struct CommonFields {
    nonce: u64,
    check_nonce: bool,
    gas_price: U256,
    gas: u64,
    from: Address,
    to: Option<Address>,
    value: U256,
    data: Vec<u8>,
    init_code_hash: Option<Hash>,
}

fn split<S: CodeSink>(msg: &Message, sink: &mut S) -> substate_primitives::Result<CommonFields> {
    let (data, init_code_hash) = if msg.to.is_none() {
        (Vec::new(), Some(sink.put_code(&msg.data)?))
    } else {
        (msg.data.clone(), None)
    };
    Ok(CommonFields {
        nonce: msg.nonce,
        check_nonce: msg.check_nonce,
        gas_price: msg.gas_price,
        gas: msg.gas,
        from: msg.from,
        to: msg.to,
        value: msg.value,
        data,
        init_code_hash,
    })
}

/// Resolves the `data` field on the way back in: for a call, the wire
/// value is used as-is; for a contract creation, it is rehydrated from
/// `init_code_hash`, tolerating a missing blob as empty.
fn resolve_data<S: CodeSource>(
    to: Option<Address>,
    data: Vec<u8>,
    init_code_hash: Option<Hash>,
    source: &mut S,
) -> substate_primitives::Result<Vec<u8>> {
    if to.is_some() {
        return Ok(data);
    }
    let hash = init_code_hash.ok_or_else(|| {
        substate_primitives::Error::Corruption(
            "contract-creation message missing init_code_hash".into(),
        )
    })?;
    Ok(source.get_code(hash)?.unwrap_or_default())
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct WireMessageLegacy {
    pub nonce: u64,
    pub check_nonce: bool,
    pub gas_price: U256,
    pub gas: u64,
    pub from: Address,
    pub to: Option<Address>,
    pub value: U256,
    pub data: Vec<u8>,
    pub init_code_hash: Option<Hash>,
}

impl Encodable for WireMessageLegacy {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(9);
        s.append(&self.nonce);
        s.append(&self.check_nonce);
        s.append(&self.gas_price);
        s.append(&self.gas);
        s.append(&self.from);
        append_opt(s, &self.to);
        s.append(&self.value);
        s.append(&self.data);
        append_opt(s, &self.init_code_hash);
    }
}

impl Decodable for WireMessageLegacy {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 9 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(WireMessageLegacy {
            nonce: rlp.val_at(0)?,
            check_nonce: rlp.val_at(1)?,
            gas_price: rlp.val_at(2)?,
            gas: rlp.val_at(3)?,
            from: rlp.val_at(4)?,
            to: decode_opt(&rlp.at(5)?)?,
            value: rlp.val_at(6)?,
            data: rlp.val_at(7)?,
            init_code_hash: decode_opt(&rlp.at(8)?)?,
        })
    }
}

impl WireMessageLegacy {
    pub(crate) fn from_domain<S: CodeSink>(
        msg: &Message,
        sink: &mut S,
    ) -> substate_primitives::Result<Self> {
        let c = split(msg, sink)?;
        Ok(WireMessageLegacy {
            nonce: c.nonce,
            check_nonce: c.check_nonce,
            gas_price: c.gas_price,
            gas: c.gas,
            from: c.from,
            to: c.to,
            value: c.value,
            data: c.data,
            init_code_hash: c.init_code_hash,
        })
    }

    pub(crate) fn into_domain<S: CodeSource>(
        self,
        source: &mut S,
    ) -> substate_primitives::Result<Message> {
        let data = resolve_data(self.to, self.data, self.init_code_hash, source)?;
        Ok(Message {
            nonce: self.nonce,
            check_nonce: self.check_nonce,
            gas_price: self.gas_price,
            gas: self.gas,
            from: self.from,
            to: self.to,
            value: self.value,
            data,
            access_list: Vec::new(),
            gas_fee_cap: self.gas_price,
            gas_tip_cap: self.gas_price,
            blob_gas_fee_cap: None,
            blob_hashes: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct WireMessageBerlin {
    pub nonce: u64,
    pub check_nonce: bool,
    pub gas_price: U256,
    pub gas: u64,
    pub from: Address,
    pub to: Option<Address>,
    pub value: U256,
    pub data: Vec<u8>,
    pub init_code_hash: Option<Hash>,
    pub access_list: AccessList,
}

impl Encodable for WireMessageBerlin {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(10);
        s.append(&self.nonce);
        s.append(&self.check_nonce);
        s.append(&self.gas_price);
        s.append(&self.gas);
        s.append(&self.from);
        append_opt(s, &self.to);
        s.append(&self.value);
        s.append(&self.data);
        append_opt(s, &self.init_code_hash);
        encode_access_list(s, &self.access_list);
    }
}

impl Decodable for WireMessageBerlin {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 10 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(WireMessageBerlin {
            nonce: rlp.val_at(0)?,
            check_nonce: rlp.val_at(1)?,
            gas_price: rlp.val_at(2)?,
            gas: rlp.val_at(3)?,
            from: rlp.val_at(4)?,
            to: decode_opt(&rlp.at(5)?)?,
            value: rlp.val_at(6)?,
            data: rlp.val_at(7)?,
            init_code_hash: decode_opt(&rlp.at(8)?)?,
            access_list: decode_access_list(&rlp.at(9)?)?,
        })
    }
}

impl WireMessageBerlin {
    pub(crate) fn from_domain<S: CodeSink>(
        msg: &Message,
        sink: &mut S,
    ) -> substate_primitives::Result<Self> {
        let c = split(msg, sink)?;
        Ok(WireMessageBerlin {
            nonce: c.nonce,
            check_nonce: c.check_nonce,
            gas_price: c.gas_price,
            gas: c.gas,
            from: c.from,
            to: c.to,
            value: c.value,
            data: c.data,
            init_code_hash: c.init_code_hash,
            access_list: msg.access_list.clone(),
        })
    }

    pub(crate) fn into_domain<S: CodeSource>(
        self,
        source: &mut S,
    ) -> substate_primitives::Result<Message> {
        let data = resolve_data(self.to, self.data, self.init_code_hash, source)?;
        Ok(Message {
            nonce: self.nonce,
            check_nonce: self.check_nonce,
            gas_price: self.gas_price,
            gas: self.gas,
            from: self.from,
            to: self.to,
            value: self.value,
            data,
            access_list: self.access_list,
            gas_fee_cap: self.gas_price,
            gas_tip_cap: self.gas_price,
            blob_gas_fee_cap: None,
            blob_hashes: None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub(crate) struct WireMessageModern {
    pub nonce: u64,
    pub check_nonce: bool,
    pub gas_price: U256,
    pub gas: u64,
    pub from: Address,
    pub to: Option<Address>,
    pub value: U256,
    pub data: Vec<u8>,
    pub init_code_hash: Option<Hash>,
    pub access_list: AccessList,
    pub gas_fee_cap: U256,
    pub gas_tip_cap: U256,
    pub blob_gas_fee_cap: Option<Hash>,
    pub blob_hashes: Option<Vec<Hash>>,
}

impl Encodable for WireMessageModern {
    fn rlp_append(&self, s: &mut RlpStream) {
        s.begin_list(14);
        s.append(&self.nonce);
        s.append(&self.check_nonce);
        s.append(&self.gas_price);
        s.append(&self.gas);
        s.append(&self.from);
        append_opt(s, &self.to);
        s.append(&self.value);
        s.append(&self.data);
        append_opt(s, &self.init_code_hash);
        encode_access_list(s, &self.access_list);
        s.append(&self.gas_fee_cap);
        s.append(&self.gas_tip_cap);
        append_opt(s, &self.blob_gas_fee_cap);
        append_opt_list(s, &self.blob_hashes);
    }
}

impl Decodable for WireMessageModern {
    fn decode(rlp: &Rlp) -> Result<Self, DecoderError> {
        if rlp.item_count()? != 14 {
            return Err(DecoderError::RlpIncorrectListLen);
        }
        Ok(WireMessageModern {
            nonce: rlp.val_at(0)?,
            check_nonce: rlp.val_at(1)?,
            gas_price: rlp.val_at(2)?,
            gas: rlp.val_at(3)?,
            from: rlp.val_at(4)?,
            to: decode_opt(&rlp.at(5)?)?,
            value: rlp.val_at(6)?,
            data: rlp.val_at(7)?,
            init_code_hash: decode_opt(&rlp.at(8)?)?,
            access_list: decode_access_list(&rlp.at(9)?)?,
            gas_fee_cap: rlp.val_at(10)?,
            gas_tip_cap: rlp.val_at(11)?,
            blob_gas_fee_cap: decode_opt(&rlp.at(12)?)?,
            blob_hashes: decode_opt_list(&rlp.at(13)?)?,
        })
    }
}

impl WireMessageModern {
    pub(crate) fn from_domain<S: CodeSink>(
        msg: &Message,
        sink: &mut S,
    ) -> substate_primitives::Result<Self> {
        let c = split(msg, sink)?;
        Ok(WireMessageModern {
            nonce: c.nonce,
            check_nonce: c.check_nonce,
            gas_price: c.gas_price,
            gas: c.gas,
            from: c.from,
            to: c.to,
            value: c.value,
            data: c.data,
            init_code_hash: c.init_code_hash,
            access_list: msg.access_list.clone(),
            gas_fee_cap: msg.gas_fee_cap,
            gas_tip_cap: msg.gas_tip_cap,
            blob_gas_fee_cap: msg.blob_gas_fee_cap.map(u256_to_hash),
            blob_hashes: msg.blob_hashes.clone(),
        })
    }

    pub(crate) fn into_domain<S: CodeSource>(
        self,
        source: &mut S,
    ) -> substate_primitives::Result<Message> {
        let data = resolve_data(self.to, self.data, self.init_code_hash, source)?;
        Ok(Message {
            nonce: self.nonce,
            check_nonce: self.check_nonce,
            gas_price: self.gas_price,
            gas: self.gas,
            from: self.from,
            to: self.to,
            value: self.value,
            data,
            access_list: self.access_list,
            gas_fee_cap: self.gas_fee_cap,
            gas_tip_cap: self.gas_tip_cap,
            blob_gas_fee_cap: self.blob_gas_fee_cap.map(hash_to_u256),
            blob_hashes: self.blob_hashes,
        })
    }
}
