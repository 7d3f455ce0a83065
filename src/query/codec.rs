//! Binary query encoding.
//!
//! ```text
//! version: u8 | count: u32 | fragment*
//! fragment = level: u8 | block_number: u32 | [address: 20 bytes] | [slot: 32 bytes]
//! ```
//!
//! Integers are big-endian. The address is present for levels 1 and 2, the
//! slot for level 2 only.

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};

use crate::query::types::{FragmentLevel, QueryError, QueryFragment, QueryResult, StorageSlot};

/// Encoding version byte.
pub const QUERY_VERSION: u8 = 1;

/// Encode fragments in order.
pub fn encode_query(fragments: &[QueryFragment]) -> Bytes {
    let mut out = Vec::with_capacity(5 + fragments.len() * 57);
    out.push(QUERY_VERSION);
    out.extend_from_slice(&(fragments.len() as u32).to_be_bytes());

    for fragment in fragments {
        out.push(fragment.level() as u8);
        out.extend_from_slice(&fragment.block_number.to_be_bytes());
        if let Some(address) = fragment.address {
            out.extend_from_slice(address.as_slice());
            if let Some(slot) = fragment.slot {
                out.extend_from_slice(&slot.as_u256().to_be_bytes::<32>());
            }
        }
    }

    out.into()
}

/// `queryHash`: keccak of the encoded query.
pub fn query_hash(encoded: &[u8]) -> B256 {
    keccak256(encoded)
}

/// Decode bytes produced by [`encode_query`].
pub fn decode_query(data: &[u8]) -> QueryResult<Vec<QueryFragment>> {
    let mut reader = Reader { data, pos: 0 };

    let version = reader.take::<1>()?[0];
    if version != QUERY_VERSION {
        return Err(QueryError::Decode(format!("Unsupported query version {}", version)));
    }
    let count = u32::from_be_bytes(reader.take::<4>()?) as usize;

    let mut fragments = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        let level = FragmentLevel::try_from(reader.take::<1>()?[0])?;
        let block_number = u32::from_be_bytes(reader.take::<4>()?);
        let address = match level {
            FragmentLevel::Block => None,
            _ => Some(Address::from(reader.take::<20>()?)),
        };
        let slot = match level {
            FragmentLevel::Storage => Some(StorageSlot(U256::from_be_bytes(reader.take::<32>()?))),
            _ => None,
        };
        fragments.push(QueryFragment {
            block_number,
            address,
            slot,
        });
    }

    if reader.pos != data.len() {
        return Err(QueryError::Decode(format!(
            "{} trailing bytes after {} fragments",
            data.len() - reader.pos,
            count
        )));
    }

    Ok(fragments)
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl Reader<'_> {
    fn take<const N: usize>(&mut self) -> QueryResult<[u8; N]> {
        let end = self.pos + N;
        let bytes = self
            .data
            .get(self.pos..end)
            .ok_or_else(|| QueryError::Decode(format!("Query truncated at byte {}", self.pos)))?;
        self.pos = end;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }
}
