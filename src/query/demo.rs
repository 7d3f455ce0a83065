//! The demonstration query submitted by `send-query`.

use alloy::primitives::{address, Address};

use crate::query::builder::QueryBuilder;
use crate::query::types::{FragmentRequest, QueryResult};

/// Uniswap V2 factory.
pub const UNI_V2_FACTORY: Address = address!("0x5C69bEe701ef814a2B6a3EDD4B1652CB9cc5aA6f");

/// An account with non-empty storage slots.
pub const TEST_ACCOUNT: Address = address!("0x8eb3a522cAB99ED365e450Dad696357DE8aB7E9d");

/// Block used when none is given. Must not have been queried with the same
/// fragments before, or the contract rejects the duplicate response hash.
pub const DEFAULT_QUERY_BLOCK: u64 = 9_142_026;

/// Append the demonstration fragments starting at `block_number`.
pub fn example_query(block_number: u64) -> QueryResult<QueryBuilder> {
    let mut qb = QueryBuilder::new();

    // header; header + account; header + account + slots 0 and 1
    qb.append(FragmentRequest::block(block_number))?;
    qb.append(FragmentRequest::block(block_number).with_address(UNI_V2_FACTORY))?;
    qb.append(FragmentRequest::block(block_number).with_address(UNI_V2_FACTORY).with_slot(0u64))?;
    qb.append(FragmentRequest::block(block_number).with_address(UNI_V2_FACTORY).with_slot(1u64))?;

    for i in 0..2 {
        qb.append(FragmentRequest::block(block_number + i).with_address(TEST_ACCOUNT))?;
    }
    for i in 0..2 {
        qb.append(
            FragmentRequest::block(block_number + 2 + i)
                .with_address(TEST_ACCOUNT)
                .with_slot(i),
        )?;
    }

    Ok(qb)
}
