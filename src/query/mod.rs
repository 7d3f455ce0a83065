//! Query assembly and response handling.
//!
//! # Data Flow
//! ```text
//! Submission:
//!     FragmentRequest → builder.rs (validate, append in order)
//!     → codec.rs (encode, queryHash)
//!     → response.rs (collect chain data, block/account/storage trees)
//!     → AssembledQuery { response_hash, query_hash, encoded_query }
//!
//! Witnesses:
//!     tx hash → fetcher.rs (decode sendQuery calldata, rebuild trees)
//!     → witness.rs (storage response + Merkle proof, hex normalization)
//! ```

pub mod builder;
pub mod codec;
pub mod demo;
pub mod fetcher;
pub mod merkle;
pub mod response;
pub mod types;
pub mod witness;

pub use builder::QueryBuilder;
pub use fetcher::fetch_response_tree;
pub use response::ResponseTree;
pub use types::{
    AssembledQuery, FragmentRequest, QueryError, QueryFragment, QueryResult, StorageSlot,
};
pub use witness::{
    normalize_hex, validation_witness, ValidationWitness, WitnessFields, WitnessTarget,
    WitnessValue,
};
