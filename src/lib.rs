//! Axiom V1 query submission and witness extraction.

pub mod blockchain;
pub mod config;
pub mod flow;
pub mod observability;
pub mod query;
pub mod report;

pub use config::schema::QueryConfig;
