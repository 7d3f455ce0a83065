//! Configuration schema definitions.
//!
//! All types derive Serde traits so a TOML file can provide any field;
//! environment variables are layered on top by the loader.

use serde::{Deserialize, Serialize};

/// Local node endpoint used when `PROVIDER_URI` is absent or empty.
pub const DEFAULT_PROVIDER_URI: &str = "http://127.0.0.1:8545";

/// Goerli.
pub const DEFAULT_CHAIN_ID: u64 = 5;

/// `AxiomV1Query` deployment on Goerli.
pub const DEFAULT_QUERY_ADDRESS: &str = "0x4Fb202140c5319106F15706b1A69E441c9536306";

/// 0.01 ether.
pub const DEFAULT_QUERY_FEE_WEI: u64 = 10_000_000_000_000_000;

pub const DEFAULT_GAS_PRICE_GWEI: u64 = 100;

/// Root configuration, immutable once loaded.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct QueryConfig {
    /// JSON-RPC endpoint URL.
    pub provider_uri: String,

    /// Chain ID the provider is expected to serve.
    pub chain_id: u64,

    /// Queries are fulfilled by the mock prover.
    pub mock: bool,

    /// Hex-encoded signing key. Selects the programmatic signer when present.
    #[serde(skip_serializing)]
    pub private_key: Option<String>,

    /// Wallet bridge endpoint for interactive signing. Falls back to `provider_uri`.
    pub wallet_bridge_uri: Option<String>,

    /// Address of the `AxiomV1Query` contract.
    pub query_address: String,

    /// Value attached to `sendQuery`, in wei.
    pub query_fee_wei: u64,

    /// Legacy gas price for `sendQuery`, in gwei.
    pub gas_price_gwei: u64,
}

impl QueryConfig {
    /// Endpoint the interactive signer talks to.
    pub fn wallet_bridge_uri(&self) -> &str {
        self.wallet_bridge_uri.as_deref().unwrap_or(&self.provider_uri)
    }

    pub fn gas_price_wei(&self) -> u128 {
        self.gas_price_gwei as u128 * 1_000_000_000
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            provider_uri: DEFAULT_PROVIDER_URI.to_string(),
            chain_id: DEFAULT_CHAIN_ID,
            mock: true,
            private_key: None,
            wallet_bridge_uri: None,
            query_address: DEFAULT_QUERY_ADDRESS.to_string(),
            query_fee_wei: DEFAULT_QUERY_FEE_WEI,
            gas_price_gwei: DEFAULT_GAS_PRICE_GWEI,
        }
    }
}

impl std::fmt::Debug for QueryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryConfig")
            .field("provider_uri", &self.provider_uri)
            .field("chain_id", &self.chain_id)
            .field("mock", &self.mock)
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("wallet_bridge_uri", &self.wallet_bridge_uri)
            .field("query_address", &self.query_address)
            .field("query_fee_wei", &self.query_fee_wei)
            .field("gas_price_gwei", &self.gas_price_gwei)
            .finish()
    }
}
