//! Configuration loading from the environment and, optionally, from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::QueryConfig;

/// JSON-RPC endpoint.
pub const PROVIDER_URI_ENV_VAR: &str = "PROVIDER_URI";
/// Hex-encoded signing key.
pub const PRIVATE_KEY_ENV_VAR: &str = "PRIVATE_KEY";
/// Wallet bridge endpoint for interactive signing.
pub const WALLET_BRIDGE_URI_ENV_VAR: &str = "WALLET_BRIDGE_URI";
/// `AxiomV1Query` contract address override.
pub const QUERY_ADDRESS_ENV_VAR: &str = "AXIOM_QUERY_ADDRESS";

/// Error type for configuration file loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Build configuration from the process environment. Never fails.
pub fn load_from_env() -> QueryConfig {
    from_lookup(QueryConfig::default(), |key| std::env::var(key).ok())
}

/// Load a TOML file, then overlay the process environment.
pub fn load_config(path: &Path) -> Result<QueryConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let base: QueryConfig = toml::from_str(&content)?;
    Ok(from_lookup(base, |key| std::env::var(key).ok()))
}

/// Overlay variables resolved by `lookup` onto `base`.
///
/// Empty values count as unset.
pub fn from_lookup<F>(mut base: QueryConfig, lookup: F) -> QueryConfig
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

    if let Some(uri) = var(PROVIDER_URI_ENV_VAR) {
        base.provider_uri = uri;
    }
    if let Some(key) = var(PRIVATE_KEY_ENV_VAR) {
        base.private_key = Some(key);
    }
    if let Some(uri) = var(WALLET_BRIDGE_URI_ENV_VAR) {
        base.wallet_bridge_uri = Some(uri);
    }
    if let Some(addr) = var(QUERY_ADDRESS_ENV_VAR) {
        base.query_address = addr;
    }

    tracing::debug!(
        provider_uri = %base.provider_uri,
        chain_id = base.chain_id,
        mock = base.mock,
        has_private_key = base.private_key.is_some(),
        "Configuration resolved"
    );

    base
}
