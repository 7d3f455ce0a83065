//! Signer resolution.
//!
//! # Security
//! - Private keys come only from configuration (environment or file)
//! - Keys are never logged or serialized
//!
//! A configured key selects [`SignerStrategy::Programmatic`] and no wallet
//! bridge is ever created. Otherwise the bridge is asked for accounts and the
//! first one signs through it (`eth_sendTransaction`).

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;

use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::config::QueryConfig;

/// An EIP-1193 style wallet connection.
pub trait WalletBridge {
    /// JSON-RPC endpoint that signs for the granted accounts.
    fn endpoint(&self) -> &str;

    /// Ask the wallet for account access.
    fn request_accounts(&self) -> impl Future<Output = BlockchainResult<Vec<Address>>> + Send;

    /// Release account access. Must be safe to call when never connected.
    fn disconnect(&self) -> impl Future<Output = ()> + Send;
}

/// Wallet bridge reached over JSON-RPC (a browser-wallet relay or a node with
/// unlocked accounts).
pub struct RpcWalletBridge {
    endpoint: String,
    provider: DynProvider,
    connected: AtomicBool,
}

impl RpcWalletBridge {
    /// Prepare a bridge. No request is made until accounts are requested.
    pub fn new(endpoint: &str) -> BlockchainResult<Self> {
        let url: url::Url = endpoint.parse().map_err(|e| {
            BlockchainError::Wallet(format!("Invalid wallet bridge URL '{}': {}", endpoint, e))
        })?;
        Ok(Self {
            endpoint: endpoint.to_string(),
            provider: ProviderBuilder::new().connect_http(url).erased(),
            connected: AtomicBool::new(false),
        })
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }
}

impl WalletBridge for RpcWalletBridge {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn request_accounts(&self) -> BlockchainResult<Vec<Address>> {
        let accounts = self
            .provider
            .raw_request::<_, Vec<Address>>("eth_requestAccounts".into(), ())
            .await
            .map_err(|e| BlockchainError::Wallet(format!("eth_requestAccounts failed: {}", e)))?;
        if !accounts.is_empty() {
            self.connected.store(true, Ordering::SeqCst);
        }
        tracing::info!(
            endpoint = %self.endpoint,
            accounts = accounts.len(),
            "Wallet bridge connected"
        );
        Ok(accounts)
    }

    async fn disconnect(&self) {
        if !self.connected.swap(false, Ordering::SeqCst) {
            return;
        }
        let params = (serde_json::json!({ "eth_accounts": {} }),);
        match self
            .provider
            .raw_request::<_, serde_json::Value>("wallet_revokePermissions".into(), params)
            .await
        {
            Ok(_) => tracing::info!(endpoint = %self.endpoint, "Wallet bridge disconnected"),
            Err(e) => tracing::warn!(
                endpoint = %self.endpoint,
                error = %e,
                "Wallet bridge disconnect failed"
            ),
        }
    }
}

impl<B: WalletBridge + Sync> WalletBridge for &B {
    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }

    fn request_accounts(&self) -> impl Future<Output = BlockchainResult<Vec<Address>>> + Send {
        (**self).request_accounts()
    }

    fn disconnect(&self) -> impl Future<Output = ()> + Send {
        (**self).disconnect()
    }
}

/// How the sender is obtained, decided once from configuration.
pub enum SignerStrategy<B> {
    /// Local key, local signing.
    Programmatic(PrivateKeySigner),
    /// Accounts granted by a wallet bridge, remote signing.
    Interactive(B),
}

impl<B: WalletBridge> SignerStrategy<B> {
    /// Pick the strategy. `connect` is only called when no key is configured.
    ///
    /// A key that does not parse is an error, not a fallback to the bridge.
    pub fn select<F>(config: &QueryConfig, connect: F) -> BlockchainResult<Self>
    where
        F: FnOnce() -> BlockchainResult<B>,
    {
        match config.private_key.as_deref() {
            Some(key) => Ok(Self::Programmatic(parse_private_key(key, config.chain_id)?)),
            None => Ok(Self::Interactive(connect()?)),
        }
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::Interactive(_))
    }

    /// Produce the signer for `provider_uri`.
    pub async fn resolve(&self, provider_uri: &str) -> BlockchainResult<ResolvedSigner> {
        match self {
            Self::Programmatic(signer) => {
                let address = signer.address();
                let url = parse_url(provider_uri)?;
                let provider = ProviderBuilder::new()
                    .wallet(EthereumWallet::from(signer.clone()))
                    .connect_http(url)
                    .erased();
                tracing::info!(address = %address, "Using programmatic signer");
                Ok(ResolvedSigner {
                    address,
                    provider,
                    interactive: false,
                })
            }
            Self::Interactive(bridge) => {
                let accounts = bridge
                    .request_accounts()
                    .await
                    .map_err(|e| BlockchainError::NoSignerAvailable(e.to_string()))?;
                let address = accounts.first().copied().ok_or_else(|| {
                    BlockchainError::NoSignerAvailable("wallet granted no accounts".to_string())
                })?;
                let url = parse_url(bridge.endpoint())?;
                let provider = ProviderBuilder::new().connect_http(url).erased();
                tracing::info!(address = %address, "Using wallet bridge signer");
                Ok(ResolvedSigner {
                    address,
                    provider,
                    interactive: true,
                })
            }
        }
    }

    /// Release the wallet bridge, if any.
    pub async fn release(&self) {
        if let Self::Interactive(bridge) = self {
            bridge.disconnect().await;
        }
    }
}

/// A sender address and a provider able to send transactions from it.
#[derive(Clone)]
pub struct ResolvedSigner {
    address: Address,
    provider: DynProvider,
    interactive: bool,
}

impl ResolvedSigner {
    pub fn address(&self) -> Address {
        self.address
    }

    pub fn provider(&self) -> &DynProvider {
        &self.provider
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }
}

impl std::fmt::Debug for ResolvedSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSigner")
            .field("address", &self.address)
            .field("interactive", &self.interactive)
            .finish()
    }
}

/// Parse a hex-encoded private key, with or without `0x`.
pub fn parse_private_key(
    private_key_hex: &str,
    chain_id: u64,
) -> BlockchainResult<PrivateKeySigner> {
    let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);
    let signer: PrivateKeySigner = key_hex
        .parse()
        .map_err(|e| BlockchainError::Wallet(format!("Invalid private key format: {}", e)))?;
    Ok(signer.with_chain_id(Some(chain_id)))
}

fn parse_url(endpoint: &str) -> BlockchainResult<url::Url> {
    endpoint
        .parse()
        .map_err(|e| BlockchainError::Rpc(format!("Invalid RPC URL '{}': {}", endpoint, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    // Well-known test private key (Anvil's first account)
    const TEST_PRIVATE_KEY: &str =
        "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    struct StubBridge {
        accounts: Option<Vec<Address>>,
        requests: AtomicUsize,
    }

    impl StubBridge {
        fn granting(accounts: Vec<Address>) -> Self {
            Self { accounts: Some(accounts), requests: AtomicUsize::new(0) }
        }

        fn rejecting() -> Self {
            Self { accounts: None, requests: AtomicUsize::new(0) }
        }
    }

    impl WalletBridge for StubBridge {
        fn endpoint(&self) -> &str {
            "http://127.0.0.1:1248"
        }

        async fn request_accounts(&self) -> BlockchainResult<Vec<Address>> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            self.accounts
                .clone()
                .ok_or_else(|| BlockchainError::Wallet("User rejected the request".to_string()))
        }

        async fn disconnect(&self) {}
    }

    fn config_with_key(key: Option<&str>) -> QueryConfig {
        QueryConfig {
            private_key: key.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_private_key() {
        let signer = parse_private_key(TEST_PRIVATE_KEY, 5).unwrap();
        assert_eq!(
            signer.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
        assert_eq!(signer.chain_id(), Some(5));

        let prefixed = parse_private_key(&format!("0x{}", TEST_PRIVATE_KEY), 5).unwrap();
        assert_eq!(prefixed.address(), signer.address());
    }

    #[test]
    fn test_invalid_private_key() {
        let result = parse_private_key("invalid_key", 5);
        assert!(result.unwrap_err().to_string().contains("Invalid private key"));
    }

    async fn resolve(
        config: &QueryConfig,
        bridge: &StubBridge,
    ) -> BlockchainResult<ResolvedSigner> {
        SignerStrategy::select(config, || Ok(bridge))?
            .resolve(&config.provider_uri)
            .await
    }

    #[tokio::test]
    async fn test_key_never_touches_bridge() {
        let bridge = StubBridge::granting(vec![Address::repeat_byte(9)]);
        let signer = resolve(&config_with_key(Some(TEST_PRIVATE_KEY)), &bridge)
            .await
            .unwrap();

        assert!(!signer.is_interactive());
        assert_eq!(bridge.requests.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_key_ignores_malformed_bridge_uri() {
        let config = QueryConfig {
            private_key: Some(TEST_PRIVATE_KEY.to_string()),
            wallet_bridge_uri: Some("not a url".to_string()),
            ..Default::default()
        };
        let strategy = SignerStrategy::select(&config, || {
            RpcWalletBridge::new(config.wallet_bridge_uri())
        })
        .unwrap();
        assert!(!strategy.is_interactive());

        let signer = strategy.resolve(&config.provider_uri).await.unwrap();
        assert!(!signer.is_interactive());
        assert_eq!(
            signer.address().to_string().to_lowercase(),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn test_malformed_bridge_uri_without_key() {
        let config = QueryConfig {
            wallet_bridge_uri: Some("not a url".to_string()),
            ..Default::default()
        };
        let result = SignerStrategy::select(&config, || {
            RpcWalletBridge::new(config.wallet_bridge_uri())
        });
        assert!(matches!(result, Err(BlockchainError::Wallet(_))));
    }

    #[tokio::test]
    async fn test_bridge_first_account_wins() {
        let first = Address::repeat_byte(1);
        let bridge = StubBridge::granting(vec![first, Address::repeat_byte(2)]);
        let signer = resolve(&config_with_key(None), &bridge).await.unwrap();

        assert!(signer.is_interactive());
        assert_eq!(signer.address(), first);
        assert_eq!(bridge.requests.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_rejected_bridge_has_no_signer() {
        let bridge = StubBridge::rejecting();
        let err = resolve(&config_with_key(None), &bridge).await.unwrap_err();
        assert!(matches!(err, BlockchainError::NoSignerAvailable(_)));
    }

    #[tokio::test]
    async fn test_empty_account_list_has_no_signer() {
        let bridge = StubBridge::granting(Vec::new());
        let err = resolve(&config_with_key(None), &bridge).await.unwrap_err();
        assert!(matches!(err, BlockchainError::NoSignerAvailable(_)));
    }

    #[tokio::test]
    async fn test_rpc_bridge_disconnect_without_connect() {
        let bridge = RpcWalletBridge::new("http://127.0.0.1:1").unwrap();
        assert!(!bridge.is_connected());
        bridge.disconnect().await;
        assert!(!bridge.is_connected());
    }
}
