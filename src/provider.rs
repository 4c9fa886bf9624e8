//! Wallet-backed provider construction.
//!
//! ```text
//! ClientConfig ──connect()──► ProviderBuilder
//!                              ├── gas, simple nonce, chain id fillers
//!                              ├── WalletFiller<EthereumWallet>
//!                              └── HTTP transport
//!                             ──► DynProvider (type-erased)
//! ```

use std::time::Duration;

use alloy::{
    network::{Ethereum, EthereumWallet},
    providers::{DynProvider, Provider, ProviderBuilder},
    signers::local::PrivateKeySigner,
};

use crate::ext::RetryConfig;

/// Provider type used by [`PolicyClient`](crate::ext::PolicyClient).
pub type WalletProvider = DynProvider<Ethereum>;

/// Connection and retry settings for a policy client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub rpc_url: String,
    /// Expected chain id; `connect` fails on mismatch when set
    pub chain_id: Option<u64>,
    /// Receipt polling interval override
    pub poll_interval: Option<Duration>,
    pub retry: RetryConfig,
}

impl ClientConfig {
    pub fn new(rpc_url: impl Into<String>) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            chain_id: None,
            poll_interval: None,
            retry: RetryConfig::default(),
        }
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.chain_id = Some(chain_id);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }
}

/// Build an HTTP provider that signs with `signer`.
pub async fn connect(config: &ClientConfig, signer: PrivateKeySigner) -> anyhow::Result<WalletProvider> {
    let from = signer.address();
    // nonce is read per fill; a fill that fails at gas estimation consumes none
    let provider = ProviderBuilder::new()
        .disable_recommended_fillers()
        .with_gas_estimation()
        .with_simple_nonce_management()
        .fetch_chain_id()
        .wallet(EthereumWallet::new(signer))
        .connect_http(config.rpc_url.parse()?);

    if let Some(interval) = config.poll_interval {
        provider.client().set_poll_interval(interval);
    }

    let chain_id = provider.get_chain_id().await?;
    if let Some(expected) = config.chain_id {
        if expected != chain_id {
            anyhow::bail!("connected to chain {chain_id}, expected {expected}");
        }
    }

    tracing::info!(rpc_url = %config.rpc_url, chain_id, %from, "connected provider");
    Ok(provider.erased())
}
