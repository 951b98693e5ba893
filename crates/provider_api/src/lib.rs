use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Numeric identifier of the blockchain network the active account is
/// connected to. `0` is reserved for "no network" on a disconnected session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChainId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    pub chain_id: ChainId,
}

/// Notifications a live provider pushes while a session is connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged { address: String },
    ChainChanged { chain_id: ChainId },
}

/// Raw, vendor-specific provider handle returned by the wallet modal after
/// user approval.
#[async_trait]
pub trait RawProvider: Send + Sync {
    /// Whether this provider kind exposes a remote disconnect call. Must be
    /// checked before invoking `disconnect`.
    fn supports_disconnect(&self) -> bool;
    /// Ask the remote wallet to drop the session. Only meaningful when
    /// `supports_disconnect` returns true.
    async fn disconnect(&self) -> anyhow::Result<()>;
    fn subscribe_events(&self) -> broadcast::Receiver<ProviderEvent>;
}

#[async_trait]
pub trait Signer: Send + Sync {
    async fn address(&self) -> anyhow::Result<String>;
}

/// Normalized wrapper exposing uniform signing/query methods regardless of
/// wallet vendor.
#[async_trait]
pub trait SignerProvider: Send + Sync {
    fn signer(&self) -> Arc<dyn Signer>;
    async fn network(&self) -> anyhow::Result<Network>;
}

/// Wallet-selection collaborator. Prompts the user to pick a wallet and
/// remembers the last successful choice across page reloads.
#[async_trait]
pub trait WalletModal: Send + Sync {
    /// Open the selection prompt and wait for the user. May suspend
    /// indefinitely; rejects when the user cancels or no wallet is present.
    async fn select_and_connect(&self) -> anyhow::Result<Arc<dyn RawProvider>>;
    fn has_cached_session(&self) -> bool;
    /// Forget the cached provider. Idempotent, safe when nothing was cached.
    async fn clear_cached_session(&self) -> anyhow::Result<()>;
}

/// Chain-abstraction collaborator wrapping a raw handle into a
/// signer-capable provider.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    async fn wrap(&self, provider: Arc<dyn RawProvider>)
        -> anyhow::Result<Arc<dyn SignerProvider>>;
}
