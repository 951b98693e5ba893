use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use provider_api::{
    ChainAdapter, ChainId, ProviderEvent, RawProvider, SignerProvider, WalletModal,
};
use thiserror::Error;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::{info, warn};

pub mod state;

pub use state::{reduce, Action, ConnectionState};

/// Plain-data view of a connected session for observers that do not need
/// the provider handles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub address: String,
    pub chain_id: ChainId,
}

/// Notifications emitted to UI observers after each applied transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Connected with the given snapshot, or disconnected when `None`.
    ConnectionChanged(Option<SessionSnapshot>),
    AddressChanged { address: String },
    ChainChanged { chain_id: ChainId },
}

/// Failures during provider acquisition. Every variant leaves the
/// connection state exactly as it was before the call.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("wallet selection rejected: {0}")]
    Rejected(String),
    #[error("failed to wrap provider handle: {0}")]
    Wrap(String),
    #[error("provider query failed: {0}")]
    ProviderQuery(String),
    #[error("a connect attempt is already in flight")]
    AlreadyConnecting,
}

pub struct MissingWalletModal;

#[async_trait]
impl WalletModal for MissingWalletModal {
    async fn select_and_connect(&self) -> anyhow::Result<Arc<dyn RawProvider>> {
        Err(anyhow!("wallet modal is unavailable"))
    }

    fn has_cached_session(&self) -> bool {
        false
    }

    async fn clear_cached_session(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

pub struct MissingChainAdapter;

#[async_trait]
impl ChainAdapter for MissingChainAdapter {
    async fn wrap(
        &self,
        _provider: Arc<dyn RawProvider>,
    ) -> anyhow::Result<Arc<dyn SignerProvider>> {
        Err(anyhow!("chain adapter is unavailable"))
    }
}

/// Orchestrates the session lifecycle against the wallet-selection and
/// chain-abstraction collaborators and keeps the connection state store
/// consistent with the real external provider.
pub struct SessionController {
    modal: Arc<dyn WalletModal>,
    chain: Arc<dyn ChainAdapter>,
    inner: Mutex<SessionInner>,
    events: broadcast::Sender<SessionEvent>,
}

struct SessionInner {
    state: ConnectionState,
    connecting: bool,
    provider_events_task: Option<JoinHandle<()>>,
}

impl SessionController {
    pub fn new(modal: Arc<dyn WalletModal>, chain: Arc<dyn ChainAdapter>) -> Arc<Self> {
        let (events, _) = broadcast::channel(64);
        Arc::new(Self {
            modal,
            chain,
            inner: Mutex::new(SessionInner {
                state: ConnectionState::default(),
                connecting: false,
                provider_events_task: None,
            }),
            events,
        })
    }

    /// Controller with no wallet surface attached; `connect` always fails
    /// and `disconnect` still resets cleanly.
    pub fn detached() -> Arc<Self> {
        Self::new(Arc::new(MissingWalletModal), Arc::new(MissingChainAdapter))
    }

    /// Read-only snapshot of the current connection state.
    pub async fn snapshot(&self) -> ConnectionState {
        self.inner.lock().await.state.clone()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Run the wallet-selection handshake and install the resulting
    /// provider as one atomic snapshot.
    ///
    /// The selection prompt may suspend indefinitely awaiting the user. On
    /// any failure the state is left untouched; a second call while one is
    /// still suspended is rejected with `AlreadyConnecting`. Connecting
    /// while already connected replaces the snapshot.
    pub async fn connect(self: &Arc<Self>) -> Result<(), ConnectError> {
        {
            let mut guard = self.inner.lock().await;
            if guard.connecting {
                return Err(ConnectError::AlreadyConnecting);
            }
            guard.connecting = true;
        }

        let result = self.connect_inner().await;

        self.inner.lock().await.connecting = false;
        result
    }

    async fn connect_inner(self: &Arc<Self>) -> Result<(), ConnectError> {
        let provider = self
            .modal
            .select_and_connect()
            .await
            .map_err(|err| ConnectError::Rejected(err.to_string()))?;

        let signer_provider = self
            .chain
            .wrap(Arc::clone(&provider))
            .await
            .map_err(|err| ConnectError::Wrap(err.to_string()))?;

        let address = signer_provider
            .signer()
            .address()
            .await
            .map_err(|err| ConnectError::ProviderQuery(err.to_string()))?;

        let network = signer_provider
            .network()
            .await
            .map_err(|err| ConnectError::ProviderQuery(err.to_string()))?;

        info!(
            address = %address,
            chain_id = network.chain_id.0,
            "wallet: provider connected"
        );

        let task = self.spawn_provider_event_task(Arc::clone(&provider));

        let previous_task = {
            let mut guard = self.inner.lock().await;
            let previous_task = guard.provider_events_task.replace(task);
            self.apply_locked(
                &mut guard,
                Action::SetProvider {
                    provider,
                    signer_provider,
                    address,
                    chain_id: network.chain_id,
                },
            );
            previous_task
        };
        if let Some(previous_task) = previous_task {
            previous_task.abort();
        }

        Ok(())
    }

    /// Tear the session down. Remote cleanup is best-effort: cache clear
    /// and provider disconnect failures are logged and swallowed, and the
    /// local state is reset to the initial snapshot regardless.
    pub async fn disconnect(&self) {
        let provider = {
            let guard = self.inner.lock().await;
            guard.state.provider.clone()
        };

        if let Err(err) = self.modal.clear_cached_session().await {
            warn!("wallet: failed to clear cached session: {err}");
        }

        if let Some(provider) = provider {
            if provider.supports_disconnect() {
                if let Err(err) = provider.disconnect().await {
                    warn!("wallet: provider disconnect failed: {err}");
                }
            }
        }

        let task = {
            let mut guard = self.inner.lock().await;
            let task = guard.provider_events_task.take();
            self.apply_locked(&mut guard, Action::ResetProvider);
            task
        };
        if let Some(task) = task {
            task.abort();
        }

        info!("wallet: session reset");
    }

    /// Startup reconnect check. When the wallet modal remembers a provider
    /// from a previous session, runs `connect` with identical semantics;
    /// returns whether a reconnect was attempted.
    pub async fn restore_cached_session(self: &Arc<Self>) -> Result<bool, ConnectError> {
        if !self.modal.has_cached_session() {
            return Ok(false);
        }

        info!("wallet: cached session found, reconnecting");
        self.connect().await?;
        Ok(true)
    }

    fn spawn_provider_event_task(
        self: &Arc<Self>,
        provider: Arc<dyn RawProvider>,
    ) -> JoinHandle<()> {
        let mut events = provider.subscribe_events();
        let controller = Arc::clone(self);
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                match event {
                    ProviderEvent::AccountsChanged { address } => {
                        info!(address = %address, "wallet: account changed");
                        controller.apply(Action::SetAddress { address }).await;
                    }
                    ProviderEvent::ChainChanged { chain_id } => {
                        info!(chain_id = chain_id.0, "wallet: network changed");
                        controller.apply(Action::SetChainId { chain_id }).await;
                    }
                }
            }
        })
    }

    async fn apply(&self, action: Action) {
        let mut guard = self.inner.lock().await;
        self.apply_locked(&mut guard, action);
    }

    fn apply_locked(&self, inner: &mut SessionInner, action: Action) {
        let event = match &action {
            Action::SetProvider {
                address, chain_id, ..
            } => SessionEvent::ConnectionChanged(Some(SessionSnapshot {
                address: address.clone(),
                chain_id: *chain_id,
            })),
            Action::SetAddress { address } => SessionEvent::AddressChanged {
                address: address.clone(),
            },
            Action::SetChainId { chain_id } => SessionEvent::ChainChanged {
                chain_id: *chain_id,
            },
            Action::ResetProvider => SessionEvent::ConnectionChanged(None),
        };
        inner.state = reduce(&inner.state, action);
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
