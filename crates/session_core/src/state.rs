//! Connection state store: the canonical provider snapshot and the closed
//! set of transitions that may replace it.

use std::sync::Arc;

use provider_api::{ChainId, RawProvider, SignerProvider};

/// Canonical `{provider, signer_provider, address, chain_id}` tuple for one
/// wallet session. The four fields always describe a single connected or
/// disconnected snapshot; a partially-connected state is never stored.
#[derive(Clone, Default)]
pub struct ConnectionState {
    /// Raw wallet provider handle, `None` while disconnected.
    pub provider: Option<Arc<dyn RawProvider>>,
    /// Chain-adapter-wrapped provider, present iff `provider` is present.
    pub signer_provider: Option<Arc<dyn SignerProvider>>,
    /// Active account identifier, empty while disconnected.
    pub address: String,
    /// Active network, `0` while disconnected.
    pub chain_id: ChainId,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        self.signer_provider.is_some()
    }
}

/// Transition requests the store accepts.
///
/// `SetAddress` and `SetChainId` are meant for live provider notifications
/// arriving while already connected; the reducer does not re-check that
/// precondition.
#[derive(Clone)]
pub enum Action {
    /// Replace the entire state with the given values as one snapshot.
    SetProvider {
        provider: Arc<dyn RawProvider>,
        signer_provider: Arc<dyn SignerProvider>,
        address: String,
        chain_id: ChainId,
    },
    /// Replace only the account identifier (account-switch notification).
    SetAddress { address: String },
    /// Replace only the network identifier (network-switch notification).
    SetChainId { chain_id: ChainId },
    /// Replace the entire state with the initial empty snapshot.
    ResetProvider,
}

/// Pure transition function over the closed action set. `SetProvider` and
/// `ResetProvider` replace the whole snapshot; the field setters touch
/// exactly their target field.
pub fn reduce(state: &ConnectionState, action: Action) -> ConnectionState {
    match action {
        Action::SetProvider {
            provider,
            signer_provider,
            address,
            chain_id,
        } => ConnectionState {
            provider: Some(provider),
            signer_provider: Some(signer_provider),
            address,
            chain_id,
        },
        Action::SetAddress { address } => ConnectionState {
            address,
            ..state.clone()
        },
        Action::SetChainId { chain_id } => ConnectionState {
            chain_id,
            ..state.clone()
        },
        Action::ResetProvider => ConnectionState::default(),
    }
}

#[cfg(test)]
#[path = "tests/state_tests.rs"]
mod tests;
