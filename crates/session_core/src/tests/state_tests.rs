use super::*;

use async_trait::async_trait;
use provider_api::{Network, ProviderEvent, Signer};
use tokio::sync::broadcast;

struct StubProvider;

#[async_trait]
impl RawProvider for StubProvider {
    fn supports_disconnect(&self) -> bool {
        false
    }

    async fn disconnect(&self) -> anyhow::Result<()> {
        Ok(())
    }

    fn subscribe_events(&self) -> broadcast::Receiver<ProviderEvent> {
        broadcast::channel(1).0.subscribe()
    }
}

struct StubSigner;

#[async_trait]
impl Signer for StubSigner {
    async fn address(&self) -> anyhow::Result<String> {
        Ok(String::new())
    }
}

struct StubSignerProvider;

#[async_trait]
impl SignerProvider for StubSignerProvider {
    fn signer(&self) -> Arc<dyn Signer> {
        Arc::new(StubSigner)
    }

    async fn network(&self) -> anyhow::Result<Network> {
        Ok(Network {
            chain_id: ChainId(0),
        })
    }
}

fn stub_provider() -> Arc<dyn RawProvider> {
    Arc::new(StubProvider)
}

fn stub_signer_provider() -> Arc<dyn SignerProvider> {
    Arc::new(StubSignerProvider)
}

fn connect_action(
    provider: &Arc<dyn RawProvider>,
    signer_provider: &Arc<dyn SignerProvider>,
) -> Action {
    Action::SetProvider {
        provider: Arc::clone(provider),
        signer_provider: Arc::clone(signer_provider),
        address: "0xABC".to_string(),
        chain_id: ChainId(56),
    }
}

fn assert_initial(state: &ConnectionState) {
    assert!(state.provider.is_none());
    assert!(state.signer_provider.is_none());
    assert!(state.address.is_empty());
    assert_eq!(state.chain_id, ChainId(0));
    assert!(!state.is_connected());
}

fn fields_consistent(state: &ConnectionState) -> bool {
    let connected = state.provider.is_some();
    state.signer_provider.is_some() == connected
        && !state.address.is_empty() == connected
        && (state.chain_id.0 != 0) == connected
}

#[test]
fn initial_state_is_the_empty_snapshot() {
    assert_initial(&ConnectionState::default());
}

#[test]
fn set_provider_copies_all_four_fields() {
    let provider = stub_provider();
    let signer_provider = stub_signer_provider();

    let state = reduce(
        &ConnectionState::default(),
        connect_action(&provider, &signer_provider),
    );

    assert!(Arc::ptr_eq(state.provider.as_ref().expect("provider"), &provider));
    assert!(Arc::ptr_eq(
        state.signer_provider.as_ref().expect("signer provider"),
        &signer_provider
    ));
    assert_eq!(state.address, "0xABC");
    assert_eq!(state.chain_id, ChainId(56));
    assert!(state.is_connected());
}

#[test]
fn set_provider_is_idempotent() {
    let provider = stub_provider();
    let signer_provider = stub_signer_provider();

    let once = reduce(
        &ConnectionState::default(),
        connect_action(&provider, &signer_provider),
    );
    let twice = reduce(&once, connect_action(&provider, &signer_provider));

    assert!(Arc::ptr_eq(twice.provider.as_ref().expect("provider"), &provider));
    assert!(Arc::ptr_eq(
        twice.signer_provider.as_ref().expect("signer provider"),
        &signer_provider
    ));
    assert_eq!(twice.address, once.address);
    assert_eq!(twice.chain_id, once.chain_id);
}

#[test]
fn reset_returns_the_initial_snapshot() {
    let connected = reduce(
        &ConnectionState::default(),
        connect_action(&stub_provider(), &stub_signer_provider()),
    );

    assert_initial(&reduce(&connected, Action::ResetProvider));
}

#[test]
fn reset_after_any_action_sequence_equals_initial() {
    let mut state = ConnectionState::default();
    for action in [
        connect_action(&stub_provider(), &stub_signer_provider()),
        Action::SetAddress {
            address: "0xDEF".to_string(),
        },
        Action::SetChainId {
            chain_id: ChainId(137),
        },
        connect_action(&stub_provider(), &stub_signer_provider()),
    ] {
        state = reduce(&state, action);
    }

    assert_initial(&reduce(&state, Action::ResetProvider));
}

#[test]
fn set_address_touches_only_the_address() {
    let provider = stub_provider();
    let signer_provider = stub_signer_provider();
    let connected = reduce(
        &ConnectionState::default(),
        connect_action(&provider, &signer_provider),
    );

    let state = reduce(
        &connected,
        Action::SetAddress {
            address: "0xDEF".to_string(),
        },
    );

    assert_eq!(state.address, "0xDEF");
    assert_eq!(state.chain_id, ChainId(56));
    assert!(Arc::ptr_eq(state.provider.as_ref().expect("provider"), &provider));
    assert!(Arc::ptr_eq(
        state.signer_provider.as_ref().expect("signer provider"),
        &signer_provider
    ));
}

#[test]
fn set_chain_id_touches_only_the_chain_id() {
    let provider = stub_provider();
    let signer_provider = stub_signer_provider();
    let connected = reduce(
        &ConnectionState::default(),
        connect_action(&provider, &signer_provider),
    );

    let state = reduce(
        &connected,
        Action::SetChainId {
            chain_id: ChainId(137),
        },
    );

    assert_eq!(state.chain_id, ChainId(137));
    assert_eq!(state.address, "0xABC");
    assert!(Arc::ptr_eq(state.provider.as_ref().expect("provider"), &provider));
    assert!(Arc::ptr_eq(
        state.signer_provider.as_ref().expect("signer provider"),
        &signer_provider
    ));
}

#[test]
fn provider_transitions_keep_all_four_fields_consistent() {
    let mut state = ConnectionState::default();
    assert!(fields_consistent(&state));

    for action in [
        connect_action(&stub_provider(), &stub_signer_provider()),
        Action::ResetProvider,
        connect_action(&stub_provider(), &stub_signer_provider()),
        connect_action(&stub_provider(), &stub_signer_provider()),
        Action::ResetProvider,
        Action::ResetProvider,
    ] {
        state = reduce(&state, action);
        assert!(fields_consistent(&state));
    }
}
