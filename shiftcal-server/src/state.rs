use std::sync::Arc;

use anyhow::Result;
use shiftcal_core::backend::BackendClient;
use shiftcal_core::config::{ShiftcalConfig, StoreKind};
use shiftcal_core::ics::IcsOptions;
use shiftcal_core::identity::{Identity, RemoteIdentity, StaticIdentity};
use shiftcal_core::store::{MemoryStore, RestStore, Store};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
    pub identity: Arc<Identity>,
    pub ics: Arc<IcsOptions>,
}

impl AppState {
    pub fn new(store: Store, identity: Identity, ics: IcsOptions) -> Self {
        AppState {
            store: Arc::new(store),
            identity: Arc::new(identity),
            ics: Arc::new(ics),
        }
    }

    /// Build the store and identity provider the config asks for.
    ///
    /// With a backend configured, tokens are checked against its auth
    /// service; otherwise only the configured dev tokens are accepted.
    pub fn from_config(config: &ShiftcalConfig) -> Result<Self> {
        let client = match config.backend_url {
            Some(_) => Some(BackendClient::from_config(config)?),
            None => None,
        };

        let store = match (config.store, &client) {
            (StoreKind::Rest, Some(client)) => Store::Rest(RestStore::new(client.clone())),
            (StoreKind::Rest, None) => anyhow::bail!("store = \"rest\" needs backend_url"),
            (StoreKind::Memory, _) => {
                tracing::warn!("using in-memory store; shifts are lost on restart");
                Store::Memory(MemoryStore::new())
            }
        };

        let identity = match client {
            Some(client) => Identity::Remote(RemoteIdentity::new(client)),
            None => {
                if config.dev_tokens.is_empty() {
                    tracing::warn!("no backend and no dev_tokens configured; every request will be rejected");
                }
                Identity::Static(StaticIdentity::new(config.dev_tokens()))
            }
        };

        Ok(AppState::new(store, identity, config.ics_options()?))
    }
}
