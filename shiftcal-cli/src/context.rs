//! Everything a command needs: config, backend client and the signed-in session.

use std::path::Path;

use anyhow::{Context as _, Result, anyhow};
use shiftcal_core::Principal;
use shiftcal_core::backend::BackendClient;
use shiftcal_core::config::ShiftcalConfig;
use shiftcal_core::session::{AuthState, Subscription};
use shiftcal_core::store::RestStore;

use crate::session_file;

pub struct Context {
    pub config: ShiftcalConfig,
    pub auth: AuthState,
    client: Option<BackendClient>,
    // Keeps the session file in step with `auth` for the life of the command
    _session_sync: Subscription,
}

impl Context {
    /// Load config (writing a commented default on first run) and the stored session.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => ShiftcalConfig::load_from(path)?,
            None => {
                let path = ShiftcalConfig::config_path()?;
                if !path.exists() {
                    ShiftcalConfig::create_default_config(&path)?;
                }
                ShiftcalConfig::load_from(&path)?
            }
        };

        let client = match config.backend_url {
            Some(_) => Some(BackendClient::from_config(&config)?),
            None => None,
        };

        let session_path = session_file::default_path()?;
        let auth = AuthState::with_session(session_file::load(&session_path)?);
        let session_sync = session_file::keep_in_sync(&auth, session_path);

        Ok(Context {
            config,
            auth,
            client,
            _session_sync: session_sync,
        })
    }

    pub fn client(&self) -> Result<&BackendClient> {
        self.client.as_ref().ok_or_else(|| {
            anyhow!(
                "No backend configured.\n\n\
                Set backend_url and anon_key in {}",
                ShiftcalConfig::config_path()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|_| "your shiftcal config".into())
            )
        })
    }

    pub fn store(&self) -> Result<RestStore> {
        Ok(RestStore::new(self.client()?.clone()))
    }

    /// The signed-in user, refreshing an expired session when possible.
    pub async fn principal(&self) -> Result<Principal> {
        let session = self.auth.current().ok_or_else(|| {
            anyhow!("Not signed in.\n\nSign in with:\n  shiftcal login --email <you@example.com>")
        })?;

        if !session.is_expired() {
            return Ok(session.principal());
        }

        let refresh_token = session
            .refresh_token
            .as_deref()
            .ok_or_else(|| anyhow!("Session expired. Sign in again with: shiftcal login"))?;

        tracing::debug!("refreshing expired session");
        let refreshed = self
            .client()?
            .refresh_session(refresh_token)
            .await
            .context("Session expired and could not be refreshed. Sign in again with: shiftcal login")?;

        let principal = refreshed.principal();
        self.auth.set_session(Some(refreshed));
        Ok(principal)
    }
}
