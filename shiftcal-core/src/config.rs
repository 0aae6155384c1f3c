//! shiftcal configuration.
//!
//! Read from `~/.config/shiftcal/config.toml` (when present) and overridden
//! by `SHIFTCAL_*` environment variables, e.g. `SHIFTCAL_BACKEND_URL`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use chrono_tz::Tz;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{ShiftError, ShiftResult};
use crate::ics::IcsOptions;
use crate::shift::UserId;

static DEFAULT_BIND: &str = "127.0.0.1:4096";
static DEFAULT_SERVER_URL: &str = "http://127.0.0.1:4096";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_server_url() -> String {
    DEFAULT_SERVER_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_calendar_name() -> String {
    IcsOptions::default().calendar_name
}

fn default_event_description() -> String {
    IcsOptions::default().description
}

fn default_event_location() -> String {
    IcsOptions::default().location
}

/// Where shifts are kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// In-process store; contents are lost on restart.
    #[default]
    Memory,
    /// The hosted backend's REST interface.
    Rest,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftcalConfig {
    #[serde(default)]
    pub store: StoreKind,

    /// Base URL of the hosted backend, e.g. `https://xyz.supabase.co`.
    pub backend_url: Option<String>,

    /// Public (anon) project key sent with every backend request.
    pub anon_key: Option<String>,

    /// Address the server listens on.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Where the CLI finds the export endpoint.
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// IANA zone name stamped on exported times; floating times when unset.
    pub timezone: Option<String>,

    #[serde(default = "default_calendar_name")]
    pub calendar_name: String,

    #[serde(default = "default_event_description")]
    pub event_description: String,

    #[serde(default = "default_event_location")]
    pub event_location: String,

    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Token -> user id table accepted when no backend is configured.
    #[serde(default)]
    pub dev_tokens: HashMap<String, String>,
}

impl Default for ShiftcalConfig {
    fn default() -> Self {
        ShiftcalConfig {
            store: StoreKind::default(),
            backend_url: None,
            anon_key: None,
            bind: default_bind(),
            server_url: default_server_url(),
            timezone: None,
            calendar_name: default_calendar_name(),
            event_description: default_event_description(),
            event_location: default_event_location(),
            request_timeout_secs: default_timeout_secs(),
            dev_tokens: HashMap::new(),
        }
    }
}

impl ShiftcalConfig {
    /// `<config dir>/shiftcal`
    pub fn config_dir() -> ShiftResult<PathBuf> {
        let dir = dirs::config_dir()
            .ok_or_else(|| ShiftError::Config("Could not determine config directory".into()))?
            .join("shiftcal");
        Ok(dir)
    }

    pub fn config_path() -> ShiftResult<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load from the default config file plus environment.
    pub fn load() -> ShiftResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load from `path` (may be missing) plus environment.
    pub fn load_from(path: &Path) -> ShiftResult<Self> {
        let path = PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned());

        let config: ShiftcalConfig = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix("SHIFTCAL").try_parsing(true))
            .build()
            .map_err(|e| ShiftError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| ShiftError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ShiftResult<()> {
        self.timezone()?;

        if self.store == StoreKind::Rest && (self.backend_url.is_none() || self.anon_key.is_none())
        {
            return Err(ShiftError::Config(
                "store = \"rest\" needs both backend_url and anon_key".into(),
            ));
        }
        Ok(())
    }

    pub fn timezone(&self) -> ShiftResult<Option<Tz>> {
        self.timezone
            .as_deref()
            .map(|name| {
                Tz::from_str(name)
                    .map_err(|_| ShiftError::Config(format!("Unknown timezone '{name}'")))
            })
            .transpose()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn ics_options(&self) -> ShiftResult<IcsOptions> {
        Ok(IcsOptions {
            calendar_name: self.calendar_name.clone(),
            description: self.event_description.clone(),
            location: self.event_location.clone(),
            timezone: self.timezone()?,
        })
    }

    pub fn dev_tokens(&self) -> impl Iterator<Item = (String, UserId)> + '_ {
        self.dev_tokens
            .iter()
            .map(|(token, user)| (token.clone(), UserId::new(user.clone())))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> ShiftResult<()> {
        let contents = format!(
            "\
# shiftcal configuration

# Where shifts are stored: \"memory\" or \"rest\"
# store = \"rest\"

# Hosted backend:
# backend_url = \"https://your-project.supabase.co\"
# anon_key = \"...\"

# Server listen address, and where the CLI reaches it:
# bind = \"{DEFAULT_BIND}\"
# server_url = \"{DEFAULT_SERVER_URL}\"

# Stamp exported times with a timezone instead of floating local time:
# timezone = \"Europe/Oslo\"

# calendar_name = \"Shifts\"
# event_location = \"Work\"
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ShiftError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| ShiftError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
