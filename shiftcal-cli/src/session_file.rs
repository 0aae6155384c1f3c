//! The CLI's stored session at ~/.config/shiftcal/session.toml

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use shiftcal_core::config::ShiftcalConfig;
use shiftcal_core::session::{AuthState, Session, Subscription};

pub fn default_path() -> Result<PathBuf> {
    Ok(ShiftcalConfig::config_dir()?.join("session.toml"))
}

pub fn load(path: &Path) -> Result<Option<Session>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;

    match toml::from_str(&content) {
        Ok(session) => Ok(Some(session)),
        Err(e) => {
            tracing::warn!("Ignoring unreadable session file {}: {e}", path.display());
            Ok(None)
        }
    }
}

pub fn save(path: &Path, session: &Session) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(session)?;
    std::fs::write(path, content)?;

    // Tokens: owner-only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

pub fn clear(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}

/// Write the session to `path` whenever `auth` changes, remove it on sign-out.
pub fn keep_in_sync(auth: &AuthState, path: PathBuf) -> Subscription {
    auth.subscribe(move |session| {
        let result = match session {
            Some(session) => save(&path, session),
            None => clear(&path),
        };
        if let Err(e) = result {
            tracing::warn!("Could not update {}: {e:#}", path.display());
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use shiftcal_core::UserId;

    fn session() -> Session {
        Session {
            user_id: UserId::new("user-1"),
            email: Some("nurse@example.com".into()),
            access_token: "access".into(),
            refresh_token: Some("refresh".into()),
            expires_at: Some(Utc.with_ymd_and_hms(2030, 1, 1, 12, 0, 0).unwrap()),
        }
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shiftcal/session.toml");

        save(&path, &session()).unwrap();
        assert_eq!(load(&path).unwrap(), Some(session()));
    }

    #[test]
    fn missing_or_garbled_file_means_signed_out() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        assert_eq!(load(&path).unwrap(), None);

        std::fs::write(&path, "not = [valid").unwrap();
        assert_eq!(load(&path).unwrap(), None);
    }

    #[test]
    fn file_follows_auth_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        let auth = AuthState::new();
        let _sync = keep_in_sync(&auth, path.clone());

        auth.set_session(Some(session()));
        assert!(path.exists());

        auth.set_session(None);
        assert!(!path.exists());
    }

    #[test]
    fn dropped_subscription_stops_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.toml");
        let auth = AuthState::new();

        drop(keep_in_sync(&auth, path.clone()));
        auth.set_session(Some(session()));
        assert!(!path.exists());
    }
}
