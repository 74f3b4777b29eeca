// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Applying grants to the config, and the JSON settings file store.

use std::path::{Path, PathBuf};

use futures_util::future::BoxFuture;
use tracing::{debug, info};

use crate::credential::oauth::TokenResponse;
use crate::credential::{
    duration_ms, epoch_ms, save_with, PluginSettings, ProConfig, SaveConfig, ACCESS_TOKEN_MARGIN,
    CREDENTIALS_TTL,
};
use crate::error::ProError;

/// Apply a successful grant to `config` in place, then persist it.
///
/// A rejected grant leaves `config` untouched and is returned as
/// [`ProError::GrantRejected`].
pub async fn set_config_by_successful_auth(
    config: &mut ProConfig,
    auth: &TokenResponse,
    save: Option<&dyn SaveConfig>,
) -> anyhow::Result<()> {
    let grant = match auth {
        TokenResponse::Granted(grant) => grant,
        TokenResponse::Rejected { kind } => {
            return Err(ProError::GrantRejected(kind.clone()).into());
        }
    };

    let now = epoch_ms();
    let expires_in_ms = grant.expires_in.saturating_mul(1000);
    config.access_token = grant.access_token.clone();
    config.access_token_expires_in_ms = expires_in_ms;
    config.access_token_expires_at_time_ms =
        now.saturating_add(expires_in_ms).saturating_sub(duration_ms(ACCESS_TOKEN_MARGIN));
    if let Some(ref refresh) = grant.refresh_token {
        config.refresh_token = refresh.clone();
    }
    config.credentials_should_be_deleted_at_time_ms =
        Some(now.saturating_add(duration_ms(CREDENTIALS_TTL)));

    debug!(
        expires_in_secs = grant.expires_in,
        rotated_refresh = grant.refresh_token.is_some(),
        "applied token grant"
    );
    save_with(save, config).await
}

/// Host settings stored as a JSON file.
///
/// Saving replaces only the `pro` key, so keys this crate does not model
/// survive a round trip.
#[derive(Debug, Clone)]
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load settings; a missing file yields defaults.
    pub fn load(&self) -> anyhow::Result<PluginSettings> {
        match self.read_value()? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(PluginSettings::default()),
        }
    }

    /// Replace the `pro` key on disk with `config`.
    pub fn save_pro(&self, config: &ProConfig) -> anyhow::Result<()> {
        let mut root = match self.read_value()? {
            Some(serde_json::Value::Object(map)) => map,
            Some(_) => anyhow::bail!("settings file {} is not a JSON object", self.path.display()),
            None => serde_json::Map::new(),
        };
        root.insert("pro".to_owned(), serde_json::to_value(config)?);
        write_atomic(&self.path, &serde_json::Value::Object(root))?;
        debug!(path = %self.path.display(), "persisted pro config");
        Ok(())
    }

    fn read_value(&self) -> anyhow::Result<Option<serde_json::Value>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(path = %self.path.display(), "no settings file yet, using defaults");
                return Ok(None);
            }
            Err(e) => {
                return Err(anyhow::anyhow!("cannot read settings {}: {e}", self.path.display()))
            }
        };
        Ok(Some(serde_json::from_str(&contents)?))
    }
}

impl SaveConfig for JsonSettingsStore {
    fn save<'a>(&'a self, config: &'a ProConfig) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move { self.save_pro(config) })
    }
}

/// Write JSON atomically (unique tmp + rename).
///
/// The tmp name carries PID and a counter so concurrent saves never share a
/// file.
fn write_atomic(path: &Path, value: &serde_json::Value) -> anyhow::Result<()> {
    use std::sync::atomic::{AtomicU32, Ordering};
    static COUNTER: AtomicU32 = AtomicU32::new(0);

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(
        "{}.{}.{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy(),
        std::process::id(),
        seq,
    );
    let tmp_path = path.with_file_name(tmp_name);
    std::fs::write(&tmp_path, json)?;
    if let Err(e) = std::fs::rename(&tmp_path, path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(anyhow::anyhow!("cannot replace {}: {e}", path.display()));
    }
    Ok(())
}

#[cfg(test)]
#[path = "persist_tests.rs"]
mod tests;
