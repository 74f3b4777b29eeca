// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `rsave-pro` subcommands: thin drivers over [`ProClient`].

use std::io::Write;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{Command, Config};
use crate::credential::client::ProClient;
use crate::credential::persist::{set_config_by_successful_auth, JsonSettingsStore};
use crate::credential::refresh::access_token_is_current;
use crate::credential::{epoch_ms, PluginSettings, ProConfig};
use crate::error::ProError;

/// Execute `config.command`, writing results to `out`.
pub async fn run(config: &Config, out: &mut impl Write) -> anyhow::Result<()> {
    let client = match config.http_timeout() {
        Some(timeout) => ProClient::with_timeout(&config.site, timeout)?,
        None => ProClient::new(&config.site),
    };
    let store = JsonSettingsStore::new(config.settings_path());
    let version = config.plugin_version.as_str();

    match &config.command {
        Command::AuthUrl { callback } => {
            let req = client.auth_url(*callback)?;
            write_json(out, &req)
        }
        Command::Connect { code, verifier } => {
            connect(&client, &store, version, code, verifier, out).await
        }
        Command::Token => {
            let mut pro = connected_pro(store.load()?)?;
            let token = client.access_token(&mut pro, Some(&store)).await?;
            writeln!(out, "{token}")?;
            Ok(())
        }
        Command::Features => {
            let mut pro = connected_pro(store.load()?)?;
            let resp = client.fetch_features(&mut pro, version, Some(&store)).await?;
            write_json(out, &resp)
        }
        Command::Profile => {
            let mut pro = connected_pro(store.load()?)?;
            let resp = client.fetch_profile(&mut pro, version, Some(&store)).await?;
            write_json(out, &resp)
        }
        Command::Check { features } => {
            let mut settings = store.load()?;
            let names: Vec<&str> = features.iter().map(String::as_str).collect();
            client.check_pro_runnable(&names, &mut settings, version, Some(&store)).await?;
            writeln!(out, "ok")?;
            Ok(())
        }
        Command::Status => {
            let settings = store.load()?;
            write_json(out, &StatusReport::from_settings(&settings, epoch_ms()))
        }
    }
}

async fn connect(
    client: &ProClient,
    store: &JsonSettingsStore,
    version: &str,
    code: &str,
    verifier: &str,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let on_error = |e: &anyhow::Error| warn!("code exchange failed: {e:#}");
    let resp = client
        .exchange_code(code, verifier, Some(&on_error))
        .await
        .ok_or_else(|| anyhow::anyhow!("could not reach the provider to exchange the code"))?;

    let mut pro = store.load()?.pro.unwrap_or_default();
    set_config_by_successful_auth(&mut pro, &resp, Some(store)).await?;
    client.fetch_features(&mut pro, version, Some(store)).await?;
    client.fetch_profile(&mut pro, version, Some(store)).await?;
    info!(email = %pro.email, features = pro.enabled_pro_features.len(), "account connected");

    write_json(out, &StatusReport::from_pro(&pro, epoch_ms()))
}

fn connected_pro(settings: PluginSettings) -> anyhow::Result<ProConfig> {
    match settings.pro {
        Some(pro) if !pro.refresh_token.is_empty() => Ok(pro),
        _ => Err(ProError::NotConnected.into()),
    }
}

fn write_json(out: &mut impl Write, value: &impl Serialize) -> anyhow::Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}

/// Connection summary printed by `status` and `connect`. Never carries tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub connected: bool,
    pub email: String,
    pub access_token_current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token_expires_in_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reauthorize_in_secs: Option<u64>,
    pub features: Vec<String>,
}

impl StatusReport {
    pub fn from_settings(settings: &PluginSettings, now: u64) -> Self {
        match settings.pro {
            Some(ref pro) => Self::from_pro(pro, now),
            None => Self::from_pro(&ProConfig::default(), now),
        }
    }

    pub fn from_pro(pro: &ProConfig, now: u64) -> Self {
        let secs_until = |at: u64| (at > now).then(|| (at - now) / 1000);
        Self {
            connected: !pro.refresh_token.is_empty(),
            email: pro.email.clone(),
            access_token_current: access_token_is_current(pro, now),
            access_token_expires_in_secs: secs_until(pro.access_token_expires_at_time_ms),
            reauthorize_in_secs: pro.credentials_should_be_deleted_at_time_ms.and_then(secs_until),
            features: pro.enabled_pro_features.iter().map(|f| f.feature_name.clone()).collect(),
        }
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod tests;
