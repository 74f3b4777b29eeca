// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::credential::DEFAULT_SITE;

/// Connect a Remotely Save installation to its PRO account.
#[derive(Debug, Parser)]
#[command(name = "rsave-pro", version, about)]
pub struct Config {
    /// Provider site serving the OAuth and PRO endpoints.
    #[arg(long, default_value = DEFAULT_SITE, env = "RSAVE_PRO_SITE")]
    pub site: String,

    /// Settings JSON file holding the `pro` section.
    #[arg(long, env = "RSAVE_PRO_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Plugin version reported to the provider.
    #[arg(long, default_value = env!("CARGO_PKG_VERSION"), env = "RSAVE_PRO_PLUGIN_VERSION")]
    pub plugin_version: String,

    /// Give up on provider requests after this many seconds (no limit if unset).
    #[arg(long, env = "RSAVE_PRO_HTTP_TIMEOUT_SECS")]
    pub http_timeout_secs: Option<u64>,

    /// Log filter (tracing `EnvFilter` syntax).
    #[arg(long, default_value = "warn", env = "RSAVE_PRO_LOG_LEVEL")]
    pub log_level: String,

    /// Log format: `text` or `json`.
    #[arg(long, default_value = "text", env = "RSAVE_PRO_LOG_FORMAT")]
    pub log_format: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, clap::Subcommand)]
pub enum Command {
    /// Print an authorization URL and the PKCE verifier to keep.
    AuthUrl {
        /// Redirect back into Obsidian instead of showing the code.
        #[arg(long)]
        callback: bool,
    },
    /// Exchange an authorization code and download entitlements.
    Connect {
        /// Code shown by the provider after approval.
        #[arg(long)]
        code: String,
        /// Verifier printed by `auth-url`.
        #[arg(long)]
        verifier: String,
    },
    /// Print a valid access token, refreshing it if needed.
    Token,
    /// Re-download and print the entitled features.
    Features,
    /// Re-download and print the account email.
    Profile,
    /// Check that the given features may run with the current settings.
    Check {
        /// Feature names, e.g. `feature-smart_conflict`.
        #[arg(required = true)]
        features: Vec<String>,
    },
    /// Show the stored connection state without contacting the provider.
    Status,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.site.trim().is_empty() {
            anyhow::bail!("--site must not be empty");
        }
        if !self.site.starts_with("http://") && !self.site.starts_with("https://") {
            anyhow::bail!("--site must be an http(s) URL, got {:?}", self.site);
        }
        if self.plugin_version.trim().is_empty() {
            anyhow::bail!("--plugin-version must not be empty");
        }
        match self.log_format.as_str() {
            "text" | "json" => {}
            other => anyhow::bail!("invalid --log-format: {other} (expected text or json)"),
        }
        if self.http_timeout_secs == Some(0) {
            anyhow::bail!("--http-timeout-secs must be positive");
        }
        Ok(())
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs.map(Duration::from_secs)
    }

    /// Explicit `--settings`, else `settings.json` in [`state_dir`].
    pub fn settings_path(&self) -> PathBuf {
        self.settings.clone().unwrap_or_else(|| state_dir().join("settings.json"))
    }
}

/// Resolve the state directory.
///
/// Checks `RSAVE_PRO_STATE_DIR`, then `$XDG_STATE_HOME/rsave-pro`,
/// then `$HOME/.local/state/rsave-pro`.
pub fn state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("RSAVE_PRO_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("rsave-pro");
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".local/state/rsave-pro");
    }
    PathBuf::from(".rsave-pro")
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
