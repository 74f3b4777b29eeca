// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PRO account credentials: PKCE authorization, token lifecycle, and
//! feature entitlements.
//!
//! The host owns a [`ProConfig`] and hands it to [`client::ProClient`] by
//! `&mut`; every mutation is followed by a call to the optional
//! [`SaveConfig`] hook so the host can persist it.

pub mod client;
pub mod entitlement;
pub mod features;
pub mod oauth;
pub mod persist;
pub mod pkce;
pub mod refresh;

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

/// Default provider site.
pub const DEFAULT_SITE: &str = "https://remotelysave.com";

/// OAuth client identifier, baked in at build time.
pub const CLIENT_ID: &str = match option_env!("RSAVE_PRO_CLIENT_ID") {
    Some(id) => id,
    None => "cli-remotely-save",
};

/// The only scope this client ever requests.
pub const SCOPE: &str = "pro.list.read";

/// Command name the host registers for the `obsidian://` callback.
pub const CALLBACK_COMMAND: &str = "remotely-save-cb-pro";

/// Header carrying the plugin version on authenticated requests.
pub const PLUGIN_VERSION_HEADER: &str = "REMOTELYSAVE-API-Plugin-Ver";

/// Safety margin subtracted from the provider's stated token lifetime.
pub const ACCESS_TOKEN_MARGIN: Duration = Duration::from_secs(5 * 60);

/// Credentials must be re-authorized this long after the last successful auth.
pub const CREDENTIALS_TTL: Duration = Duration::from_secs(80 * 24 * 60 * 60);

/// Cached entitlements expiring further out than this are not trusted.
pub const FEATURE_HORIZON: Duration = Duration::from_secs(40 * 24 * 60 * 60);

/// Persisted PRO account state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProConfig {
    #[serde(default)]
    pub access_token: String,
    #[serde(default)]
    pub access_token_expires_in_ms: u64,
    /// Epoch ms, already shortened by [`ACCESS_TOKEN_MARGIN`].
    #[serde(default)]
    pub access_token_expires_at_time_ms: u64,
    /// Empty when no account is connected.
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials_should_be_deleted_at_time_ms: Option<u64>,
    #[serde(default)]
    pub enabled_pro_features: Vec<FeatureInfo>,
    #[serde(default)]
    pub email: String,
}

/// One entitled feature and when it lapses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureInfo {
    pub feature_name: String,
    #[serde(deserialize_with = "lenient_u64")]
    pub expire_at_time_ms: u64,
}

/// Features the entitlement checker knows how to validate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProFeature {
    SmartConflict,
    GoogleDrive,
}

impl ProFeature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SmartConflict => "feature-smart_conflict",
            Self::GoogleDrive => "feature-google_drive",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "feature-smart_conflict" => Some(Self::SmartConflict),
            "feature-google_drive" => Some(Self::GoogleDrive),
            _ => None,
        }
    }
}

/// How the sync engine resolves conflicting edits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictAction {
    #[default]
    KeepNewer,
    KeepLarger,
    SmartConflict,
    #[serde(other)]
    Unknown,
}

/// Remote storage backend the host syncs against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    #[default]
    S3,
    Webdav,
    Dropbox,
    Onedrive,
    Webdis,
    Googledrive,
    Box,
    Pcloud,
    Yandexdisk,
    Koofr,
    Azureblobstorage,
    #[serde(other)]
    Unknown,
}

/// The slice of host settings the PRO layer reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pro: Option<ProConfig>,
    #[serde(default)]
    pub conflict_action: ConflictAction,
    #[serde(default)]
    pub service_type: ServiceType,
}

/// Persistence hook invoked after every config mutation.
///
/// May be called any number of times; implementations should write the
/// given snapshot wherever the host keeps its settings.
pub trait SaveConfig: Send + Sync {
    fn save<'a>(&'a self, config: &'a ProConfig) -> BoxFuture<'a, anyhow::Result<()>>;
}

/// Run the hook if one was provided.
pub(crate) async fn save_with(
    save: Option<&dyn SaveConfig>,
    config: &ProConfig,
) -> anyhow::Result<()> {
    match save {
        Some(hook) => hook.save(config).await,
        None => Ok(()),
    }
}

/// Milliseconds since the Unix epoch.
pub fn epoch_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

pub(crate) fn duration_ms(d: Duration) -> u64 {
    d.as_millis() as u64
}

/// A JSON number that may arrive as `3600` or `3600.0`.
#[derive(Deserialize)]
#[serde(untagged)]
enum WireNumber {
    Int(u64),
    Float(f64),
}

impl WireNumber {
    fn into_u64<E: serde::de::Error>(self) -> Result<u64, E> {
        match self {
            Self::Int(n) => Ok(n),
            // Fractions truncate; out-of-range values saturate.
            Self::Float(f) if f.is_finite() && f >= 0.0 => Ok(f as u64),
            Self::Float(f) => Err(E::custom(format!("expected a non-negative number, got {f}"))),
        }
    }
}

/// Deserialize a non-negative integer, tolerating a float encoding.
pub(crate) fn lenient_u64<'de, D>(de: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    WireNumber::deserialize(de)?.into_u64()
}

pub(crate) fn lenient_opt_u64<'de, D>(de: D) -> Result<Option<u64>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<WireNumber>::deserialize(de)?.map(WireNumber::into_u64).transpose()
}
