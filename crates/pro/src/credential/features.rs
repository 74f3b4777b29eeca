// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Entitlement and profile downloads.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::credential::client::ProClient;
use crate::credential::{save_with, FeatureInfo, ProConfig, SaveConfig, PLUGIN_VERSION_HEADER};

/// `GET /api/v1/pro/list` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProFeaturesResponse {
    pub pro_features: Vec<FeatureInfo>,
}

/// `GET /api/v1/profile/list` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub email: String,
}

impl ProClient {
    /// Download the account's entitled features into `config`.
    pub async fn fetch_features(
        &self,
        config: &mut ProConfig,
        plugin_version: &str,
        save: Option<&dyn SaveConfig>,
    ) -> anyhow::Result<ProFeaturesResponse> {
        let resp: ProFeaturesResponse =
            self.authed_get("/api/v1/pro/list", config, plugin_version, save).await?;
        info!(count = resp.pro_features.len(), "fetched pro features");
        config.enabled_pro_features = resp.pro_features.clone();
        save_with(save, config).await?;
        Ok(resp)
    }

    /// Download the account's profile (email) into `config`.
    pub async fn fetch_profile(
        &self,
        config: &mut ProConfig,
        plugin_version: &str,
        save: Option<&dyn SaveConfig>,
    ) -> anyhow::Result<ProfileResponse> {
        let resp: ProfileResponse =
            self.authed_get("/api/v1/profile/list", config, plugin_version, save).await?;
        config.email = resp.email.clone();
        save_with(save, config).await?;
        Ok(resp)
    }

    async fn authed_get<T: DeserializeOwned>(
        &self,
        path: &str,
        config: &mut ProConfig,
        plugin_version: &str,
        save: Option<&dyn SaveConfig>,
    ) -> anyhow::Result<T> {
        let token = self.access_token(config, save).await?;
        let url = self.endpoint(path);
        debug!(%url, "authenticated GET");
        let resp = self
            .http
            .get(&url)
            .bearer_auth(token)
            .header(PLUGIN_VERSION_HEADER, plugin_version)
            .send()
            .await?
            .error_for_status()?;
        Ok(resp.json().await?)
    }
}

#[cfg(test)]
#[path = "features_tests.rs"]
mod tests;
