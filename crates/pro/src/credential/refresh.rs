// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Access token resolution with transparent refresh.

use tracing::{debug, info};

use crate::credential::client::ProClient;
use crate::credential::oauth::TokenResponse;
use crate::credential::persist::set_config_by_successful_auth;
use crate::credential::{epoch_ms, ProConfig, SaveConfig};
use crate::error::ProError;

/// Sent when no refresh token is stored; the provider rejects it.
const PLACEHOLDER_REFRESH_TOKEN: &str = "refresh";

/// Deadline assumed when the config predates deletion tracking.
const UNTRACKED_DELETION_GRACE_MS: u64 = 1_000_000;

/// Whether the stored access token can be used as-is at `now`.
pub fn access_token_is_current(config: &ProConfig, now: u64) -> bool {
    let delete_at = config
        .credentials_should_be_deleted_at_time_ms
        .unwrap_or(now + UNTRACKED_DELETION_GRACE_MS);
    !config.access_token.is_empty() && config.access_token_expires_at_time_ms > now && delete_at > now
}

impl ProClient {
    /// Return a usable access token, refreshing and persisting when the
    /// stored one is expired or past the deletion deadline.
    ///
    /// Every authenticated request goes through here rather than reading
    /// `config.access_token` directly.
    pub async fn access_token(
        &self,
        config: &mut ProConfig,
        save: Option<&dyn SaveConfig>,
    ) -> anyhow::Result<String> {
        if access_token_is_current(config, epoch_ms()) {
            debug!("stored access token is current");
            return Ok(config.access_token.clone());
        }

        let refresh_token = if config.refresh_token.is_empty() {
            PLACEHOLDER_REFRESH_TOKEN
        } else {
            config.refresh_token.as_str()
        };
        info!("access token expired, refreshing");
        let resp = self.refresh(refresh_token).await?;
        if let TokenResponse::Rejected { kind } = resp {
            return Err(ProError::GrantRejected(kind).into());
        }

        set_config_by_successful_auth(config, &resp, save).await?;
        info!("access token refreshed");
        Ok(config.access_token.clone())
    }
}

#[cfg(test)]
#[path = "refresh_tests.rs"]
mod tests;
