// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gate PRO functionality on the account's entitlements.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::credential::client::ProClient;
use crate::credential::{
    duration_ms, epoch_ms, ConflictAction, FeatureInfo, PluginSettings, ProFeature, SaveConfig,
    ServiceType, FEATURE_HORIZON,
};
use crate::error::ProError;

/// Whether a cached entry must be reconciled with the server: already
/// lapsed, or implausibly far in the future.
pub fn feature_is_stale(feature: &FeatureInfo, now: u64) -> bool {
    feature.expire_at_time_ms <= now
        || feature.expire_at_time_ms >= now + duration_ms(FEATURE_HORIZON)
}

/// Collect one message per requested feature the account does not hold.
///
/// A feature is only checked when the setting it guards is active; names
/// this crate does not recognize are accepted as-is. Repeated names are
/// checked once.
pub fn entitlement_violations(features_to_check: &[&str], settings: &PluginSettings) -> Vec<String> {
    let enabled = settings.pro.as_ref().map(|p| p.enabled_pro_features.as_slice()).unwrap_or(&[]);
    let mut msgs = Vec::new();
    let mut seen = HashSet::new();

    for name in features_to_check {
        let Some(feature) = ProFeature::from_name(name) else {
            debug!(feature = *name, "unrecognized feature, not validated");
            continue;
        };
        if !seen.insert(feature) {
            continue;
        }
        let (in_use, label) = match feature {
            ProFeature::SmartConflict => {
                (settings.conflict_action == ConflictAction::SmartConflict, "smart conflict")
            }
            ProFeature::GoogleDrive => {
                (settings.service_type == ServiceType::Googledrive, "sync with Google Drive")
            }
        };
        if !in_use {
            continue;
        }
        let held = enabled.iter().filter(|f| f.feature_name == feature.as_str()).count();
        if held != 1 {
            warn!(feature = feature.as_str(), held, "feature not entitled");
            msgs.push(format!(
                "You're trying to use \"{label}\" PRO feature but you haven't subscribed to it."
            ));
        }
    }
    msgs
}

impl ProClient {
    /// Check that `features_to_check` may run under `settings`.
    ///
    /// Re-fetches the entitlement list once if any cached entry is stale,
    /// then evaluates every requested feature before failing, so the error
    /// lists all violations.
    pub async fn check_pro_runnable(
        &self,
        features_to_check: &[&str],
        settings: &mut PluginSettings,
        plugin_version: &str,
        save: Option<&dyn SaveConfig>,
    ) -> anyhow::Result<()> {
        let pro = match settings.pro.as_mut() {
            Some(pro) if !pro.refresh_token.is_empty() => pro,
            _ => return Err(ProError::NotConnected.into()),
        };

        let now = epoch_ms();
        let stale = pro
            .enabled_pro_features
            .iter()
            .find(|f| feature_is_stale(f, now))
            .map(|f| f.feature_name.clone());
        if let Some(stale) = stale {
            info!(feature = %stale, "cached entitlements stale, re-fetching");
            self.fetch_features(pro, plugin_version, save).await?;
        }

        let msgs = entitlement_violations(features_to_check, settings);
        if !msgs.is_empty() {
            return Err(ProError::NotEntitled(msgs).into());
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "entitlement_tests.rs"]
mod tests;
