// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP client bound to a single provider site.
//!
//! The grant, refresh, feature and entitlement operations live in sibling
//! modules as further `impl ProClient` blocks.

use std::time::Duration;

use crate::credential::pkce::{self, AuthRequest};
use crate::credential::{CLIENT_ID, DEFAULT_SITE};

/// Talks to the provider on behalf of one plugin installation.
#[derive(Debug, Clone)]
pub struct ProClient {
    pub(crate) http: reqwest::Client,
    pub(crate) site: String,
    pub(crate) client_id: String,
}

impl Default for ProClient {
    fn default() -> Self {
        Self::new(DEFAULT_SITE)
    }
}

impl ProClient {
    /// Client for `site` with no request timeout.
    pub fn new(site: &str) -> Self {
        install_crypto_provider();
        Self::with_http(site, reqwest::Client::new())
    }

    /// Client for `site` whose requests give up after `timeout`.
    pub fn with_timeout(site: &str, timeout: Duration) -> anyhow::Result<Self> {
        install_crypto_provider();
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self::with_http(site, http))
    }

    pub fn with_http(site: &str, http: reqwest::Client) -> Self {
        Self {
            http,
            site: site.trim_end_matches('/').to_owned(),
            client_id: CLIENT_ID.to_owned(),
        }
    }

    pub fn site(&self) -> &str {
        &self.site
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Build the authorize URL and the PKCE pair the caller must retain.
    pub fn auth_url(&self, has_callback: bool) -> anyhow::Result<AuthRequest> {
        pkce::build_auth_url(&self.site, &self.client_id, has_callback)
    }

    pub(crate) fn token_url(&self) -> String {
        format!("{}/api/v1/oauth2/token", self.site)
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.site)
    }
}

/// reqwest is built without a bundled TLS provider; install ring once.
fn install_crypto_provider() {
    // Err means a provider is already installed.
    let _ = rustls::crypto::ring::default_provider().install_default();
}
