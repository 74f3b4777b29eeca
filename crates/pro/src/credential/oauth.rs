// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token endpoint grants: authorization code and refresh token.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::credential::client::ProClient;
use crate::credential::{lenient_opt_u64, lenient_u64, SCOPE};
use crate::error::TokenErrorKind;

/// Token endpoint response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(try_from = "RawTokenResponse")]
pub enum TokenResponse {
    Granted(TokenGrant),
    Rejected { kind: TokenErrorKind },
}

/// A successful grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    /// Lifetime in seconds.
    #[serde(deserialize_with = "lenient_u64")]
    pub expires_in: u64,
    /// Absent when the provider does not rotate the refresh token.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Wire shape: one flat object whose `error` field picks the variant.
#[derive(Debug, Deserialize)]
struct RawTokenResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_u64")]
    expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

impl TryFrom<RawTokenResponse> for TokenResponse {
    type Error = String;

    fn try_from(raw: RawTokenResponse) -> Result<Self, Self::Error> {
        if let Some(code) = raw.error {
            return Ok(Self::Rejected { kind: code.into() });
        }
        let access_token = raw.access_token.ok_or("missing access_token")?;
        let expires_in = raw.expires_in.ok_or("missing expires_in")?;
        Ok(Self::Granted(TokenGrant { access_token, expires_in, refresh_token: raw.refresh_token }))
    }
}

impl ProClient {
    /// Exchange an authorization code for tokens.
    ///
    /// Transport and parse failures are reported to `on_error` and
    /// swallowed; `None` means the exchange did not complete.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        on_error: Option<&(dyn Fn(&anyhow::Error) + Send + Sync)>,
    ) -> Option<TokenResponse> {
        let form = [
            ("grant_type", "authorization_code"),
            ("code", code),
            ("code_verifier", code_verifier),
            ("client_id", self.client_id.as_str()),
            ("scope", SCOPE),
        ];
        match self.post_token(&form).await {
            Ok(resp) => Some(resp),
            Err(e) => {
                warn!(err = %e, "authorization code exchange failed");
                if let Some(cb) = on_error {
                    cb(&e);
                }
                None
            }
        }
    }

    /// Mint a new access token from a refresh token.
    pub async fn refresh(&self, refresh_token: &str) -> anyhow::Result<TokenResponse> {
        let form = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", self.client_id.as_str()),
            ("scope", SCOPE),
        ];
        self.post_token(&form).await.inspect_err(|e| {
            error!(err = %e, "refresh token exchange failed");
        })
    }

    /// POST a form to the token endpoint and parse the body regardless of
    /// HTTP status; the provider reports rejected grants in the body.
    async fn post_token(&self, form: &[(&str, &str)]) -> anyhow::Result<TokenResponse> {
        let url = self.token_url();
        let grant_type = form.first().map(|(_, v)| *v).unwrap_or_default();
        debug!(%url, grant_type, "requesting token");

        let resp = self.http.post(&url).form(form).send().await?;
        let status = resp.status();
        let body = resp.text().await?;
        let parsed: TokenResponse = serde_json::from_str(&body).map_err(|e| {
            anyhow::anyhow!("unparseable token response (HTTP {status}): {e}")
        })?;

        if let TokenResponse::Rejected { ref kind } = parsed {
            debug!(%status, grant_type, error = %kind, "token grant rejected");
        }
        Ok(parsed)
    }
}

#[cfg(test)]
#[path = "oauth_tests.rs"]
mod tests;
