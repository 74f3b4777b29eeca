// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OAuth authorization code + PKCE (RFC 7636) helpers.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::credential::{CALLBACK_COMMAND, SCOPE};

/// Length of the generated code verifier (the RFC 7636 maximum).
pub const CODE_VERIFIER_LEN: usize = 128;

/// A verifier and the challenge derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PkcePair {
    pub code_verifier: String,
    pub code_challenge: String,
}

/// An authorization URL together with the PKCE pair it was built from.
///
/// The caller must keep `pkce.code_verifier` to finish the code exchange.
#[derive(Debug, Clone, Serialize)]
pub struct AuthRequest {
    pub auth_url: String,
    #[serde(flatten)]
    pub pkce: PkcePair,
}

/// Generate a 128-char alphanumeric verifier from the thread-local CSPRNG.
pub fn generate_code_verifier() -> String {
    rand::rng().sample_iter(&Alphanumeric).take(CODE_VERIFIER_LEN).map(char::from).collect()
}

/// Compute code_challenge = base64url_nopad(sha256(verifier)).
///
/// An empty verifier yields an empty challenge; the provider rejects it at
/// exchange time.
pub fn compute_code_challenge(verifier: &str) -> String {
    if verifier.is_empty() {
        return String::new();
    }
    URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes()))
}

pub fn generate_pkce_pair() -> PkcePair {
    let code_verifier = generate_code_verifier();
    let code_challenge = compute_code_challenge(&code_verifier);
    PkcePair { code_verifier, code_challenge }
}

/// The `obsidian://` URI the provider redirects back to.
pub fn callback_uri() -> String {
    format!("obsidian://{CALLBACK_COMMAND}")
}

/// Build the authorize URL for `site` with a fresh PKCE pair.
pub fn build_auth_url(
    site: &str,
    client_id: &str,
    has_callback: bool,
) -> anyhow::Result<AuthRequest> {
    let pkce = generate_pkce_pair();
    let auth_url = build_auth_url_with(site, client_id, &pkce.code_challenge, has_callback)?;
    Ok(AuthRequest { auth_url, pkce })
}

/// Build the authorize URL for a known challenge.
///
/// Parameter order is fixed; the provider logs it verbatim.
pub fn build_auth_url_with(
    site: &str,
    client_id: &str,
    code_challenge: &str,
    has_callback: bool,
) -> anyhow::Result<String> {
    let mut params = vec![
        ("response_type", "code".to_owned()),
        ("client_id", client_id.to_owned()),
        ("token_access_type", "offline".to_owned()),
        ("code_challenge_method", "S256".to_owned()),
        ("code_challenge", code_challenge.to_owned()),
        ("scope", SCOPE.to_owned()),
    ];
    if has_callback {
        params.push(("redirect_uri", callback_uri()));
    }
    let base = format!("{}/oauth2/authorize", site.trim_end_matches('/'));
    let url = reqwest::Url::parse_with_params(&base, &params)?;
    Ok(url.into())
}

#[cfg(test)]
#[path = "pkce_tests.rs"]
mod tests;
