// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error code carried by a rejected token grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TokenErrorKind {
    /// The only code the provider documents today.
    InvalidRequest,
    Other(String),
}

impl TokenErrorKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::Other(code) => code,
        }
    }
}

impl From<String> for TokenErrorKind {
    fn from(code: String) -> Self {
        match code.as_str() {
            "invalid_request" => Self::InvalidRequest,
            _ => Self::Other(code),
        }
    }
}

impl From<TokenErrorKind> for String {
    fn from(kind: TokenErrorKind) -> Self {
        kind.as_str().to_owned()
    }
}

impl fmt::Display for TokenErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain failures surfaced to the host's command/UI layer.
///
/// Always travels inside an [`anyhow::Error`]; recover it with
/// `err.downcast_ref::<ProError>()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProError {
    /// No account connected (no pro config or no refresh token).
    NotConnected,
    /// The token endpoint answered with an `error` body.
    GrantRejected(TokenErrorKind),
    /// One user-facing message per violated entitlement.
    NotEntitled(Vec<String>),
}

impl ProError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotConnected => "NOT_CONNECTED",
            Self::GrantRejected(_) => "GRANT_REJECTED",
            Self::NotEntitled(_) => "NOT_ENTITLED",
        }
    }
}

impl fmt::Display for ProError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => {
                f.write_str("you need to connect your account to use PRO features")
            }
            Self::GrantRejected(kind) => write!(f, "token grant rejected by provider: {kind}"),
            Self::NotEntitled(msgs) => f.write_str(&msgs.join("\n\n")),
        }
    }
}

impl std::error::Error for ProError {}
