// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for unit tests: a local mock provider and assertions.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use futures_util::future::BoxFuture;
use tokio::net::TcpListener;

use crate::credential::client::ProClient;
use crate::credential::{ProConfig, SaveConfig, PLUGIN_VERSION_HEADER};

/// Assert that a `Result` is `Err` and its message contains `$substr`.
#[macro_export]
macro_rules! assert_err_contains {
    ($expr:expr, $substr:expr) => {{
        let result = $expr;
        let err = result.expect_err(concat!("expected Err for: ", stringify!($expr)));
        let msg = err.to_string();
        assert!(msg.contains($substr), "expected error containing {:?}, got: {msg:?}", $substr);
    }};
}

/// Headers seen on an authenticated GET.
#[derive(Debug, Clone, Default)]
pub struct SeenHeaders {
    pub authorization: Option<String>,
    pub plugin_version: Option<String>,
}

#[derive(Default)]
struct ProviderState {
    token_responses: Vec<(u16, String)>,
    features_body: serde_json::Value,
    profile_body: serde_json::Value,
    token_calls: AtomicU32,
    features_calls: AtomicU32,
    profile_calls: AtomicU32,
    token_forms: Mutex<Vec<HashMap<String, String>>>,
    get_headers: Mutex<Vec<SeenHeaders>>,
}

/// A provider bound to `127.0.0.1:0` with canned responses.
pub struct MockProvider {
    pub addr: SocketAddr,
    state: Arc<ProviderState>,
}

impl MockProvider {
    /// Start a provider. Token responses are served in order, the last one
    /// repeating once exhausted.
    pub async fn spawn(
        token_responses: Vec<(u16, String)>,
        features_body: serde_json::Value,
        profile_body: serde_json::Value,
    ) -> anyhow::Result<Self> {
        let state = Arc::new(ProviderState {
            token_responses,
            features_body,
            profile_body,
            ..Default::default()
        });

        let app = Router::new()
            .route("/api/v1/oauth2/token", post(token))
            .route("/api/v1/pro/list", get(features))
            .route("/api/v1/profile/list", get(profile))
            .with_state(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Ok(Self { addr, state })
    }

    pub fn site(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn client(&self) -> ProClient {
        ProClient::new(&self.site())
    }

    pub fn token_calls(&self) -> u32 {
        self.state.token_calls.load(Ordering::Relaxed)
    }

    pub fn features_calls(&self) -> u32 {
        self.state.features_calls.load(Ordering::Relaxed)
    }

    pub fn profile_calls(&self) -> u32 {
        self.state.profile_calls.load(Ordering::Relaxed)
    }

    pub fn token_forms(&self) -> Vec<HashMap<String, String>> {
        self.state.token_forms.lock().map(|f| f.clone()).unwrap_or_default()
    }

    pub fn get_headers(&self) -> Vec<SeenHeaders> {
        self.state.get_headers.lock().map(|h| h.clone()).unwrap_or_default()
    }
}

async fn token(
    State(s): State<Arc<ProviderState>>,
    Form(form): Form<HashMap<String, String>>,
) -> (StatusCode, String) {
    let idx = s.token_calls.fetch_add(1, Ordering::Relaxed) as usize;
    if let Ok(mut forms) = s.token_forms.lock() {
        forms.push(form);
    }
    let (status, body) = s
        .token_responses
        .get(idx)
        .or(s.token_responses.last())
        .cloned()
        .unwrap_or((500, "{}".to_owned()));
    (StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR), body)
}

async fn features(
    State(s): State<Arc<ProviderState>>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    s.features_calls.fetch_add(1, Ordering::Relaxed);
    record_headers(&s, &headers);
    Json(s.features_body.clone())
}

async fn profile(
    State(s): State<Arc<ProviderState>>,
    headers: HeaderMap,
) -> Json<serde_json::Value> {
    s.profile_calls.fetch_add(1, Ordering::Relaxed);
    record_headers(&s, &headers);
    Json(s.profile_body.clone())
}

fn record_headers(s: &ProviderState, headers: &HeaderMap) {
    let value = |name: &str| headers.get(name).and_then(|v| v.to_str().ok()).map(String::from);
    let seen = SeenHeaders {
        authorization: value("authorization"),
        plugin_version: value(PLUGIN_VERSION_HEADER),
    };
    if let Ok(mut all) = s.get_headers.lock() {
        all.push(seen);
    }
}

/// JSON body for a successful grant.
pub fn grant_body(access: &str, refresh: Option<&str>, expires_in: u64) -> String {
    let mut body = serde_json::json!({ "access_token": access, "expires_in": expires_in });
    if let Some(r) = refresh {
        body["refresh_token"] = serde_json::Value::from(r);
    }
    body.to_string()
}

/// JSON body for a rejected grant.
pub fn rejected_body() -> String {
    serde_json::json!({ "error": "invalid_request" }).to_string()
}

/// Save hook that records every snapshot it is handed.
#[derive(Default)]
pub struct RecordingSaver {
    pub saved: Mutex<Vec<ProConfig>>,
}

impl RecordingSaver {
    pub fn count(&self) -> usize {
        self.saved.lock().map(|s| s.len()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<ProConfig> {
        self.saved.lock().ok().and_then(|s| s.last().cloned())
    }
}

impl SaveConfig for RecordingSaver {
    fn save<'a>(&'a self, config: &'a ProConfig) -> BoxFuture<'a, anyhow::Result<()>> {
        Box::pin(async move {
            if let Ok(mut saved) = self.saved.lock() {
                saved.push(config.clone());
            }
            Ok(())
        })
    }
}
