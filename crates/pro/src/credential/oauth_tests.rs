// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::atomic::{AtomicU32, Ordering};

use serde_json::json;

use super::*;
use crate::test_support::{grant_body, rejected_body, MockProvider};

#[yare::parameterized(
    granted_with_refresh = {
        r#"{"access_token":"a","expires_in":3600,"refresh_token":"r"}"#,
        TokenResponse::Granted(TokenGrant {
            access_token: "a".into(), expires_in: 3600, refresh_token: Some("r".into()),
        })
    },
    granted_without_refresh = {
        r#"{"access_token":"a","expires_in":60}"#,
        TokenResponse::Granted(TokenGrant {
            access_token: "a".into(), expires_in: 60, refresh_token: None,
        })
    },
    float_lifetime = {
        r#"{"access_token":"a","expires_in":3600.0}"#,
        TokenResponse::Granted(TokenGrant {
            access_token: "a".into(), expires_in: 3600, refresh_token: None,
        })
    },
    invalid_request = {
        r#"{"error":"invalid_request"}"#,
        TokenResponse::Rejected { kind: TokenErrorKind::InvalidRequest }
    },
    other_error = {
        r#"{"error":"invalid_grant","access_token":"ignored"}"#,
        TokenResponse::Rejected { kind: TokenErrorKind::Other("invalid_grant".into()) }
    },
)]
fn parses_token_response(body: &str, expected: TokenResponse) {
    let parsed: Result<TokenResponse, _> = serde_json::from_str(body);
    assert_eq!(parsed.ok(), Some(expected));
}

#[test]
fn body_without_error_or_token_is_a_parse_failure() -> anyhow::Result<()> {
    assert!(serde_json::from_str::<TokenResponse>(r#"{"expires_in":10}"#).is_err());
    assert!(serde_json::from_str::<TokenResponse>(r#"{"access_token":"a"}"#).is_err());
    Ok(())
}

#[test]
fn negative_lifetime_is_a_parse_failure() -> anyhow::Result<()> {
    let body = r#"{"access_token":"a","expires_in":-1.5}"#;
    assert!(serde_json::from_str::<TokenResponse>(body).is_err());
    Ok(())
}

#[tokio::test]
async fn exchange_code_posts_authorization_code_grant() -> anyhow::Result<()> {
    let provider =
        MockProvider::spawn(vec![(200, grant_body("acc", Some("ref"), 3600))], json!({}), json!({}))
            .await?;
    let client = provider.client();

    let resp = client.exchange_code("the-code", "the-verifier", None).await;
    assert!(matches!(resp, Some(TokenResponse::Granted(ref g)) if g.access_token == "acc"));

    let forms = provider.token_forms();
    assert_eq!(forms.len(), 1);
    let form = &forms[0];
    assert_eq!(form.get("grant_type").map(String::as_str), Some("authorization_code"));
    assert_eq!(form.get("code").map(String::as_str), Some("the-code"));
    assert_eq!(form.get("code_verifier").map(String::as_str), Some("the-verifier"));
    assert_eq!(form.get("client_id").map(String::as_str), Some(client.client_id()));
    assert_eq!(form.get("scope").map(String::as_str), Some("pro.list.read"));
    Ok(())
}

#[tokio::test]
async fn exchange_code_returns_rejection_from_error_status() -> anyhow::Result<()> {
    let provider = MockProvider::spawn(vec![(400, rejected_body())], json!({}), json!({})).await?;
    let resp = provider.client().exchange_code("bad", "v", None).await;
    assert_eq!(resp, Some(TokenResponse::Rejected { kind: TokenErrorKind::InvalidRequest }));
    Ok(())
}

#[tokio::test]
async fn exchange_code_swallows_parse_failure_and_reports_it() -> anyhow::Result<()> {
    let provider =
        MockProvider::spawn(vec![(502, "<html>bad gateway</html>".to_owned())], json!({}), json!({}))
            .await?;
    let reported = AtomicU32::new(0);
    let on_error = |e: &anyhow::Error| {
        assert!(e.to_string().contains("unparseable token response"));
        reported.fetch_add(1, Ordering::Relaxed);
    };

    let resp = provider.client().exchange_code("c", "v", Some(&on_error)).await;
    assert!(resp.is_none());
    assert_eq!(reported.load(Ordering::Relaxed), 1);
    Ok(())
}

#[tokio::test]
async fn exchange_code_swallows_transport_failure_without_callback() -> anyhow::Result<()> {
    // Nothing listens on port 9 locally.
    let client = ProClient::new("http://127.0.0.1:9");
    assert!(client.exchange_code("c", "v", None).await.is_none());
    Ok(())
}

#[tokio::test]
async fn refresh_posts_refresh_grant() -> anyhow::Result<()> {
    let provider =
        MockProvider::spawn(vec![(200, grant_body("new", None, 60))], json!({}), json!({})).await?;
    let resp = provider.client().refresh("old-refresh").await?;
    assert!(matches!(resp, TokenResponse::Granted(ref g) if g.refresh_token.is_none()));

    let forms = provider.token_forms();
    assert_eq!(forms[0].get("grant_type").map(String::as_str), Some("refresh_token"));
    assert_eq!(forms[0].get("refresh_token").map(String::as_str), Some("old-refresh"));
    assert_eq!(forms[0].get("scope").map(String::as_str), Some("pro.list.read"));
    assert!(!forms[0].contains_key("code_verifier"));
    Ok(())
}

#[tokio::test]
async fn refresh_propagates_parse_failure() -> anyhow::Result<()> {
    let provider =
        MockProvider::spawn(vec![(500, "not json".to_owned())], json!({}), json!({})).await?;
    crate::assert_err_contains!(provider.client().refresh("r").await, "unparseable");
    Ok(())
}

#[tokio::test]
async fn refresh_propagates_transport_failure() -> anyhow::Result<()> {
    let client = ProClient::new("http://127.0.0.1:9");
    assert!(client.refresh("r").await.is_err());
    Ok(())
}
