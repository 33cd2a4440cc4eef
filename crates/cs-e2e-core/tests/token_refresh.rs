//! Token refresh through the cookie-jar browser context.

use std::sync::Arc;

use chrono::Utc;
use cs_e2e_core::auth::{
    jwt, AuthState, AuthStateStore, Cookie, HttpBrowserContext, Persona, TokenCache, TokenManager,
    TokenStatus, REFRESH_ROUTE, SESSION_COOKIE,
};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn token_expiring_in(seconds: i64) -> String {
    let exp = Utc::now().timestamp() + seconds;
    jwt::mint_unsigned(&json!({ "exp": exp, "org_id": "13476" }))
}

#[tokio::test]
async fn test_expired_stored_token_is_refreshed_and_persisted() {
    let server = MockServer::start().await;
    let fresh = token_expiring_in(900);

    Mock::given(method("GET"))
        .and(path(REFRESH_ROUTE))
        .respond_with(
            ResponseTemplate::new(200).insert_header(
                "set-cookie",
                format!("{}={}; Path=/", SESSION_COOKIE, fresh).as_str(),
            ),
        )
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let store = AuthStateStore::new(dir.path());
    let stale = AuthState {
        cookies: vec![
            Cookie::new(SESSION_COOKIE, token_expiring_in(-60)),
            Cookie::new("rh_sso", "session"),
        ],
        origins: vec![],
    };
    store.save(Persona::StableSam, &stale).unwrap();

    // Browser context starts from the same auth-state file
    let browser = HttpBrowserContext::new(&server.uri(), &stale, false).unwrap();
    let manager = TokenManager::new(Arc::new(TokenCache::new()), store);

    let status = manager.ensure_valid(Persona::StableSam, &browser).await.unwrap();

    assert_eq!(status, TokenStatus::Refreshed(jwt::bearer(&fresh)));
    let expiry = manager.stored_expiry(Persona::StableSam).unwrap();
    assert!(!expiry.needs_refresh());
    assert_eq!(
        manager.token(Persona::StableSam).await,
        Some(jwt::bearer(&fresh))
    );
}

#[tokio::test]
async fn test_valid_token_skips_navigation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let current = jwt::bearer(&token_expiring_in(3600));
    let token = current.clone();
    let cache = TokenCache::from_lookup(move |name| (name == "TOKEN").then(|| token.clone()));
    let manager = TokenManager::new(Arc::new(cache), AuthStateStore::new(dir.path()));
    let browser = HttpBrowserContext::new(&server.uri(), &AuthState::default(), false).unwrap();

    let status = manager.ensure_valid(Persona::AdminUser, &browser).await.unwrap();
    assert_eq!(status, TokenStatus::Valid(current));
}

#[tokio::test]
async fn test_refresh_replaces_parent_domain_session_cookie() {
    let server = MockServer::start().await;
    let fresh = token_expiring_in(900);
    Mock::given(method("GET"))
        .and(path(REFRESH_ROUTE))
        .respond_with(ResponseTemplate::new(200).insert_header(
            "set-cookie",
            format!("{}={}; Path=/", SESSION_COOKIE, fresh).as_str(),
        ))
        .expect(1)
        .mount(&server)
        .await;

    // Login writes the session cookie for the parent domain
    let dir = tempfile::tempdir().unwrap();
    let store = AuthStateStore::new(dir.path());
    let stale = AuthState {
        cookies: vec![Cookie {
            domain: Some(".foo.redhat.com".to_string()),
            path: Some("/".to_string()),
            ..Cookie::new(SESSION_COOKIE, token_expiring_in(-60))
        }],
        origins: vec![],
    };
    store.save(Persona::RhelOperator, &stale).unwrap();

    let browser = HttpBrowserContext::new(&server.uri(), &stale, false).unwrap();
    let manager = TokenManager::new(Arc::new(TokenCache::new()), store);

    let status = manager.ensure_valid(Persona::RhelOperator, &browser).await.unwrap();
    assert_eq!(status, TokenStatus::Refreshed(jwt::bearer(&fresh)));

    let saved = manager.store().load(Persona::RhelOperator).unwrap().unwrap();
    let sessions: Vec<_> = saved
        .cookies
        .iter()
        .filter(|c| c.name == SESSION_COOKIE)
        .collect();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].value, fresh);
    assert!(!manager
        .stored_expiry(Persona::RhelOperator)
        .unwrap()
        .needs_refresh());
}
