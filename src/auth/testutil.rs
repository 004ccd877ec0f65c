// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Test fixtures: signing keys, tokens, canned userinfo documents and a
//! mock identity provider.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Map, Value};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::config::Config;
use crate::state::AppState;
use crate::store::InMemoryLandingStore;
use crate::transplant::HttpTransplantClient;

pub const TEST_KID: &str = "test-signing-key";
/// 45 bytes, so its standard and URL-safe base64 encodings are identical.
pub const TEST_SECRET: &[u8] = b"landing-api-test-secret-0123456789abcdefghijk";
pub const TEST_AUDIENCE: &str = "lando-api";
pub const GROUPS_CLAIM: &str = "https://sso.mozilla.com/claim/groups";
pub const PINGBACK_SECRET: &str = "transplant-pingback-secret";

pub fn jwks_document() -> Value {
    json!({
        "keys": [
            {
                "kty": "oct",
                "kid": TEST_KID,
                "alg": "HS256",
                "use": "sig",
                "k": URL_SAFE_NO_PAD.encode(TEST_SECRET)
            }
        ]
    })
}

pub async fn mount_jwks(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/.well-known/jwks.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_document()))
        .mount(server)
        .await;
}

pub async fn mount_userinfo(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/userinfo"))
        .respond_with(response)
        .mount(server)
        .await;
}

pub fn issuer_for(server: &MockServer) -> String {
    format!("{}/", server.uri())
}

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

/// Claims of a valid token for `issuer`; tests override members as needed.
pub fn default_claims(issuer: &str) -> Map<String, Value> {
    let claims = json!({
        "sub": "ad|Example-LDAP|testuser",
        "iss": issuer,
        "aud": [TEST_AUDIENCE, format!("{issuer}userinfo")],
        "iat": now(),
        "exp": now() + 3600,
        "scope": "openid profile email",
    });
    match claims {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

pub fn sign(claims: &Map<String, Value>, kid: &str) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(kid.to_string());
    encode(&header, claims, &EncodingKey::from_secret(TEST_SECRET)).unwrap()
}

/// Signed token for `issuer` with the given claim overrides applied.
pub fn create_access_token(issuer: &str, overrides: Value) -> String {
    let mut claims = default_claims(issuer);
    if let Value::Object(overrides) = overrides {
        claims.extend(overrides);
    }
    sign(&claims, TEST_KID)
}

pub fn userinfo_standard() -> Value {
    json!({
        "email": "tuser@example.com",
        "email_verified": true,
        "name": "Test User",
        "nickname": "tuser",
        "picture": "https://s.gravatar.com/avatar/tuser.png",
        "sub": "ad|Example-LDAP|testuser",
        "updated_at": "2017-09-15T17:24:05.469Z",
        GROUPS_CLAIM: [
            "all_scm_level_1",
            "active_scm_level_1",
            "all_scm_level_3",
            "active_scm_level_3"
        ]
    })
}

pub fn userinfo_without(field: &str) -> Value {
    let mut info = userinfo_standard();
    if let Value::Object(map) = &mut info {
        map.remove(field);
    }
    info
}

pub fn userinfo_with(field: &str, value: Value) -> Value {
    let mut info = userinfo_standard();
    if let Value::Object(map) = &mut info {
        map.insert(field.to_string(), value);
    }
    info
}

/// Configuration pointing every outbound endpoint at `server`.
pub fn test_config(server: &MockServer) -> Config {
    let vars = [
        ("OIDC_DOMAIN", "idp.example.com".to_string()),
        ("OIDC_IDENTIFIER", TEST_AUDIENCE.to_string()),
        ("OIDC_ISSUER", issuer_for(server)),
        ("OIDC_JWKS_URL", format!("{}/.well-known/jwks.json", server.uri())),
        ("OIDC_USERINFO_URL", format!("{}/userinfo", server.uri())),
        ("AUTH0_TIMEOUT_SECONDS", "2".to_string()),
        ("TRANSPLANT_URL", server.uri()),
        ("TRANSPLANT_API_KEY", PINGBACK_SECRET.to_string()),
        ("PINGBACK_ENABLED", "y".to_string()),
        ("PINGBACK_URL", "https://lando.example.com/landings/update".to_string()),
        ("TRANSPLANT_TIMEOUT_SECONDS", "2".to_string()),
    ];
    Config::from_lookup(|key| {
        vars.iter()
            .find(|(name, _)| *name == key)
            .map(|(_, value)| value.clone())
    })
    .unwrap()
}

pub fn test_state(config: Config) -> AppState {
    let transplant = HttpTransplantClient::from_config(&config).unwrap();
    AppState::new(
        config,
        Arc::new(InMemoryLandingStore::new()),
        Arc::new(transplant),
    )
    .unwrap()
}
