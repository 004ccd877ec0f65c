// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Access token verification against the identity provider's key set.
//!
//! Checks run in a fixed order: the JOSE header is parsed, the key is looked
//! up by `kid`, the signature is verified, and only then are `exp`, `iss` and
//! `aud` inspected. Claim validity is never reported for a token whose
//! signature did not verify.

use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, Validation};
use serde_json::{Map, Value};

use super::claims::{BearerToken, TokenClaims, ValidatedClaims};
use super::error::TokenError;
use super::jwks::KeySetCache;

/// Verifies bearer tokens issued by the configured identity provider.
pub struct TokenValidator {
    keys: Arc<KeySetCache>,
    issuer: String,
    audience: String,
    leeway: u64,
}

impl TokenValidator {
    pub fn new(keys: Arc<KeySetCache>, issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
            audience: audience.into(),
            leeway: 0,
        }
    }

    /// Clock skew tolerance applied to `exp`, in seconds.
    pub fn with_leeway(mut self, leeway: u64) -> Self {
        self.leeway = leeway;
        self
    }

    pub fn keys(&self) -> &Arc<KeySetCache> {
        &self.keys
    }

    pub async fn validate(&self, token: &BearerToken) -> Result<ValidatedClaims, TokenError> {
        let header = decode_header(token.as_str()).map_err(|_| TokenError::TokenMalformed)?;
        let kid = header.kid.as_deref().ok_or(TokenError::KeyNotFound)?;

        let (decoding_key, algorithm) = self.keys.get_decoding_key(kid).await?;

        let mut validation = Validation::new(algorithm);
        validation.leeway = self.leeway;
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);

        // Decoded as a bare map so that a missing or mistyped claim surfaces
        // from the claim checks, not from deserialization.
        let token_data = decode::<Map<String, Value>>(token.as_str(), &decoding_key, &validation)
            .map_err(|e| classify(e.kind()))?;
        let claims: TokenClaims = serde_json::from_value(Value::Object(token_data.claims))
            .map_err(|_| TokenError::InvalidClaims)?;

        // jsonwebtoken accepts `exp == now`; a token is expired from its `exp` second on.
        let leeway = i64::try_from(self.leeway).unwrap_or(i64::MAX);
        if claims.exp <= Utc::now().timestamp().saturating_sub(leeway) {
            return Err(TokenError::TokenExpired);
        }

        Ok(ValidatedClaims::from_verified(claims))
    }
}

fn classify(kind: &ErrorKind) -> TokenError {
    match kind {
        ErrorKind::ExpiredSignature => TokenError::TokenExpired,
        ErrorKind::InvalidIssuer
        | ErrorKind::InvalidAudience
        | ErrorKind::InvalidSubject
        | ErrorKind::ImmatureSignature
        | ErrorKind::MissingRequiredClaim(_)
        | ErrorKind::InvalidClaimFormat(_) => TokenError::InvalidClaims,
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::SignatureInvalid,
        // The signature is checked before the payload is parsed, so this is
        // a signed payload whose claims are unusable.
        ErrorKind::Json(_) => TokenError::InvalidClaims,
        _ => TokenError::TokenMalformed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::testutil::{
        create_access_token, default_claims, issuer_for, mount_jwks, sign, TEST_AUDIENCE, TEST_KID,
        TEST_SECRET,
    };
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
    use serde_json::json;
    use wiremock::MockServer;

    async fn validator_for(server: &MockServer) -> TokenValidator {
        mount_jwks(server).await;
        let keys = Arc::new(KeySetCache::new(
            format!("{}/.well-known/jwks.json", server.uri()),
            reqwest::Client::new(),
        ));
        TokenValidator::new(keys, issuer_for(server), TEST_AUDIENCE)
    }

    fn bearer(token: &str) -> BearerToken {
        BearerToken::parse(&format!("Bearer {token}")).unwrap()
    }

    #[tokio::test]
    async fn valid_token_produces_claims() {
        let server = MockServer::start().await;
        let validator = validator_for(&server).await;
        let token = create_access_token(&issuer_for(&server), json!({}));

        let claims = validator.validate(&bearer(&token)).await.unwrap();
        assert_eq!(claims.subject(), Some("ad|Example-LDAP|testuser"));
        assert_eq!(claims.issuer(), issuer_for(&server));
        assert!(claims.audience().iter().any(|aud| aud == TEST_AUDIENCE));
        assert!(claims.expires_at_utc().is_some());
    }

    #[tokio::test]
    async fn unparseable_token_is_malformed() {
        let server = MockServer::start().await;
        let validator = validator_for(&server).await;

        let result = validator.validate(&bearer("bogus")).await;
        assert!(matches!(result, Err(TokenError::TokenMalformed)));
    }

    #[tokio::test]
    async fn unknown_kid_is_key_not_found() {
        let server = MockServer::start().await;
        let validator = validator_for(&server).await;
        let token = sign(&default_claims(&issuer_for(&server)), "BOGUSKID");

        let result = validator.validate(&bearer(&token)).await;
        assert!(matches!(result, Err(TokenError::KeyNotFound)));
    }

    #[tokio::test]
    async fn missing_kid_is_key_not_found() {
        let server = MockServer::start().await;
        let validator = validator_for(&server).await;
        let token = encode(
            &Header::new(Algorithm::HS256),
            &default_claims(&issuer_for(&server)),
            &EncodingKey::from_secret(TEST_SECRET),
        )
        .unwrap();

        let result = validator.validate(&bearer(&token)).await;
        assert!(matches!(result, Err(TokenError::KeyNotFound)));
    }

    #[tokio::test]
    async fn expired_token_is_rejected() {
        let server = MockServer::start().await;
        let validator = validator_for(&server).await;
        let token = create_access_token(&issuer_for(&server), json!({ "exp": 1 }));

        let result = validator.validate(&bearer(&token)).await;
        assert!(matches!(result, Err(TokenError::TokenExpired)));
    }

    #[tokio::test]
    async fn wrong_issuer_or_audience_is_invalid_claims() {
        let server = MockServer::start().await;
        let validator = validator_for(&server).await;
        let issuer = issuer_for(&server);

        for overrides in [
            json!({ "iss": "bogus issuer" }),
            json!({ "aud": "bogus audience" }),
        ] {
            let token = create_access_token(&issuer, overrides);
            let result = validator.validate(&bearer(&token)).await;
            assert!(matches!(result, Err(TokenError::InvalidClaims)));
        }
    }

    #[tokio::test]
    async fn missing_audience_is_invalid_claims() {
        let server = MockServer::start().await;
        let validator = validator_for(&server).await;
        let mut claims = default_claims(&issuer_for(&server));
        claims.remove("aud");

        let result = validator.validate(&bearer(&sign(&claims, TEST_KID))).await;
        assert!(matches!(result, Err(TokenError::InvalidClaims)));
    }

    #[tokio::test]
    async fn mistyped_expiry_is_invalid_claims() {
        let server = MockServer::start().await;
        let validator = validator_for(&server).await;
        let token = create_access_token(&issuer_for(&server), json!({ "exp": "soon" }));

        let result = validator.validate(&bearer(&token)).await;
        assert!(matches!(result, Err(TokenError::InvalidClaims)));
    }

    #[tokio::test]
    async fn missing_expiry_is_invalid_claims() {
        let server = MockServer::start().await;
        let validator = validator_for(&server).await;
        let mut claims = default_claims(&issuer_for(&server));
        claims.remove("exp");

        let result = validator.validate(&bearer(&sign(&claims, TEST_KID))).await;
        assert!(matches!(result, Err(TokenError::InvalidClaims)));
    }

    #[tokio::test]
    async fn token_expiring_this_second_is_expired() {
        let server = MockServer::start().await;
        let validator = validator_for(&server).await;
        let issuer = issuer_for(&server);

        for _ in 0..5 {
            let now = chrono::Utc::now().timestamp();
            let token = create_access_token(&issuer, json!({ "exp": now }));
            let result = validator.validate(&bearer(&token)).await;
            assert!(matches!(result, Err(TokenError::TokenExpired)));
        }
    }

    #[tokio::test]
    async fn leeway_extends_expiry() {
        let server = MockServer::start().await;
        let validator = validator_for(&server).await.with_leeway(60);
        let now = chrono::Utc::now().timestamp();
        let token = create_access_token(&issuer_for(&server), json!({ "exp": now - 10 }));

        assert!(validator.validate(&bearer(&token)).await.is_ok());
    }

    #[tokio::test]
    async fn forged_signature_is_rejected() {
        let server = MockServer::start().await;
        let validator = validator_for(&server).await;
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(TEST_KID.to_string());
        let token = encode(
            &header,
            &default_claims(&issuer_for(&server)),
            &EncodingKey::from_secret(b"not-the-provider-secret"),
        )
        .unwrap();

        let result = validator.validate(&bearer(&token)).await;
        assert!(matches!(result, Err(TokenError::SignatureInvalid)));
    }

    #[tokio::test]
    async fn forged_expired_token_reports_signature_not_expiry() {
        let server = MockServer::start().await;
        let validator = validator_for(&server).await;
        let mut claims = default_claims(&issuer_for(&server));
        claims.insert("exp".into(), json!(1));
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(TEST_KID.to_string());
        let token = encode(&header, &claims, &EncodingKey::from_secret(b"attacker")).unwrap();

        let result = validator.validate(&bearer(&token)).await;
        assert!(matches!(result, Err(TokenError::SignatureInvalid)));
    }

    #[tokio::test]
    async fn algorithm_differing_from_key_is_rejected() {
        let server = MockServer::start().await;
        let validator = validator_for(&server).await;
        let mut header = Header::new(Algorithm::HS512);
        header.kid = Some(TEST_KID.to_string());
        let token = encode(
            &header,
            &default_claims(&issuer_for(&server)),
            &EncodingKey::from_secret(TEST_SECRET),
        )
        .unwrap();

        let result = validator.validate(&bearer(&token)).await;
        assert!(matches!(result, Err(TokenError::SignatureInvalid)));
    }
}
