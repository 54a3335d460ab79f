//! Token verification against a key set served over HTTP

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{routing::get, Json, Router};
use drinkery::auth::{AuthError, KeySource, TokenVerifier, VerifierConfig};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;

// base64 of SECRET; identical in the standard and URL-safe alphabets
const SECRET: &str = "jwks-test-signing-secret";
const SECRET_B64: &str = "andrcy10ZXN0LXNpZ25pbmctc2VjcmV0";

async fn serve_jwks() -> String {
    let jwks = json!({
        "keys": [
            {"kty": "oct", "kid": "test-key", "k": SECRET_B64}
        ]
    });
    let app = Router::new().route(
        "/.well-known/jwks.json",
        get(move || {
            let jwks = jwks.clone();
            async move { Json(jwks) }
        }),
    );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}/.well-known/jwks.json")
}

fn verifier(url: String) -> TokenVerifier {
    TokenVerifier::new(VerifierConfig {
        key_source: KeySource::Jwks {
            url,
            algorithm: Algorithm::HS256,
        },
        audience: Some("drinks".to_string()),
        ..VerifierConfig::hs256("unused")
    })
    .unwrap()
}

fn sign(kid: Option<&str>) -> String {
    let exp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
        + 600;

    let mut header = Header::new(Algorithm::HS256);
    header.kid = kid.map(str::to_string);

    encode(
        &header,
        &json!({"sub": "auth0|owner", "aud": "drinks", "exp": exp, "permissions": ["post:drinks"]}),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

#[tokio::test]
async fn test_token_verified_with_fetched_key() {
    let verifier = verifier(serve_jwks().await);
    let header = format!("Bearer {}", sign(Some("test-key")));

    let claims = verifier
        .authorize(Some(&header), "post:drinks")
        .await
        .unwrap();
    assert_eq!(claims.subject.as_deref(), Some("auth0|owner"));

    // Served from the cache the second time
    assert!(verifier.verify(&sign(Some("test-key"))).await.is_ok());
}

#[tokio::test]
async fn test_unknown_or_missing_kid_is_invalid() {
    let verifier = verifier(serve_jwks().await);

    let err = verifier.verify(&sign(Some("rotated-away"))).await.unwrap_err();
    assert_eq!(err, AuthError::InvalidToken);

    let err = verifier.verify(&sign(None)).await.unwrap_err();
    assert_eq!(err, AuthError::InvalidToken);
}

#[tokio::test]
async fn test_unreachable_key_set_is_invalid() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let verifier = verifier(format!("http://{addr}/.well-known/jwks.json"));
    let err = verifier.verify(&sign(Some("test-key"))).await.unwrap_err();
    assert_eq!(err, AuthError::InvalidToken);
}
