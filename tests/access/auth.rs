//! Token handling at the HTTP boundary.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::json;

use super::{SECRET, start_app};

fn now() -> i64 {
    jiff::Timestamp::now().as_second()
}

fn signed(claims: serde_json::Value, secret: &str) -> String {
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

#[tokio::test]
async fn register_login_and_me() {
    let app = start_app().await;
    let (id, token) = app.register("alice").await;

    let me = app.call("GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(me.status, 200);
    assert_eq!(me.body, json!({ "id": id, "role": "editor" }));

    let duplicate = app
        .call(
            "POST",
            "/api/auth/register",
            None,
            Some(json!({ "name": "A", "email": "ALICE@example.com", "password": "whatever-long" })),
        )
        .await;
    assert_eq!(duplicate.status, 409);

    let wrong = app
        .call(
            "POST",
            "/api/auth/login",
            None,
            Some(json!({ "email": "alice@example.com", "password": "nope-nope" })),
        )
        .await;
    assert_eq!(wrong.status, 401);

    let anonymous = app.call("GET", "/api/auth/me", None, None).await;
    assert_eq!(anonymous.status, 401);

    app.stop().await;
}

/// A well-signed token whose role is not one of the known roles is rejected
/// rather than mapped to some default.
#[tokio::test]
async fn unknown_role_claim_is_unauthenticated() {
    let app = start_app().await;
    let token = signed(
        json!({ "sub": "u1", "role": "superuser", "exp": now() + 3600, "iat": now() }),
        SECRET,
    );

    let reply = app.call("GET", "/api/auth/me", Some(&token), None).await;
    assert_eq!(reply.status, 401);

    let missing_role = signed(json!({ "sub": "u1", "exp": now() + 3600, "iat": now() }), SECRET);
    let reply = app.call("GET", "/api/auth/me", Some(&missing_role), None).await;
    assert_eq!(reply.status, 401);

    app.stop().await;
}

#[tokio::test]
async fn forged_tokens_are_rejected() {
    let app = start_app().await;
    let claims = json!({ "sub": "u1", "role": "admin", "exp": now() + 3600, "iat": now() });

    let wrong_key = signed(claims.clone(), "another-secret-that-is-32-bytes-long");
    let reply = app.call("GET", "/api/users", Some(&wrong_key), None).await;
    assert_eq!(reply.status, 401);

    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    let unsigned = format!("{header}.{payload}.");
    let reply = app.call("GET", "/api/users", Some(&unsigned), None).await;
    assert_eq!(reply.status, 401);

    let expired = signed(
        json!({ "sub": "u1", "role": "admin", "exp": now() - 3600, "iat": now() - 7200 }),
        SECRET,
    );
    let reply = app.call("GET", "/api/users", Some(&expired), None).await;
    assert_eq!(reply.status, 401);

    app.stop().await;
}

#[tokio::test]
async fn bearer_scheme_is_case_insensitive() {
    let app = start_app().await;
    let (_, token) = app.register("alice").await;

    let request = format!(
        "GET /api/auth/me HTTP/1.1\r\nHost: localhost\r\nAuthorization: bearer {token}\r\nConnection: close\r\n\r\n"
    );
    let raw = super::raw_request(app.addr(), request.as_bytes()).await;
    assert!(String::from_utf8_lossy(&raw).starts_with("HTTP/1.1 200"));

    app.stop().await;
}
