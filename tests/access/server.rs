//! Transport-level behavior shared by every route.

use inkstone::config::{RateLimitConfig, Server as ServerConfig};
use serde_json::json;

use super::{raw_request, start_app, start_app_with};

#[tokio::test]
async fn health_is_public_and_carries_security_headers() {
    let app = start_app().await;

    let reply = app.call("GET", "/health", None, None).await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body["status"], "ok");
    assert_eq!(reply.header("x-content-type-options"), Some("nosniff"));
    assert_eq!(reply.header("x-frame-options"), Some("DENY"));
    assert_eq!(reply.header("cache-control"), Some("no-store"));
    assert!(reply.header("content-security-policy").is_some());
    assert!(reply.header("strict-transport-security").is_none());

    let id = reply.header("x-request-id").unwrap();
    assert!(uuid::Uuid::try_parse(id).is_ok());

    app.stop().await;
}

#[tokio::test]
async fn openapi_document_lists_secured_routes() {
    let app = start_app().await;

    let reply = app.call("GET", "/openapi.json", None, None).await;
    assert_eq!(reply.status, 200);
    assert_eq!(reply.body["openapi"], "3.1.0");
    let delete = &reply.body["paths"]["/api/content/{id}"]["delete"];
    assert!(delete["responses"].get("403").is_some());
    assert_eq!(delete["security"], json!([{ "bearerAuth": [] }]));
    assert!(reply.body["paths"]["/health"]["get"].get("security").is_none());

    let tags = &reply.body["paths"]["/api/ai/tags"]["post"];
    assert_eq!(tags["security"], json!([{ "bearerAuth": [] }]));
    assert!(tags.get("requestBody").is_some());

    app.stop().await;
}

#[tokio::test]
async fn unknown_paths_and_methods() {
    let app = start_app().await;

    assert_eq!(app.call("GET", "/nope", None, None).await.status, 404);
    assert_eq!(app.call("PATCH", "/health", None, None).await.status, 405);

    app.stop().await;
}

#[tokio::test]
async fn client_request_id_is_echoed_only_when_valid() {
    let app = start_app().await;
    let client_id = "550e8400-e29b-41d4-a716-446655440000";

    let req = format!(
        "GET /health HTTP/1.1\r\nHost: localhost\r\nX-Request-Id: {client_id}\r\nConnection: close\r\n\r\n"
    );
    let echoed = String::from_utf8_lossy(&raw_request(app.addr(), req.as_bytes()).await).into_owned();
    assert!(echoed.contains(client_id), "{echoed}");

    let bad = raw_request(
        app.addr(),
        b"GET /health HTTP/1.1\r\nHost: localhost\r\nX-Request-Id: not-a-uuid\r\nConnection: close\r\n\r\n",
    )
    .await;
    let bad = String::from_utf8_lossy(&bad);
    assert!(bad.to_ascii_lowercase().contains("x-request-id"));
    assert!(!bad.contains("not-a-uuid"));

    app.stop().await;
}

#[tokio::test]
async fn cors_follows_the_allowlist() {
    let app = start_app_with(
        ServerConfig {
            cors_origins: vec!["http://allowed.com".to_string()],
            hsts: true,
            ..Default::default()
        },
        |_| {},
    )
    .await;

    let allowed = raw_request(
        app.addr(),
        b"GET /health HTTP/1.1\r\nHost: localhost\r\nOrigin: http://allowed.com\r\nConnection: close\r\n\r\n",
    )
    .await;
    let allowed = String::from_utf8_lossy(&allowed).to_ascii_lowercase();
    assert!(allowed.contains("access-control-allow-origin: http://allowed.com"));
    assert!(allowed.contains("strict-transport-security"));

    let evil = raw_request(
        app.addr(),
        b"GET /health HTTP/1.1\r\nHost: localhost\r\nOrigin: http://evil.com\r\nConnection: close\r\n\r\n",
    )
    .await;
    assert!(
        !String::from_utf8_lossy(&evil)
            .to_ascii_lowercase()
            .contains("access-control-allow-origin")
    );

    let preflight = raw_request(
        app.addr(),
        b"OPTIONS /api/content HTTP/1.1\r\nHost: localhost\r\nOrigin: http://allowed.com\r\nConnection: close\r\n\r\n",
    )
    .await;
    let preflight = String::from_utf8_lossy(&preflight).to_ascii_lowercase();
    assert!(preflight.starts_with("http/1.1 204"), "{preflight}");
    assert!(preflight.contains("access-control-allow-methods"));

    app.stop().await;
}

#[tokio::test]
async fn non_json_bodies_are_rejected() {
    let app = start_app().await;

    let reply = raw_request(
        app.addr(),
        b"POST /api/auth/login HTTP/1.1\r\nHost: localhost\r\nContent-Type: text/plain\r\nContent-Length: 14\r\nConnection: close\r\n\r\n{\"hello\":true}",
    )
    .await;
    let reply = String::from_utf8_lossy(&reply);
    assert!(reply.starts_with("HTTP/1.1 415"), "{reply}");

    app.stop().await;
}

#[tokio::test]
async fn oversized_bodies_are_rejected() {
    let app = start_app().await;

    let reply = raw_request(
        app.addr(),
        b"POST /api/auth/login HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: 10485760\r\nConnection: close\r\n\r\n",
    )
    .await;
    let reply = String::from_utf8_lossy(&reply);
    assert!(reply.starts_with("HTTP/1.1 413"), "{reply}");

    app.stop().await;
}

#[tokio::test]
async fn rate_limit_answers_429_with_retry_after() {
    let app = start_app_with(
        ServerConfig {
            rate_limit: Some(RateLimitConfig {
                max_requests: 2,
                window_secs: 60,
            }),
            ..Default::default()
        },
        |_| {},
    )
    .await;

    assert_eq!(app.call("GET", "/health", None, None).await.status, 200);
    assert_eq!(app.call("GET", "/health", None, None).await.status, 200);
    let limited = app.call("GET", "/health", None, None).await;
    assert_eq!(limited.status, 429);
    let retry_after: u64 = limited.header("retry-after").unwrap().parse().unwrap();
    assert!(retry_after >= 1);

    app.stop().await;
}

#[tokio::test]
async fn panicking_handler_returns_500() {
    let app = start_app_with(ServerConfig::default(), |router| {
        router.get("/panic", |_ctx| async move {
            panic!("test panic");
        });
    })
    .await;

    let reply = app.call("GET", "/panic", None, None).await;
    assert_eq!(reply.status, 500);
    assert_eq!(reply.body["error"], "Internal server error");

    // The server keeps serving afterwards
    assert_eq!(app.call("GET", "/health", None, None).await.status, 200);

    app.stop().await;
}

#[tokio::test]
async fn ai_routes_need_a_token_and_fall_back_without_a_key() {
    let app = start_app().await;
    let (_, token) = app.register("alice").await;
    let input = json!({ "title": "T", "content": "Some words" });

    let anonymous = app
        .call("POST", "/api/ai/tags", None, Some(input.clone()))
        .await;
    assert_eq!(anonymous.status, 401);

    let tags = app
        .call("POST", "/api/ai/tags", Some(&token), Some(input.clone()))
        .await;
    assert_eq!(tags.status, 200);
    assert_eq!(tags.body, json!({ "tags": [] }));

    let seo = app
        .call("POST", "/api/ai/seo", Some(&token), Some(input))
        .await;
    assert_eq!(seo.status, 200);
    assert_eq!(seo.body["seoScore"], 0);

    let missing = app
        .call("POST", "/api/ai/summarize", Some(&token), Some(json!({})))
        .await;
    assert_eq!(missing.status, 400);

    app.stop().await;
}
