//! User administration is admin-only.

use inkstone::Role;
use serde_json::json;

use super::start_app;

#[tokio::test]
async fn listing_users_requires_admin_and_hides_hashes() {
    let app = start_app().await;
    let (_, editor) = app.register("alice").await;
    let (_, admin) = app.user_with_role("root", Role::Admin).await;

    let denied = app.call("GET", "/api/users", Some(&editor), None).await;
    assert_eq!(denied.status, 403);

    let listing = app.call("GET", "/api/users", Some(&admin), None).await;
    assert_eq!(listing.status, 200);
    let users = listing.body.as_array().unwrap();
    assert_eq!(users.len(), 2);
    for user in users {
        assert!(user.get("password_hash").is_none());
        assert!(user.get("password").is_none());
    }

    app.stop().await;
}

/// A role change is picked up by the next token, not by tokens already
/// issued.
#[tokio::test]
async fn role_change_applies_to_new_tokens() {
    let app = start_app().await;
    let (bob_id, old_token) = app.register("bob").await;
    let (_, admin) = app.user_with_role("root", Role::Admin).await;

    let changed = app
        .call(
            "PUT",
            &format!("/api/users/{bob_id}/role"),
            Some(&admin),
            Some(json!({ "role": "admin" })),
        )
        .await;
    assert_eq!(changed.status, 200);
    assert_eq!(changed.body["role"], "admin");

    let stale = app.call("GET", "/api/users", Some(&old_token), None).await;
    assert_eq!(stale.status, 403);

    let fresh = app.login("bob").await;
    let listing = app.call("GET", "/api/users", Some(&fresh), None).await;
    assert_eq!(listing.status, 200);

    app.stop().await;
}

#[tokio::test]
async fn role_change_validates_input() {
    let app = start_app().await;
    let (bob_id, bob) = app.register("bob").await;
    let (_, admin) = app.user_with_role("root", Role::Admin).await;

    let self_promotion = app
        .call(
            "PUT",
            &format!("/api/users/{bob_id}/role"),
            Some(&bob),
            Some(json!({ "role": "admin" })),
        )
        .await;
    assert_eq!(self_promotion.status, 403);

    let bogus = app
        .call(
            "PUT",
            &format!("/api/users/{bob_id}/role"),
            Some(&admin),
            Some(json!({ "role": "owner" })),
        )
        .await;
    assert_eq!(bogus.status, 400);

    let missing = app
        .call(
            "PUT",
            "/api/users/nobody/role",
            Some(&admin),
            Some(json!({ "role": "viewer" })),
        )
        .await;
    assert_eq!(missing.status, 404);

    app.stop().await;
}
