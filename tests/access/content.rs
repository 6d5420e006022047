//! Ownership and lifecycle rules on the content routes.

use inkstone::Role;
use serde_json::json;

use super::{App, start_app};

async fn create(app: &App, token: &str, title: &str, status: &str) -> String {
    let reply = app
        .call(
            "POST",
            "/api/content",
            Some(token),
            Some(json!({ "title": title, "body": "Some text.", "status": status })),
        )
        .await;
    assert_eq!(reply.status, 201, "create: {:?}", reply.body);
    reply.body["id"].as_str().unwrap().to_string()
}

/// An editor deleting someone else's item is refused, and the item stays
/// exactly as it was.
#[tokio::test]
async fn editor_cannot_archive_another_editors_content() {
    let app = start_app().await;
    let (_, alice) = app.register("alice").await;
    let (_, bob) = app.register("bob").await;
    let id = create(&app, &alice, "Alice's post", "draft").await;

    let denied = app
        .call("DELETE", &format!("/api/content/{id}"), Some(&bob), None)
        .await;
    assert_eq!(denied.status, 403, "{:?}", denied.body);

    let edit = app
        .call(
            "PUT",
            &format!("/api/content/{id}"),
            Some(&bob),
            Some(json!({ "title": "Hijacked", "body": "x" })),
        )
        .await;
    assert_eq!(edit.status, 403);

    let publish = app
        .call("POST", &format!("/api/content/{id}/publish"), Some(&bob), None)
        .await;
    assert_eq!(publish.status, 403);

    let item = app
        .call("GET", &format!("/api/content/{id}"), Some(&alice), None)
        .await;
    assert_eq!(item.status, 200);
    assert_eq!(item.body["status"], "draft");
    assert_eq!(item.body["title"], "Alice's post");

    app.stop().await;
}

#[tokio::test]
async fn owner_and_admin_can_archive() {
    let app = start_app().await;
    let (_, alice) = app.register("alice").await;
    let (_, admin) = app.user_with_role("root", Role::Admin).await;

    let mine = create(&app, &alice, "Mine", "draft").await;
    let theirs = create(&app, &alice, "Theirs", "published").await;

    let own = app
        .call("DELETE", &format!("/api/content/{mine}"), Some(&alice), None)
        .await;
    assert_eq!(own.status, 200);
    assert_eq!(own.body["status"], "archived");

    let by_admin = app
        .call("DELETE", &format!("/api/content/{theirs}"), Some(&admin), None)
        .await;
    assert_eq!(by_admin.status, 200);
    assert_eq!(by_admin.body["status"], "archived");

    let listing = app.call("GET", "/api/content", Some(&alice), None).await;
    assert_eq!(listing.body, json!([]));

    let dashboard = app.call("GET", "/api/dashboard", Some(&alice), None).await;
    assert_eq!(dashboard.body["stats"]["archived"], 2);
    assert_eq!(dashboard.body["recent"], json!([]));

    app.stop().await;
}

/// Missing identity is 401; a known identity with too little rank is 403.
#[tokio::test]
async fn unauthenticated_and_underprivileged_are_distinct() {
    let app = start_app().await;
    let (_, viewer) = app.user_with_role("vera", Role::Viewer).await;
    let body = json!({ "title": "T", "body": "B" });

    let anonymous = app
        .call("POST", "/api/content", None, Some(body.clone()))
        .await;
    assert_eq!(anonymous.status, 401);
    assert!(
        anonymous.body["error"]
            .as_str()
            .unwrap()
            .contains("logged in")
    );

    let forbidden = app
        .call("POST", "/api/content", Some(&viewer), Some(body))
        .await;
    assert_eq!(forbidden.status, 403);
    assert!(
        forbidden.body["error"]
            .as_str()
            .unwrap()
            .contains("editor role or higher")
    );

    // Viewers can still read published content
    let published = app
        .call("GET", "/api/content/published", Some(&viewer), None)
        .await;
    assert_eq!(published.status, 200);

    app.stop().await;
}

#[tokio::test]
async fn drafts_are_private_and_published_reads_count_views() {
    let app = start_app().await;
    let (_, alice) = app.register("alice").await;
    let (_, bob) = app.register("bob").await;

    let draft = create(&app, &alice, "Secret", "draft").await;
    let post = create(&app, &alice, "Hello World!", "published").await;

    let hidden = app
        .call("GET", &format!("/api/content/{draft}"), Some(&bob), None)
        .await;
    assert_eq!(hidden.status, 404);

    for _ in 0..2 {
        let read = app
            .call("GET", &format!("/api/content/{post}"), Some(&bob), None)
            .await;
        assert_eq!(read.status, 200);
        assert_eq!(read.body["slug"], "hello-world");
    }

    let totals = app
        .call("GET", &format!("/api/content/{post}/analytics"), Some(&alice), None)
        .await;
    assert_eq!(totals.status, 200);
    assert_eq!(totals.body["views"], 2);
    assert_eq!(totals.body["unique_visitors"], 1);

    let not_owner = app
        .call("GET", &format!("/api/content/{post}/analytics"), Some(&bob), None)
        .await;
    assert_eq!(not_owner.status, 403);

    let draft_totals = app
        .call("GET", &format!("/api/content/{draft}/analytics"), Some(&bob), None)
        .await;
    assert_eq!(draft_totals.status, 404);
    let own_draft = app
        .call("GET", &format!("/api/content/{draft}/analytics"), Some(&alice), None)
        .await;
    assert_eq!(own_draft.status, 200);

    let overview = app.call("GET", "/api/analytics", Some(&alice), None).await;
    assert_eq!(overview.status, 200);
    assert_eq!(overview.body["top_content"][0]["id"], post.as_str());

    app.stop().await;
}

#[tokio::test]
async fn lifecycle_is_enforced() {
    let app = start_app().await;
    let (_, alice) = app.register("alice").await;
    let id = create(&app, &alice, "Lifecycle", "draft").await;

    let archived_on_create = app
        .call(
            "POST",
            "/api/content",
            Some(&alice),
            Some(json!({ "title": "X", "body": "Y", "status": "archived" })),
        )
        .await;
    assert_eq!(archived_on_create.status, 400);

    let published = app
        .call("POST", &format!("/api/content/{id}/publish"), Some(&alice), None)
        .await;
    assert_eq!(published.status, 200);
    assert_eq!(published.body["status"], "published");
    let stamped = published.body["published_at"].clone();
    assert!(stamped.is_i64());

    let again = app
        .call("POST", &format!("/api/content/{id}/publish"), Some(&alice), None)
        .await;
    assert_eq!(again.status, 200);
    assert_eq!(again.body["published_at"], stamped);

    let back_to_draft = app
        .call(
            "PUT",
            &format!("/api/content/{id}"),
            Some(&alice),
            Some(json!({ "title": "Lifecycle", "body": "B", "status": "draft" })),
        )
        .await;
    assert_eq!(back_to_draft.status, 409);

    app.call("DELETE", &format!("/api/content/{id}"), Some(&alice), None)
        .await;
    let edit_archived = app
        .call(
            "PUT",
            &format!("/api/content/{id}"),
            Some(&alice),
            Some(json!({ "title": "Lifecycle", "body": "B" })),
        )
        .await;
    assert_eq!(edit_archived.status, 409);

    let missing = app
        .call("DELETE", "/api/content/does-not-exist", Some(&alice), None)
        .await;
    assert_eq!(missing.status, 404);

    app.stop().await;
}

#[tokio::test]
async fn admin_edits_use_the_any_content_permission() {
    let app = start_app().await;
    let (_, alice) = app.register("alice").await;
    let (_, admin) = app.user_with_role("root", Role::Admin).await;
    let id = create(&app, &alice, "Typo Titel", "draft").await;

    let fixed = app
        .call(
            "PUT",
            &format!("/api/content/{id}"),
            Some(&admin),
            Some(json!({ "title": "Typo Title", "body": "Fixed." })),
        )
        .await;
    assert_eq!(fixed.status, 200);
    assert_eq!(fixed.body["slug"], "typo-title");
    assert_eq!(fixed.body["status"], "draft");

    app.stop().await;
}
