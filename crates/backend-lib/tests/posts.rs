// crates/backend-lib/tests/posts.rs
mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{error_message, setup_test_app};

#[tokio::test]
async fn test_post_crud_by_creator() {
    let app = setup_test_app();
    let token = app.signed_in("ada", "ada@example.com").await;

    let (status, post) = app
        .create_post(&token, "https://example.com/a", &["Rust", "web", "rust"])
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(post["tags"], json!(["rust", "web"]));
    let id = post["id"].as_i64().unwrap();

    let (status, fetched) = app
        .request(Method::GET, &format!("/api/posts/{id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched, post);

    let (status, updated) = app
        .request(
            Method::PUT,
            &format!("/api/posts/{id}"),
            Some(&token),
            Some(json!({
                "title": "Renamed",
                "image": "https://img.example.com/new.png",
                "tags": ["async"],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Renamed");
    assert_eq!(updated["link"], "https://example.com/a");
    assert_eq!(updated["tags"], json!(["async"]));

    let (status, deleted) = app
        .request(Method::DELETE, &format!("/api/posts/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["id"], id);

    let (status, body) = app
        .request(Method::GET, &format!("/api/posts/{id}"), None, None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&body), "Post does not exists!");
}

#[tokio::test]
async fn test_only_creator_can_modify() {
    let app = setup_test_app();
    let owner = app.signed_in("ada", "ada@example.com").await;
    let other = app.signed_in("bob", "bob@example.com").await;

    let (_, post) = app.create_post(&owner, "https://example.com/a", &["rust"]).await;
    let id = post["id"].as_i64().unwrap();

    let (status, _) = app
        .request(
            Method::PUT,
            &format!("/api/posts/{id}"),
            Some(&other),
            Some(json!({
                "title": "Hijacked",
                "image": "https://img.example.com/x.png",
                "tags": ["spam"],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .request(Method::DELETE, &format!("/api/posts/{id}"), Some(&other), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, fetched) = app
        .request(Method::GET, &format!("/api/posts/{id}"), None, None)
        .await;
    assert_eq!(fetched["title"], post["title"]);
}

#[tokio::test]
async fn test_post_input_errors() {
    let app = setup_test_app();
    let token = app.signed_in("ada", "ada@example.com").await;

    let (status, body) = app.request(Method::GET, "/api/posts/abc", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Post ID must be a number.");

    let (status, body) = app
        .request(
            Method::POST,
            "/api/posts",
            Some(&token),
            Some(json!({ "title": "Only a title" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Missing required fields: link, image, tags");

    let (status, body) = app.create_post(&token, "not a url", &["rust"]).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "Invalid URL format for link or image");

    app.create_post(&token, "https://example.com/a", &["rust"]).await;
    let (status, _) = app.create_post(&token, "https://example.com/a", &["rust"]).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = app
        .request(Method::DELETE, "/api/posts/999", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_post_writes_need_a_token() {
    let app = setup_test_app();

    let (status, body) = app
        .request(
            Method::POST,
            "/api/posts",
            None,
            Some(json!({ "title": "anonymous" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(error_message(&body), "auth header not set");

    let (status, _) = app
        .request(Method::DELETE, "/api/posts/1", Some("forged"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unsupported_methods_answer_405() {
    let app = setup_test_app();

    let (status, _) = app.request(Method::PATCH, "/api/posts", None, None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = app.request(Method::PATCH, "/api/posts/1", None, None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    let (status, _) = app.request(Method::DELETE, "/api/tags", None, None).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

    // Public reads on shared paths stay open
    let (status, _) = app.request(Method::GET, "/api/posts", None, None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_listing_pagination_and_filters() {
    let app = setup_test_app();
    let token = app.signed_in("ada", "ada@example.com").await;

    app.create_post(&token, "https://example.com/1", &["rust"]).await;
    app.create_post(&token, "https://example.com/2", &["rust", "web"]).await;
    app.create_post(&token, "https://example.com/3", &["web"]).await;

    // posts_per_page is 2 in the test settings
    let (status, page) = app.request(Method::GET, "/api/posts", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["currentPage"], 1);
    assert_eq!(page["totalPages"], 2);
    assert_eq!(page["nextPageExists"], true);
    assert_eq!(page["posts"].as_array().unwrap().len(), 2);

    let (_, page) = app.request(Method::GET, "/api/posts?page=2", None, None).await;
    assert_eq!(page["nextPageExists"], false);
    assert_eq!(page["posts"].as_array().unwrap().len(), 1);

    let (_, page) = app.request(Method::GET, "/api/posts?tags=Rust", None, None).await;
    assert_eq!(page["totalPages"], 1);
    assert_eq!(page["posts"].as_array().unwrap().len(), 2);

    let (_, page) = app
        .request(Method::GET, "/api/posts?tags=rust,web", None, None)
        .await;
    let posts = page["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["link"], "https://example.com/2");

    let (_, page) = app
        .request(Method::GET, "/api/posts?query=example.com%2F3", None, None)
        .await;
    assert_eq!(page["posts"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_tags_listing() {
    let app = setup_test_app();

    let (status, body) = app.request(Method::GET, "/api/tags", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(error_message(&body), "No tags found");

    let token = app.signed_in("ada", "ada@example.com").await;
    app.create_post(&token, "https://example.com/1", &["web", "Rust"]).await;

    let (status, body) = app.request(Method::GET, "/api/tags", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "allTags": ["rust", "web"] }));
}
