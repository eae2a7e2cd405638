mod common;

use axum::http::StatusCode;
use serde_json::json;

#[tokio::test]
async fn create_project_returns_slug_and_commits_file() {
    let env = common::TestEnv::start();
    let server = env.server();

    let response = server
        .post("/api/projects/create")
        .json(&json!({
            "slug": "Weather Station",
            "title_sv": "Väderstation",
            "title_en": "Weather Station",
            "description_sv": "En liten station",
            "description_en": "A small station",
            "role_sv": "Utvecklare",
            "role_en": "Developer",
            "status": "done",
            "year": 2022,
            "tags": ["iot"],
            "stack": ["rust", "embassy"],
            "repo_link": "https://github.com/someone/weather",
            "live_link": "",
            "coverImage": "/images/covers/1-weather.png",
            "highlightBullets_sv": ["Batteridriven"],
            "highlightBullets_en": ["Battery powered"],
            "body": "## Background\n\nIt measures things."
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["slug"], "weather-station");

    let file = env
        .document("projects", "weather-station")
        .await
        .expect("project file should be committed");
    assert!(file.starts_with("---\n"));
    assert!(file.contains("  en: Weather Station\n"));
    assert!(file.contains("status: done"));
    assert!(file.contains("https://github.com/someone/weather"));
    assert!(!file.contains("live:"));
    assert!(!file.contains("title_sv"));
    assert!(file.ends_with("---\n\n## Background\n\nIt measures things.\n"));

    let commits = env.store.commits().await;
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].message, "admin: add project weather-station");
}

#[tokio::test]
async fn create_project_missing_title_en_is_rejected() {
    let env = common::TestEnv::start();
    let server = env.server_permissive();

    let response = server
        .post("/api/projects/create")
        .json(&json!({ "slug": "x", "title_sv": "Titel" }))
        .await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("title_en"));
    assert!(env.store.commits().await.is_empty());
}

#[tokio::test]
async fn create_project_with_invalid_slug_is_rejected() {
    let env = common::TestEnv::start();
    let server = env.server_permissive();

    let response = env.create_project(&server, "!!!", "Title").await;

    response.assert_status_bad_request();
    let body: serde_json::Value = response.json();
    assert_eq!(body["fields"][0]["field"], "slug");
}

#[tokio::test]
async fn create_project_twice_fails_without_overwriting() {
    let env = common::TestEnv::start();
    let server = env.server_permissive();

    env.create_project(&server, "my-app", "First").await.assert_status_ok();
    let response = env.create_project(&server, "my-app", "Second").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Failed to create project");
    assert!(body["details"].is_string());

    let file = env.document("projects", "my-app").await.unwrap();
    assert!(file.contains("en: First"));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let env = common::TestEnv::start();
    let server = env.server_permissive();

    let response = server
        .post("/api/projects/create")
        .content_type("application/json")
        .bytes("{not json".into())
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn update_project_replaces_content_at_same_path() {
    let env = common::TestEnv::start();
    let server = env.server();

    env.create_project(&server, "my-app", "My App").await;

    let response = server
        .put("/api/projects/my-app")
        .json(&json!({
            "slug": "ignored-new-slug",
            "title_sv": "Min app",
            "title_en": "My Renamed App",
            "status": "paused",
            "body": "Updated body"
        }))
        .await;

    response.assert_status_ok();
    assert_eq!(response.json::<serde_json::Value>()["success"], true);

    assert!(env.document("projects", "ignored-new-slug").await.is_none());
    let file = env.document("projects", "my-app").await.unwrap();
    assert!(file.contains("en: My Renamed App"));
    assert!(file.contains("status: paused"));
    assert!(file.ends_with("\n\nUpdated body\n"));

    let commits = env.store.commits().await;
    assert_eq!(commits.last().unwrap().message, "admin: update project my-app");
}

#[tokio::test]
async fn update_missing_project_is_a_generic_failure() {
    let env = common::TestEnv::start();
    let server = env.server_permissive();

    let response = server
        .put("/api/projects/ghost")
        .json(&json!({ "title_sv": "a", "title_en": "b" }))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Failed to update project");
    assert!(env.store.commits().await.is_empty());
}

#[tokio::test]
async fn update_with_missing_required_field_is_rejected() {
    let env = common::TestEnv::start();
    let server = env.server();
    env.create_project(&server, "my-app", "My App").await;

    let response = server
        .put("/api/projects/my-app")
        .json(&json!({ "title_sv": "Min app" }))
        .expect_failure()
        .await;

    response.assert_status_bad_request();
    assert_eq!(env.store.commits().await.len(), 1);
}

#[tokio::test]
async fn get_project_returns_flat_form_shape() {
    let env = common::TestEnv::start();
    let server = env.server();

    server
        .post("/api/projects/create")
        .json(&json!({
            "slug": "my-app",
            "title_sv": "Min app",
            "title_en": "My App",
            "role_sv": "Roll",
            "role_en": "Role",
            "live_link": "https://example.com"
        }))
        .await;

    let body: serde_json::Value = server.get("/api/projects/my-app").await.json();
    assert_eq!(body["slug"], "my-app");
    assert_eq!(body["title_en"], "My App");
    assert_eq!(body["role_sv"], "Roll");
    assert_eq!(body["live_link"], "https://example.com");
    assert!(body.get("repo_link").is_none());
    assert_eq!(body["status"], "active");
    assert_eq!(body["body"], "# Project Content\n\nAdd your project description here...");
}

#[tokio::test]
async fn get_missing_project_is_not_found() {
    let env = common::TestEnv::start();
    let server = env.server_permissive();

    server.get("/api/projects/ghost").await.assert_status_not_found();
}

#[tokio::test]
async fn delete_project_removes_file() {
    let env = common::TestEnv::start();
    let server = env.server();
    env.create_project(&server, "my-app", "My App").await;

    let response = server.delete("/api/projects/my-app").await;

    assert_eq!(response.json::<serde_json::Value>()["success"], true);
    assert!(env.document("projects", "my-app").await.is_none());
    assert_eq!(
        env.store.commits().await.last().unwrap().message,
        "admin: delete project my-app"
    );
}

#[tokio::test]
async fn delete_missing_project_is_a_generic_failure() {
    let env = common::TestEnv::start();
    let server = env.server_permissive();

    let response = server.delete("/api/projects/ghost").await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"], "Failed to delete project");
}
