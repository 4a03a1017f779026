/// Authentication and database-free endpoint tests
///
/// These drive the router with a pool that never connects, so they run
/// without PostgreSQL:
/// - Init data presence, signature, and freshness checks
/// - Missing bot token handling
/// - Priority analysis
/// - Profile lookup failures

mod common;

use axum::http::StatusCode;
use common::{init_data_at, init_data_for, lazy_router, mock_profiles, send, BOT_TOKEN};
use minitask_shared::auth::init_data::sign;
use serde_json::json;

#[tokio::test]
async fn test_missing_init_data_is_unauthorized() {
    let app = lazy_router(Some(BOT_TOKEN), None);

    let (status, body) = send(&app, "GET", "/tasks", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
    assert_eq!(body["message"], "Telegram initData missing");
}

#[tokio::test]
async fn test_every_protected_route_requires_init_data() {
    let app = lazy_router(Some(BOT_TOKEN), None);

    for (method, uri) in [
        ("POST", "/tasks"),
        ("GET", "/tasks/1"),
        ("PUT", "/tasks/1"),
        ("DELETE", "/tasks/1"),
        ("POST", "/tasks/1/share"),
        ("POST", "/tasks/analyze-task"),
        ("GET", "/plans"),
        ("POST", "/plans/1/share"),
        ("GET", "/reminders"),
        ("GET", "/tg/info/42"),
    ] {
        let (status, _) = send(&app, method, uri, None, Some(json!({}))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{} {}", method, uri);
    }
}

#[tokio::test]
async fn test_tampered_init_data_is_unauthorized() {
    let app = lazy_router(Some(BOT_TOKEN), None);
    let tampered = init_data_for(1).replace("Test", "Evil");

    let (status, body) = send(&app, "GET", "/reminders", Some(tampered.as_str()), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_init_data_signed_with_other_token_is_unauthorized() {
    let app = lazy_router(Some(BOT_TOKEN), None);
    let auth_date = chrono::Utc::now().timestamp().to_string();
    let forged = sign(
        &[("auth_date", &auth_date), ("user", r#"{"id":1}"#)],
        "999:other-bot",
    )
    .unwrap();

    let (status, _) = send(&app, "GET", "/plans", Some(forged.as_str()), None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_init_data_is_unauthorized() {
    let app = lazy_router(Some(BOT_TOKEN), None);
    let two_hours_ago = chrono::Utc::now().timestamp() - 7200;

    let (status, body) = send(
        &app,
        "GET",
        "/plans",
        Some(init_data_at(1, two_hours_ago).as_str()),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["message"].as_str().unwrap().contains("expired"));
}

#[tokio::test]
async fn test_missing_bot_token_is_server_error() {
    let app = lazy_router(None, None);

    let (status, body) = send(&app, "GET", "/tasks", Some(init_data_for(1).as_str()), None).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "configuration_error");
}

#[tokio::test]
async fn test_analyze_task_suggests_priority() {
    let app = lazy_router(Some(BOT_TOKEN), None);
    let init_data = init_data_for(1);

    let cases = [
        (json!({ "title": "Urgent: call client" }), "high"),
        (json!({ "title": "Report", "description": "IMPORTANT for Monday" }), "high"),
        (json!({ "title": "Clean garage later" }), "low"),
        (json!({ "title": "Buy milk" }), "medium"),
    ];

    for (body, expected) in cases {
        let (status, response) =
            send(&app, "POST", "/tasks/analyze-task", Some(init_data.as_str()), Some(body)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(response["suggested_priority"], expected);
        assert!(response["advice"].as_str().is_some_and(|a| !a.is_empty()));
    }
}

#[tokio::test]
async fn test_analyze_task_validates_title() {
    let app = lazy_router(Some(BOT_TOKEN), None);

    let (status, body) = send(
        &app,
        "POST",
        "/tasks/analyze-task",
        Some(init_data_for(1).as_str()),
        Some(json!({ "title": "" })),
    )
    .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    assert_eq!(body["details"][0]["field"], "title");
}

#[tokio::test]
async fn test_unknown_telegram_profile_is_not_found() {
    let app = lazy_router(Some(BOT_TOKEN), Some(mock_profiles(None)));
    let init_data = init_data_for(1);

    let (status, body) = send(&app, "GET", "/tg/info/@nobody", Some(init_data.as_str()), None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"],
        "Telegram user not found or not visible to the bot"
    );
}

#[tokio::test]
async fn test_health_is_public_and_headers_are_set() {
    let app = lazy_router(Some(BOT_TOKEN), None);

    let request = axum::http::Request::builder()
        .uri("/health")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = tower::ServiceExt::oneshot(app, request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("X-Content-Type-Options").unwrap(),
        "nosniff"
    );

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["database"], "disconnected");
    assert_eq!(body["status"], "degraded");
}
