//! The axum adapter served over a real socket.

mod common;

use axum::http::StatusCode;
use common::start_server;
use route_dispatch::config::AppConfig;
use route_dispatch::dispatch::{HandlerUnit, ParsedBody, Signal};
use route_dispatch::http::X_REQUEST_ID;
use route_dispatch::middleware::{body_parser, cookie_parser, error_responder, not_found};
use route_dispatch::routing::{RouteTable, Router};

fn app() -> Router {
    let mut root = RouteTable::new();
    root.middleware([cookie_parser(), body_parser()])
        .unwrap()
        .get("/", [HandlerUnit::from_sync(|ctx| {
            let title = ctx
                .setting("title")
                .and_then(|v| v.as_str())
                .unwrap_or("untitled")
                .to_string();
            ctx.send(format!("Hello, {}", title))
        })])
        .unwrap()
        .post("/echo", [HandlerUnit::from_sync(|ctx| {
            let body = match &ctx.body {
                Some(ParsedBody::Json(value)) => value.clone(),
                _ => serde_json::Value::Null,
            };
            ctx.json(&body)
        })])
        .unwrap()
        .get("/whoami", [HandlerUnit::from_sync(|ctx| {
            let session = ctx.cookies.get("session").cloned().unwrap_or_default();
            ctx.send(session)
        })])
        .unwrap()
        .get("/boom", [HandlerUnit::from_sync(|_| Signal::fail("boom"))])
        .unwrap();

    let mut user = RouteTable::new();
    user.get("/:userId-:boardId", [HandlerUnit::from_sync(|ctx| {
        let params = ctx.params.clone();
        ctx.json(&params)
    })])
    .unwrap();

    let mut fallback = RouteTable::new();
    fallback.middleware([not_found(), error_responder()]).unwrap();

    let mut router = Router::new();
    router
        .mount("/", root)
        .unwrap()
        .mount("/users", user)
        .unwrap()
        .mount("/", fallback)
        .unwrap();
    router
}

fn config() -> AppConfig {
    let mut config = AppConfig::default();
    config
        .settings
        .insert("title".to_string(), serde_json::Value::from("route-dispatch"));
    config.limits.max_body_bytes = 64;
    config
}

#[tokio::test]
async fn test_serves_routes_and_settings() {
    let server = start_server(config(), app()).await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.text().await.unwrap(), "Hello, route-dispatch");

    let res = client.get(server.url("/users/test-title")).send().await.unwrap();
    let json: serde_json::Value = res.json().await.unwrap();
    assert_eq!(json, serde_json::json!({ "userId": "test", "boardId": "title" }));

    server.stop().await;
}

#[tokio::test]
async fn test_not_found_and_error_responses() {
    let server = start_server(config(), app()).await;
    let client = reqwest::Client::new();

    let res = client.delete(server.url("/unknown")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.text().await.unwrap(), "Cannot DELETE /unknown");

    let res = client.get(server.url("/boom")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.text().await.unwrap(), "boom");

    server.stop().await;
}

#[tokio::test]
async fn test_json_body_round_trip_and_bad_json() {
    let server = start_server(config(), app()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/echo"))
        .json(&serde_json::json!({ "name": "sub_bong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json: serde_json::Value = res.json().await.unwrap();
    assert_eq!(json["name"], "sub_bong");

    let res = client
        .post(server.url("/echo"))
        .header("content-type", "application/json")
        .body("{oops")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    server.stop().await;
}

#[tokio::test]
async fn test_body_limit_enforced() {
    let server = start_server(config(), app()).await;
    let client = reqwest::Client::new();

    let res = client
        .post(server.url("/echo"))
        .header("content-type", "text/plain")
        .body("x".repeat(1024))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);

    server.stop().await;
}

#[tokio::test]
async fn test_cookies_reach_handlers() {
    let server = start_server(config(), app()).await;
    let client = reqwest::Client::new();

    let res = client
        .get(server.url("/whoami"))
        .header("cookie", "session=abc123; theme=dark")
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "abc123");

    server.stop().await;
}

#[tokio::test]
async fn test_request_id_generated_and_propagated() {
    let server = start_server(config(), app()).await;
    let client = reqwest::Client::new();

    let res = client.get(server.url("/")).send().await.unwrap();
    let generated = res.headers().get(X_REQUEST_ID).unwrap().to_str().unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok());

    let res = client
        .get(server.url("/"))
        .header(X_REQUEST_ID, "client-chosen-id")
        .send()
        .await
        .unwrap();
    assert_eq!(res.headers().get(X_REQUEST_ID).unwrap(), "client-chosen-id");

    server.stop().await;
}

#[tokio::test]
async fn test_head_served_by_get_route() {
    let server = start_server(config(), app()).await;
    let client = reqwest::Client::new();

    let res = client.head(server.url("/")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    server.stop().await;
}

#[tokio::test]
async fn test_shutdown_stops_server() {
    let server = start_server(config(), app()).await;
    let addr = server.addr;
    server.stop().await;

    let result = reqwest::Client::new()
        .get(format!("http://{}/", addr))
        .send()
        .await;
    assert!(result.is_err());
}
