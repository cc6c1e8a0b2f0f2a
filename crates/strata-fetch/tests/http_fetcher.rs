//! HttpFetcher against a local axum server.

use axum::{extract::Query, http::StatusCode, routing::get, Json, Router};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::collections::HashMap;
use strata_fetch::{FetchError, FetchRequest, Fetcher, HttpFetcher};

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn api() -> Router {
    Router::new()
        .route("/posts", get(|| async { Json(json!([{"id": 1, "title": "A"}])) }))
        .route(
            "/echo",
            get(|Query(params): Query<HashMap<String, String>>| async move { Json(json!(params)) }),
        )
        .route("/broken", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
        .route("/garbage", get(|| async { "definitely not json" }))
}

fn fetcher() -> HttpFetcher {
    let client = reqwest::Client::builder().no_proxy().build().unwrap();
    HttpFetcher::from_client(client)
}

#[tokio::test]
async fn test_fetch_parses_json() {
    let base = spawn(api()).await;
    let body = fetcher()
        .fetch(&FetchRequest::new(format!("{}/posts", base)))
        .await
        .unwrap();

    assert_eq!(body, json!([{"id": 1, "title": "A"}]));
}

#[tokio::test]
async fn test_fetch_sends_query_parameters() {
    let base = spawn(api()).await;
    let request = FetchRequest::new(format!("{}/echo", base))
        .query("limit", 1)
        .query("offset", 0);

    let body: Value = fetcher().fetch(&request).await.unwrap();
    assert_eq!(body["limit"], "1");
    assert_eq!(body["offset"], "0");
}

#[tokio::test]
async fn test_non_2xx_is_status_error() {
    let base = spawn(api()).await;
    let err = fetcher()
        .fetch(&FetchRequest::new(format!("{}/broken", base)))
        .await
        .unwrap_err();

    assert_eq!(err.status(), Some(500));
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let base = spawn(api()).await;
    let err = fetcher()
        .fetch(&FetchRequest::new(format!("{}/garbage", base)))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Parse { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_refused_connection_is_network_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = fetcher()
        .fetch(&FetchRequest::new(format!("http://{}/posts", addr)))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Network { .. }), "got {:?}", err);
}

#[tokio::test]
async fn test_invalid_url() {
    let err = fetcher()
        .fetch(&FetchRequest::new("not a url"))
        .await
        .unwrap_err();

    assert_eq!(err, FetchError::InvalidUrl("not a url".to_string()));
}
