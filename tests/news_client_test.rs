//! `NewsApiClient` against a scripted local NewsAPI stand-in

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use esgpulse::error::BackendError;
use esgpulse::news::{NewsApiClient, NewsProvider};
use esgpulse::util::RetryPolicy;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

const OK_BODY: &str = r#"{
    "status": "ok",
    "totalResults": 2,
    "articles": [
        {"title": "Acme cuts emissions", "description": "Carbon output down 20%",
         "source": {"id": null, "name": "Wire"}, "url": "https://news.example/1",
         "publishedAt": "2024-05-01T10:00:00Z"},
        {"title": "Acme board shakeup", "description": "New audit committee chair",
         "source": {"id": null, "name": "Daily"}}
    ]
}"#;

/// Answers with the queued statuses in order, then 200 with `OK_BODY`
#[derive(Default)]
struct FakeNewsApi {
    script: Mutex<VecDeque<StatusCode>>,
    calls: AtomicUsize,
    keys: Mutex<Vec<String>>,
    params: Mutex<Vec<HashMap<String, String>>>,
}

async fn everything(
    State(api): State<Arc<FakeNewsApi>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    api.calls.fetch_add(1, Ordering::SeqCst);
    api.params.lock().unwrap().push(params);
    if let Some(key) = headers.get("x-api-key").and_then(|v| v.to_str().ok()) {
        api.keys.lock().unwrap().push(key.to_string());
    }

    let next = api.script.lock().unwrap().pop_front();
    match next {
        Some(status) => (status, r#"{"status": "error"}"#).into_response(),
        None => (StatusCode::OK, OK_BODY).into_response(),
    }
}

async fn start(script: Vec<StatusCode>) -> (String, Arc<FakeNewsApi>) {
    let api = Arc::new(FakeNewsApi {
        script: Mutex::new(script.into()),
        ..Default::default()
    });
    let app = Router::new()
        .route("/v2/everything", get(everything))
        .with_state(api.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{}/v2", addr), api)
}

fn fast_retry(attempts: u32) -> RetryPolicy {
    RetryPolicy::new(attempts)
        .with_base_delay(Duration::from_millis(5))
        .with_max_delay(Duration::from_millis(20))
        .without_jitter()
}

fn client(base_url: &str, attempts: u32) -> NewsApiClient {
    NewsApiClient::new(base_url, Some("test-key".to_string()))
        .unwrap()
        .with_min_interval(Duration::ZERO)
        .with_retry_policy(fast_retry(attempts))
}

#[tokio::test]
async fn test_fetch_parses_articles() {
    let (url, api) = start(vec![]).await;

    let articles = client(&url, 3).fetch("Acme Corp", 30).await;

    assert_eq!(articles.len(), 2);
    assert_eq!(articles[0].title, "Acme cuts emissions");
    assert_eq!(articles[0].source.as_deref(), Some("Wire"));
    assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    assert_eq!(*api.keys.lock().unwrap(), vec!["test-key".to_string()]);
}

#[tokio::test]
async fn test_company_query_ranks_by_relevancy() {
    let (url, api) = start(vec![]).await;

    client(&url, 1).fetch("Acme Corp", 30).await;

    let params = api.params.lock().unwrap();
    assert!(params[0]["q"].starts_with("\"Acme Corp\" AND (ESG OR"));
    assert_eq!(params[0]["sortBy"], "relevancy");
    assert_eq!(params[0]["pageSize"], "20");
    assert_eq!(params[0]["language"], "en");
}

#[tokio::test]
async fn test_sector_query_is_newest_first() {
    let (url, api) = start(vec![StatusCode::BAD_GATEWAY]).await;

    let articles = client(&url, 2).fetch_sector("Energy", 7).await;

    assert_eq!(articles.len(), 2);
    assert_eq!(api.calls.load(Ordering::SeqCst), 2);
    let params = api.params.lock().unwrap();
    assert_eq!(
        params[1]["q"],
        "\"Energy\" AND (ESG OR sustainability OR environmental impact)"
    );
    assert_eq!(params[1]["sortBy"], "publishedAt");
    assert_eq!(params[1]["pageSize"], "10");
}

#[tokio::test]
async fn test_rate_limit_is_retried() {
    let (url, api) = start(vec![StatusCode::TOO_MANY_REQUESTS]).await;

    let articles = client(&url, 3).fetch("Acme Corp", 30).await;

    assert_eq!(articles.len(), 2);
    assert_eq!(api.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_server_errors_exhaust_retries() {
    let (url, api) = start(vec![StatusCode::SERVICE_UNAVAILABLE; 5]).await;
    let client = client(&url, 3);

    let err = client.try_fetch("Acme Corp", 30).await.unwrap_err();
    assert!(matches!(
        err,
        BackendError::ApiError {
            status_code: Some(503),
            ..
        }
    ));
    assert_eq!(api.calls.load(Ordering::SeqCst), 3);

    // two scripted failures left, so the infallible path gives up too
    assert!(client.fetch("Acme Corp", 30).await.is_empty());
    assert_eq!(api.calls.load(Ordering::SeqCst), 5);
}

#[tokio::test]
async fn test_unauthorized_is_not_retried() {
    let (url, api) = start(vec![StatusCode::UNAUTHORIZED]).await;

    let err = client(&url, 3).try_fetch("Acme Corp", 30).await.unwrap_err();

    assert!(matches!(err, BackendError::AuthenticationError { .. }));
    assert_eq!(api.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_requests_are_paced() {
    let (url, api) = start(vec![]).await;
    let interval = Duration::from_millis(150);
    let client = client(&url, 1).with_min_interval(interval);

    let start = Instant::now();
    client.fetch("Acme Corp", 30).await;
    client.fetch("Acme Corp", 30).await;

    assert!(start.elapsed() >= interval);
    assert_eq!(api.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_unreachable_server_yields_no_news() {
    let client = NewsApiClient::new("http://127.0.0.1:9", Some("k".to_string()))
        .unwrap()
        .with_timeout(Duration::from_millis(500))
        .unwrap()
        .with_retry_policy(RetryPolicy::none());

    assert!(client.fetch("Acme Corp", 30).await.is_empty());
}
