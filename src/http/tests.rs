//! Tests for the HTTP page fetcher

use super::*;
use crate::config::ClientConfig;
use crate::context::Context;
use crate::engine::PageFetcher;
use crate::error::{Error, ErrorKind};
use crate::request::{PageRequest, TimeseriesRequest};
use crate::types::{ApiError, BackoffType, PageResult};
use serde_json::{json, Value};
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer) -> HttpClient {
    let config = ClientConfig::builder()
        .endpoint(server.uri())
        .api_key("abc")
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(10),
            Duration::from_secs(1),
        )
        .no_rate_limit()
        .build();
    HttpClient::with_config(config).unwrap()
}

fn candles_request() -> TimeseriesRequest {
    TimeseriesRequest::new("timeseries/market-candles")
        .param("markets", "bibox-aaa-usdt-spot")
        .frequency("1d")
}

#[test]
fn test_build_url() {
    let config = ClientConfig::builder()
        .endpoint("http://fake-endpoint.com/")
        .api_key("abc")
        .build();
    let client = HttpClient::with_config(config).unwrap();

    let mut request = TimeseriesRequest::new("/catalog/assets").param("assets", "btc");
    request.set_page_size(100);
    let url = client.build_url(&request).unwrap();

    assert_eq!(
        url.as_str(),
        "http://fake-endpoint.com/v4/catalog/assets?assets=btc&page_size=100&api_key=abc"
    );
}

#[test]
fn test_build_url_without_params() {
    let config = ClientConfig::builder()
        .endpoint("http://fake-endpoint.com")
        .build();
    let client = HttpClient::with_config(config).unwrap();

    let url = client
        .build_url(&TimeseriesRequest::new("catalog/assets"))
        .unwrap();
    assert_eq!(url.as_str(), "http://fake-endpoint.com/v4/catalog/assets");
}

#[test]
fn test_invalid_endpoint() {
    let config = ClientConfig::builder().endpoint("not a url").build();
    assert!(matches!(
        HttpClient::with_config(config),
        Err(Error::InvalidUrl(_))
    ));
}

#[tokio::test]
async fn test_fetch_page_success() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/timeseries/market-candles"))
        .and(query_param("markets", "bibox-aaa-usdt-spot"))
        .and(query_param("api_key", "abc"))
        .and(query_param("page_size", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"market": "bibox-aaa-usdt-spot", "time": "2021-03-07T00:00:00Z"},
                {"market": "bibox-aaa-usdt-spot", "time": "2021-03-08T00:00:00Z"}
            ],
            "next_page_token": "0.MjAyMS0wMy0wOA"
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let mut request = candles_request();
    request.set_page_size(2);

    let page = client
        .fetch(&Context::background(), &request)
        .await
        .unwrap();

    match page {
        PageResult::Data {
            items,
            next_page_token,
        } => {
            assert_eq!(items.len(), 2);
            assert_eq!(items[1]["time"], "2021-03-08T00:00:00Z");
            assert_eq!(next_page_token.as_deref(), Some("0.MjAyMS0wMy0wOA"));
        }
        other => panic!("Expected data, got {other:?}"),
    }
}

#[tokio::test]
async fn test_fetch_page_sends_cursor() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/timeseries/market-candles"))
        .and(query_param("next_page_token", "tok-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [1]})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let mut request = candles_request();
    request.set_next_page_token(Some("tok-2".into()));

    let page: PageResult<u32> = client
        .fetch_page(&Context::background(), &request)
        .await
        .unwrap();
    assert_eq!(page, PageResult::last(vec![1]));
}

#[tokio::test]
async fn test_fetch_page_bad_request() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/catalog/assets"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "type": "bad_parameter",
                "message": "Bad parameter 'assets'. Value 'sdvwbtc' is not supported."
            }
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let request = TimeseriesRequest::new("catalog/assets").param("assets", "sdvwbtc");
    let page = client
        .fetch(&Context::background(), &request)
        .await
        .unwrap();

    assert_eq!(
        page,
        PageResult::BadRequest(ApiError::new(
            "bad_parameter",
            "Bad parameter 'assets'. Value 'sdvwbtc' is not supported."
        ))
    );
}

#[tokio::test]
async fn test_fetch_page_unauthorized_and_forbidden() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/timeseries/asset-metrics"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"type": "unauthorized", "message": "Requested resource requires authorization."}
        })))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v4/timeseries/market-orderbooks"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"type": "forbidden", "message": "Requested resource is not available with supplied credentials."}
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let ctx = Context::background();

    let page = client
        .fetch(&ctx, &TimeseriesRequest::new("timeseries/asset-metrics"))
        .await
        .unwrap();
    assert!(matches!(page, PageResult::Unauthorized(e) if e.error_type == "unauthorized"));

    let page = client
        .fetch(&ctx, &TimeseriesRequest::new("timeseries/market-orderbooks"))
        .await
        .unwrap();
    assert!(matches!(page, PageResult::Forbidden(_)));
}

#[tokio::test]
async fn test_fetch_page_retry_on_500() {
    let mock_server = MockServer::start().await;

    // First two calls return 500, third succeeds
    Mock::given(method("GET"))
        .and(path("/v4/timeseries/market-candles"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v4/timeseries/market-candles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [{"ok": true}]})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let page = client
        .fetch(&Context::background(), &candles_request())
        .await
        .unwrap();

    assert!(page.is_data());
}

#[tokio::test]
async fn test_fetch_page_rate_limit_retry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/timeseries/market-candles"))
        .respond_with(
            ResponseTemplate::new(429)
                .insert_header("retry-after", "0")
                .set_body_string("Rate limited"),
        )
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v4/timeseries/market-candles"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": [1, 2]})))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let page: PageResult<u32> = client
        .fetch_page(&Context::background(), &candles_request())
        .await
        .unwrap();

    assert_eq!(page, PageResult::last(vec![1, 2]));
}

#[tokio::test]
async fn test_fetch_page_max_retries_exceeded() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/timeseries/market-candles"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service unavailable"))
        .expect(4)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let err = client
        .fetch(&Context::background(), &candles_request())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::HttpStatus { status: 503, .. }));
    assert_eq!(err.kind(), ErrorKind::Transport);
}

#[tokio::test]
async fn test_fetch_page_cancelled() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v4/timeseries/market-candles"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": [1]}))
                .set_delay(Duration::from_secs(10)),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);
    let (ctx, handle) = Context::with_cancel();

    let cancel = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.cancel();
    });

    let result = tokio::time::timeout(
        Duration::from_secs(2),
        client.fetch_page::<Value>(&ctx, &candles_request()),
    )
    .await
    .expect("cancellation should unblock the fetch");

    cancel.await.unwrap();
    assert!(matches!(result, Err(Error::Cancelled)));
}

#[test]
fn test_calculate_backoff_constant() {
    let config = ClientConfig::builder()
        .backoff(
            BackoffType::Constant,
            Duration::from_millis(100),
            Duration::from_secs(10),
        )
        .build();

    let client = HttpClient::with_config(config).unwrap();

    assert_eq!(client.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(client.calculate_backoff(5), Duration::from_millis(100));
}

#[test]
fn test_calculate_backoff_linear() {
    let config = ClientConfig::builder()
        .backoff(
            BackoffType::Linear,
            Duration::from_millis(100),
            Duration::from_secs(10),
        )
        .build();

    let client = HttpClient::with_config(config).unwrap();

    assert_eq!(client.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(client.calculate_backoff(2), Duration::from_millis(300));
}

#[test]
fn test_calculate_backoff_exponential_respects_max() {
    let config = ClientConfig::builder()
        .backoff(
            BackoffType::Exponential,
            Duration::from_millis(100),
            Duration::from_millis(500),
        )
        .build();

    let client = HttpClient::with_config(config).unwrap();

    assert_eq!(client.calculate_backoff(0), Duration::from_millis(100));
    assert_eq!(client.calculate_backoff(2), Duration::from_millis(400));
    assert_eq!(client.calculate_backoff(10), Duration::from_millis(500));
}

#[test]
fn test_http_client_debug_hides_key() {
    let config = ClientConfig::builder().api_key("secret-key").build();
    let client = HttpClient::with_config(config).unwrap();
    let debug = format!("{client:?}");
    assert!(debug.contains("HttpClient"));
    assert!(debug.contains("has_api_key: true"));
    assert!(!debug.contains("secret-key"));
}
