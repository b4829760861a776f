use legocore::{ApiError, ApiProvider, RequestOptions};
use legoproviders::{
    DiiaProvider, HttpProvider, MonobankProvider, OpenDataBotProvider, ProviderConfig, RetryPolicy,
};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer) -> HttpProvider {
    let config = ProviderConfig::new("Test", server.uri()).with_token("secret");
    HttpProvider::new(config).unwrap()
}

#[tokio::test]
async fn test_get_is_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/company"))
        .and(query_param("code", "12345678"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "TOV Romashka"})))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider(&server);
    let options = RequestOptions::get().with_param("code", "12345678");

    let first = provider.request("/company", options.clone()).await;
    assert!(first.success);
    assert!(!first.is_cached());
    assert_eq!(first.data, Some(json!({"name": "TOV Romashka"})));

    let second = provider.request("/company", options).await;
    assert!(second.success);
    assert!(second.is_cached());
    assert_eq!(second.data, first.data);
    assert_eq!(provider.cached_entries(), 1);
}

#[tokio::test]
async fn test_clear_cache_forces_new_request() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/edrfo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"brand": "Tesla"})))
        .expect(2)
        .mount(&server)
        .await;

    let provider = provider(&server);
    provider.request("/edrfo", RequestOptions::get()).await;
    provider.clear_cache();
    assert_eq!(provider.cached_entries(), 0);

    let response = provider.request("/edrfo", RequestOptions::get()).await;
    assert!(!response.is_cached());
}

#[tokio::test]
async fn test_http_error_is_structured() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/court"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such case"))
        .mount(&server)
        .await;

    let response = provider(&server).request("/court", RequestOptions::get()).await;

    assert!(!response.success);
    assert!(response.data.is_none());
    let error = response.error.unwrap();
    assert_eq!(error.code, ApiError::HTTP);
    assert!(error.message.starts_with("HTTP 404"));
    assert_eq!(
        error.details,
        Some(json!({"status": 404, "body": "no such case"}))
    );
}

#[tokio::test]
async fn test_invalid_json_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let response = provider(&server).request("/company", RequestOptions::get()).await;

    assert!(!response.success);
    assert_eq!(response.error.unwrap().code, ApiError::INVALID_RESPONSE);
}

#[tokio::test]
async fn test_network_error() {
    let config = ProviderConfig::new("Offline", "http://127.0.0.1:9").with_token("t");
    let provider = HttpProvider::new(config).unwrap();

    let response = provider.request("/anything", RequestOptions::get()).await;

    assert!(!response.success);
    assert_eq!(response.error.unwrap().code, ApiError::NETWORK);
}

#[tokio::test]
async fn test_bearer_token_and_custom_headers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/documents"))
        .and(header("authorization", "Bearer secret"))
        .and(header("x-request-source", "lego"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let response = provider(&server)
        .request(
            "/api/v1/documents",
            RequestOptions::get().with_header("X-Request-Source", "lego"),
        )
        .await;

    assert!(response.success);
    assert_eq!(response.data, Some(json!([])));
}

#[tokio::test]
async fn test_post_sends_body_and_is_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/merchant/invoice/create"))
        .and(body_json(json!({"amount": 50000, "description": "Fine"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"invoiceId": "inv_1", "pageUrl": "https://pay"})),
        )
        .expect(2)
        .mount(&server)
        .await;

    let provider = provider(&server);
    let options = RequestOptions::post(json!({"amount": 50000, "description": "Fine"}));

    let first = provider.request("/api/merchant/invoice/create", options.clone()).await;
    let second = provider.request("/api/merchant/invoice/create", options).await;

    assert!(first.success);
    assert!(!second.is_cached());
    assert_eq!(provider.cached_entries(), 0);
}

#[tokio::test]
async fn test_retries_server_errors() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/company"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/company"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let config = ProviderConfig::new("Test", server.uri())
        .with_token("secret")
        .with_retry(RetryPolicy::attempts(3, 10));
    let provider = HttpProvider::new(config).unwrap();

    let response = provider.request("/company", RequestOptions::get()).await;

    assert!(response.success);
    assert_eq!(response.data, Some(json!({"ok": true})));
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(400))
        .expect(1)
        .mount(&server)
        .await;

    let config = ProviderConfig::new("Test", server.uri())
        .with_token("secret")
        .with_retry(RetryPolicy::attempts(3, 10));
    let provider = HttpProvider::new(config).unwrap();

    let response = provider.request("/company", RequestOptions::get()).await;
    assert!(!response.success);
}

#[tokio::test]
async fn test_named_provider_convenience_call() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v3/company"))
        .and(query_param("code", "00032129"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "active"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = ProviderConfig::opendatabot()
        .with_base_url(format!("{}/api/v3", server.uri()))
        .with_token("secret");
    let provider = OpenDataBotProvider::with_config(config).unwrap();

    assert_eq!(provider.name(), "OpenDataBot");
    let response = provider.search_company("00032129").await;
    assert_eq!(response.data, Some(json!({"status": "active"})));
}

#[tokio::test]
async fn test_missing_required_token_fails_authentication() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = ProviderConfig::new("Strict", server.uri())
        .with_required_token_env("LEGO_TEST_STRICT_TOKEN_NOT_SET");
    let provider = HttpProvider::new(config).unwrap();

    let error = provider.authenticate().await.unwrap_err();
    assert_eq!(error.code, ApiError::AUTHENTICATION);
    assert!(error.message.contains("LEGO_TEST_STRICT_TOKEN_NOT_SET"));

    let response = provider.request("/company", RequestOptions::get()).await;
    assert!(!response.success);
    assert_eq!(response.error.unwrap().code, ApiError::AUTHENTICATION);
}

#[tokio::test]
async fn test_slow_backend_times_out_as_network_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ok": true}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&server)
        .await;

    let config = ProviderConfig::new("Slow", server.uri())
        .with_token("secret")
        .with_timeout(Duration::from_millis(50));
    let provider = HttpProvider::new(config).unwrap();

    let response = provider.request("/company", RequestOptions::get()).await;

    assert!(!response.success);
    assert_eq!(response.error.unwrap().code, ApiError::NETWORK);
    assert_eq!(provider.cached_entries(), 0);
}

#[tokio::test]
async fn test_named_providers_delegate_to_http_client() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/merchant/invoice/status"))
        .and(query_param("invoiceId", "inv_1"))
        .and(header("authorization", "Bearer mono"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "success"})))
        .expect(2)
        .mount(&server)
        .await;

    let monobank = MonobankProvider::with_config(
        ProviderConfig::monobank().with_base_url(server.uri()).with_token("mono"),
    )
    .unwrap();
    assert_eq!(monobank.name(), "Monobank");
    assert_eq!(monobank.base_url(), server.uri());
    assert!(monobank.authenticate().await.is_ok());

    let first = monobank.invoice_status("inv_1").await;
    assert!(first.success);
    assert!(monobank.invoice_status("inv_1").await.is_cached());

    monobank.clear_cache();
    assert!(!monobank.invoice_status("inv_1").await.is_cached());

    let diia = DiiaProvider::with_config(ProviderConfig::diia().with_base_url(server.uri())).unwrap();
    assert_eq!(diia.name(), "Diia");
}
