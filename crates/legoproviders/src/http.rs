use crate::config::ProviderConfig;
use async_trait::async_trait;
use legocore::{
    ApiError, ApiProvider, ApiResponse, HttpMethod, RequestOptions, Resolved, ResponseMetadata,
};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, Url};
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

/// JSON-over-HTTP provider: bearer authentication, GET response cache and
/// retry of transient failures.
pub struct HttpProvider {
    config: ProviderConfig,
    client: Client,
    token: OnceCell<Option<String>>,
    cache: RwLock<HashMap<String, Value>>,
}

impl HttpProvider {
    pub fn new(config: ProviderConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            config,
            client,
            token: OnceCell::new(),
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// Number of cached GET responses
    pub fn cached_entries(&self) -> usize {
        self.cache.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn cache_key(method: HttpMethod, endpoint: &str, params: Option<&Map<String, Value>>) -> String {
        let params = params
            .and_then(|p| serde_json::to_string(p).ok())
            .unwrap_or_else(|| "null".to_string());
        format!("{}:{}:{}", method, endpoint, params)
    }

    fn cached(&self, key: &str) -> Option<Value> {
        self.cache
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned()
    }

    fn store(&self, key: String, data: Value) {
        self.cache
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key, data);
    }

    fn build_url(&self, endpoint: &str, params: Option<&Map<String, Value>>) -> Result<Url, ApiError> {
        let raw = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!(
                "{}/{}",
                self.config.base_url.trim_end_matches('/'),
                endpoint.trim_start_matches('/')
            )
        };

        let mut url = Url::parse(&raw).map_err(|e| {
            ApiError::new(ApiError::INVALID_URL, format!("Invalid URL '{}': {}", raw, e))
        })?;

        if let Some(params) = params.filter(|p| !p.is_empty()) {
            let mut query = url.query_pairs_mut();
            for (key, value) in params {
                query.append_pair(key, &Resolved::from(value.clone()).render());
            }
        }

        Ok(url)
    }

    async fn send(&self, endpoint: &str, options: &RequestOptions) -> Result<Value, ApiError> {
        let url = self.build_url(endpoint, options.params.as_ref())?;
        let method = match options.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        };

        let mut request = self
            .client
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");
        if let Some(Some(token)) = self.token.get() {
            request = request.bearer_auth(token);
        }
        for (name, value) in &options.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if options.method != HttpMethod::Get {
            if let Some(body) = &options.body {
                request = request.json(body);
            }
        }

        let response = request.send().await.map_err(|e| {
            ApiError::new(ApiError::NETWORK, format!("Request failed: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::new(
                ApiError::HTTP,
                format!(
                    "HTTP {}: {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("Unknown")
                ),
            )
            .with_details(json!({"status": status.as_u16(), "body": body})));
        }

        let text = response.text().await.map_err(|e| {
            ApiError::new(ApiError::NETWORK, format!("Failed to read response: {}", e))
        })?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text).map_err(|e| {
            ApiError::new(
                ApiError::INVALID_RESPONSE,
                format!("Invalid JSON response: {}", e),
            )
        })
    }

    async fn send_with_retry(&self, endpoint: &str, options: &RequestOptions) -> Result<Value, ApiError> {
        let retry = &self.config.retry;
        let max_attempts = retry.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match self.send(endpoint, options).await {
                Ok(data) => return Ok(data),
                Err(error) if attempt < max_attempts && is_transient(&error) => {
                    let delay = retry.delay_for(attempt);
                    warn!(
                        "{} {} attempt {}/{} failed ({}), retrying in {:?}",
                        self.config.name, endpoint, attempt, max_attempts, error, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

/// Network failures and 5xx responses are worth another attempt.
fn is_transient(error: &ApiError) -> bool {
    match error.code.as_str() {
        ApiError::NETWORK => true,
        ApiError::HTTP => error
            .details
            .as_ref()
            .and_then(|d| d.get("status"))
            .and_then(Value::as_u64)
            .is_some_and(|status| status >= 500),
        _ => false,
    }
}

#[async_trait]
impl ApiProvider for HttpProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn base_url(&self) -> &str {
        &self.config.base_url
    }

    async fn authenticate(&self) -> Result<(), ApiError> {
        let token = self
            .token
            .get_or_init(|| async {
                info!("Authenticating API provider: {}", self.config.name);
                self.config.resolve_token()
            })
            .await;

        if token.is_none() && self.config.requires_token() {
            return Err(ApiError::new(
                ApiError::AUTHENTICATION,
                format!(
                    "{} requires a token in {}",
                    self.config.name,
                    self.config.token_env.as_deref().unwrap_or_default()
                ),
            ));
        }
        Ok(())
    }

    async fn request(&self, endpoint: &str, options: RequestOptions) -> ApiResponse {
        let cache_key = Self::cache_key(options.method, endpoint, options.params.as_ref());
        if options.method == HttpMethod::Get {
            if let Some(data) = self.cached(&cache_key) {
                debug!("{} cache hit: {}", self.config.name, cache_key);
                return ApiResponse::ok(data, ResponseMetadata::new(true));
            }
        }

        if let Err(error) = self.authenticate().await {
            return ApiResponse::failure(error);
        }

        debug!("{} {} {}", self.config.name, options.method, endpoint);
        match self.send_with_retry(endpoint, &options).await {
            Ok(data) => {
                if options.method == HttpMethod::Get {
                    self.store(cache_key, data.clone());
                }
                ApiResponse::ok(data, ResponseMetadata::new(false))
            }
            Err(error) => {
                warn!("{} request to {} failed: {}", self.config.name, endpoint, error);
                ApiResponse::failure(error)
            }
        }
    }

    fn clear_cache(&self) {
        self.cache.write().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(base_url: &str) -> HttpProvider {
        HttpProvider::new(ProviderConfig::new("test", base_url)).unwrap()
    }

    #[test]
    fn joins_base_url_and_endpoint() {
        let p = provider("https://opendatabot.ua/api/v3/");
        let mut params = Map::new();
        params.insert("code".to_string(), json!("12345678"));
        params.insert("limit".to_string(), json!(5));

        let url = p.build_url("/company", Some(&params)).unwrap();
        assert_eq!(
            url.as_str(),
            "https://opendatabot.ua/api/v3/company?code=12345678&limit=5"
        );
    }

    #[test]
    fn empty_params_add_no_query() {
        let p = provider("https://api.monobank.ua");
        let url = p.build_url("api/merchant/invoice/status", Some(&Map::new())).unwrap();
        assert_eq!(url.as_str(), "https://api.monobank.ua/api/merchant/invoice/status");
    }

    #[test]
    fn cache_key_includes_params() {
        let mut params = Map::new();
        params.insert("code".to_string(), json!("1"));

        assert_eq!(
            HttpProvider::cache_key(HttpMethod::Get, "/company", Some(&params)),
            r#"GET:/company:{"code":"1"}"#
        );
        assert_eq!(
            HttpProvider::cache_key(HttpMethod::Get, "/company", None),
            "GET:/company:null"
        );
    }

    #[test]
    fn transient_errors() {
        let server = ApiError::new(ApiError::HTTP, "HTTP 503").with_details(json!({"status": 503}));
        let client = ApiError::new(ApiError::HTTP, "HTTP 404").with_details(json!({"status": 404}));

        assert!(is_transient(&server));
        assert!(!is_transient(&client));
        assert!(is_transient(&ApiError::new(ApiError::NETWORK, "refused")));
        assert!(!is_transient(&ApiError::new(ApiError::INVALID_RESPONSE, "bad json")));
    }
}
