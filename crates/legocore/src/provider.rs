use crate::{ApiError, HttpMethod};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Uniform request contract over one external backend.
#[async_trait]
pub trait ApiProvider: Send + Sync {
    /// Registry name (e.g. "diia", "opendatabot")
    fn name(&self) -> &str;

    fn base_url(&self) -> &str;

    /// Acquire credentials. Idempotent; called before first use.
    async fn authenticate(&self) -> Result<(), ApiError>;

    /// Issue a request. Failures are reported in the response, never raised.
    async fn request(&self, endpoint: &str, options: RequestOptions) -> ApiResponse;

    /// Drop any cached responses.
    fn clear_cache(&self) {}
}

/// Options for a single provider request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestOptions {
    #[serde(default)]
    pub method: HttpMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

impl RequestOptions {
    pub fn get() -> Self {
        Self::default()
    }

    pub fn post(body: Value) -> Self {
        Self {
            method: HttpMethod::Post,
            body: Some(body),
            ..Self::default()
        }
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// Provider response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
}

impl ApiResponse {
    pub fn ok(data: Value, metadata: ResponseMetadata) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            metadata: Some(metadata),
        }
    }

    pub fn failure(error: ApiError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            metadata: None,
        }
    }

    pub fn is_cached(&self) -> bool {
        self.metadata.as_ref().is_some_and(|m| m.cached)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub timestamp: DateTime<Utc>,
    pub request_id: String,
    pub cached: bool,
}

impl ResponseMetadata {
    pub fn new(cached: bool) -> Self {
        let suffix = uuid::Uuid::new_v4().simple().to_string();
        Self {
            timestamp: Utc::now(),
            request_id: format!("req_{}_{}", Utc::now().timestamp_millis(), &suffix[..9]),
            cached,
        }
    }
}

/// Resolves a provider name to an instance.
pub trait ProviderLookup: Send + Sync {
    fn provider(&self, name: &str) -> Option<Arc<dyn ApiProvider>>;
}

impl<F> ProviderLookup for F
where
    F: Fn(&str) -> Option<Arc<dyn ApiProvider>> + Send + Sync,
{
    fn provider(&self, name: &str) -> Option<Arc<dyn ApiProvider>> {
        self(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_ids_are_unique() {
        let a = ResponseMetadata::new(false);
        let b = ResponseMetadata::new(false);
        assert!(a.request_id.starts_with("req_"));
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn failure_serializes_structured_error() {
        let response = ApiResponse::failure(
            ApiError::new(ApiError::HTTP, "HTTP 404: Not Found").with_details(json!({"status": 404})),
        );
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], json!(false));
        assert_eq!(json["error"]["code"], json!("HTTP_ERROR"));
        assert_eq!(json["error"]["details"]["status"], json!(404));
        assert!(json.get("data").is_none());
    }
}
