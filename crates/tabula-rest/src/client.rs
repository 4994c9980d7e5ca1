use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

use tabula_api::{ApiError, FetchParams, Value};
use tabula_core::Result;

pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// JSON-over-HTTP client shared by every resource.
///
/// Transport failures become `ApiError::Network`, non-2xx responses become
/// `ApiError::Http` carrying the server's `message` when it sent one.
#[derive(Clone)]
pub struct RestClient {
    base_url: String,
    client: reqwest::Client,
}

impl RestClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Query string pairs for `params`, sorted by key.
    ///
    /// Nulls are skipped and arrays repeat the key once per element.
    pub fn query_pairs(params: &FetchParams) -> Vec<(String, String)> {
        let mut keys: Vec<&String> = params.keys().collect();
        keys.sort();

        let mut pairs = Vec::new();
        for key in keys {
            match &params[key] {
                Value::Null => {}
                Value::Array(values) => {
                    for v in values.iter().filter(|v| !v.is_null()) {
                        pairs.push((key.clone(), v.search_text()));
                    }
                }
                other => pairs.push((key.clone(), other.search_text())),
            }
        }
        pairs
    }

    /// Helper to create better error messages from reqwest errors
    fn format_reqwest_error(e: reqwest::Error, url: &str, operation: &str) -> ApiError {
        let message = if e.is_timeout() {
            format!(
                "Failed to {} {}: timeout - request took too long (check network or increase timeout)",
                operation, url
            )
        } else if e.is_connect() {
            format!(
                "Failed to {} {}: connection error - is the server running? Error: {}",
                operation, url, e
            )
        } else if e.is_decode() {
            format!(
                "Failed to {} {}: decode error - unexpected response format from server. Error: {}",
                operation, url, e
            )
        } else {
            format!("Failed to {} {}: {}", operation, url, e)
        };
        error!("[RestClient] {}", message);
        ApiError::network(message)
    }

    /// `ApiError::Http` for a failed response, preferring the server's own
    /// `message` field over a generic `HTTP <status>`
    pub fn http_error(status: u16, body: &str) -> ApiError {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|json| {
                json.get("message")
                    .and_then(|m| m.as_str())
                    .filter(|m| !m.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| format!("HTTP {}", status));
        ApiError::Http { status, message }
    }

    /// Helper to handle HTTP responses with better error messages
    async fn handle_response(response: reqwest::Response, url: &str) -> Result<serde_json::Value> {
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Self::format_reqwest_error(e, url, "read response body from"))?;

        if !status.is_success() {
            error!(
                "[RestClient] HTTP {} from {}: {}",
                status.as_u16(),
                url,
                text.chars().take(200).collect::<String>()
            );
            return Err(Self::http_error(status.as_u16(), &text));
        }

        parse_body(&text)
    }

    pub async fn get(&self, path: &str, params: &FetchParams) -> Result<serde_json::Value> {
        let url = self.url(path);
        debug!("[RestClient] GET {} {:?}", url, params);

        let response = self
            .client
            .get(&url)
            .query(&Self::query_pairs(params))
            .send()
            .await
            .map_err(|e| Self::format_reqwest_error(e, &url, "GET"))?;

        Self::handle_response(response, &url).await
    }

    /// GET that maps 404 to `None`
    pub async fn get_optional(&self, path: &str) -> Result<Option<serde_json::Value>> {
        let url = self.url(path);
        debug!("[RestClient] GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Self::format_reqwest_error(e, &url, "GET"))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!("[RestClient] {} not found", url);
            return Ok(None);
        }
        Self::handle_response(response, &url).await.map(Some)
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<serde_json::Value> {
        let url = self.url(path);
        debug!("[RestClient] POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| Self::format_reqwest_error(e, &url, "POST"))?;

        Self::handle_response(response, &url).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<serde_json::Value> {
        let url = self.url(path);
        debug!("[RestClient] PUT {}", url);

        let response = self
            .client
            .put(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| Self::format_reqwest_error(e, &url, "PUT"))?;

        Self::handle_response(response, &url).await
    }

    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<serde_json::Value> {
        let url = self.url(path);
        debug!("[RestClient] PATCH {}", url);

        let response = self
            .client
            .patch(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| Self::format_reqwest_error(e, &url, "PATCH"))?;

        Self::handle_response(response, &url).await
    }

    pub async fn delete(&self, path: &str) -> Result<()> {
        let url = self.url(path);
        debug!("[RestClient] DELETE {}", url);

        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| Self::format_reqwest_error(e, &url, "DELETE"))?;

        Self::handle_response(response, &url).await.map(|_| ())
    }
}

/// Empty bodies (e.g. from DELETE) parse as null
fn parse_body(text: &str) -> Result<serde_json::Value> {
    if text.trim().is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_str(text).map_err(|e| {
        ApiError::invalid_response(format!(
            "Response is not valid JSON: {} ({})",
            e,
            text.chars().take(100).collect::<String>()
        ))
    })
}
