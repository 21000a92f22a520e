use std::time::Instant;

use bytes::Bytes;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::observability::{
    CLIENT_BLOB_BYTES, CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS, CLIENT_REQUESTS,
};

/// Message used when a failed response carries no usable explanation.
pub const FALLBACK_ERROR_MESSAGE: &str = "Request failed";

/// Client for the assistant API.
///
/// Every call is a single best-effort attempt: there are no retries, no
/// caching, and no client-imposed timeout.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: ReqwestClient,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the API configured in `settings`.
    pub fn new(settings: &Settings) -> Result<Self> {
        Self::with_base_url(settings.api_url.clone())
    }

    /// Create a client for an explicit base URL.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into();
        url::Url::parse(&base_url)?;
        let client = ReqwestClient::builder().build().map_err(|e| {
            Error::http_client(
                format!("Failed to build HTTP client: {}", e),
                Some(Box::new(e)),
            )
        })?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// The base URL every path is appended to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn default_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));
        headers
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client
            .request(method, self.url(path))
            .headers(Self::default_headers())
    }

    /// Issue a GET and parse the JSON response.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.execute(path, self.request(Method::GET, path)).await?;
        Self::parse_json(response).await
    }

    /// Issue a POST with a JSON body and parse the JSON response.
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::POST, path).json(body);
        let response = self.execute(path, builder).await?;
        Self::parse_json(response).await
    }

    /// Issue a POST without a body and parse the JSON response.
    pub async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.execute(path, self.request(Method::POST, path)).await?;
        Self::parse_json(response).await
    }

    /// Issue a PUT with a JSON body and parse the JSON response.
    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let builder = self.request(Method::PUT, path).json(body);
        let response = self.execute(path, builder).await?;
        Self::parse_json(response).await
    }

    /// Issue a DELETE and parse the JSON response.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .execute(path, self.request(Method::DELETE, path))
            .await?;
        Self::parse_json(response).await
    }

    /// Issue a POST with a JSON body and return the raw response payload.
    ///
    /// Used for file exports, where the server answers with a binary blob.
    pub async fn post_blob<B>(&self, path: &str, body: &B) -> Result<Bytes>
    where
        B: Serialize + ?Sized,
    {
        let builder = self
            .client
            .post(self.url(path))
            .header(header::ACCEPT, HeaderValue::from_static("*/*"))
            .json(body);
        let response = self.execute(path, builder).await?;
        let bytes = response.bytes().await.map_err(|e| {
            Error::http_client(format!("Failed to read response: {}", e), Some(Box::new(e)))
        })?;
        CLIENT_BLOB_BYTES.add(bytes.len() as f64);
        Ok(bytes)
    }

    /// Issue a multipart POST and parse the JSON response.
    pub async fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T> {
        let builder = self.request(Method::POST, path).multipart(form);
        let response = self.execute(path, builder).await?;
        Self::parse_json(response).await
    }

    /// Send a request and turn transport failures and non-success statuses
    /// into errors.
    async fn execute(&self, path: &str, builder: RequestBuilder) -> Result<Response> {
        CLIENT_REQUESTS.click();
        let start = Instant::now();
        tracing::debug!(path, "sending request");
        let result = match builder.send().await {
            Ok(response) if response.status().is_success() => Ok(response),
            Ok(response) => Err(Self::process_error_response(response).await),
            Err(e) => Err(Self::map_transport_error(e)),
        };
        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        if let Err(err) = &result {
            CLIENT_REQUEST_ERRORS.click();
            tracing::warn!(path, error = %err, "request failed");
        }
        result
    }

    fn map_transport_error(e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(format!("Request timed out: {}", e))
        } else if e.is_connect() {
            Error::connection(format!("Connection error: {}", e), Some(Box::new(e)))
        } else {
            Error::http_client(format!("Request failed: {}", e), Some(Box::new(e)))
        }
    }

    /// Extract the server-supplied message from a failed response.
    ///
    /// The body's `error` field wins over its `message` field; anything else
    /// falls back to [`FALLBACK_ERROR_MESSAGE`].
    async fn process_error_response(response: Response) -> Error {
        let status_code = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        Error::request(status_code, error_message_from_body(&body))
    }

    async fn parse_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        let body = response.bytes().await.map_err(|e| {
            Error::http_client(format!("Failed to read response: {}", e), Some(Box::new(e)))
        })?;
        serde_json::from_slice(&body).map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {}", e),
                Some(Box::new(e)),
            )
        })
    }
}

fn error_message_from_body(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return FALLBACK_ERROR_MESSAGE.to_string();
    };
    ["error", "message", "detail"]
        .iter()
        .filter_map(|key| value.get(*key))
        .find_map(|field| match field {
            serde_json::Value::String(s) if !s.is_empty() => Some(s.clone()),
            serde_json::Value::Object(inner) => inner
                .get("message")
                .and_then(|m| m.as_str())
                .map(String::from),
            _ => None,
        })
        .unwrap_or_else(|| FALLBACK_ERROR_MESSAGE.to_string())
}
