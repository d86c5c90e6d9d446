//! Resource client
//!
//! Thin wrapper over the backend REST API. Every call either yields a decoded,
//! contract-checked value or a classified [`ApiError`]. Nothing is retried.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

use crate::config::Config;
use crate::domain::{ApiError, Method, Transport, Validate};

/// reqwest-backed [`Transport`]
pub struct HttpTransport {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        // Connect timeout only: mutations complete or fail on the transport's own terms
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("Failed to build client: {}", e)))?;

        let base_url = Url::parse(&config.api_base_url).map_err(|e| {
            ApiError::Network(format!("Invalid base URL {}: {}", config.api_base_url, e))
        })?;

        Ok(Self { http, base_url })
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| ApiError::Network(format!("Invalid path {}: {}", path, e)))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        let url = self.url(path)?;

        let verb = match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut req = self.http.request(verb, url);
        if let Some(body) = body {
            req = req.json(&body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("Failed to send request: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            // Error bodies carry no contract, the status is all we use
            return Err(ApiError::from_status(
                status.as_u16(),
                format!("{} {} returned {}", method, path, status),
            ));
        }

        let body = resp.text().await?;

        if body.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&body)
            .map_err(|e| ApiError::malformed(format!("Failed to parse JSON: {}", e)))
    }
}

/// Decode a raw JSON body into `T` and check its contract.
pub fn decode<T>(raw: Value) -> Result<T, ApiError>
where
    T: DeserializeOwned + Validate,
{
    let value: T = serde_json::from_value(raw)
        .map_err(|e| ApiError::malformed(format!("Unexpected response shape: {}", e)))?;
    value
        .validate()
        .map_err(|e| ApiError::malformed(format!("Response failed validation: {}", e)))?;
    Ok(value)
}

#[derive(Clone)]
pub struct ResourceClient {
    transport: Arc<dyn Transport>,
}

impl ResourceClient {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        Ok(Self::with_transport(Arc::new(HttpTransport::new(config)?)))
    }

    pub fn with_transport(transport: Arc<dyn Transport>) -> Self {
        Self { transport }
    }

    /// `request(method, path, body?) -> Result<T, ApiError>`
    pub async fn request<T, B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Validate,
        B: Serialize + ?Sized,
    {
        let body = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| ApiError::Network(format!("Failed to encode body: {}", e)))?;

        let raw = self.raw(method, path, body).await?;
        decode(raw).inspect_err(|e| {
            tracing::warn!(method = %method, path, "Rejected response: {}", e);
        })
    }

    /// Untyped exchange, used by the read cache which stores raw snapshots.
    pub async fn raw(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        tracing::debug!(method = %method, path, "Sending request");

        self.transport
            .execute(method, path, body)
            .await
            .inspect_err(|e| {
                tracing::warn!(
                    method = %method,
                    path,
                    status = ?e.status(),
                    kind = ?e.kind(),
                    "Request failed: {}",
                    e
                );
            })
    }

    pub async fn get<T>(&self, path: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Validate,
    {
        self.request::<T, ()>(Method::Get, path, None).await
    }

    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Validate,
        B: Serialize + ?Sized,
    {
        self.request(Method::Post, path, Some(body)).await
    }

    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Validate,
        B: Serialize + ?Sized,
    {
        self.request(Method::Patch, path, Some(body)).await
    }

    pub async fn delete<T>(&self, path: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned + Validate,
    {
        self.request::<T, ()>(Method::Delete, path, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Beverage;

    #[test]
    fn test_decode_rejects_contract_violation() {
        let raw = serde_json::json!([{ "id": 1, "name": "", "price": 10 }]);
        let err = decode::<Vec<Beverage>>(raw).unwrap_err();
        assert!(matches!(err, ApiError::Server { status: None, .. }));
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        let raw = serde_json::json!({ "unexpected": true });
        let err = decode::<Vec<Beverage>>(raw).unwrap_err();
        assert_eq!(err.kind(), crate::domain::ApiErrorKind::Server);
    }

    #[test]
    fn test_decode_null_as_unit() {
        assert!(decode::<()>(Value::Null).is_ok());
    }

    #[test]
    fn test_url_join_keeps_base_path() {
        let transport = HttpTransport::new(&Config::with_base_url("http://cafe.local/api")).unwrap();
        assert_eq!(
            transport.url("/books/42").unwrap().as_str(),
            "http://cafe.local/api/books/42"
        );
    }
}
