//! JSON-over-HTTP client for the extraction service.
//!
//! Wire contract:
//!
//! - `POST {base}/v1/extract` with `{"url": ...}` answers
//!   `{"name", "price", "currency", "image_url", "platform"}`.
//! - `POST {base}/v1/price` with `{"name": ..., "url": ...}` answers
//!   `{"price": <number>}`; a missing or zero price means "unknown".

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{ExtractionError, ExtractionGateway, PriceQuote};
use crate::domain::{Platform, ProductListing};

/// Extraction client backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpExtractionGateway {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
struct ExtractRequest<'a> {
    url: &'a str,
}

#[derive(Debug, Serialize)]
struct PriceRequest<'a> {
    name: &'a str,
    url: &'a str,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    name: String,
    price: f64,
    #[serde(default)]
    currency: String,
    #[serde(default, alias = "imageUrl")]
    image_url: String,
    #[serde(default = "unknown_platform")]
    platform: Platform,
}

fn unknown_platform() -> Platform {
    Platform::Other
}

impl HttpExtractionGateway {
    /// Creates a client for the service at `base_url`.
    ///
    /// `request_timeout` is applied by `reqwest` per request; the monitor
    /// service additionally bounds every call on its side.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Network`] if the HTTP client cannot be
    /// built (TLS backend initialisation failure).
    pub fn new(
        base_url: impl Into<String>,
        api_key: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, ExtractionError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("price-sentinel/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ExtractionError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Base URL requests are sent to, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.base_url)
    }

    async fn post<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<reqwest::Response, ExtractionError> {
        let mut request = self.client.post(self.endpoint(path)).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ExtractionError::Network(format!("request timed out: {e}"))
            } else {
                ExtractionError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExtractionError::BadResponse(format!(
                "{path} returned HTTP {status}"
            )));
        }
        Ok(response)
    }
}

#[async_trait]
impl ExtractionGateway for HttpExtractionGateway {
    async fn extract_full(&self, url: &str) -> Result<ProductListing, ExtractionError> {
        let response = self.post("extract", &ExtractRequest { url }).await?;
        let body: ExtractResponse = response
            .json()
            .await
            .map_err(|e| ExtractionError::Parse(e.to_string()))?;

        if body.name.trim().is_empty() {
            return Err(ExtractionError::BadResponse(
                "extraction returned an empty product name".to_string(),
            ));
        }

        Ok(ProductListing {
            name: body.name,
            price: body.price,
            currency: body.currency,
            image_url: body.image_url,
            platform: body.platform,
        })
    }

    async fn extract_price(&self, name: &str, url: &str) -> Result<PriceQuote, ExtractionError> {
        let response = self.post("price", &PriceRequest { name, url }).await?;
        response
            .json::<PriceQuote>()
            .await
            .map_err(|e| ExtractionError::Parse(e.to_string()))
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let Ok(gateway) =
            HttpExtractionGateway::new("http://extract.local/", None, Duration::from_secs(5))
        else {
            panic!("client should build");
        };
        assert_eq!(gateway.base_url(), "http://extract.local");
        assert_eq!(gateway.endpoint("price"), "http://extract.local/v1/price");
    }

    #[test]
    fn extract_response_accepts_camel_case_image() {
        let json = r#"{"name":"Kettle","price":499.0,"currency":"INR","imageUrl":"https://i/k.png","platform":"Flipkart"}"#;
        let parsed: Result<ExtractResponse, _> = serde_json::from_str(json);
        let Ok(parsed) = parsed else {
            panic!("payload should decode");
        };
        assert_eq!(parsed.image_url, "https://i/k.png");
        assert_eq!(parsed.platform, Platform::Flipkart);
    }

    #[test]
    fn extract_response_defaults_missing_platform() {
        let json = r#"{"name":"Kettle","price":10.0}"#;
        let parsed: Result<ExtractResponse, _> = serde_json::from_str(json);
        let Ok(parsed) = parsed else {
            panic!("payload should decode");
        };
        assert_eq!(parsed.platform, Platform::Other);
        assert!(parsed.currency.is_empty());
    }
}
