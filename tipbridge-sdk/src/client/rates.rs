//! Exchange-rate source client.

use reqwest::Client;
use url::Url;

use super::{ClientError, default_http_client, parse_response};
use crate::objects::rates::RateResponse;

/// Typed HTTP client for the foreign-exchange rate source.
#[derive(Debug, Clone)]
pub struct RatesClient {
    http: Client,
    base_url: Url,
}

impl RatesClient {
    /// Create a new `RatesClient` for the given API root URL.
    pub fn new(base_url: Url) -> Self {
        Self {
            http: default_http_client(),
            base_url,
        }
    }

    /// Replace the default `reqwest::Client` with a custom one.
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `GET /latest?base={base}` – fetch the latest table anchored to `base`.
    pub async fn latest(&self, base: &str) -> Result<RateResponse, ClientError> {
        let url = self.base_url.join("latest")?;

        let resp = self
            .http
            .get(url)
            .query(&[("base", base)])
            .send()
            .await?;

        parse_response(resp).await
    }
}
