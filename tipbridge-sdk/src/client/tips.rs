//! Tip-recording API client.

use reqwest::Client;
use url::Url;

use super::{ClientError, default_http_client, parse_response};
use crate::objects::tips::{TipPayload, TipRecord};

/// Typed HTTP client for the downstream tip-recording API.
///
/// Tips are recorded against a single account; authentication is a bearer
/// token sent on every request.
#[derive(Debug, Clone)]
pub struct TipsClient {
    http: Client,
    base_url: Url,
    account_id: String,
    token: String,
}

impl TipsClient {
    /// Create a new `TipsClient`.
    ///
    /// * `base_url` – root URL of the tip API (e.g. `https://api.example.com/v2/`).
    /// * `account_id` – the account the tips are recorded under.
    /// * `token` – bearer token for the `Authorization` header.
    pub fn new(base_url: Url, account_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            http: default_http_client(),
            base_url,
            account_id: account_id.into(),
            token: token.into(),
        }
    }

    /// Replace the default `reqwest::Client` with a custom one (e.g. to
    /// configure timeouts or a proxy).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// `POST /tips/{account_id}` – record one tip.
    pub async fn post_tip(&self, payload: &TipPayload) -> Result<TipRecord, ClientError> {
        let url = self.base_url.join(&format!("tips/{}", self.account_id))?;

        let resp = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(payload)
            .send()
            .await?;

        parse_response(resp).await
    }
}
