//! Rate lookups over HTTP against the freecurrencyapi `/v1/latest` endpoint.

use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::{debug, instrument};

use crate::core::currency::{CurrencyCode, RateLookupClient, RateResponse};
use crate::core::error::LookupFailure;

/// Rate lookups against freecurrencyapi.com (or anything speaking its
/// `/v1/latest` dialect).
pub struct FreeCurrencyClient {
    base_url: String,
    api_key: String,
}

impl FreeCurrencyClient {
    pub fn new(base_url: &str, api_key: &str) -> Self {
        FreeCurrencyClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn latest_url(&self, from: &CurrencyCode, to: &CurrencyCode) -> Result<Url, LookupFailure> {
        Url::parse_with_params(
            &format!("{}/v1/latest", self.base_url),
            &[
                ("apikey", self.api_key.as_str()),
                ("base_currency", from.as_str()),
                ("currencies", to.as_str()),
            ],
        )
        .map_err(|e| LookupFailure::Transport(format!("Invalid base URL {}: {}", self.base_url, e)))
    }
}

// `message` and `data` are mutually exclusive in practice; a non-empty
// `message` wins. A `null` rate is kept as NaN rather than failing the decode.
#[derive(Deserialize, Debug)]
struct LatestRatesResponse {
    message: Option<String>,
    data: Option<HashMap<String, Option<f64>>>,
    errors: Option<serde_json::Value>,
}

#[async_trait]
impl RateLookupClient for FreeCurrencyClient {
    #[instrument(
        name = "FreeCurrencyFetch",
        skip(self),
        fields(from = %from, to = %to)
    )]
    async fn fetch_rate(
        &self,
        from: &CurrencyCode,
        to: &CurrencyCode,
    ) -> Result<RateResponse, LookupFailure> {
        let url = self.latest_url(from, to)?;
        debug!("Requesting rates from {}/v1/latest", self.base_url);

        let client = reqwest::Client::builder()
            .user_agent("fxconv/1.0")
            .build()
            .map_err(|e| LookupFailure::Transport(format!("Failed to build HTTP client: {e}")))?;

        let response = client.get(url).send().await.map_err(|e| {
            LookupFailure::Transport(format!(
                "Request error: {} for currency pair: {}{}",
                e.without_url(),
                from,
                to
            ))
        })?;

        let status = response.status();
        debug!(%status, "Received rate response");

        let text = response.text().await.map_err(|e| {
            LookupFailure::Transport(format!(
                "Failed to read response for {}{}: {}",
                from,
                to,
                e.without_url()
            ))
        })?;

        let body: LatestRatesResponse = match serde_json::from_str(&text) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(LookupFailure::Transport(format!(
                    "HTTP error: {status} for currency pair: {from}{to}"
                )));
            }
            Err(e) => {
                return Err(LookupFailure::Transport(format!(
                    "Failed to parse JSON response for {from}{to}: {e}"
                )));
            }
        };

        if let Some(message) = body.message.filter(|m| !m.is_empty()) {
            debug!(errors = ?body.errors, "Rate service reported an error");
            return Err(LookupFailure::ServiceReported(message));
        }

        if !status.is_success() {
            return Err(LookupFailure::Transport(format!(
                "HTTP error: {status} for currency pair: {from}{to}"
            )));
        }

        body.data
            .map(|rates| RateResponse {
                rates: rates
                    .into_iter()
                    .map(|(code, rate)| (code, rate.unwrap_or(f64::NAN)))
                    .collect(),
            })
            .ok_or_else(|| {
                LookupFailure::Transport(format!("No rate data found for currency pair: {from}{to}"))
            })
    }
}
