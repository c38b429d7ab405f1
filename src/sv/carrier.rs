//! Carrier rate/label HTTP client.
//!
//! The rate service is treated as untrusted and unreliable: every call has a
//! bounded timeout with a single retry for transient network errors, and all
//! responses are validated before anything is persisted. Misconfiguration
//! (missing API token, missing ship-from address) surfaces as a provider
//! error that is reported, never retried automatically.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{money, prelude::*};

pub const DEFAULT_API_URL: &str = "https://api.goshippo.com/";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Clone, Serialize)]
pub struct Address {
  pub name: String,
  pub street1: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub street2: Option<String>,
  pub city: String,
  pub state: String,
  pub zip: String,
  pub country: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RateRequest {
  pub address_from: Address,
  pub address_to: Address,
  pub weight_oz: f64,
  pub carrier_accounts: Vec<String>,
}

/// One option from the rate menu presented to the admin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateQuote {
  pub rate_id: String,
  pub carrier: String,
  pub service: String,
  pub amount_cents: i64,
}

/// A validated label purchase, ready to persist.
#[derive(Debug, Clone)]
pub struct LabelPurchase {
  pub carrier: String,
  pub service: String,
  pub tracking_number: String,
  pub label_url: String,
  pub rate_cents: i64,
}

#[derive(Debug, Deserialize)]
struct RawRate {
  rate_id: String,
  carrier: String,
  service: String,
  amount: String,
}

#[derive(Debug, Deserialize)]
struct RatesResponse {
  rates: Vec<RawRate>,
}

#[derive(Debug, Deserialize)]
struct LabelResponse {
  status: String,
  tracking_number: Option<String>,
  label_url: Option<String>,
  carrier: Option<String>,
  service: Option<String>,
  amount: Option<String>,
  message: Option<String>,
}

#[derive(Clone)]
pub struct Carrier {
  client: Client,
  base_url: String,
  api_token: String,
}

impl Carrier {
  pub fn new(base_url: String, api_token: String) -> Self {
    Self { client: Client::new(), base_url, api_token }
  }

  pub async fn rates(&self, request: &RateRequest) -> Result<Vec<RateQuote>> {
    let response: RatesResponse = self.post("rates", request).await?;

    response
      .rates
      .into_iter()
      .map(|raw| {
        let amount_cents =
          money::parse_usd(&raw.amount).ok_or_else(|| {
            Error::Provider(format!(
              "carrier returned unparsable rate amount {:?}",
              raw.amount
            ))
          })?;
        Ok(RateQuote {
          rate_id: raw.rate_id,
          carrier: raw.carrier,
          service: raw.service,
          amount_cents,
        })
      })
      .collect()
  }

  pub async fn buy_label(&self, rate_id: &str) -> Result<LabelPurchase> {
    let response: LabelResponse =
      self.post("labels", &json::json!({ "rate_id": rate_id })).await?;

    if !response.status.eq_ignore_ascii_case("success") {
      return Err(Error::Provider(format!(
        "label purchase failed: {}",
        response.message.unwrap_or_else(|| response.status.clone())
      )));
    }

    let purchase = LabelPurchase {
      carrier: response.carrier.unwrap_or_default(),
      service: response.service.unwrap_or_default(),
      tracking_number: response.tracking_number.unwrap_or_default(),
      label_url: response.label_url.unwrap_or_default(),
      rate_cents: response
        .amount
        .as_deref()
        .and_then(money::parse_usd)
        .unwrap_or(0),
    };

    if purchase.tracking_number.is_empty() || purchase.label_url.is_empty() {
      return Err(Error::Provider(
        "carrier returned an incomplete label".into(),
      ));
    }

    Ok(purchase)
  }

  /// POST with one retry for transient network errors. Anything else is a
  /// terminal provider error for the caller to report.
  async fn post<T: for<'de> Deserialize<'de>, B: Serialize>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<T> {
    if self.api_token.is_empty() {
      return Err(Error::Provider("carrier API token not configured".into()));
    }

    let url = format!("{}{}", self.base_url, path);

    let mut attempt = self.send(&url, body).await;
    if let Err(err) = &attempt
      && (err.is_timeout() || err.is_connect())
    {
      debug!("carrier call {path} retrying after transient error: {err}");
      attempt = self.send(&url, body).await;
    }

    let response = attempt
      .map_err(|e| Error::Provider(format!("carrier request failed: {e}")))?;

    if !response.status().is_success() {
      return Err(Error::Provider(format!(
        "carrier returned {}",
        response.status()
      )));
    }

    response.json().await.map_err(|e| {
      Error::Provider(format!("failed to parse carrier response: {e}"))
    })
  }

  async fn send<B: Serialize>(
    &self,
    url: &str,
    body: &B,
  ) -> Result<reqwest::Response, reqwest::Error> {
    self
      .client
      .post(url)
      .timeout(REQUEST_TIMEOUT)
      .bearer_auth(&self.api_token)
      .json(body)
      .send()
      .await
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn missing_token_is_a_provider_error_without_any_call() {
    let carrier = Carrier::new("http://127.0.0.1:1/".into(), String::new());
    let request = RateRequest {
      address_from: Address {
        name: "Store".into(),
        street1: "2 Dock Rd".into(),
        street2: None,
        city: "Springfield".into(),
        state: "IL".into(),
        zip: "62702".into(),
        country: "US".into(),
      },
      address_to: Address {
        name: "Pat".into(),
        street1: "1 Main St".into(),
        street2: None,
        city: "Springfield".into(),
        state: "IL".into(),
        zip: "62701".into(),
        country: "US".into(),
      },
      weight_oz: 16.0,
      carrier_accounts: vec![],
    };

    let result = carrier.rates(&request).await;
    assert!(matches!(result, Err(Error::Provider(_))));
  }
}
