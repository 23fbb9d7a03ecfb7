use super::{RateSource, RateSourceError};
use crate::config::RateSourceConfig;
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};

/// Client for the Open Exchange Rates historical endpoint.
#[derive(Debug, Clone)]
pub struct OpenExchangeRatesClient {
    client: Client,
    base_url: String,
    app_id: String,
}

#[derive(Debug, Deserialize)]
struct HistoricalRatesPayload {
    #[serde(default)]
    rates: HashMap<String, f64>,
}

impl OpenExchangeRatesClient {
    /// Builds a client when a credential is configured. `Ok(None)` means no
    /// credential is present and the caller should run offline.
    pub fn from_config(config: &RateSourceConfig) -> Result<Option<Self>, RateSourceError> {
        let Some(app_id) = config.app_id.clone() else {
            return Ok(None);
        };

        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|err| {
                RateSourceError::Transport(format!("failed to build HTTP client: {err}"))
            })?;

        Ok(Some(Self {
            client,
            base_url: config.base_url.clone(),
            app_id,
        }))
    }

    fn request_url(&self, date: NaiveDate, symbols: &BTreeSet<String>) -> String {
        let symbols_query = symbols
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");

        format!(
            "{}/historical/{}.json?app_id={}&symbols={}",
            self.base_url, date, self.app_id, symbols_query
        )
    }
}

#[async_trait]
impl RateSource for OpenExchangeRatesClient {
    async fn historical_rates(
        &self,
        date: NaiveDate,
        symbols: &BTreeSet<String>,
    ) -> Result<HashMap<String, f64>, RateSourceError> {
        let url = self.request_url(date, symbols);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|err| RateSourceError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RateSourceError::Status(status.as_u16()));
        }

        let payload: HistoricalRatesPayload = response
            .json()
            .await
            .map_err(|err| RateSourceError::Transport(err.to_string()))?;

        Ok(payload.rates)
    }
}
