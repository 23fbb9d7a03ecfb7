mod openexchange;

pub use openexchange::OpenExchangeRatesClient;

use super::domain::Expense;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::warn;

/// Historical exchange-rate provider, queried by date and symbol set.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Returns the symbol → rate table (relative to the base currency) for
    /// one date. Implementations should only be asked for the symbols they
    /// are given; absent symbols in the response are per-symbol
    /// unavailability, not an error.
    async fn historical_rates(
        &self,
        date: NaiveDate,
        symbols: &BTreeSet<String>,
    ) -> Result<HashMap<String, f64>, RateSourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RateSourceError {
    #[error("rate source request failed: {0}")]
    Transport(String),
    #[error("rate source returned HTTP status {0}")]
    Status(u16),
}

/// Failure signaled when a (date, currency) pair has no usable rate. Distinct
/// from a zero or default rate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("no usable rate for '{currency}'")]
pub struct RateUnavailable {
    pub currency: String,
    pub date: Option<NaiveDate>,
}

/// Prefetched (date, currency) → rate table.
///
/// `prefetch` is the only write path and lookups never trigger requests, so a
/// batch with N non-base rows costs one external request per distinct date,
/// not one per row.
#[derive(Debug, Default)]
pub struct RateCache {
    rates: HashMap<NaiveDate, HashMap<String, f64>>,
    requests: usize,
}

impl RateCache {
    /// Cache with no entries and no recorded requests, for offline runs.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Issues at most one request per date, asking only for the symbols
    /// needed that day. Requests are counted before the attempt; a date that
    /// fails stays unresolved and surfaces at lookup time.
    pub async fn prefetch<S>(source: &S, needed: &BTreeMap<NaiveDate, BTreeSet<String>>) -> Self
    where
        S: RateSource + ?Sized,
    {
        let mut cache = Self::default();

        for (date, symbols) in needed {
            if symbols.is_empty() {
                continue;
            }
            cache.requests += 1;

            match source.historical_rates(*date, symbols).await {
                Ok(fetched) => {
                    let day = cache.rates.entry(*date).or_default();
                    for symbol in symbols {
                        if let Some(rate) = fetched.get(symbol) {
                            if rate.is_finite() && *rate > 0.0 {
                                day.insert(symbol.clone(), *rate);
                            }
                        }
                    }
                }
                Err(err) => {
                    warn!(%date, error = %err, "failed to fetch rates for date");
                }
            }
        }

        cache
    }

    pub fn lookup(&self, date: NaiveDate, currency: &str) -> Option<f64> {
        self.rates
            .get(&date)
            .and_then(|day| day.get(currency))
            .copied()
    }

    /// Number of external requests issued by `prefetch`, including failed
    /// ones.
    pub fn requests(&self) -> usize {
        self.requests
    }
}

/// Groups the distinct non-base currencies needed per date. Rows without a
/// date and rows already in the base currency need no lookup and are skipped.
pub fn required_symbols_by_date(
    expenses: &[Expense],
    base_currency: &str,
) -> BTreeMap<NaiveDate, BTreeSet<String>> {
    let mut needed: BTreeMap<NaiveDate, BTreeSet<String>> = BTreeMap::new();

    for expense in expenses {
        let currency = expense.currency.trim();
        if currency.is_empty() || currency == base_currency {
            continue;
        }
        if let Some(date) = expense.date {
            needed.entry(date).or_default().insert(currency.to_string());
        }
    }

    needed
}

/// Converts an amount to the base currency for the given date. Base-currency
/// amounts pass through without touching the cache; a missing rate is a
/// distinct failure, never a silent default.
pub fn convert_to_base(
    amount: f64,
    currency: &str,
    date: Option<NaiveDate>,
    cache: &RateCache,
    base_currency: &str,
) -> Result<f64, RateUnavailable> {
    let currency = currency.trim();
    if currency == base_currency {
        return Ok(amount);
    }

    let rate = date
        .and_then(|day| cache.lookup(day, currency))
        .ok_or_else(|| RateUnavailable {
            currency: currency.to_string(),
            date,
        })?;

    Ok(amount / rate)
}
