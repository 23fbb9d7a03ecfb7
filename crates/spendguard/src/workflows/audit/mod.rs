//! Historical batch audit: CSV ingestion, rate prefetch, per-row verdicts,
//! cross-row anomaly detection, and the aggregate report.

mod anomalies;
mod parser;
pub mod report;
pub mod router;

pub use report::{BatchAuditReport, BatchAuditSummary, DuplicateGroup, StatusCountEntry};
pub use router::{audit_router, AuditCsvRequest};

use crate::workflows::expenses::domain::Expense;
use crate::workflows::expenses::policy::{PolicyEngine, PolicyRulebook};
use crate::workflows::expenses::rates::{
    convert_to_base, required_symbols_by_date, RateCache, RateSource,
};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;
use std::path::Path;

/// A row that could not be turned into an [`Expense`]. Surfaced through the
/// report, never fatal to the run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowParseError {
    pub row: usize,
    pub reason: String,
}

#[derive(Debug)]
pub enum ExpenseHistoryError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for ExpenseHistoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExpenseHistoryError::Io(err) => {
                write!(f, "failed to read expense history: {}", err)
            }
            ExpenseHistoryError::Csv(err) => {
                write!(f, "invalid expense history CSV: {}", err)
            }
        }
    }
}

impl std::error::Error for ExpenseHistoryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExpenseHistoryError::Io(err) => Some(err),
            ExpenseHistoryError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ExpenseHistoryError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ExpenseHistoryError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Parsed batch: typed rows plus the structural errors found on the way in.
#[derive(Debug)]
pub struct ExpenseBatch {
    pub expenses: Vec<Expense>,
    pub parse_errors: Vec<RowParseError>,
}

impl ExpenseBatch {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ExpenseHistoryError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, ExpenseHistoryError> {
        let (expenses, parse_errors) = parser::parse_rows(reader)?;
        Ok(Self {
            expenses,
            parse_errors,
        })
    }
}

/// Runs the audit pipeline over a parsed batch: group dates, prefetch rates,
/// convert and evaluate each row, scan for anomalies, assemble the report.
pub struct BatchAuditor {
    engine: PolicyEngine,
}

impl BatchAuditor {
    pub fn new(rulebook: PolicyRulebook) -> Self {
        Self {
            engine: PolicyEngine::new(rulebook),
        }
    }

    /// Audits with rates prefetched from `source`: at most one request per
    /// distinct date, all issued before any conversion runs.
    pub async fn audit<S>(
        &self,
        batch: &ExpenseBatch,
        source: &S,
        today: NaiveDate,
    ) -> BatchAuditReport
    where
        S: RateSource + ?Sized,
    {
        let needed = self.required_dates(batch);
        let cache = RateCache::prefetch(source, &needed).await;
        self.with_cache(batch, &needed, &cache, today)
    }

    /// Audits without touching the external source: zero requests, every
    /// non-base conversion resolves unavailable.
    pub fn audit_offline(&self, batch: &ExpenseBatch, today: NaiveDate) -> BatchAuditReport {
        let needed = self.required_dates(batch);
        self.with_cache(batch, &needed, &RateCache::empty(), today)
    }

    fn required_dates(&self, batch: &ExpenseBatch) -> BTreeMap<NaiveDate, BTreeSet<String>> {
        required_symbols_by_date(&batch.expenses, &self.engine.rulebook().base_currency)
    }

    fn with_cache(
        &self,
        batch: &ExpenseBatch,
        needed: &BTreeMap<NaiveDate, BTreeSet<String>>,
        cache: &RateCache,
        today: NaiveDate,
    ) -> BatchAuditReport {
        let base_currency = &self.engine.rulebook().base_currency;

        let mut report = BatchAuditReport {
            total_expenses: batch.expenses.len(),
            structural_errors: batch.parse_errors.clone(),
            distinct_rate_dates: needed.len(),
            rate_requests: cache.requests(),
            ..Default::default()
        };

        for expense in &batch.expenses {
            let converted = convert_to_base(
                expense.amount,
                &expense.currency,
                expense.date,
                cache,
                base_currency,
            )
            .ok();

            let verdict = self.engine.evaluate(expense, converted, today);
            *report.status_counts.entry(verdict.status).or_insert(0) += 1;

            *report
                .currency_distribution
                .entry(expense.currency.clone())
                .or_insert(0) += 1;
            if !expense.currency.trim().is_empty() && expense.currency != *base_currency {
                report.non_base_rows += 1;
            }
        }

        report.duplicate_groups = anomalies::exact_duplicates(&batch.expenses);
        report.negative_ids = anomalies::negative_amounts(&batch.expenses);

        report
    }
}
