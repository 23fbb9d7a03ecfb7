use super::RowParseError;
use crate::workflows::expenses::domain::ExpenseStatus;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// Aggregates accumulated over one batch run. Built once, rendered, then
/// discarded; nothing survives across runs.
#[derive(Debug, Default)]
pub struct BatchAuditReport {
    pub total_expenses: usize,
    pub status_counts: HashMap<ExpenseStatus, usize>,
    pub structural_errors: Vec<RowParseError>,
    pub duplicate_groups: Vec<DuplicateGroup>,
    pub negative_ids: Vec<String>,
    pub currency_distribution: BTreeMap<String, usize>,
    pub non_base_rows: usize,
    pub distinct_rate_dates: usize,
    pub rate_requests: usize,
}

impl BatchAuditReport {
    pub fn count_for(&self, status: ExpenseStatus) -> usize {
        self.status_counts.get(&status).copied().unwrap_or(0)
    }

    pub fn summary(&self) -> BatchAuditSummary {
        let status_counts = ExpenseStatus::ordered()
            .into_iter()
            .map(|status| StatusCountEntry {
                status,
                status_label: status.label(),
                count: self.count_for(status),
            })
            .collect();

        BatchAuditSummary {
            total_expenses: self.total_expenses,
            status_counts,
            structural_errors: self.structural_errors.clone(),
            duplicate_groups: self.duplicate_groups.clone(),
            negative_ids: self.negative_ids.clone(),
            currency_distribution: self.currency_distribution.clone(),
            non_base_rows: self.non_base_rows,
            distinct_rate_dates: self.distinct_rate_dates,
            rate_requests: self.rate_requests,
        }
    }
}

/// Expenses sharing the exact (amount, currency, date) triple. The amount is
/// the two-decimal rendering used as the grouping key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateGroup {
    pub amount: String,
    pub currency: String,
    pub date: NaiveDate,
    pub expense_ids: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusCountEntry {
    pub status: ExpenseStatus,
    pub status_label: &'static str,
    pub count: usize,
}

/// Serializable view of a batch run with statuses in severity order.
#[derive(Debug, Clone, Serialize)]
pub struct BatchAuditSummary {
    pub total_expenses: usize,
    pub status_counts: Vec<StatusCountEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub structural_errors: Vec<RowParseError>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub duplicate_groups: Vec<DuplicateGroup>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub negative_ids: Vec<String>,
    pub currency_distribution: BTreeMap<String, usize>,
    pub non_base_rows: usize,
    pub distinct_rate_dates: usize,
    pub rate_requests: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_orders_statuses_and_zero_fills() {
        let mut report = BatchAuditReport::default();
        report.total_expenses = 3;
        report.status_counts.insert(ExpenseStatus::Rechazado, 3);

        let summary = report.summary();
        let labels: Vec<_> = summary
            .status_counts
            .iter()
            .map(|entry| (entry.status_label, entry.count))
            .collect();
        assert_eq!(
            labels,
            vec![("APROBADO", 0), ("PENDIENTE", 0), ("RECHAZADO", 3)]
        );
    }
}
