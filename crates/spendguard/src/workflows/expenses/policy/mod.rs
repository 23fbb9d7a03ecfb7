mod config;
mod rules;

pub use config::{CategoryCeiling, CostCenterRule, PolicyRulebook};

use super::domain::{Alert, Expense, ExpenseStatus, Verdict};
use chrono::NaiveDate;

/// Stateless evaluator that applies the rulebook to a single expense.
pub struct PolicyEngine {
    rulebook: PolicyRulebook,
}

impl PolicyEngine {
    pub fn new(rulebook: PolicyRulebook) -> Self {
        Self { rulebook }
    }

    pub fn rulebook(&self) -> &PolicyRulebook {
        &self.rulebook
    }

    /// Evaluates one expense whose amount has already been converted to the
    /// base currency; `None` means the conversion was unavailable.
    ///
    /// The final status is the maximum severity across all fired checks, and
    /// every fired alert is preserved in rule order.
    pub fn evaluate(
        &self,
        expense: &Expense,
        converted_amount: Option<f64>,
        today: NaiveDate,
    ) -> Verdict {
        let findings = rules::run_checks(expense, converted_amount, today, &self.rulebook);

        let status = findings
            .iter()
            .map(|finding| finding.severity)
            .max()
            .unwrap_or(ExpenseStatus::Aprobado);

        Verdict {
            expense_id: expense.id.clone(),
            status,
            alerts: findings.into_iter().map(|finding| finding.alert).collect(),
        }
    }
}

/// A fired rule check: the alert it raises and the minimum severity it
/// demands for the final status.
pub(crate) struct Finding {
    pub severity: ExpenseStatus,
    pub alert: Alert,
}
