use std::slice;
use std::sync::Arc;

use super::domain::{Expense, Verdict};
use super::policy::{PolicyEngine, PolicyRulebook};
use super::rates::{convert_to_base, required_symbols_by_date, RateCache, RateSource};
use chrono::NaiveDate;

/// Service composing the rate source and the policy engine for the
/// single-expense path.
///
/// `source` is `None` when no rate credential is configured; the service then
/// runs offline and non-base conversions resolve as unavailable.
pub struct ExpenseValidationService<S> {
    source: Option<Arc<S>>,
    engine: Arc<PolicyEngine>,
}

impl<S> ExpenseValidationService<S>
where
    S: RateSource + 'static,
{
    pub fn new(source: Option<Arc<S>>, rulebook: PolicyRulebook) -> Self {
        Self {
            source,
            engine: Arc::new(PolicyEngine::new(rulebook)),
        }
    }

    pub fn source(&self) -> Option<&Arc<S>> {
        self.source.as_ref()
    }

    pub fn rulebook(&self) -> &PolicyRulebook {
        self.engine.rulebook()
    }

    /// Validates one expense end-to-end: prefetch the single date it needs,
    /// convert, evaluate. Rate-source failures degrade to an alert on the
    /// verdict, never to an error.
    pub async fn validate(&self, expense: &Expense, today: NaiveDate) -> Verdict {
        let base_currency = &self.engine.rulebook().base_currency;
        let needed = required_symbols_by_date(slice::from_ref(expense), base_currency);

        let cache = match &self.source {
            Some(source) if !needed.is_empty() => {
                RateCache::prefetch(source.as_ref(), &needed).await
            }
            _ => RateCache::empty(),
        };

        let converted = convert_to_base(
            expense.amount,
            &expense.currency,
            expense.date,
            &cache,
            base_currency,
        )
        .ok();

        self.engine.evaluate(expense, converted, today)
    }
}
