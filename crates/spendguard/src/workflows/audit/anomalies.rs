use super::report::DuplicateGroup;
use crate::workflows::expenses::domain::Expense;
use chrono::NaiveDate;
use std::collections::HashMap;

type DuplicateKey = (String, String, NaiveDate);

/// Groups expenses sharing the exact (amount, currency, date) triple, in
/// first-encounter order with member ids in encounter order. Amounts compare
/// by their two-decimal rendering, so 50.0 and 50.00 land together.
pub(crate) fn exact_duplicates(expenses: &[Expense]) -> Vec<DuplicateGroup> {
    let mut members: HashMap<DuplicateKey, Vec<String>> = HashMap::new();
    let mut order: Vec<DuplicateKey> = Vec::new();

    for expense in expenses {
        let Some(date) = expense.date else {
            continue;
        };
        let key = (
            format!("{:.2}", expense.amount),
            expense.currency.clone(),
            date,
        );

        let ids = members.entry(key.clone()).or_default();
        if ids.is_empty() {
            order.push(key);
        }
        ids.push(expense.id.clone());
    }

    order
        .into_iter()
        .filter_map(|key| {
            let ids = members.remove(&key)?;
            if ids.len() < 2 {
                return None;
            }
            Some(DuplicateGroup {
                amount: key.0,
                currency: key.1,
                date: key.2,
                expense_ids: ids,
            })
        })
        .collect()
}

/// Collects ids of expenses whose raw amount is negative, in encounter
/// order. Currency, date, and the eventual verdict are irrelevant here.
pub(crate) fn negative_amounts(expenses: &[Expense]) -> Vec<String> {
    expenses
        .iter()
        .filter(|expense| expense.amount < 0.0)
        .map(|expense| expense.id.clone())
        .collect()
}
