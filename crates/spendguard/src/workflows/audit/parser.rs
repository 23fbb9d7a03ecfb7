use super::RowParseError;
use crate::workflows::expenses::domain::{Employee, Expense};
use chrono::NaiveDate;
use serde::Deserialize;
use std::io::Read;
use tracing::warn;

/// Reads the historical-expense CSV, keeping unparseable rows as structural
/// errors instead of aborting. Only a reader/header failure is fatal.
pub(crate) fn parse_rows<R: Read>(
    reader: R,
) -> Result<(Vec<Expense>, Vec<RowParseError>), csv::Error> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);
    csv_reader.headers()?;

    let mut expenses = Vec::new();
    let mut errors = Vec::new();

    for (index, record) in csv_reader.deserialize::<HistoryRow>().enumerate() {
        let row = index + 1;
        match record {
            Ok(parsed) if parsed.expense_id.trim().is_empty() => {
                warn!(row, "skipping history row without gasto_id");
                errors.push(RowParseError {
                    row,
                    reason: "empty gasto_id".to_string(),
                });
            }
            Ok(parsed) => expenses.push(parsed.into_expense()),
            Err(err) => {
                warn!(row, error = %err, "skipping unparseable history row");
                errors.push(RowParseError {
                    row,
                    reason: err.to_string(),
                });
            }
        }
    }

    Ok((expenses, errors))
}

#[derive(Debug, Deserialize)]
struct HistoryRow {
    #[serde(rename = "gasto_id")]
    expense_id: String,
    #[serde(rename = "empleado_id", default)]
    employee_id: String,
    #[serde(rename = "empleado_nombre", default)]
    employee_name: String,
    #[serde(rename = "empleado_apellido", default)]
    employee_surname: String,
    #[serde(rename = "empleado_cost_center", default)]
    employee_cost_center: String,
    #[serde(rename = "categoria", default)]
    category: String,
    #[serde(rename = "moneda", default)]
    currency: String,
    #[serde(rename = "monto")]
    amount: f64,
    #[serde(rename = "fecha")]
    date: NaiveDate,
}

impl HistoryRow {
    fn into_expense(self) -> Expense {
        Expense {
            id: self.expense_id,
            amount: self.amount,
            currency: self.currency,
            date: Some(self.date),
            category: self.category,
            employee: Employee {
                id: self.employee_id,
                name: self.employee_name,
                surname: self.employee_surname,
                cost_center: self.employee_cost_center,
            },
        }
    }
}
