use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;

use super::domain::{Employee, Expense};
use super::rates::RateSource;
use super::service::ExpenseValidationService;

/// Router builder exposing the single-expense validation endpoint.
pub fn expense_router<S>(service: Arc<ExpenseValidationService<S>>) -> Router
where
    S: RateSource + 'static,
{
    Router::new()
        .route("/api/v1/expenses/validate", post(validate_handler::<S>))
        .with_state(service)
}

/// Flat wire body for the single-expense boundary. Only the id and amount
/// are structurally required; missing mandatory policy fields are reported
/// through the verdict, not rejected here.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateExpenseRequest {
    #[serde(rename = "gasto_id")]
    pub expense_id: String,
    #[serde(rename = "monto")]
    pub amount: f64,
    #[serde(rename = "moneda", default)]
    pub currency: String,
    #[serde(rename = "fecha", default)]
    pub date: Option<NaiveDate>,
    #[serde(rename = "categoria", default)]
    pub category: String,
    #[serde(rename = "empleado_id", default)]
    pub employee_id: String,
    #[serde(rename = "empleado_nombre", default)]
    pub employee_name: String,
    #[serde(rename = "empleado_apellido", default)]
    pub employee_surname: String,
    #[serde(rename = "empleado_cost_center", default)]
    pub employee_cost_center: String,
}

impl ValidateExpenseRequest {
    pub fn into_expense(self) -> Expense {
        Expense {
            id: self.expense_id,
            amount: self.amount,
            currency: self.currency,
            date: self.date,
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

pub(crate) async fn validate_handler<S>(
    State(service): State<Arc<ExpenseValidationService<S>>>,
    axum::Json(request): axum::Json<ValidateExpenseRequest>,
) -> Response
where
    S: RateSource + 'static,
{
    let today = Local::now().date_naive();
    let expense = request.into_expense();
    let verdict = service.validate(&expense, today).await;

    (StatusCode::OK, axum::Json(verdict)).into_response()
}
