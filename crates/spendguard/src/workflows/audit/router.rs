use crate::error::AppError;
use crate::workflows::audit::{BatchAuditSummary, BatchAuditor, ExpenseBatch};
use crate::workflows::expenses::rates::RateSource;
use crate::workflows::expenses::service::ExpenseValidationService;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use std::sync::Arc;

/// Builds the batch-audit route backed by the shared validation service.
pub fn audit_router<S>(service: Arc<ExpenseValidationService<S>>) -> Router
where
    S: RateSource + 'static,
{
    Router::new()
        .route("/api/v1/expenses/audit", post(audit_handler::<S>))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub struct AuditCsvRequest {
    pub csv: String,
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

async fn audit_handler<S>(
    State(service): State<Arc<ExpenseValidationService<S>>>,
    Json(request): Json<AuditCsvRequest>,
) -> Result<Json<BatchAuditSummary>, AppError>
where
    S: RateSource + 'static,
{
    let batch = ExpenseBatch::from_reader(request.csv.as_bytes())?;
    let today = request
        .today
        .unwrap_or_else(|| Local::now().date_naive());

    let auditor = BatchAuditor::new(service.rulebook().clone());
    let report = match service.source() {
        Some(source) => auditor.audit(&batch, source.as_ref(), today).await,
        None => auditor.audit_offline(&batch, today),
    };

    Ok(Json(report.summary()))
}
