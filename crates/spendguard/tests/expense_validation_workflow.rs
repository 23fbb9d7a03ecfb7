//! Integration specifications for the single-expense validation workflow.
//!
//! Scenarios exercise the public service facade and HTTP router end-to-end:
//! policy checks, currency conversion, and the wire contract, without
//! reaching into private modules.

mod common {
    use std::collections::{BTreeSet, HashMap};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use spendguard::workflows::expenses::domain::{Employee, Expense};
    use spendguard::workflows::expenses::rates::{RateSource, RateSourceError};
    use spendguard::workflows::expenses::{ExpenseValidationService, PolicyRulebook};

    /// Rate source backed by a fixed table. Dates absent from the table fail
    /// like an outage; every call is counted.
    pub(super) struct FixedRateSource {
        rates: HashMap<NaiveDate, HashMap<String, f64>>,
        calls: AtomicUsize,
    }

    impl FixedRateSource {
        pub(super) fn new(rates: HashMap<NaiveDate, HashMap<String, f64>>) -> Self {
            Self {
                rates,
                calls: AtomicUsize::new(0),
            }
        }

        pub(super) fn single(date: NaiveDate, symbol: &str, rate: f64) -> Self {
            Self::new(HashMap::from([(
                date,
                HashMap::from([(symbol.to_string(), rate)]),
            )]))
        }

        pub(super) fn unavailable() -> Self {
            Self::new(HashMap::new())
        }

        pub(super) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RateSource for FixedRateSource {
        async fn historical_rates(
            &self,
            date: NaiveDate,
            symbols: &BTreeSet<String>,
        ) -> Result<HashMap<String, f64>, RateSourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.rates.get(&date) {
                Some(day) => Ok(day
                    .iter()
                    .filter(|(symbol, _)| symbols.contains(*symbol))
                    .map(|(symbol, rate)| (symbol.clone(), *rate))
                    .collect()),
                None => Err(RateSourceError::Transport(
                    "no rates scripted for date".to_string(),
                )),
            }
        }
    }

    pub(super) fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 10, 25).expect("valid date")
    }

    pub(super) fn days_ago(days: i64) -> NaiveDate {
        today() - chrono::Duration::days(days)
    }

    /// A compliant expense: base currency, known category, recent date, all
    /// mandatory fields present. Tests mutate specific fields from here.
    pub(super) fn clean_expense(date: NaiveDate) -> Expense {
        Expense {
            id: "g_100".to_string(),
            amount: 120.0,
            currency: "USD".to_string(),
            date: Some(date),
            category: "food".to_string(),
            employee: Employee {
                id: "emp_7".to_string(),
                name: "Carla".to_string(),
                surname: "Paz".to_string(),
                cost_center: "sales".to_string(),
            },
        }
    }

    pub(super) fn build_service(
        source: FixedRateSource,
    ) -> (
        ExpenseValidationService<FixedRateSource>,
        Arc<FixedRateSource>,
    ) {
        let source = Arc::new(source);
        let service =
            ExpenseValidationService::new(Some(source.clone()), PolicyRulebook::standard());
        (service, source)
    }

    pub(super) fn offline_service() -> ExpenseValidationService<FixedRateSource> {
        ExpenseValidationService::new(None, PolicyRulebook::standard())
    }
}

mod policy {
    use super::common::*;
    use spendguard::workflows::expenses::{AlertCode, ExpenseStatus};

    #[tokio::test]
    async fn clean_expense_is_approved_without_alerts() {
        let (service, source) = build_service(FixedRateSource::unavailable());
        let expense = clean_expense(days_ago(5));

        let verdict = service.validate(&expense, today()).await;

        assert_eq!(verdict.expense_id, "g_100");
        assert_eq!(verdict.status, ExpenseStatus::Aprobado);
        assert!(verdict.alerts.is_empty());
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn each_missing_field_earns_its_own_alert() {
        let (service, _) = build_service(FixedRateSource::unavailable());
        let mut expense = clean_expense(days_ago(5));
        expense.employee.id = String::new();
        expense.employee.cost_center = "  ".to_string();
        expense.category = String::new();
        expense.currency = String::new();
        expense.date = None;

        let verdict = service.validate(&expense, today()).await;

        assert_eq!(verdict.status, ExpenseStatus::Rechazado);
        assert_eq!(verdict.alerts.len(), 5);
        assert!(verdict
            .alerts
            .iter()
            .all(|alert| alert.code == AlertCode::CampoObligatorio));
        let fields: Vec<_> = verdict
            .alerts
            .iter()
            .map(|alert| alert.message.as_str())
            .collect();
        assert!(fields[0].contains("empleado_id"));
        assert!(fields[4].contains("fecha"));
    }

    #[tokio::test]
    async fn non_positive_amounts_are_rejected() {
        let (service, _) = build_service(FixedRateSource::unavailable());

        for amount in [0.0, -42.5] {
            let mut expense = clean_expense(days_ago(5));
            expense.amount = amount;

            let verdict = service.validate(&expense, today()).await;
            assert_eq!(verdict.status, ExpenseStatus::Rechazado);
            assert_eq!(verdict.alerts.len(), 1);
            assert_eq!(verdict.alerts[0].code, AlertCode::MontoNoPositivo);
        }
    }

    #[tokio::test]
    async fn stale_expenses_escalate_with_age() {
        let (service, _) = build_service(FixedRateSource::unavailable());

        let pending = service
            .validate(&clean_expense(days_ago(45)), today())
            .await;
        assert_eq!(pending.status, ExpenseStatus::Pendiente);
        assert_eq!(pending.alerts[0].code, AlertCode::LimiteAntiguedad);
        assert!(pending.alerts[0].message.contains("30"));

        let rejected = service
            .validate(&clean_expense(days_ago(90)), today())
            .await;
        assert_eq!(rejected.status, ExpenseStatus::Rechazado);
        assert_eq!(rejected.alerts[0].code, AlertCode::LimiteAntiguedad);
        assert!(rejected.alerts[0].message.contains("60"));
    }

    #[tokio::test]
    async fn category_ceilings_band_by_converted_amount() {
        let (service, _) = build_service(FixedRateSource::unavailable());

        let mut review = clean_expense(days_ago(5));
        review.amount = 180.0;
        let verdict = service.validate(&review, today()).await;
        assert_eq!(verdict.status, ExpenseStatus::Pendiente);
        assert_eq!(verdict.alerts[0].code, AlertCode::LimiteCategoria);

        let mut rejected = clean_expense(days_ago(5));
        rejected.amount = 250.0;
        let verdict = service.validate(&rejected, today()).await;
        assert_eq!(verdict.status, ExpenseStatus::Rechazado);
        assert_eq!(verdict.alerts[0].code, AlertCode::LimiteCategoria);

        let mut unknown = clean_expense(days_ago(5));
        unknown.category = "lodging".to_string();
        unknown.amount = 10_000.0;
        let verdict = service.validate(&unknown, today()).await;
        assert_eq!(verdict.status, ExpenseStatus::Aprobado);
    }

    #[tokio::test]
    async fn prohibited_cost_center_category_pair_is_rejected() {
        let (service, _) = build_service(FixedRateSource::unavailable());
        let mut expense = clean_expense(days_ago(5));
        expense.employee.cost_center = "core_engineering".to_string();
        expense.amount = 50.0;

        let verdict = service.validate(&expense, today()).await;

        assert_eq!(verdict.status, ExpenseStatus::Rechazado);
        assert_eq!(verdict.alerts.len(), 1);
        assert_eq!(verdict.alerts[0].code, AlertCode::PoliticaCentroCosto);
        assert!(verdict.alerts[0].message.contains("core_engineering"));
    }

    #[tokio::test]
    async fn worst_severity_wins_and_all_alerts_survive() {
        let (service, _) = build_service(FixedRateSource::unavailable());
        let mut expense = clean_expense(days_ago(45));
        expense.amount = 180.0;
        expense.employee.cost_center = "core_engineering".to_string();

        let verdict = service.validate(&expense, today()).await;

        assert_eq!(verdict.status, ExpenseStatus::Rechazado);
        let codes: Vec<_> = verdict.alerts.iter().map(|alert| alert.code).collect();
        assert_eq!(
            codes,
            vec![
                AlertCode::LimiteAntiguedad,
                AlertCode::LimiteCategoria,
                AlertCode::PoliticaCentroCosto,
            ]
        );
    }

    #[tokio::test]
    async fn validation_is_idempotent() {
        let (service, _) = build_service(FixedRateSource::unavailable());
        let mut expense = clean_expense(days_ago(45));
        expense.employee.cost_center = "core_engineering".to_string();

        let first = service.validate(&expense, today()).await;
        let second = service.validate(&expense, today()).await;

        assert_eq!(first, second);
    }
}

mod conversion {
    use super::common::*;
    use spendguard::workflows::expenses::{AlertCode, ExpenseStatus};

    #[tokio::test]
    async fn ceiling_applies_to_the_converted_amount() {
        let date = days_ago(5);
        let (service, source) = build_service(FixedRateSource::single(date, "CLP", 950.0));

        let mut modest = clean_expense(date);
        modest.currency = "CLP".to_string();
        modest.amount = 9_500.0;
        let verdict = service.validate(&modest, today()).await;
        assert_eq!(verdict.status, ExpenseStatus::Aprobado);
        assert!(verdict.alerts.is_empty());
        assert_eq!(source.calls(), 1);

        let mut lavish = clean_expense(date);
        lavish.currency = "CLP".to_string();
        lavish.amount = 200_000.0;
        let verdict = service.validate(&lavish, today()).await;
        assert_eq!(verdict.status, ExpenseStatus::Rechazado);
        assert_eq!(verdict.alerts[0].code, AlertCode::LimiteCategoria);
    }

    #[tokio::test]
    async fn rate_outage_degrades_to_pending_review() {
        let (service, source) = build_service(FixedRateSource::unavailable());
        let mut expense = clean_expense(days_ago(5));
        expense.currency = "CLP".to_string();
        expense.amount = 9_500.0;

        let verdict = service.validate(&expense, today()).await;

        assert_eq!(verdict.status, ExpenseStatus::Pendiente);
        assert_eq!(verdict.alerts.len(), 1);
        assert_eq!(verdict.alerts[0].code, AlertCode::TasaCambioNoDisponible);
        assert!(verdict.alerts[0].message.contains("CLP"));
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn rate_outage_never_softens_a_rejection() {
        let (service, source) = build_service(FixedRateSource::unavailable());
        let mut expense = clean_expense(days_ago(90));
        expense.currency = "CLP".to_string();
        expense.amount = 9_500.0;

        let verdict = service.validate(&expense, today()).await;

        assert_eq!(verdict.status, ExpenseStatus::Rechazado);
        let codes: Vec<_> = verdict.alerts.iter().map(|alert| alert.code).collect();
        assert_eq!(
            codes,
            vec![
                AlertCode::LimiteAntiguedad,
                AlertCode::TasaCambioNoDisponible,
            ]
        );
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test]
    async fn offline_service_flags_rates_without_any_request() {
        let service = offline_service();
        let mut expense = clean_expense(days_ago(5));
        expense.currency = "EUR".to_string();

        let verdict = service.validate(&expense, today()).await;

        assert_eq!(verdict.status, ExpenseStatus::Pendiente);
        assert_eq!(verdict.alerts[0].code, AlertCode::TasaCambioNoDisponible);
    }

    #[tokio::test]
    async fn base_currency_never_touches_the_source() {
        let date = days_ago(5);
        let (service, source) = build_service(FixedRateSource::single(date, "CLP", 950.0));

        let verdict = service.validate(&clean_expense(date), today()).await;

        assert_eq!(verdict.status, ExpenseStatus::Aprobado);
        assert_eq!(source.calls(), 0);
    }
}

mod routing {
    use super::common::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use spendguard::workflows::expenses::{
        expense_router, ExpenseValidationService, PolicyRulebook,
    };
    use std::sync::Arc;
    use tower::ServiceExt;

    fn build_router(source: FixedRateSource) -> axum::Router {
        let service = Arc::new(ExpenseValidationService::new(
            Some(Arc::new(source)),
            PolicyRulebook::standard(),
        ));
        expense_router(service)
    }

    fn recent_date() -> chrono::NaiveDate {
        chrono::Local::now().date_naive() - chrono::Duration::days(5)
    }

    async fn dispatch(router: axum::Router, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/expenses/validate")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::to_vec(&body).expect("serialize body"),
            ))
            .expect("request");

        let response = router.oneshot(request).await.expect("router dispatch");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("body");
        let payload: Value = serde_json::from_slice(&bytes).expect("json");
        (status, payload)
    }

    #[tokio::test]
    async fn post_validate_returns_the_wire_verdict() {
        let router = build_router(FixedRateSource::unavailable());
        let body = json!({
            "gasto_id": "g_900",
            "monto": 120.0,
            "moneda": "USD",
            "fecha": recent_date().to_string(),
            "categoria": "food",
            "empleado_id": "emp_1",
            "empleado_nombre": "Ana",
            "empleado_apellido": "Rojas",
            "empleado_cost_center": "sales",
        });

        let (status, payload) = dispatch(router, body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.get("gasto_id"), Some(&json!("g_900")));
        assert_eq!(payload.get("status"), Some(&json!("APROBADO")));
        assert_eq!(
            payload.get("alertas").and_then(Value::as_array).map(Vec::len),
            Some(0)
        );
    }

    #[tokio::test]
    async fn omitted_fields_surface_as_alerts_not_http_errors() {
        let router = build_router(FixedRateSource::unavailable());
        let body = json!({ "gasto_id": "g_901", "monto": 10.0 });

        let (status, payload) = dispatch(router, body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.get("status"), Some(&json!("RECHAZADO")));
        let alerts = payload
            .get("alertas")
            .and_then(Value::as_array)
            .expect("alerts array");
        assert!(!alerts.is_empty());
        assert!(alerts
            .iter()
            .all(|alert| alert.get("codigo") == Some(&json!("CAMPO_OBLIGATORIO"))));
    }

    #[tokio::test]
    async fn rate_outage_still_answers_ok() {
        let router = build_router(FixedRateSource::unavailable());
        let body = json!({
            "gasto_id": "g_902",
            "monto": 9500.0,
            "moneda": "CLP",
            "fecha": recent_date().to_string(),
            "categoria": "food",
            "empleado_id": "emp_1",
            "empleado_nombre": "Ana",
            "empleado_apellido": "Rojas",
            "empleado_cost_center": "sales",
        });

        let (status, payload) = dispatch(router, body).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.get("status"), Some(&json!("PENDIENTE")));
        let alerts = payload
            .get("alertas")
            .and_then(Value::as_array)
            .expect("alerts array");
        assert_eq!(
            alerts[0].get("codigo"),
            Some(&json!("TASA_CAMBIO_NO_DISPONIBLE"))
        );
    }
}
