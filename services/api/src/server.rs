use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_expense_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use spendguard::config::AppConfig;
use spendguard::error::AppError;
use spendguard::telemetry;
use spendguard::workflows::expenses::rates::OpenExchangeRatesClient;
use spendguard::workflows::expenses::{ExpenseValidationService, PolicyRulebook};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let rate_client = OpenExchangeRatesClient::from_config(&config.rates)?.map(Arc::new);
    if rate_client.is_none() {
        warn!("no exchange-rate credential configured; currency conversion disabled");
    }
    let validation_service = Arc::new(ExpenseValidationService::new(
        rate_client,
        PolicyRulebook::standard(),
    ));

    let app = with_expense_routes(validation_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "expense validation service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
