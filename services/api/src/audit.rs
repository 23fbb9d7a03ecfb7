use chrono::{Local, NaiveDate};
use clap::Args;
use spendguard::config::AppConfig;
use spendguard::error::AppError;
use spendguard::telemetry;
use spendguard::workflows::audit::{BatchAuditSummary, BatchAuditor, ExpenseBatch};
use spendguard::workflows::expenses::rates::OpenExchangeRatesClient;
use spendguard::workflows::expenses::PolicyRulebook;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Args, Debug)]
pub(crate) struct AuditArgs {
    /// Path to the historical expense CSV
    #[arg(long, default_value = "gastos_historicos.csv")]
    pub(crate) csv: PathBuf,
    /// Evaluation date for the age rules (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Output path for the markdown analysis
    #[arg(long, default_value = "ANALISIS.md")]
    pub(crate) output: PathBuf,
    /// Skip the external rate source even when a credential is configured
    #[arg(long)]
    pub(crate) offline: bool,
}

pub(crate) async fn run_audit(args: AuditArgs) -> Result<(), AppError> {
    let AuditArgs {
        csv,
        today,
        output,
        offline,
    } = args;

    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let batch = ExpenseBatch::from_path(&csv)?;

    let client = if offline {
        None
    } else {
        let client = OpenExchangeRatesClient::from_config(&config.rates)?;
        if client.is_none() {
            warn!("no exchange-rate credential configured; non-base expenses stay unconverted");
        }
        client
    };

    let auditor = BatchAuditor::new(PolicyRulebook::standard());
    let report = match &client {
        Some(source) => auditor.audit(&batch, source, today).await,
        None => auditor.audit_offline(&batch, today),
    };
    let summary = report.summary();

    render_summary(&csv, today, client.is_none(), &summary);

    std::fs::write(&output, analysis_markdown(&summary))?;
    println!("\nWrote analysis to {}", output.display());

    Ok(())
}

fn render_summary(csv: &Path, today: NaiveDate, offline: bool, summary: &BatchAuditSummary) {
    println!("Historical expense audit");
    println!(
        "Source: {} ({} expenses, {} rows skipped, evaluated {})",
        csv.display(),
        summary.total_expenses,
        summary.structural_errors.len(),
        today
    );
    if offline {
        println!("Rate source: offline (no requests issued)");
    }

    println!("\nStatus breakdown");
    for entry in &summary.status_counts {
        println!("- {}: {}", entry.status_label, entry.count);
    }

    if !summary.structural_errors.is_empty() {
        println!("\nSkipped rows");
        for error in &summary.structural_errors {
            println!("- row {}: {}", error.row, error.reason);
        }
    }

    println!("\nExact duplicates");
    if summary.duplicate_groups.is_empty() {
        println!("- none");
    } else {
        for group in &summary.duplicate_groups {
            println!(
                "- {} | {} {} | ids: {}",
                group.date,
                group.amount,
                group.currency,
                group.expense_ids.join(", ")
            );
        }
    }

    println!("\nNegative amounts");
    if summary.negative_ids.is_empty() {
        println!("- none");
    } else {
        println!("- ids: {}", summary.negative_ids.join(", "));
    }

    println!("\nCurrency distribution");
    for (currency, count) in &summary.currency_distribution {
        println!("- {currency}: {count}");
    }

    println!("\nRate requests");
    println!(
        "- {} non-base rows across {} distinct dates -> {} requests",
        summary.non_base_rows, summary.distinct_rate_dates, summary.rate_requests
    );
}

/// Renders the Spanish-language `ANALISIS.md` findings document.
fn analysis_markdown(summary: &BatchAuditSummary) -> String {
    let mut md = String::new();

    md.push_str("# ANALISIS - Auditoría de gastos históricos\n\n");

    md.push_str("## 1) Desglose de gastos por estado\n\n");
    for entry in &summary.status_counts {
        md.push_str(&format!("- {}S: {}\n", entry.status_label, entry.count));
    }

    md.push_str("\n## 2) Anomalías detectadas\n\n");
    md.push_str("### 2.1 Duplicados exactos (monto, moneda, fecha idénticos)\n\n");
    if summary.duplicate_groups.is_empty() {
        md.push_str("No se encontraron duplicados exactos.\n");
    } else {
        for group in summary.duplicate_groups.iter().take(5) {
            md.push_str(&format!(
                "- {} | {} {} | ids: {}\n",
                group.date,
                group.amount,
                group.currency,
                group.expense_ids.join(", ")
            ));
        }
    }

    md.push_str("\n### 2.2 Montos negativos\n\n");
    if summary.negative_ids.is_empty() {
        md.push_str("No se encontraron montos negativos.\n");
    } else {
        let ids: Vec<&str> = summary
            .negative_ids
            .iter()
            .take(10)
            .map(String::as_str)
            .collect();
        md.push_str(&format!("Ejemplos (ids): {}\n", ids.join(", ")));
    }

    md.push_str("\n## 3) Optimización para evitar N+1 requests (Open Exchange Rates)\n\n");
    md.push_str("### Problema\n\n");
    md.push_str(
        "Consultar la tasa por cada gasto no-USD genera el anti-patrón N+1: \
         N filas no-USD producen N llamadas de red, repitiendo fechas y \
         sumando latencia y puntos de falla.\n\n",
    );
    md.push_str("### Solución aplicada\n\n");
    md.push_str(
        "1) Los gastos no-USD se agrupan por fecha, reuniendo las monedas necesarias de cada día.\n\
         2) Se hace 1 request por fecha única, pidiendo solo los symbols requeridos.\n\
         3) Las tasas quedan en un cache en memoria; cada conversión posterior es un lookup O(1).\n\n",
    );
    md.push_str("### Beneficios\n\n");
    md.push_str(&format!(
        "- Menos round trips: N={} gastos no-USD colapsan en D={} llamadas (una por fecha única).\n",
        summary.non_base_rows, summary.distinct_rate_dates
    ));
    md.push_str("- Menos exposición a fallas de red y cuotas del proveedor.\n\n");
    md.push_str("### Fallback\n\n");
    md.push_str(
        "Si una fecha queda sin tasa, el gasto recibe la alerta `TASA_CAMBIO_NO_DISPONIBLE` \
         y queda PENDIENTE, salvo que otra regla más severa lo lleve a RECHAZADO.\n\n",
    );

    md.push_str("## 4) Datos del lote\n\n");
    md.push_str(&format!("- Total gastos: {}\n", summary.total_expenses));
    if !summary.structural_errors.is_empty() {
        md.push_str(&format!(
            "- Filas descartadas por formato: {}\n",
            summary.structural_errors.len()
        ));
    }
    let distribution: Vec<String> = summary
        .currency_distribution
        .iter()
        .map(|(currency, count)| format!("{currency}={count}"))
        .collect();
    md.push_str(&format!(
        "- Distribución monedas: {}\n",
        distribution.join(", ")
    ));
    md.push_str(&format!(
        "- Requests OXR ejecutadas (en esta corrida): {}\n",
        summary.rate_requests
    ));

    md
}
