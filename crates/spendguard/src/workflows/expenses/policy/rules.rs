use super::super::domain::{Alert, AlertCode, Expense, ExpenseStatus};
use super::config::PolicyRulebook;
use super::Finding;
use chrono::NaiveDate;

pub(crate) fn run_checks(
    expense: &Expense,
    converted_amount: Option<f64>,
    today: NaiveDate,
    rulebook: &PolicyRulebook,
) -> Vec<Finding> {
    let mut findings = Vec::new();

    let mandatory = [
        ("empleado_id", expense.employee.id.trim().is_empty()),
        (
            "empleado_cost_center",
            expense.employee.cost_center.trim().is_empty(),
        ),
        ("categoria", expense.category.trim().is_empty()),
        ("moneda", expense.currency.trim().is_empty()),
        ("fecha", expense.date.is_none()),
    ];
    for (field, missing) in mandatory {
        if missing {
            findings.push(Finding {
                severity: ExpenseStatus::Rechazado,
                alert: Alert {
                    code: AlertCode::CampoObligatorio,
                    message: format!("Falta campo obligatorio: '{field}'."),
                },
            });
        }
    }

    // Sign is checked on the converted amount when available; positive rates
    // preserve the sign of the raw amount otherwise.
    let effective_amount = converted_amount.unwrap_or(expense.amount);
    if effective_amount <= 0.0 {
        findings.push(Finding {
            severity: ExpenseStatus::Rechazado,
            alert: Alert {
                code: AlertCode::MontoNoPositivo,
                message: "El monto del gasto no es positivo; dato sospechoso/erróneo.".to_string(),
            },
        });
    }

    if let Some(date) = expense.date {
        let age_days = (today - date).num_days();
        if age_days > rulebook.rejected_after_days {
            findings.push(Finding {
                severity: ExpenseStatus::Rechazado,
                alert: Alert {
                    code: AlertCode::LimiteAntiguedad,
                    message: format!(
                        "Gasto excede los {} días. No es reembolsable.",
                        rulebook.rejected_after_days
                    ),
                },
            });
        } else if age_days > rulebook.pending_after_days {
            findings.push(Finding {
                severity: ExpenseStatus::Pendiente,
                alert: Alert {
                    code: AlertCode::LimiteAntiguedad,
                    message: format!(
                        "Gasto excede los {} días. Requiere revisión.",
                        rulebook.pending_after_days
                    ),
                },
            });
        }
    }

    // Only meaningful when the expense actually identified a (date, currency)
    // pair to convert; missing fields already carry their own alert.
    if converted_amount.is_none() && !expense.currency.trim().is_empty() {
        if let Some(date) = expense.date {
            findings.push(Finding {
                severity: ExpenseStatus::Pendiente,
                alert: Alert {
                    code: AlertCode::TasaCambioNoDisponible,
                    message: format!(
                        "No se pudo obtener tasa para {} en {}.",
                        expense.currency, date
                    ),
                },
            });
        }
    }

    if let Some(amount) = converted_amount {
        if let Some(ceiling) = rulebook.ceiling_for(&expense.category) {
            if amount > ceiling.pending_up_to {
                findings.push(Finding {
                    severity: ExpenseStatus::Rechazado,
                    alert: Alert {
                        code: AlertCode::LimiteCategoria,
                        message: format!(
                            "El gasto de '{}' excede el límite permitido.",
                            expense.category
                        ),
                    },
                });
            } else if amount > ceiling.approved_up_to {
                findings.push(Finding {
                    severity: ExpenseStatus::Pendiente,
                    alert: Alert {
                        code: AlertCode::LimiteCategoria,
                        message: format!(
                            "El gasto de '{}' excede el límite aprobado; requiere revisión.",
                            expense.category
                        ),
                    },
                });
            }
        }
    }

    for rule in &rulebook.cost_center_rules {
        if expense.employee.cost_center == rule.cost_center
            && expense.category == rule.prohibited_category
        {
            findings.push(Finding {
                severity: ExpenseStatus::Rechazado,
                alert: Alert {
                    code: AlertCode::PoliticaCentroCosto,
                    message: format!(
                        "El C.C. '{}' no puede reportar a '{}'.",
                        rule.cost_center, rule.prohibited_category
                    ),
                },
            });
        }
    }

    findings
}
