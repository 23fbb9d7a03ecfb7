use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Final status of an evaluated expense.
///
/// Variants are declared from least to most severe so the derived ordering
/// matches the policy precedence: `Rechazado > Pendiente > Aprobado`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpenseStatus {
    Aprobado,
    Pendiente,
    Rechazado,
}

impl ExpenseStatus {
    pub const fn ordered() -> [Self; 3] {
        [Self::Aprobado, Self::Pendiente, Self::Rechazado]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Aprobado => "APROBADO",
            Self::Pendiente => "PENDIENTE",
            Self::Rechazado => "RECHAZADO",
        }
    }
}

/// Machine-readable identifier of a fired policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertCode {
    CampoObligatorio,
    MontoNoPositivo,
    LimiteAntiguedad,
    LimiteCategoria,
    PoliticaCentroCosto,
    TasaCambioNoDisponible,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "codigo")]
    pub code: AlertCode,
    #[serde(rename = "mensaje")]
    pub message: String,
}

/// Output of the policy engine for one expense.
///
/// Alerts are additive and preserved in rule order; an expense may carry
/// several alerts of mixed severity regardless of the final status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    #[serde(rename = "gasto_id")]
    pub expense_id: String,
    pub status: ExpenseStatus,
    #[serde(rename = "alertas")]
    pub alerts: Vec<Alert>,
}

/// Employee reference attached to an expense. Cost-center and id are
/// mandatory for approval; name and surname are descriptive only.
#[derive(Debug, Clone, PartialEq)]
pub struct Employee {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub cost_center: String,
}

/// The unit under evaluation. Immutable once constructed: conversion and
/// rule evaluation produce derived values and never mutate the input.
#[derive(Debug, Clone, PartialEq)]
pub struct Expense {
    pub id: String,
    pub amount: f64,
    pub currency: String,
    pub date: Option<NaiveDate>,
    pub category: String,
    pub employee: Employee,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_severity_orders_rechazado_highest() {
        assert!(ExpenseStatus::Rechazado > ExpenseStatus::Pendiente);
        assert!(ExpenseStatus::Pendiente > ExpenseStatus::Aprobado);
        let max = ExpenseStatus::ordered().into_iter().max();
        assert_eq!(max, Some(ExpenseStatus::Rechazado));
    }

    #[test]
    fn statuses_serialize_to_wire_spelling() {
        let json = serde_json::to_string(&ExpenseStatus::Pendiente).expect("status serializes");
        assert_eq!(json, "\"PENDIENTE\"");
        let code =
            serde_json::to_string(&AlertCode::TasaCambioNoDisponible).expect("code serializes");
        assert_eq!(code, "\"TASA_CAMBIO_NO_DISPONIBLE\"");
    }
}
