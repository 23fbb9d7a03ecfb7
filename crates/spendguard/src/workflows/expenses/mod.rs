//! Single-expense validation: domain model, policy engine, currency rates,
//! and the HTTP boundary of the validation service.

pub mod domain;
pub mod policy;
pub mod rates;
pub mod router;
pub mod service;

pub use domain::{Alert, AlertCode, Employee, Expense, ExpenseStatus, Verdict};
pub use policy::{CategoryCeiling, CostCenterRule, PolicyEngine, PolicyRulebook};
pub use router::{expense_router, ValidateExpenseRequest};
pub use service::ExpenseValidationService;
