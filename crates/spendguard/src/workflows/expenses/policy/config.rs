use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-category spending ceiling, checked against the base-currency amount.
///
/// Amounts up to `approved_up_to` pass silently, amounts up to
/// `pending_up_to` require review, anything above is rejected. Setting both
/// to the same value removes the review band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CategoryCeiling {
    pub approved_up_to: f64,
    pub pending_up_to: f64,
}

/// A cost-center that may not report expenses under a given category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostCenterRule {
    pub cost_center: String,
    pub prohibited_category: String,
}

/// Policy configuration the engine evaluates expenses against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRulebook {
    pub base_currency: String,
    pub pending_after_days: i64,
    pub rejected_after_days: i64,
    pub category_ceilings: HashMap<String, CategoryCeiling>,
    pub cost_center_rules: Vec<CostCenterRule>,
}

impl PolicyRulebook {
    pub fn standard() -> Self {
        Self {
            base_currency: "USD".to_string(),
            pending_after_days: 30,
            rejected_after_days: 60,
            category_ceilings: standard_category_ceilings(),
            cost_center_rules: vec![CostCenterRule {
                cost_center: "core_engineering".to_string(),
                prohibited_category: "food".to_string(),
            }],
        }
    }

    pub fn ceiling_for(&self, category: &str) -> Option<&CategoryCeiling> {
        self.category_ceilings.get(category)
    }
}

fn standard_category_ceilings() -> HashMap<String, CategoryCeiling> {
    HashMap::from([
        (
            "food".to_string(),
            CategoryCeiling {
                approved_up_to: 150.0,
                pending_up_to: 200.0,
            },
        ),
        (
            "transport".to_string(),
            CategoryCeiling {
                approved_up_to: 200.0,
                pending_up_to: 200.0,
            },
        ),
    ])
}
