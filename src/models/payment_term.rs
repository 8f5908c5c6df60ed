use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// Milestone label to percentage of the work-order value, e.g.
/// `{"advance": 30, "on_delivery": 70}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct PaymentTerm(pub BTreeMap<String, f64>);

impl PaymentTerm {
    pub fn total_percentage(&self) -> f64 {
        self.0.values().sum()
    }

    /// Every share must be a finite, non-negative number under a non-blank label.
    pub fn check(&self) -> Result<(), String> {
        for (label, share) in &self.0 {
            if label.trim().is_empty() {
                return Err("payment_term labels must not be blank".to_string());
            }
            if !share.is_finite() || *share < 0.0 {
                return Err(format!(
                    "payment_term share for '{}' must be a non-negative number",
                    label
                ));
            }
        }
        Ok(())
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.0
                .iter()
                .map(|(label, share)| (label.clone(), serde_json::json!(share)))
                .collect(),
        )
    }

    pub fn from_json(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value.clone())
    }
}
