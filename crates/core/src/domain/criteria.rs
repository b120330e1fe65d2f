use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

use crate::domain::suggestion::dedup_key;

pub const DEFAULT_TOTAL_BUDGET: f64 = 50_000.0;
pub const DEFAULT_TRAVELERS: u32 = 1;

/// Trip request as the caller sent it. Every field is optional and leniently
/// parsed: blank strings are absent, numeric fields accept numbers or numeric
/// strings, and non-positive numbers are treated as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRequest {
    pub mood: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub budget: Option<f64>,
    pub travelers: Option<u32>,
    #[serde(default)]
    pub existing: Vec<String>,
}

impl TripRequest {
    pub fn from_payload(payload: &Value) -> Self {
        let Some(obj) = payload.as_object() else {
            return Self::default();
        };

        let text = |key: &str| {
            obj.get(key)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        let budget = ["budget", "totalBudget"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(positive_number));

        let travelers = obj
            .get("travelers")
            .and_then(positive_number)
            .map(|n| n.floor())
            .filter(|n| *n >= 1.0 && *n <= u32::MAX as f64)
            .map(|n| n as u32);

        let existing = ["existing", "existingDestinationNames"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_array))
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            mood: text("mood"),
            country: text("country"),
            state: text("state"),
            budget,
            travelers,
            existing,
        }
    }

    pub fn total_budget_or_default(&self) -> f64 {
        self.budget.unwrap_or(DEFAULT_TOTAL_BUDGET)
    }

    pub fn travelers_or_default(&self) -> u32 {
        self.travelers.unwrap_or(DEFAULT_TRAVELERS).max(1)
    }
}

fn positive_number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (n.is_finite() && n > 0.0).then_some(n)
}

/// Validated criteria for one generation call. `total_budget > 0` and
/// `travelers >= 1` always hold.
#[derive(Debug, Clone, PartialEq)]
pub struct TripCriteria {
    pub mood: String,
    pub country: String,
    pub state: Option<String>,
    pub total_budget: f64,
    pub travelers: u32,
    pub existing_destination_names: Vec<String>,
}

impl TripCriteria {
    pub fn per_person_budget(&self) -> f64 {
        self.total_budget / f64::from(self.travelers.max(1))
    }

    /// Dedup keys of every destination the caller has already been shown.
    pub fn excluded_keys(&self) -> BTreeSet<String> {
        self.existing_destination_names
            .iter()
            .map(|name| dedup_key(name))
            .filter(|key| !key.is_empty())
            .collect()
    }
}
