use crate::domain::criteria::TripCriteria;
use crate::domain::suggestion::RawSuggestion;
use crate::suggest::normalize::{DAYS, NIGHTS};
use anyhow::Context;
use serde::{Deserialize, Deserializer};
use serde_json::{json, Value};
use std::path::Path;

/// One row of the static destination dataset. Costs are per person.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DestinationRow {
    #[serde(rename = "Destination Name", alias = "DestinationName", default)]
    pub destination_name: String,
    #[serde(rename = "Country", default)]
    pub country: String,
    #[serde(rename = "State", default)]
    pub state: Option<String>,
    #[serde(rename = "Trip Type", default)]
    pub trip_type: String,
    #[serde(rename = "Avg Flight Cost (₹)", default, deserialize_with = "lenient_amount")]
    pub flight: f64,
    #[serde(rename = "Hotel (₹/night)", default, deserialize_with = "lenient_amount")]
    pub hotel_per_night: f64,
    #[serde(rename = "Food (₹/day)", default, deserialize_with = "lenient_amount")]
    pub food_per_day: f64,
    #[serde(rename = "Local Transport (₹)", default, deserialize_with = "lenient_amount")]
    pub local_transport: f64,
    #[serde(rename = "Shopping (₹)", default, deserialize_with = "lenient_amount")]
    pub shopping: f64,
    #[serde(rename = "Activities Included", default)]
    pub activities: Option<String>,
}

impl DestinationRow {
    /// Per-person cost of the fixed-length trip, flight included.
    pub fn per_person_total(&self) -> f64 {
        self.flight
            + self.hotel_per_night * NIGHTS
            + self.food_per_day * DAYS
            + self.local_transport
            + self.shopping
    }

    fn to_raw(&self) -> RawSuggestion {
        let mut tags = vec![self.trip_type.clone(), self.country.clone()];
        if let Some(state) = self.state.as_deref().filter(|s| !s.trim().is_empty()) {
            tags.push(state.to_string());
        }

        let record = json!({
            "destination": self.destination_name,
            "summary": self.activities.clone().unwrap_or_default(),
            "tags": tags,
            "estimatedPerPerson": self.per_person_total(),
        });
        record.as_object().cloned().unwrap_or_default()
    }
}

/// Read-only destination table loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct DestinationDataset {
    rows: Vec<DestinationRow>,
}

impl DestinationDataset {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read destination dataset {}", path.display()))?;
        let dataset = Self::from_json_str(&text)
            .with_context(|| format!("failed to parse destination dataset {}", path.display()))?;
        tracing::info!(path = %path.display(), rows = dataset.len(), "destination dataset loaded");
        Ok(dataset)
    }

    pub fn from_json_str(text: &str) -> anyhow::Result<Self> {
        let rows = serde_json::from_str::<Vec<DestinationRow>>(text)
            .context("destination dataset must be a JSON array of rows")?;
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows matching mood (trip type), country and, when given, state exactly,
    /// whose trip total for every traveler fits the budget.
    pub fn query(&self, criteria: &TripCriteria) -> Vec<RawSuggestion> {
        let travelers = f64::from(criteria.travelers.max(1));
        self.rows
            .iter()
            .filter(|row| row.trip_type == criteria.mood && row.country == criteria.country)
            .filter(|row| match criteria.state.as_deref() {
                Some(state) => row.state.as_deref() == Some(state),
                None => true,
            })
            .filter(|row| row.per_person_total() * travelers <= criteria.total_budget)
            .map(DestinationRow::to_raw)
            .collect()
    }
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(deserializer)?;
    let n = match v {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().replace(',', "").parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(if n.is_finite() { n } else { 0.0 })
}
