use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Loosely-shaped suggestion object as produced by the upstream model, the mock
/// generator or the static dataset, before normalization.
pub type RawSuggestion = Map<String, Value>;

/// Where a suggestion came from. Earlier sources win when batches are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionSource {
    Local,
    Generated,
    Mock,
}

impl SuggestionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SuggestionSource::Local => "local",
            SuggestionSource::Generated => "generated",
            SuggestionSource::Mock => "mock",
        }
    }
}

/// Per-person split of a base cost over a fixed two-night trip.
///
/// `lodging_per_night * 2 + food_per_day * 2 + local_transport + shopping + activities`
/// always equals `total_per_person`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostBreakdown {
    pub lodging_per_night: f64,
    pub food_per_day: f64,
    pub local_transport: f64,
    pub shopping: f64,
    pub activities: f64,
    pub total_per_person: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestionRecord {
    pub destination_name: String,
    pub summary: String,
    pub tags: Vec<String>,
    pub approx_base_cost_per_person: f64,
    pub breakdown: CostBreakdown,
    pub source: SuggestionSource,
}

impl SuggestionRecord {
    /// Trimmed, lowercased destination name used to collapse duplicates.
    pub fn dedup_key(&self) -> String {
        dedup_key(&self.destination_name)
    }
}

pub fn dedup_key(destination_name: &str) -> String {
    destination_name.trim().to_lowercase()
}

/// Caller-facing result of a suggestion request. `success` is always true;
/// `note` is only set when a fallback path produced the suggestions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuggestionResponse {
    pub success: bool,
    pub suggestions: Vec<SuggestionRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl SuggestionResponse {
    pub fn authentic(suggestions: Vec<SuggestionRecord>) -> Self {
        Self {
            success: true,
            suggestions,
            note: None,
        }
    }

    pub fn degraded(suggestions: Vec<SuggestionRecord>, note: impl Into<String>) -> Self {
        Self {
            success: true,
            suggestions,
            note: Some(note.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_camel_case_with_lowercase_source() {
        let record = SuggestionRecord {
            destination_name: "Goa".to_string(),
            summary: String::new(),
            tags: vec!["beach".to_string()],
            approx_base_cost_per_person: 100.0,
            breakdown: CostBreakdown::default(),
            source: SuggestionSource::Generated,
        };

        let v = serde_json::to_value(&record).unwrap();
        assert_eq!(v["destinationName"], json!("Goa"));
        assert_eq!(v["approxBaseCostPerPerson"], json!(100.0));
        assert_eq!(v["breakdown"]["lodgingPerNight"], json!(0.0));
        assert_eq!(v["source"], json!("generated"));
    }

    #[test]
    fn note_is_omitted_on_authentic_responses() {
        let v = serde_json::to_value(SuggestionResponse::authentic(vec![])).unwrap();
        assert_eq!(v, json!({"success": true, "suggestions": []}));

        let v = serde_json::to_value(SuggestionResponse::degraded(vec![], "fallback")).unwrap();
        assert_eq!(v["note"], json!("fallback"));
    }

    #[test]
    fn dedup_key_trims_and_lowercases() {
        assert_eq!(dedup_key("  Paris, France "), "paris, france");
    }
}
