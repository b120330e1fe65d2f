use crate::domain::criteria::TripRequest;
use crate::domain::suggestion::RawSuggestion;
use serde_json::json;

const THEMES: [&str; 6] = [
    "City Highlights",
    "Hidden Gems",
    "Nature Escape",
    "Food & Culture",
    "Adventure Mix",
    "Relax & Reset",
];

const COST_STEP: f64 = 1500.0;

/// Deterministic offline suggestions derived only from the request. Always six
/// raw records, one per theme, with the per-person budget stepping up by 1500.
pub fn generate(request: &TripRequest) -> Vec<RawSuggestion> {
    let per_person =
        (request.total_budget_or_default() / f64::from(request.travelers_or_default())).round();

    let prefix = match (request.country.as_deref(), request.state.as_deref()) {
        (Some(country), Some(state)) => format!("{country} - {state}"),
        (Some(country), None) => country.to_string(),
        (None, Some(state)) => format!("Destination - {state}"),
        (None, None) => "Destination".to_string(),
    };
    let mood = request.mood.as_deref();

    THEMES
        .iter()
        .enumerate()
        .filter_map(|(idx, label)| {
            let label_lower = label.to_lowercase();
            let record = json!({
                "destination": format!("{prefix} - {label}"),
                "summary": format!(
                    "Suggested {} in {prefix}: {label_lower} with approx per-person cost.",
                    mood.unwrap_or("trip")
                ),
                "tags": [
                    mood.unwrap_or("Trip"),
                    request.country.as_deref().unwrap_or("World"),
                    label_lower,
                ],
                "approxBaseCost": per_person + (idx as f64) * COST_STEP,
            });
            record.as_object().cloned()
        })
        .collect()
}
