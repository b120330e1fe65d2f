use crate::domain::criteria::{TripCriteria, TripRequest};
use crate::domain::suggestion::dedup_key;
use crate::suggest::error::SuggestionFailure;
use std::collections::BTreeSet;

/// Checks that mood and country are present. A failure here is a signal to use
/// mock suggestions, not an error for the caller.
pub fn validate(request: &TripRequest) -> Result<TripCriteria, SuggestionFailure> {
    let mut missing = Vec::new();
    if request.mood.is_none() {
        missing.push("mood");
    }
    if request.country.is_none() {
        missing.push("country");
    }

    let (Some(mood), Some(country)) = (&request.mood, &request.country) else {
        return Err(SuggestionFailure::ValidationMissing { missing });
    };

    let mut seen = BTreeSet::new();
    let existing_destination_names: Vec<String> = request
        .existing
        .iter()
        .filter(|name| seen.insert(dedup_key(name)))
        .cloned()
        .collect();

    Ok(TripCriteria {
        mood: mood.clone(),
        country: country.clone(),
        state: request.state.clone(),
        total_budget: request.total_budget_or_default(),
        travelers: request.travelers_or_default(),
        existing_destination_names,
    })
}
