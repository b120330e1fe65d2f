use crate::domain::criteria::TripCriteria;
use crate::domain::suggestion::{dedup_key, RawSuggestion};
use crate::llm::{json, GenerationRequest, Provider, SuggestionModel};
use crate::suggest::error::SuggestionFailure;
use crate::suggest::normalize::destination_name;
use std::time::Duration;

pub const MAX_CANDIDATES: usize = 10;

pub fn build_prompt(criteria: &TripCriteria) -> String {
    let existing = criteria.existing_destination_names.join(", ");
    format!(
        "Return a JSON array of up to {MAX_CANDIDATES} DIFFERENT travel suggestions for a user.\n\
\n\
Mood: {mood}\n\
Country: {country}\n\
StateOrRegion: {state}\n\
TotalBudget: {budget}\n\
Travelers: {travelers}\n\
ExistingDestinations (do NOT repeat any of these city/place names): [{existing}]\n\
\n\
Each object MUST have exactly these keys:\n\
{{\n\
  \"destination\": \"City or Place, State\",\n\
  \"summary\": \"1-3 lines about the place: a little history and why to visit\",\n\
  \"tags\": [\"tag1\", \"tag2\", \"tag3\"],\n\
  \"approxBaseCost\": number\n\
}}\n\
approxBaseCost is the estimated cost per person for the whole trip, as a plain number.\n\
\n\
Rules:\n\
- Mix famous and lesser-known places.\n\
- Do NOT include any destination whose city/place name appears in ExistingDestinations.\n\
- Do not repeat the same city across objects in this response.\n\
- Respond with VALID JSON ONLY. No markdown fences, no prose.",
        mood = criteria.mood,
        country = criteria.country,
        state = criteria.state.as_deref().unwrap_or("Any"),
        budget = criteria.total_budget,
        travelers = criteria.travelers,
    )
}

/// Asks the model for suggestions and parses its answer into raw records.
///
/// The whole call is bounded by `timeout`. Candidates naming an excluded
/// destination are dropped and at most [`MAX_CANDIDATES`] are kept.
pub async fn generate_candidates(
    model: &dyn SuggestionModel,
    criteria: &TripCriteria,
    timeout: Duration,
) -> Result<Vec<RawSuggestion>, SuggestionFailure> {
    let provider = model.provider();
    let request = GenerationRequest::new(build_prompt(criteria));

    let text = match tokio::time::timeout(timeout, model.generate_text(&request)).await {
        Err(_) => {
            return Err(SuggestionFailure::UpstreamUnavailable {
                provider,
                detail: format!("no response within {}s", timeout.as_secs_f64()),
            })
        }
        Ok(Err(err)) => return Err(classify(provider, err)),
        Ok(Ok(text)) => text,
    };

    let parsed = match json::parse_candidates(&text) {
        Ok(parsed) => parsed,
        Err(err) => {
            return Err(SuggestionFailure::UpstreamMalformed {
                provider,
                detail: format!("{err:#}"),
                raw_output: Some(text),
            })
        }
    };

    let excluded = criteria.excluded_keys();
    let candidates: Vec<RawSuggestion> = parsed
        .into_iter()
        .filter(|raw| match destination_name(raw) {
            Some(name) => !excluded.contains(&dedup_key(name)),
            None => true,
        })
        .take(MAX_CANDIDATES)
        .collect();

    if candidates.is_empty() {
        return Err(SuggestionFailure::UpstreamMalformed {
            provider,
            detail: "no usable suggestions in model output".to_string(),
            raw_output: Some(text),
        });
    }

    Ok(candidates)
}

fn classify(provider: Provider, err: anyhow::Error) -> SuggestionFailure {
    match err.downcast::<SuggestionFailure>() {
        Ok(failure) => failure,
        Err(err) => SuggestionFailure::UpstreamUnavailable {
            provider,
            detail: format!("{err:#}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggest::testing::ScriptedModel;
    use serde_json::json;

    fn criteria() -> TripCriteria {
        TripCriteria {
            mood: "Adventure".to_string(),
            country: "India".to_string(),
            state: None,
            total_budget: 60000.0,
            travelers: 2,
            existing_destination_names: vec!["Manali".to_string(), "Rishikesh".to_string()],
        }
    }

    #[test]
    fn prompt_embeds_criteria_and_exclusions() {
        let prompt = build_prompt(&criteria());
        assert!(prompt.contains("Mood: Adventure"));
        assert!(prompt.contains("Country: India"));
        assert!(prompt.contains("StateOrRegion: Any"));
        assert!(prompt.contains("TotalBudget: 60000"));
        assert!(prompt.contains("Travelers: 2"));
        assert!(prompt.contains("[Manali, Rishikesh]"));
        assert!(prompt.contains("\"approxBaseCost\": number"));
    }

    #[tokio::test]
    async fn fenced_and_bare_replies_parse_identically() {
        let body = json!([{"destination": "Hampi", "approxBaseCost": 9000}]).to_string();
        let bare = ScriptedModel::replying(&body);
        let fenced = ScriptedModel::replying(&format!("```json\n{body}\n```"));

        let timeout = Duration::from_secs(5);
        let a = generate_candidates(&bare, &criteria(), timeout).await.unwrap();
        let b = generate_candidates(&fenced, &criteria(), timeout).await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 1);
    }

    #[tokio::test]
    async fn sends_prompt_with_sampling_parameters() {
        let model = ScriptedModel::replying(r#"[{"destination":"Hampi"}]"#);
        generate_candidates(&model, &criteria(), Duration::from_secs(5))
            .await
            .unwrap();

        let seen = model.last_request().unwrap();
        assert_eq!(seen.temperature, 1.0);
        assert_eq!(seen.top_p, 0.9);
        assert_eq!(seen.top_k, 40);
        assert!(seen.prompt.contains("ExistingDestinations"));
    }

    #[tokio::test]
    async fn drops_excluded_names_and_caps_count() {
        let mut items: Vec<_> = (0..15)
            .map(|i| json!({"destination": format!("Place {i}"), "approxBaseCost": 1000 + i}))
            .collect();
        items.insert(0, json!({"destination": " manali ", "approxBaseCost": 5000}));
        let model = ScriptedModel::replying(&serde_json::Value::Array(items).to_string());

        let out = generate_candidates(&model, &criteria(), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(out.len(), MAX_CANDIDATES);
        assert_eq!(out[0]["destination"], "Place 0");
    }

    #[tokio::test]
    async fn exclusion_applies_to_every_name_field() {
        let reply = json!([
            {"destinationName": "Manali", "approxBaseCost": 9000},
            {"DestinationName": "RISHIKESH", "approxBaseCost": 8000},
            {"destinationName": "Spiti", "approxBaseCost": 7000},
        ]);
        let model = ScriptedModel::replying(&reply.to_string());

        let out = generate_candidates(&model, &criteria(), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0]["destinationName"], "Spiti");
    }

    #[tokio::test]
    async fn timeout_is_upstream_unavailable() {
        let model = ScriptedModel::replying("[]").with_delay(Duration::from_secs(30));
        let err = generate_candidates(&model, &criteria(), Duration::from_millis(20))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "upstream_unavailable");
    }

    #[tokio::test]
    async fn transport_error_is_upstream_unavailable() {
        let model = ScriptedModel::failing("connection refused");
        let err = generate_candidates(&model, &criteria(), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "upstream_unavailable");
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn typed_failures_from_the_model_are_kept() {
        let model = ScriptedModel::failing_with(SuggestionFailure::UpstreamMalformed {
            provider: Provider::Gemini,
            detail: "envelope".to_string(),
            raw_output: None,
        });
        let err = generate_candidates(&model, &criteria(), Duration::from_secs(5))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "upstream_malformed");
    }

    #[tokio::test]
    async fn unparseable_or_empty_output_is_malformed() {
        for reply in ["Sorry, I can't do that.", "42", "[]", "[1, 2]"] {
            let model = ScriptedModel::replying(reply);
            let err = generate_candidates(&model, &criteria(), Duration::from_secs(5))
                .await
                .unwrap_err();
            assert_eq!(err.kind(), "upstream_malformed", "reply={reply}");
        }
    }
}
