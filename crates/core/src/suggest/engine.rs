use crate::dataset::DestinationDataset;
use crate::domain::criteria::{TripCriteria, TripRequest};
use crate::domain::suggestion::{SuggestionRecord, SuggestionResponse, SuggestionSource};
use crate::llm::{Provider, SuggestionModel};
use crate::suggest::error::SuggestionFailure;
use crate::suggest::normalize::normalize_all;
use crate::suggest::{merge, mock, upstream, validate};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_UPSTREAM_TIMEOUT: Duration = Duration::from_secs(60);

/// Validates the request, asks the upstream model, and degrades to mock
/// suggestions on any failure. Never returns an error to the caller.
#[derive(Clone)]
pub struct SuggestionEngine {
    model: Option<Arc<dyn SuggestionModel>>,
    dataset: Option<Arc<DestinationDataset>>,
    upstream_timeout: Duration,
}

impl SuggestionEngine {
    pub fn new(model: Option<Arc<dyn SuggestionModel>>) -> Self {
        Self {
            model,
            dataset: None,
            upstream_timeout: DEFAULT_UPSTREAM_TIMEOUT,
        }
    }

    /// Local dataset hits are merged after the generated (or mock) batch.
    pub fn with_dataset(mut self, dataset: Arc<DestinationDataset>) -> Self {
        self.dataset = Some(dataset);
        self
    }

    pub fn with_upstream_timeout(mut self, timeout: Duration) -> Self {
        self.upstream_timeout = timeout;
        self
    }

    pub fn upstream_timeout(&self) -> Duration {
        self.upstream_timeout
    }

    pub async fn suggest(&self, payload: &Value) -> SuggestionResponse {
        self.suggest_request(&TripRequest::from_payload(payload)).await
    }

    pub async fn suggest_request(&self, request: &TripRequest) -> SuggestionResponse {
        let criteria = match validate::validate(request) {
            Ok(criteria) => criteria,
            Err(failure) => {
                tracing::info!(
                    kind = failure.kind(),
                    reason = %failure,
                    "trip criteria incomplete; using mock suggestions"
                );
                return SuggestionResponse::degraded(Self::mock(request), failure.note());
            }
        };

        let (primary, note) = match self.generate(&criteria).await {
            Ok(records) => (records, None),
            Err(failure) => {
                tracing::warn!(
                    kind = failure.kind(),
                    error = %failure,
                    mood = %criteria.mood,
                    country = %criteria.country,
                    "upstream suggestions failed; using mock suggestions"
                );
                (Self::mock(request), Some(failure.note()))
            }
        };

        let suggestions = match &self.dataset {
            Some(dataset) => {
                let local = normalize_all(&dataset.query(&criteria), SuggestionSource::Local);
                merge::merge([primary, local])
            }
            None => merge::merge([primary]),
        };

        tracing::info!(
            count = suggestions.len(),
            degraded = note.is_some(),
            "suggestions ready"
        );

        match note {
            Some(note) => SuggestionResponse::degraded(suggestions, note),
            None => SuggestionResponse::authentic(suggestions),
        }
    }

    async fn generate(
        &self,
        criteria: &TripCriteria,
    ) -> Result<Vec<SuggestionRecord>, SuggestionFailure> {
        let Some(model) = &self.model else {
            return Err(SuggestionFailure::UpstreamUnavailable {
                provider: Provider::Gemini,
                detail: "no upstream model configured".to_string(),
            });
        };

        let provider = model.provider();
        let raws =
            upstream::generate_candidates(model.as_ref(), criteria, self.upstream_timeout).await?;
        let records = normalize_all(&raws, SuggestionSource::Generated);
        if records.is_empty() {
            return Err(SuggestionFailure::UpstreamMalformed {
                provider,
                detail: format!("none of {} candidates had a destination name", raws.len()),
                raw_output: None,
            });
        }
        Ok(records)
    }

    fn mock(request: &TripRequest) -> Vec<SuggestionRecord> {
        normalize_all(&mock::generate(request), SuggestionSource::Mock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suggest::testing::ScriptedModel;
    use serde_json::json;

    fn engine(model: ScriptedModel) -> SuggestionEngine {
        SuggestionEngine::new(Some(Arc::new(model)))
    }

    fn payload() -> Value {
        json!({"mood": "Adventure", "country": "Nepal", "budget": 60000, "travelers": 2})
    }

    #[tokio::test]
    async fn missing_criteria_short_circuits_to_mock() {
        let model = Arc::new(ScriptedModel::replying("[]"));
        let engine = SuggestionEngine::new(Some(model.clone()));

        let res = engine.suggest(&json!({"country": "Nepal"})).await;
        assert!(res.success);
        assert_eq!(res.suggestions.len(), 6);
        assert!(res.suggestions.iter().all(|s| s.source == SuggestionSource::Mock));
        assert_eq!(
            res.note.as_deref(),
            Some("Required fields missing. Using local suggestions.")
        );
        assert!(model.last_request().is_none());
    }

    #[tokio::test]
    async fn authentic_suggestions_are_normalized_without_note() {
        let reply = json!([
            {
                "destination": "Pokhara",
                "summary": "Lakes.",
                "tags": ["lakes"],
                "approxBaseCost": "1,200 INR"
            },
            {"destination": "Lumbini", "summary": "", "tags": [], "estimatedPerPerson": 9000},
            {"destination": "pokhara ", "approxBaseCost": 1}
        ]);
        let res = engine(ScriptedModel::replying(&reply.to_string()))
            .suggest(&payload())
            .await;

        assert!(res.success);
        assert!(res.note.is_none());
        assert_eq!(res.suggestions.len(), 2);
        assert_eq!(res.suggestions[0].destination_name, "Pokhara");
        assert_eq!(res.suggestions[0].approx_base_cost_per_person, 1200.0);
        assert_eq!(res.suggestions[0].breakdown.total_per_person, 1200.0);
        assert_eq!(res.suggestions[1].approx_base_cost_per_person, 9000.0);
        assert!(res
            .suggestions
            .iter()
            .all(|s| s.source == SuggestionSource::Generated));
    }

    #[tokio::test]
    async fn upstream_timeout_degrades_to_mock_with_note() {
        let engine = engine(ScriptedModel::replying("[]").with_delay(Duration::from_secs(30)))
            .with_upstream_timeout(Duration::from_millis(20));

        let res = engine.suggest(&payload()).await;
        assert!(res.success);
        assert!(!res.suggestions.is_empty());
        assert!(res.note.is_some());
        assert_eq!(res.suggestions[0].destination_name, "Nepal - City Highlights");
        assert_eq!(res.suggestions[0].approx_base_cost_per_person, 30000.0);
        assert_eq!(res.suggestions[1].approx_base_cost_per_person, 31500.0);
    }

    #[tokio::test]
    async fn excluded_destination_under_alternate_key_is_not_returned() {
        let reply = json!([{"destinationName": "Pokhara", "approxBaseCost": 9000}]);
        let mut request = payload();
        request["existing"] = json!(["Pokhara"]);

        let res = engine(ScriptedModel::replying(&reply.to_string()))
            .suggest(&request)
            .await;
        assert!(res.note.is_some());
        assert!(res.suggestions.iter().all(|s| s.dedup_key() != "pokhara"));
        assert!(res.suggestions.iter().all(|s| s.source == SuggestionSource::Mock));
    }

    #[tokio::test]
    async fn configured_timeout_lets_slow_model_finish() {
        let reply = json!([{"destination": "Bandipur", "approxBaseCost": 7000}]);
        let engine = engine(
            ScriptedModel::replying(&reply.to_string()).with_delay(Duration::from_millis(50)),
        )
        .with_upstream_timeout(Duration::from_secs(5));
        assert_eq!(engine.upstream_timeout(), Duration::from_secs(5));

        let res = engine.suggest(&payload()).await;
        assert!(res.note.is_none());
        assert_eq!(res.suggestions[0].destination_name, "Bandipur");
    }

    #[tokio::test]
    async fn malformed_output_degrades_to_mock() {
        let res = engine(ScriptedModel::replying("I'd love to help, but..."))
            .suggest(&payload())
            .await;
        assert!(res.success);
        assert_eq!(res.suggestions.len(), 6);
        assert!(res.note.unwrap().contains("unreadable"));
    }

    #[tokio::test]
    async fn nameless_candidates_degrade_to_mock() {
        let res = engine(ScriptedModel::replying(r#"[{"summary": "nowhere"}]"#))
            .suggest(&payload())
            .await;
        assert!(res.note.is_some());
        assert!(res.suggestions.iter().all(|s| s.source == SuggestionSource::Mock));
    }

    #[tokio::test]
    async fn no_model_configured_uses_mock() {
        let res = SuggestionEngine::new(None).suggest(&payload()).await;
        assert!(res.success);
        assert_eq!(res.suggestions.len(), 6);
        assert!(res.note.is_some());
    }

    #[tokio::test]
    async fn local_dataset_is_merged_after_generated() {
        let row = |name: &str, trip_type: &str, hotel: u32| {
            json!({
                "Destination Name": name,
                "Country": "Nepal",
                "Trip Type": trip_type,
                "Hotel (₹/night)": hotel,
            })
        };
        let rows = json!([
            row("Pokhara", "Adventure", 1000),
            row("Chitwan", "Adventure", 2000),
            row("Kathmandu", "Spiritual", 500),
        ]);
        let dataset = DestinationDataset::from_json_str(&rows.to_string()).unwrap();
        let reply = json!([{"destination": "pokhara", "approxBaseCost": 15000}]);
        let res = engine(ScriptedModel::replying(&reply.to_string()))
            .with_dataset(Arc::new(dataset))
            .suggest(&payload())
            .await;

        let names: Vec<_> = res
            .suggestions
            .iter()
            .map(|s| (s.destination_name.as_str(), s.source))
            .collect();
        assert_eq!(
            names,
            vec![
                ("pokhara", SuggestionSource::Generated),
                ("Chitwan", SuggestionSource::Local),
            ]
        );
        assert_eq!(res.suggestions[1].approx_base_cost_per_person, 4000.0);
    }
}
