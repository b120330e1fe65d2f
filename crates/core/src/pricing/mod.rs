//! Per-destination city codes and train quotes, priced as one batch.

pub mod amadeus;
pub mod rail;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Trains are only quoted for destinations in this country.
pub const TRAIN_COUNTRY: &str = "India";
const ESTIMATE_BASE_FARE: f64 = 1200.0;
const ESTIMATE_PER_CODE_POINT: f64 = 5.0;

#[async_trait::async_trait]
pub trait CityCodeResolver: Send + Sync {
    async fn resolve_city_code(&self, destination: &str) -> anyhow::Result<Option<String>>;
}

#[async_trait::async_trait]
pub trait TrainQuoteSource: Send + Sync {
    async fn fetch_train_quote(
        &self,
        city_code: &str,
        travelers: u32,
    ) -> anyhow::Result<TrainQuote>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainQuote {
    pub price: f64,
    pub currency: String,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub raw_status: Option<Value>,
}

/// Quote shown when the live rail lookup fails, derived from the city code.
pub fn estimated_train_quote(city_code: &str, travelers: u32) -> TrainQuote {
    let code_point = city_code.chars().next().map(|c| c as u32).unwrap_or(0);
    let per_traveler = ESTIMATE_BASE_FARE + ESTIMATE_PER_CODE_POINT * f64::from(code_point);
    TrainQuote {
        price: per_traveler * f64::from(travelers.max(1)),
        currency: "INR".to_string(),
        source: "estimate".to_string(),
        raw_status: None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PricingRequest {
    pub destinations: Vec<String>,
    pub travelers: u32,
    pub include_train: bool,
    pub country: String,
}

impl PricingRequest {
    /// Missing or mistyped fields take their defaults.
    pub fn from_payload(payload: &Value) -> Self {
        let destinations = payload
            .get("destinations")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let travelers = payload
            .get("travelers")
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| *n > 0)
            .unwrap_or(1);

        Self {
            destinations,
            travelers,
            include_train: payload
                .get("includeTrain")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            country: payload
                .get("country")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingMeta {
    /// A live train lookup failed; the client should offer manual booking.
    pub train_redirect: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DestinationPricing {
    pub city_code: Option<String>,
    pub train: Option<TrainQuote>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PricingBatch {
    #[serde(rename = "__meta")]
    pub meta: PricingMeta,
    #[serde(flatten)]
    pub destinations: BTreeMap<String, DestinationPricing>,
}

#[derive(Clone, Default)]
pub struct PricingService {
    city_codes: Option<Arc<dyn CityCodeResolver>>,
    trains: Option<Arc<dyn TrainQuoteSource>>,
}

impl PricingService {
    pub fn new(
        city_codes: Option<Arc<dyn CityCodeResolver>>,
        trains: Option<Arc<dyn TrainQuoteSource>>,
    ) -> Self {
        Self { city_codes, trains }
    }

    /// Prices each destination on its own; a failed lookup only degrades
    /// that destination's entry.
    pub async fn price_batch(&self, request: &PricingRequest) -> PricingBatch {
        let mut batch = PricingBatch::default();
        let wants_train = request.include_train && request.country == TRAIN_COUNTRY;

        for destination in &request.destinations {
            if destination.trim().is_empty() || batch.destinations.contains_key(destination) {
                continue;
            }

            let city_code = self.city_code(destination).await;
            let train = match (&city_code, wants_train) {
                (Some(code), true) => {
                    self.train_quote(destination, code, request.travelers, &mut batch.meta)
                        .await
                }
                _ => None,
            };

            batch
                .destinations
                .insert(destination.clone(), DestinationPricing { city_code, train });
        }

        tracing::info!(
            destinations = batch.destinations.len(),
            train_redirect = batch.meta.train_redirect,
            "pricing batch complete"
        );
        batch
    }

    async fn city_code(&self, destination: &str) -> Option<String> {
        let resolver = self.city_codes.as_ref()?;
        match resolver.resolve_city_code(destination).await {
            Ok(code) => code,
            Err(err) => {
                tracing::warn!(destination, error = %format!("{err:#}"), "city code lookup failed");
                None
            }
        }
    }

    async fn train_quote(
        &self,
        destination: &str,
        city_code: &str,
        travelers: u32,
        meta: &mut PricingMeta,
    ) -> Option<TrainQuote> {
        let source = self.trains.as_ref()?;
        match source.fetch_train_quote(city_code, travelers).await {
            Ok(quote) => Some(quote),
            Err(err) => {
                tracing::warn!(
                    destination,
                    city_code,
                    error = %format!("{err:#}"),
                    "train lookup failed; using estimate and flagging redirect"
                );
                meta.train_redirect = true;
                Some(estimated_train_quote(city_code, travelers))
            }
        }
    }
}
