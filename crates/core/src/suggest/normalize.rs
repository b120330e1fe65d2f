use crate::domain::suggestion::{
    CostBreakdown, RawSuggestion, SuggestionRecord, SuggestionSource,
};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Fixed trip length every breakdown is computed for.
pub const NIGHTS: f64 = 2.0;
pub const DAYS: f64 = 2.0;

const LODGING_SHARE: f64 = 0.35;
const FOOD_SHARE: f64 = 0.20;
const TRANSPORT_SHARE: f64 = 0.15;
const SHOPPING_SHARE: f64 = 0.15;

/// Candidate cost fields in priority order; the first usable one wins.
pub const BASE_COST_FIELDS: [&str; 6] = [
    "approxBaseCost",
    "estimatedPerPerson",
    "totalPerPerson",
    "perPerson",
    "costPerPerson",
    "pricePerPerson",
];

const DESTINATION_FIELDS: [&str; 3] = ["destination", "destinationName", "DestinationName"];

// A run of digits with optional grouping commas and decimal points, or a bare
// decimal like ".5".
static NUMBER_RUN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"[0-9][0-9,.]*|\.[0-9]+").ok());

/// Trimmed destination name from the first non-blank name field.
pub fn destination_name(raw: &RawSuggestion) -> Option<&str> {
    DESTINATION_FIELDS
        .iter()
        .filter_map(|k| raw.get(*k).and_then(Value::as_str))
        .map(str::trim)
        .find(|s| !s.is_empty())
}

/// Turns one raw record into a [`SuggestionRecord`]. Returns `None` when the
/// record has no usable destination name.
pub fn normalize(raw: &RawSuggestion, source: SuggestionSource) -> Option<SuggestionRecord> {
    let destination_name = destination_name(raw)?.to_string();

    let summary = raw
        .get("summary")
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .unwrap_or_default();

    let tags = raw
        .get("tags")
        .and_then(Value::as_array)
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

    let base = extract_base_cost(raw);
    if base == 0.0 {
        tracing::debug!(
            destination = %destination_name,
            source = source.as_str(),
            "no usable cost field on suggestion; base cost defaults to 0"
        );
    }

    Some(SuggestionRecord {
        destination_name,
        summary,
        tags,
        approx_base_cost_per_person: base,
        breakdown: breakdown_from_base(base),
        source,
    })
}

/// Normalizes a batch, dropping records without a destination name.
pub fn normalize_all(raws: &[RawSuggestion], source: SuggestionSource) -> Vec<SuggestionRecord> {
    raws.iter()
        .filter_map(|raw| normalize(raw, source))
        .collect()
}

/// Positive per-person base cost from the first usable candidate field, or 0.
pub fn extract_base_cost(raw: &RawSuggestion) -> f64 {
    for field in BASE_COST_FIELDS {
        let value = match raw.get(field) {
            None | Some(Value::Null) => continue,
            Some(v) => v,
        };

        if let Some(n) = value.as_f64() {
            if n.is_finite() && n > 0.0 {
                return n;
            }
        }

        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        if let Some(n) = first_number(&text) {
            return n;
        }
    }

    0.0
}

/// First numeric run in `text` with grouping commas removed, if it parses to a
/// finite positive number.
fn first_number(text: &str) -> Option<f64> {
    let run = NUMBER_RUN.as_ref()?.find(text)?.as_str();
    let cleaned: String = run
        .trim_end_matches(|c| c == ',' || c == '.')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let n = cleaned.parse::<f64>().ok()?;
    (n.is_finite() && n > 0.0).then_some(n)
}

/// Splits a base cost into categories. Activities take the residual so the
/// categories always add back up to `base`.
pub fn breakdown_from_base(base: f64) -> CostBreakdown {
    if !(base.is_finite() && base > 0.0) {
        return CostBreakdown::default();
    }

    let mut lodging_per_night = (base * LODGING_SHARE / NIGHTS).round();
    let mut food_per_day = (base * FOOD_SHARE / DAYS).round();
    let mut local_transport = (base * TRANSPORT_SHARE).round();
    let mut shopping = (base * SHOPPING_SHARE).round();

    let used = |lodging: f64, food: f64, transport: f64, shopping: f64| {
        lodging * NIGHTS + food * DAYS + transport + shopping
    };

    // Only reachable for very small bases, where rounding up four categories
    // can exceed the whole amount.
    let mut overshoot = used(lodging_per_night, food_per_day, local_transport, shopping) - base;
    if overshoot > 0.0 {
        for (amount, unit) in [
            (&mut shopping, 1.0),
            (&mut local_transport, 1.0),
            (&mut food_per_day, DAYS),
            (&mut lodging_per_night, NIGHTS),
        ] {
            if overshoot <= 0.0 {
                break;
            }
            let cut = (overshoot / unit).ceil().min(*amount);
            *amount -= cut;
            overshoot -= cut * unit;
        }
    }

    let used = used(lodging_per_night, food_per_day, local_transport, shopping);
    let activities = (base - used).max(0.0);

    CostBreakdown {
        lodging_per_night,
        food_per_day,
        local_transport,
        shopping,
        activities,
        total_per_person: base,
    }
}
