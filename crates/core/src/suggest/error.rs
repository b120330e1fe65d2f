use crate::llm::Provider;
use std::fmt;

/// Why a pipeline stage could not produce authentic suggestions. Every variant
/// is recovered by the engine with mock suggestions; none reaches the caller.
#[derive(Debug, Clone)]
pub enum SuggestionFailure {
    ValidationMissing {
        missing: Vec<&'static str>,
    },
    UpstreamUnavailable {
        provider: Provider,
        detail: String,
    },
    UpstreamMalformed {
        provider: Provider,
        detail: String,
        raw_output: Option<String>,
    },
}

impl SuggestionFailure {
    pub fn kind(&self) -> &'static str {
        match self {
            SuggestionFailure::ValidationMissing { .. } => "validation_missing",
            SuggestionFailure::UpstreamUnavailable { .. } => "upstream_unavailable",
            SuggestionFailure::UpstreamMalformed { .. } => "upstream_malformed",
        }
    }

    /// Informational note attached to the caller-facing response.
    pub fn note(&self) -> &'static str {
        match self {
            SuggestionFailure::ValidationMissing { .. } => {
                "Required fields missing. Using local suggestions."
            }
            SuggestionFailure::UpstreamUnavailable { .. } => {
                "Suggestion service unavailable. Using local suggestions."
            }
            SuggestionFailure::UpstreamMalformed { .. } => {
                "Suggestion service returned an unreadable answer. Using local suggestions."
            }
        }
    }
}

impl fmt::Display for SuggestionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SuggestionFailure::ValidationMissing { missing } => {
                write!(f, "missing required criteria: {}", missing.join(", "))
            }
            SuggestionFailure::UpstreamUnavailable { provider, detail } => {
                write!(f, "upstream unavailable (provider={provider:?}): {detail}")
            }
            SuggestionFailure::UpstreamMalformed {
                provider, detail, ..
            } => {
                write!(f, "upstream output malformed (provider={provider:?}): {detail}")
            }
        }
    }
}

impl std::error::Error for SuggestionFailure {}
