pub mod gemini;
pub mod json;

pub const DEFAULT_TEMPERATURE: f64 = 1.0;
pub const DEFAULT_TOP_P: f64 = 0.9;
pub const DEFAULT_TOP_K: u32 = 40;

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
}

impl GenerationRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: DEFAULT_TEMPERATURE,
            top_p: DEFAULT_TOP_P,
            top_k: DEFAULT_TOP_K,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
}

/// Text-generation upstream. Implementations return the first candidate's text
/// and leave JSON extraction to the caller.
///
/// Errors that are a [`crate::suggest::SuggestionFailure`] are kept as-is by the
/// pipeline; anything else is treated as the upstream being unavailable.
#[async_trait::async_trait]
pub trait SuggestionModel: Send + Sync {
    fn provider(&self) -> Provider;

    async fn generate_text(&self, request: &GenerationRequest) -> anyhow::Result<String>;
}
