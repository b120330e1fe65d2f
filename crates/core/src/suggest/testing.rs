use crate::llm::{GenerationRequest, Provider, SuggestionModel};
use crate::suggest::error::SuggestionFailure;
use std::sync::Mutex;
use std::time::Duration;

enum Reply {
    Text(String),
    Error(String),
    Failure(SuggestionFailure),
}

/// In-process model returning a fixed reply, optionally after a delay.
pub(crate) struct ScriptedModel {
    reply: Reply,
    delay: Duration,
    last_request: Mutex<Option<GenerationRequest>>,
}

impl ScriptedModel {
    fn new(reply: Reply) -> Self {
        Self {
            reply,
            delay: Duration::ZERO,
            last_request: Mutex::new(None),
        }
    }

    pub(crate) fn replying(text: &str) -> Self {
        Self::new(Reply::Text(text.to_string()))
    }

    pub(crate) fn failing(message: &str) -> Self {
        Self::new(Reply::Error(message.to_string()))
    }

    pub(crate) fn failing_with(failure: SuggestionFailure) -> Self {
        Self::new(Reply::Failure(failure))
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn last_request(&self) -> Option<GenerationRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl SuggestionModel for ScriptedModel {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn generate_text(&self, request: &GenerationRequest) -> anyhow::Result<String> {
        *self.last_request.lock().unwrap() = Some(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Error(message) => Err(anyhow::anyhow!("{message}")),
            Reply::Failure(failure) => Err(failure.clone().into()),
        }
    }
}
