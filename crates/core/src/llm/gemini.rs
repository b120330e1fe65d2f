use crate::config::Settings;
use crate::llm::{GenerationRequest, Provider, SuggestionModel};
use crate::suggest::SuggestionFailure;
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_keys: Vec<String>,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_keys = settings.require_gemini_api_keys()?.to_vec();
        let base_url =
            std::env::var("GEMINI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Self::new(base_url, model, api_keys, settings.gemini_timeout)
    }

    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_keys: Vec<String>,
        timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_keys,
            base_url: base_url.into(),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    /// One attempt with one key. Returns the raw response body on 2xx.
    async fn generate_content(
        &self,
        api_key: &str,
        req: &GenerateContentRequest<'_>,
    ) -> anyhow::Result<String> {
        let mut headers = HeaderMap::new();
        headers.insert("x-goog-api-key", HeaderValue::from_str(api_key)?);

        let res = self
            .http
            .post(self.url())
            .headers(headers)
            .json(req)
            .send()
            .await
            .context("Gemini request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Gemini response body")?;
        if !status.is_success() {
            anyhow::bail!("Gemini HTTP {status}: {text}");
        }
        Ok(text)
    }

    /// Text of the first candidate. Falls back to the whole envelope when the
    /// candidate has no recognizable content so the caller can still try to
    /// find JSON in it.
    fn response_text(raw: &Value) -> String {
        let content = raw
            .get("candidates")
            .and_then(Value::as_array)
            .and_then(|c| c.first())
            .and_then(|c| c.get("content"));

        match content {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Object(obj)) => match obj.get("parts").and_then(Value::as_array) {
                Some(parts) => parts
                    .iter()
                    .filter_map(|p| p.get("text").and_then(Value::as_str))
                    .collect(),
                None => raw.to_string(),
            },
            _ => raw.to_string(),
        }
    }
}

#[async_trait::async_trait]
impl SuggestionModel for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn generate_text(&self, request: &GenerationRequest) -> anyhow::Result<String> {
        let req = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                top_p: request.top_p,
                top_k: request.top_k,
            },
        };

        let mut last_err: Option<anyhow::Error> = None;
        for (key_index, api_key) in self.api_keys.iter().enumerate() {
            match self.generate_content(api_key, &req).await {
                Ok(body) => {
                    tracing::debug!(key_index, model = %self.model, "Gemini call succeeded");
                    let raw = serde_json::from_str::<Value>(&body).map_err(|err| {
                        SuggestionFailure::UpstreamMalformed {
                            provider: Provider::Gemini,
                            detail: format!("response envelope is not JSON: {err}"),
                            raw_output: Some(body.clone()),
                        }
                    })?;
                    return Ok(Self::response_text(&raw));
                }
                Err(err) => {
                    tracing::warn!(
                        key_index,
                        model = %self.model,
                        error = %err,
                        "Gemini call failed; trying next key"
                    );
                    last_err = Some(err);
                }
            }
        }

        let detail = match last_err {
            Some(err) => format!(
                "all {} Gemini keys failed; last error: {err:#}",
                self.api_keys.len()
            ),
            None => "no Gemini API key configured".to_string(),
        };
        Err(SuggestionFailure::UpstreamUnavailable {
            provider: Provider::Gemini,
            detail,
        }
        .into())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Clone, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    top_p: f64,
    top_k: u32,
}
