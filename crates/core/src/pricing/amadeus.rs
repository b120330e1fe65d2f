use crate::config::Settings;
use crate::pricing::CityCodeResolver;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tokio::sync::RwLock;

const DEFAULT_BASE_URL: &str = "https://test.api.amadeus.com";
const TOKEN_TIMEOUT_SECS: u64 = 15;
const LOOKUP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_EXPIRES_IN_SECS: i64 = 1800;
const REFRESH_MARGIN_SECS: i64 = 60;

#[derive(Debug)]
pub struct AmadeusClient {
    http: reqwest::Client,
    base_url: String,
    client_id: String,
    client_secret: String,
    tokens: TokenCache,
}

impl AmadeusClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let (client_id, client_secret) = settings.require_amadeus_credentials()?;
        let base_url =
            std::env::var("AMADEUS_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::new(base_url, client_id, client_secret)
    }

    pub fn new(
        base_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .context("failed to build Amadeus http client")?;

        Ok(Self {
            http,
            base_url: base_url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            tokens: TokenCache::default(),
        })
    }

    async fn access_token(&self) -> Result<String> {
        self.tokens
            .get_or_refresh(Utc::now(), || self.fetch_access_token())
            .await
    }

    async fn fetch_access_token(&self) -> Result<CachedToken> {
        let url = format!(
            "{}/v1/security/oauth2/token",
            self.base_url.trim_end_matches('/')
        );
        let params = [
            ("grant_type", "client_credentials"),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
        ];

        let fetched_at = Utc::now();
        let res = self
            .http
            .post(url)
            .form(&params)
            .timeout(Duration::from_secs(TOKEN_TIMEOUT_SECS))
            .send()
            .await
            .context("Amadeus token request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Amadeus token response")?;
        if !status.is_success() {
            anyhow::bail!("Amadeus token HTTP {status}: {text}");
        }

        let token = serde_json::from_str::<TokenResponse>(&text)
            .context("failed to parse Amadeus token response")?;
        let expires_in = token
            .expires_in
            .filter(|s| *s > 0)
            .unwrap_or(DEFAULT_EXPIRES_IN_SECS);

        tracing::debug!(expires_in, "Amadeus access token refreshed");
        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: fetched_at + ChronoDuration::seconds(expires_in),
        })
    }
}

#[async_trait::async_trait]
impl CityCodeResolver for AmadeusClient {
    async fn resolve_city_code(&self, destination: &str) -> Result<Option<String>> {
        let Some(keyword) = city_keyword(destination) else {
            return Ok(None);
        };

        let token = self.access_token().await?;
        let url = format!(
            "{}/v1/reference-data/locations",
            self.base_url.trim_end_matches('/')
        );

        let res = self
            .http
            .get(url)
            .bearer_auth(token)
            .query(&[
                ("keyword", keyword.as_str()),
                ("subType", "CITY"),
                ("page[limit]", "1"),
            ])
            .timeout(Duration::from_secs(LOOKUP_TIMEOUT_SECS))
            .send()
            .await
            .context("Amadeus location request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Amadeus location response")?;
        if !status.is_success() {
            anyhow::bail!("Amadeus locations HTTP {status}: {text}");
        }

        let body = serde_json::from_str::<LocationsResponse>(&text)
            .context("failed to parse Amadeus location response")?;
        Ok(body.data.into_iter().find_map(|loc| loc.iata_code))
    }
}

/// Search keyword for a suggestion name like "Jaipur, Rajasthan - Heritage Walk":
/// the text before the first `-`, then before the first `,`.
pub fn city_keyword(destination: &str) -> Option<String> {
    let head = destination.split('-').next().unwrap_or("");
    let head = head.split(',').next().unwrap_or("").trim();
    let keyword = if head.is_empty() {
        destination.trim()
    } else {
        head
    };
    (!keyword.is_empty()).then(|| keyword.to_string())
}

#[derive(Debug, Clone)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at - ChronoDuration::seconds(REFRESH_MARGIN_SECS)
    }
}

/// Shared access token, refreshed lazily shortly before it expires.
///
/// The read lock is released before refreshing, so concurrent callers may each
/// fetch a token; the last write wins. Token issuance is idempotent.
#[derive(Debug, Default)]
pub struct TokenCache {
    inner: RwLock<Option<CachedToken>>,
}

impl TokenCache {
    pub async fn get_or_refresh<F, Fut>(&self, now: DateTime<Utc>, refresh: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<CachedToken>>,
    {
        if let Some(cached) = self.inner.read().await.as_ref() {
            if cached.is_fresh(now) {
                return Ok(cached.access_token.clone());
            }
        }

        let token = refresh().await?;
        let access_token = token.access_token.clone();
        *self.inner.write().await = Some(token);
        Ok(access_token)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct LocationsResponse {
    #[serde(default)]
    data: Vec<Location>,
}

#[derive(Debug, Deserialize)]
struct Location {
    #[serde(rename = "iataCode", default)]
    iata_code: Option<String>,
}
