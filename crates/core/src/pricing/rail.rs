use crate::config::Settings;
use crate::pricing::{TrainQuote, TrainQuoteSource};
use anyhow::{Context, Result};
use serde_json::Value;
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://indian-railway-irctc.p.rapidapi.com";
const DEFAULT_TRAIN_NUMBER: &str = "12051";
const REQUEST_TIMEOUT_SECS: u64 = 15;
const FARE_PER_TRAVELER: f64 = 900.0;
const LIVE_SOURCE: &str = "IRCTC RapidAPI";

#[derive(Debug, Clone)]
pub struct RailClient {
    http: reqwest::Client,
    base_url: String,
    host: String,
    api_key: String,
    train_number: String,
    departure_date: Option<String>,
}

impl RailClient {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let api_key = settings.require_rapidapi_key()?;
        let base_url =
            std::env::var("RAIL_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let train_number = std::env::var("RAIL_TRAIN_NUMBER")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TRAIN_NUMBER.to_string());
        let departure_date = std::env::var("RAIL_DEPARTURE_DATE")
            .ok()
            .filter(|s| !s.trim().is_empty());

        Ok(Self::new(base_url, api_key, train_number)?.with_departure_date(departure_date))
    }

    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        train_number: impl Into<String>,
    ) -> Result<Self> {
        let base_url = base_url.into();
        let host = reqwest::Url::parse(&base_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default();
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build rail http client")?;

        Ok(Self {
            http,
            base_url,
            host,
            api_key: api_key.into(),
            train_number: train_number.into(),
            departure_date: None,
        })
    }

    /// `YYYYMMDD`; defaults to today (UTC) at request time.
    pub fn with_departure_date(mut self, date: Option<String>) -> Self {
        self.departure_date = date;
        self
    }

    fn departure_date(&self) -> String {
        self.departure_date
            .clone()
            .unwrap_or_else(|| chrono::Utc::now().format("%Y%m%d").to_string())
    }

    pub async fn train_status(&self) -> Result<Value> {
        let url = format!(
            "{}/api/trains/v1/train/status",
            self.base_url.trim_end_matches('/')
        );
        let departure_date = self.departure_date();

        let res = self
            .http
            .get(url)
            .header("x-rapidapi-key", &self.api_key)
            .header("x-rapidapi-host", &self.host)
            .header("x-rapid-api", "rapid-api-database")
            .query(&[
                ("departure_date", departure_date.as_str()),
                ("isH5", "true"),
                ("client", "web"),
                ("deviceIdentifier", "JourneyPlanner-App"),
                ("train_number", self.train_number.as_str()),
            ])
            .send()
            .await
            .context("rail status request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read rail status response")?;
        if !status.is_success() {
            anyhow::bail!("rail status HTTP {status}: {text}");
        }

        serde_json::from_str(&text).context("rail status response was not JSON")
    }
}

#[async_trait::async_trait]
impl TrainQuoteSource for RailClient {
    async fn fetch_train_quote(&self, city_code: &str, travelers: u32) -> Result<TrainQuote> {
        let raw = self.train_status().await?;
        tracing::debug!(city_code, train = %self.train_number, "rail status fetched");
        Ok(TrainQuote {
            price: FARE_PER_TRAVELER * f64::from(travelers.max(1)),
            currency: "INR".to_string(),
            source: LIVE_SOURCE.to_string(),
            raw_status: Some(raw),
        })
    }
}
