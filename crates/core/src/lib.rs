pub mod dataset;
pub mod domain;
pub mod llm;
pub mod pricing;
pub mod suggest;

pub mod config {
    use anyhow::Context;
    use std::time::Duration;

    const DEFAULT_GEMINI_TIMEOUT_SECS: u64 = 60;
    const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,https://joureny-planner.vercel.app";

    #[derive(Debug, Clone)]
    pub struct Settings {
        /// Tried in order; the first key that gets a 2xx answer wins.
        pub gemini_api_keys: Vec<String>,
        /// Per-request limit for one Gemini key.
        pub gemini_timeout: Duration,
        pub amadeus_client_id: Option<String>,
        pub amadeus_client_secret: Option<String>,
        pub rapidapi_key: Option<String>,
        pub destination_dataset_path: Option<String>,
        pub cors_allowed_origins: Vec<String>,
        pub sentry_dsn: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            let mut gemini_api_keys = Vec::new();
            for var in [
                "GEMINI_API_KEY",
                "GEMINI_API_KEY_1",
                "GEMINI_API_KEY_2",
                "GEMINI_API_KEY_3",
            ] {
                if let Some(key) = non_empty_var(var) {
                    if !gemini_api_keys.contains(&key) {
                        gemini_api_keys.push(key);
                    }
                }
            }

            let gemini_timeout_secs = non_empty_var("GEMINI_TIMEOUT_SECS")
                .and_then(|s| s.parse::<u64>().ok())
                .filter(|s| *s > 0)
                .unwrap_or(DEFAULT_GEMINI_TIMEOUT_SECS);

            let cors_allowed_origins = non_empty_var("CORS_ALLOWED_ORIGINS")
                .unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string())
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();

            Ok(Self {
                gemini_api_keys,
                gemini_timeout: Duration::from_secs(gemini_timeout_secs),
                amadeus_client_id: non_empty_var("AMADEUS_CLIENT_ID"),
                amadeus_client_secret: non_empty_var("AMADEUS_CLIENT_SECRET"),
                rapidapi_key: non_empty_var("RAPIDAPI_KEY"),
                destination_dataset_path: non_empty_var("DESTINATION_DATASET_PATH"),
                cors_allowed_origins,
                sentry_dsn: non_empty_var("SENTRY_DSN"),
            })
        }

        pub fn require_gemini_api_keys(&self) -> anyhow::Result<&[String]> {
            anyhow::ensure!(
                !self.gemini_api_keys.is_empty(),
                "GEMINI_API_KEY (or GEMINI_API_KEY_1..3) is required"
            );
            Ok(&self.gemini_api_keys)
        }

        /// Budget for a whole suggestion call: every key gets its own
        /// per-request limit so rotation can reach the last key.
        pub fn upstream_timeout(&self) -> Duration {
            let keys = u32::try_from(self.gemini_api_keys.len())
                .unwrap_or(u32::MAX)
                .max(1);
            self.gemini_timeout.saturating_mul(keys)
        }

        pub fn require_amadeus_credentials(&self) -> anyhow::Result<(&str, &str)> {
            let id = self
                .amadeus_client_id
                .as_deref()
                .context("AMADEUS_CLIENT_ID is required")?;
            let secret = self
                .amadeus_client_secret
                .as_deref()
                .context("AMADEUS_CLIENT_SECRET is required")?;
            Ok((id, secret))
        }

        pub fn require_rapidapi_key(&self) -> anyhow::Result<&str> {
            self.rapidapi_key
                .as_deref()
                .context("RAPIDAPI_KEY is required")
        }
    }

    fn non_empty_var(name: &str) -> Option<String> {
        std::env::var(name)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

}
