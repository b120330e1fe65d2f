use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use journey_core::config::Settings;
use journey_core::dataset::DestinationDataset;
use journey_core::domain::suggestion::SuggestionResponse;
use journey_core::llm::gemini::GeminiClient;
use journey_core::llm::SuggestionModel;
use journey_core::pricing::amadeus::AmadeusClient;
use journey_core::pricing::rail::RailClient;
use journey_core::pricing::{
    CityCodeResolver, PricingBatch, PricingRequest, PricingService, TrainQuoteSource,
};
use journey_core::suggest::SuggestionEngine;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let state = AppState {
        engine: build_engine(&settings),
        pricing: build_pricing(&settings),
    };
    let app = router(state, &settings.cors_allowed_origins);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(4000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

#[derive(Clone)]
struct AppState {
    engine: SuggestionEngine,
    pricing: PricingService,
}

fn router(state: AppState, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/recommendations", post(recommendations))
        .route("/api/live-pricing-batch", post(live_pricing_batch))
        .with_state(state)
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

fn build_engine(settings: &Settings) -> SuggestionEngine {
    let model: Option<Arc<dyn SuggestionModel>> = match GeminiClient::from_settings(settings) {
        Ok(client) => {
            tracing::info!(model = client.model(), "gemini suggestions enabled");
            Some(Arc::new(client))
        }
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "gemini unavailable; serving mock suggestions only");
            None
        }
    };

    let engine = SuggestionEngine::new(model).with_upstream_timeout(settings.upstream_timeout());
    tracing::info!(
        timeout_secs = engine.upstream_timeout().as_secs(),
        "suggestion upstream budget"
    );
    let Some(path) = settings.destination_dataset_path.as_deref() else {
        return engine;
    };
    match DestinationDataset::load(path) {
        Ok(dataset) => engine.with_dataset(Arc::new(dataset)),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %format!("{e:#}"), "destination dataset not loaded");
            engine
        }
    }
}

fn build_pricing(settings: &Settings) -> PricingService {
    let city_codes: Option<Arc<dyn CityCodeResolver>> = match AmadeusClient::from_settings(settings)
    {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "city code lookups disabled");
            None
        }
    };
    let trains: Option<Arc<dyn TrainQuoteSource>> = match RailClient::from_settings(settings) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            tracing::warn!(error = %e, "train lookups disabled");
            None
        }
    };
    PricingService::new(city_codes, trains)
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn recommendations(State(state): State<AppState>, body: Bytes) -> Json<SuggestionResponse> {
    let payload = lenient_json(&body);
    Json(state.engine.suggest(&payload).await)
}

async fn live_pricing_batch(State(state): State<AppState>, body: Bytes) -> Json<PricingBatch> {
    let request = PricingRequest::from_payload(&lenient_json(&body));
    Json(state.pricing.price_batch(&request).await)
}

/// Unreadable bodies count as an empty payload.
fn lenient_json(body: &[u8]) -> Value {
    if body.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(body).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "request body is not JSON; treating as empty");
        Value::Null
    })
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
