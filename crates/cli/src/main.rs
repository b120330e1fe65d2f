use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use journey_core::config::Settings;
use journey_core::dataset::DestinationDataset;
use journey_core::llm::gemini::GeminiClient;
use journey_core::llm::SuggestionModel;
use journey_core::pricing::amadeus::AmadeusClient;
use journey_core::pricing::rail::RailClient;
use journey_core::pricing::{CityCodeResolver, PricingService, TrainQuoteSource};
use journey_core::suggest::SuggestionEngine;

mod args;

use args::{PricingArgs, SuggestArgs};

#[derive(Debug, Parser)]
#[command(name = "journey_cli", about = "Trip suggestions and live pricing from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print suggestions for a mood and country as JSON.
    Suggest(SuggestArgs),
    /// Print city codes and train quotes for destinations as JSON.
    Pricing(PricingArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let cli = Cli::parse();
    let output = match cli.command {
        Command::Suggest(args) => run_suggest(&settings, args).await?,
        Command::Pricing(args) => run_pricing(&settings, args).await?,
    };

    println!("{output}");
    Ok(())
}

async fn run_suggest(settings: &Settings, args: SuggestArgs) -> anyhow::Result<String> {
    let model: Option<Arc<dyn SuggestionModel>> = if args.offline {
        None
    } else {
        match GeminiClient::from_settings(settings) {
            Ok(client) => Some(Arc::new(client)),
            Err(err) => {
                sentry_anyhow::capture_anyhow(&err);
                tracing::warn!(error = %err, "gemini unavailable; using mock suggestions");
                None
            }
        }
    };

    let mut engine =
        SuggestionEngine::new(model).with_upstream_timeout(settings.upstream_timeout());
    let dataset_path = args
        .dataset
        .clone()
        .or_else(|| settings.destination_dataset_path.clone());
    if let Some(path) = dataset_path {
        let dataset = DestinationDataset::load(&path)?;
        engine = engine.with_dataset(Arc::new(dataset));
    }

    let response = engine.suggest_request(&args.to_request()).await;
    if let Some(note) = response.note.as_deref() {
        tracing::warn!(note, "suggestions came from a fallback path");
    }
    serde_json::to_string_pretty(&response).context("failed to serialize suggestions")
}

async fn run_pricing(settings: &Settings, args: PricingArgs) -> anyhow::Result<String> {
    let city_codes: Option<Arc<dyn CityCodeResolver>> = match AmadeusClient::from_settings(settings)
    {
        Ok(client) => Some(Arc::new(client)),
        Err(err) => {
            tracing::warn!(error = %err, "city code lookups disabled");
            None
        }
    };
    let trains: Option<Arc<dyn TrainQuoteSource>> = if args.include_train {
        match RailClient::from_settings(settings) {
            Ok(client) => Some(Arc::new(client)),
            Err(err) => {
                tracing::warn!(error = %err, "train lookups disabled");
                None
            }
        }
    } else {
        None
    };

    let batch = PricingService::new(city_codes, trains)
        .price_batch(&args.to_request())
        .await;
    serde_json::to_string_pretty(&batch).context("failed to serialize pricing batch")
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
