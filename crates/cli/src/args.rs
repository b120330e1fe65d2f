use clap::Args;
use journey_core::domain::criteria::TripRequest;
use journey_core::pricing::PricingRequest;

#[derive(Debug, Args)]
pub struct SuggestArgs {
    #[arg(long)]
    pub mood: Option<String>,

    #[arg(long)]
    pub country: Option<String>,

    /// State or region inside the country.
    #[arg(long)]
    pub state: Option<String>,

    /// Total trip budget for the whole group.
    #[arg(long)]
    pub budget: Option<f64>,

    #[arg(long)]
    pub travelers: Option<u32>,

    /// Destination already shown to the user; repeatable.
    #[arg(long)]
    pub existing: Vec<String>,

    /// JSON destination dataset merged after generated suggestions.
    #[arg(long)]
    pub dataset: Option<String>,

    /// Skip the upstream model and print mock suggestions.
    #[arg(long)]
    pub offline: bool,
}

impl SuggestArgs {
    pub fn to_request(&self) -> TripRequest {
        TripRequest {
            mood: non_blank(self.mood.as_deref()),
            country: non_blank(self.country.as_deref()),
            state: non_blank(self.state.as_deref()),
            budget: self.budget.filter(|b| b.is_finite() && *b > 0.0),
            travelers: self.travelers.filter(|t| *t > 0),
            existing: self.existing.clone(),
        }
    }
}

#[derive(Debug, Args)]
pub struct PricingArgs {
    #[arg(long = "destination", required = true)]
    pub destinations: Vec<String>,

    #[arg(long, default_value_t = 1)]
    pub travelers: u32,

    #[arg(long, default_value = "")]
    pub country: String,

    #[arg(long)]
    pub include_train: bool,
}

impl PricingArgs {
    pub fn to_request(&self) -> PricingRequest {
        PricingRequest {
            destinations: self.destinations.clone(),
            travelers: self.travelers.max(1),
            include_train: self.include_train,
            country: self.country.clone(),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
