//! Providers command: search nearby healthcare providers.

use anyhow::{bail, Context, Result};
use clap::Args;
use dialoguer::Password;
use mom_core::config::MomConfig;
use mom_core::geo::Coordinate;
use mom_core::locator::location::FixedLocation;
use mom_core::locator::model::Category;
use mom_core::locator::places::GooglePlacesClient;
use mom_core::locator::{LocatorSettings, ProviderLocator, SearchOutcome};
use mom_core::notice::Notice;
use std::io::IsTerminal;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::output;

#[derive(Args)]
pub struct ProvidersArgs {
    /// dermatologist, doctor or pharmacy
    #[arg(default_value = "dermatologist")]
    pub category: Category,

    /// Latitude of the search origin (defaults to [location] lat)
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude of the search origin (defaults to [location] lng)
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lng: Option<f64>,

    /// Google Maps API key (defaults to [places] api_key)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Print providers as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: ProvidersArgs, config: &MomConfig) -> Result<()> {
    let position = match (args.lat, args.lng) {
        (Some(lat), Some(lng)) => Some(Coordinate::new(lat, lng)),
        _ => config.location.coordinate(),
    };
    debug!(category = %args.category, has_position = position.is_some(), "Provider search requested");

    let locator = ProviderLocator::new(
        Arc::new(GooglePlacesClient::new(&config.places.base_url)),
        Arc::new(FixedLocation::new(position)),
        LocatorSettings::from(config),
    );

    let credential = match args
        .api_key
        .filter(|k| !k.trim().is_empty())
        .or_else(|| config.places.credential().map(str::to_string))
    {
        Some(key) => key,
        None => prompt_credential()?,
    };
    if let Err(e) = locator.set_credential(credential) {
        output::print_notice(&Notice::from_error(&e));
        return Err(e.into());
    }

    // No position yet, so this only records the selection.
    locator.select_category(args.category).await?;

    let outcome = match locator.find_nearby().await {
        Ok(outcome) => outcome,
        Err(e) => {
            warn!(category = %args.category, error = %e, "Provider search failed");
            output::print_notice(&Notice::from_error(&e));
            return Err(e.into());
        }
    };

    let providers = match outcome {
        SearchOutcome::Applied(providers) => providers,
        SearchOutcome::Superseded | SearchOutcome::Deferred => Vec::new(),
    };
    info!(category = %args.category, count = providers.len(), "Provider search finished");

    if args.json {
        println!("{}", serde_json::to_string_pretty(&providers)?);
        return Ok(());
    }

    if let Some(origin) = locator.user_location() {
        output::print_notice(&Notice::location_found());
        output::print_providers(args.category, origin, &providers);
    }
    Ok(())
}

/// Ask for the places key when none is configured.
fn prompt_credential() -> Result<String> {
    if !std::io::stdin().is_terminal() {
        output::print_notice(&Notice::from_error(&mom_core::MomError::MissingCredential(
            "no places API key".into(),
        )));
        bail!("No Google Maps API key: pass --api-key or set MOM_PLACES_API_KEY");
    }

    debug!("No places key configured, prompting");
    println!("Enter your Google Maps API key to search for healthcare providers.");
    Password::new()
        .with_prompt("Google Maps API key")
        .interact()
        .context("Failed to read API key")
}
