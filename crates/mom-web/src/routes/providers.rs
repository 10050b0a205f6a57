//! Provider search route handlers.

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use mom_core::geo::Coordinate;
use mom_core::locator::location::FixedLocation;
use mom_core::locator::model::{Category, HealthcareProvider};
use mom_core::locator::{LocatorSettings, ProviderLocator, SearchOutcome};
use mom_core::MomError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SearchRequest {
    pub category: Category,
    /// Position resolved by the client's own geolocation.
    pub lat: f64,
    pub lng: f64,
    /// Places key entered by the user; falls back to the server's configured key.
    pub api_key: Option<String>,
}

#[derive(Serialize)]
pub struct ProviderView {
    #[serde(flatten)]
    pub provider: HealthcareProvider,
    pub directions_url: String,
    pub tel_url: Option<String>,
    pub marker_color: &'static str,
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub category: Category,
    pub label: &'static str,
    pub origin: Coordinate,
    pub providers: Vec<ProviderView>,
}

#[derive(Serialize)]
pub struct CategoryView {
    pub id: Category,
    pub label: &'static str,
    pub marker_color: &'static str,
}

pub async fn list_categories() -> Json<Vec<CategoryView>> {
    Json(
        Category::ALL
            .iter()
            .map(|c| CategoryView {
                id: *c,
                label: c.plural(),
                marker_color: c.marker_color(),
            })
            .collect(),
    )
}

pub async fn search(
    State(state): State<AppState>,
    payload: Result<Json<SearchRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(req) = payload?;
    let origin = Coordinate::new(req.lat, req.lng);
    if !origin.is_valid() {
        return Err(MomError::validation(format!("invalid coordinate {origin}")).into());
    }

    let credential = req
        .api_key
        .filter(|k| !k.trim().is_empty())
        .or_else(|| state.config.places.credential().map(str::to_string))
        .ok_or_else(|| {
            MomError::MissingCredential("no places API key supplied or configured".into())
        })?;

    let locator = ProviderLocator::new(
        state.places.clone(),
        Arc::new(FixedLocation::new(Some(origin))),
        LocatorSettings::from(state.config.as_ref()),
    );
    locator.set_credential(credential)?;

    let providers = match locator.search(req.category, origin).await? {
        SearchOutcome::Applied(providers) => providers,
        SearchOutcome::Superseded | SearchOutcome::Deferred => Vec::new(),
    };

    let category = req.category;
    Ok(Json(SearchResponse {
        category,
        label: category.plural(),
        origin,
        providers: providers
            .into_iter()
            .map(|provider| ProviderView {
                directions_url: provider.directions_url(),
                tel_url: provider.tel_url(),
                marker_color: category.marker_color(),
                provider,
            })
            .collect(),
    }))
}
