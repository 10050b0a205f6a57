//! Nearby healthcare provider search.
//!
//! [`ProviderLocator`] is the per-screen context: it owns the credential, the
//! selected category, the last resolved position and the displayed list.
//! Searches are last-request-wins; a response that arrives after a newer
//! request (or after the screen is closed) is dropped.

pub mod location;
pub mod model;
pub mod places;

use chrono::Datelike;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

use crate::config::MomConfig;
use crate::error::{MomError, MomResult};
use crate::geo::Coordinate;
use location::{LocationProvider, PositionOptions};
use model::{Category, HealthcareProvider};
use places::{PlacesService, TextSearchRequest, PLACE_FIELDS};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatorSettings {
    pub radius_m: u32,
    pub max_results: usize,
    pub position: PositionOptions,
}

impl Default for LocatorSettings {
    fn default() -> Self {
        Self {
            radius_m: 10_000,
            max_results: 10,
            position: PositionOptions::default(),
        }
    }
}

impl From<&MomConfig> for LocatorSettings {
    fn from(config: &MomConfig) -> Self {
        Self {
            radius_m: config.places.radius_m,
            max_results: config.places.max_results,
            position: PositionOptions::from(&config.location),
        }
    }
}

/// What happened to a search request.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// The list on screen was replaced with these providers.
    Applied(Vec<HealthcareProvider>),
    /// A newer request or a close arrived first; nothing was shown.
    Superseded,
    /// Nothing to search against yet (no position resolved).
    Deferred,
}

/// Snapshot of what the locator screen shows.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LocatorView {
    pub category: Category,
    pub user_location: Option<Coordinate>,
    pub providers: Vec<HealthcareProvider>,
    pub loading: bool,
    pub needs_credential: bool,
}

#[derive(Default)]
struct Screen {
    credential: Option<String>,
    category: Category,
    user_location: Option<Coordinate>,
    providers: Vec<HealthcareProvider>,
    loading: bool,
    request_id: u64,
}

pub struct ProviderLocator {
    places: Arc<dyn PlacesService>,
    location: Arc<dyn LocationProvider>,
    settings: LocatorSettings,
    screen: Mutex<Screen>,
}

impl ProviderLocator {
    pub fn new(
        places: Arc<dyn PlacesService>,
        location: Arc<dyn LocationProvider>,
        settings: LocatorSettings,
    ) -> Self {
        Self {
            places,
            location,
            settings,
            screen: Mutex::new(Screen::default()),
        }
    }

    fn screen(&self) -> MutexGuard<'_, Screen> {
        self.screen.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store the places credential entered by the user.
    pub fn set_credential(&self, credential: impl Into<String>) -> MomResult<()> {
        let credential = credential.into().trim().to_string();
        if credential.is_empty() {
            return Err(MomError::MissingCredential("the places API key is empty".into()));
        }
        self.screen().credential = Some(credential);
        Ok(())
    }

    /// Whether the credential prompt must be shown before searching.
    pub fn needs_credential(&self) -> bool {
        self.screen().credential.is_none()
    }

    pub fn category(&self) -> Category {
        self.screen().category
    }

    pub fn providers(&self) -> Vec<HealthcareProvider> {
        self.screen().providers.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.screen().loading
    }

    pub fn user_location(&self) -> Option<Coordinate> {
        self.screen().user_location
    }

    pub fn view(&self) -> LocatorView {
        let screen = self.screen();
        LocatorView {
            category: screen.category,
            user_location: screen.user_location,
            providers: screen.providers.clone(),
            loading: screen.loading,
            needs_credential: screen.credential.is_none(),
        }
    }

    /// Resolve the user's position, then search the selected category.
    pub async fn find_nearby(&self) -> MomResult<SearchOutcome> {
        let request_id = {
            let mut screen = self.screen();
            if screen.credential.is_none() {
                return Err(MomError::MissingCredential(
                    "Please enter your Google Maps API key to search for healthcare providers.".into(),
                ));
            }
            screen.request_id += 1;
            screen.loading = true;
            screen.request_id
        };

        let located = location::locate(self.location.as_ref(), &self.settings.position).await;

        let (category, origin) = {
            let mut screen = self.screen();
            if screen.request_id != request_id {
                return Ok(SearchOutcome::Superseded);
            }
            match located {
                Ok(position) => {
                    info!(lat = position.lat, lng = position.lng, "Location found");
                    screen.user_location = Some(position);
                    (screen.category, position)
                }
                Err(e) => {
                    screen.loading = false;
                    warn!(error = %e, "Unable to get current location");
                    return Err(e);
                }
            }
        };

        self.search(category, origin).await
    }

    /// Switch category and re-search against the last known position.
    ///
    /// No location round trip happens; without a position the switch only
    /// changes the selection.
    pub async fn select_category(&self, category: Category) -> MomResult<SearchOutcome> {
        let origin = {
            let mut screen = self.screen();
            screen.category = category;
            match (screen.user_location, screen.credential.is_some()) {
                (Some(origin), true) => {
                    screen.providers.clear();
                    origin
                }
                _ => return Ok(SearchOutcome::Deferred),
            }
        };
        self.search(category, origin).await
    }

    /// Query the places service for `category` around `origin`.
    ///
    /// Results keep the service order and are truncated to the configured
    /// maximum. Distance is computed for display only.
    pub async fn search(&self, category: Category, origin: Coordinate) -> MomResult<SearchOutcome> {
        let (request_id, credential) = {
            let mut screen = self.screen();
            let credential = screen.credential.clone().ok_or_else(|| {
                MomError::MissingCredential(
                    "Please enter your Google Maps API key to search for healthcare providers.".into(),
                )
            })?;
            screen.request_id += 1;
            screen.loading = true;
            (screen.request_id, credential)
        };

        let request = TextSearchRequest {
            query: category.as_str().to_string(),
            location: origin,
            radius_m: self.settings.radius_m,
            fields: PLACE_FIELDS,
        };
        debug!(request_id, category = %category, "Searching providers");

        let outcome = self.places.text_search(&credential, &request).await;

        let mut screen = self.screen();
        if screen.request_id != request_id {
            debug!(request_id, latest = screen.request_id, "Discarding stale search result");
            return Ok(SearchOutcome::Superseded);
        }
        screen.loading = false;

        let places = match outcome {
            Ok(places) => places,
            Err(e) => {
                warn!(category = %category, error = %e, "Provider search failed");
                return Err(e);
            }
        };

        let reported = places.len();
        let weekday = today_index();
        let providers: Vec<HealthcareProvider> = places
            .into_iter()
            .take(self.settings.max_results)
            .enumerate()
            .map(|(i, place)| HealthcareProvider::from_place(i, place, category, &origin, weekday))
            .collect();

        info!(category = %category, reported, shown = providers.len(), "Providers found");
        screen.category = category;
        screen.user_location = Some(origin);
        screen.providers = providers.clone();
        Ok(SearchOutcome::Applied(providers))
    }

    /// Tear the screen down: pending searches are discarded.
    pub fn close(&self) {
        let mut screen = self.screen();
        screen.request_id += 1;
        screen.loading = false;
        screen.providers.clear();
    }
}

/// Index into Monday-first opening-hours lines for today.
fn today_index() -> usize {
    chrono::Local::now().weekday().num_days_from_monday() as usize
}
