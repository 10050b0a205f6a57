//! Application state.

use chrono::{DateTime, Utc};
use mom_core::analysis::engine::{AnalysisEngine, StubEngine};
use mom_core::analysis::AnalysisSimulator;
use mom_core::capture::model::CapturedImage;
use mom_core::config::MomConfig;
use mom_core::locator::places::{GooglePlacesClient, PlacesService};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Scans kept in memory before the oldest is evicted.
pub const MAX_SCANS: usize = 100;

/// One uploaded image and its analysis run.
pub struct ScanEntry {
    pub id: Uuid,
    pub image: CapturedImage,
    pub simulator: AnalysisSimulator,
    pub created_at: DateTime<Utc>,
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub scans: Arc<RwLock<HashMap<Uuid, Arc<ScanEntry>>>>,
    pub engine: Arc<dyn AnalysisEngine>,
    pub places: Arc<dyn PlacesService>,
    pub config: Arc<MomConfig>,
}

impl AppState {
    pub fn new(config: MomConfig) -> Self {
        let places = Arc::new(GooglePlacesClient::new(&config.places.base_url));
        Self::with_services(config, Arc::new(StubEngine), places)
    }

    pub fn with_services(
        config: MomConfig,
        engine: Arc<dyn AnalysisEngine>,
        places: Arc<dyn PlacesService>,
    ) -> Self {
        Self {
            scans: Arc::new(RwLock::new(HashMap::new())),
            engine,
            places,
            config: Arc::new(config),
        }
    }

    /// Start analyzing `image` and register the scan.
    pub async fn start_scan(&self, image: CapturedImage) -> Arc<ScanEntry> {
        let simulator = AnalysisSimulator::new(self.engine.clone());
        simulator.start(image.clone());

        let entry = Arc::new(ScanEntry {
            id: Uuid::new_v4(),
            image,
            simulator,
            created_at: Utc::now(),
        });

        let mut scans = self.scans.write().await;
        if scans.len() >= MAX_SCANS {
            if let Some(oldest) = scans.values().min_by_key(|s| s.created_at).map(|s| s.id) {
                debug!(scan_id = %oldest, "Evicting oldest scan");
                if let Some(evicted) = scans.remove(&oldest) {
                    evicted.simulator.cancel();
                }
            }
        }
        scans.insert(entry.id, entry.clone());
        entry
    }

    pub async fn scan(&self, id: &Uuid) -> Option<Arc<ScanEntry>> {
        self.scans.read().await.get(id).cloned()
    }

    /// Tear a scan down and forget it.
    pub async fn remove_scan(&self, id: &Uuid) -> bool {
        match self.scans.write().await.remove(id) {
            Some(entry) => {
                entry.simulator.cancel();
                true
            }
            None => false,
        }
    }
}
