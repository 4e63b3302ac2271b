pub mod presence;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use evac_store::{FloorRepository, ImageRepository, RouteRepository, SettingsRepository, StoreClient};
use tokio::sync::Mutex;

use crate::config::PipelineConfig;
use crate::dispatch::push::EventBus;
use presence::PresenceRegistry;

/// Composition root threaded through the scheduler, the per-floor cycle
/// and the dispatch layer. Every shared resource is `Arc`-wrapped so
/// cloning `AppState` is cheap and safe to hand to a spawned task.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<PipelineConfig>,
    pub floors: FloorRepository,
    pub images: ImageRepository,
    pub routes: RouteRepository,
    pub settings: SettingsRepository,
    pub presence: Arc<PresenceRegistry>,
    pub event_bus: Arc<EventBus>,
    pub http: reqwest::Client,
    /// Process-wide cycle mutex (§4.12): at most one pipeline cycle is in
    /// `Running`+`Persisting`+`Dispatching` at any instant.
    pub cycle_mutex: Arc<Mutex<()>>,
    pub shutting_down: Arc<AtomicBool>,
}

impl AppState {
    pub async fn new(store: StoreClient, config: PipelineConfig) -> Self {
        let http = reqwest::Client::builder()
            .user_agent("evac-orchestrator/0.1")
            .build()
            .expect("reqwest client builder should not fail with no custom TLS config");

        AppState {
            config: Arc::new(config),
            floors: FloorRepository::new(store.clone()),
            images: ImageRepository::new(store.clone()),
            routes: RouteRepository::new(store.clone()),
            settings: SettingsRepository::new(store),
            presence: Arc::new(PresenceRegistry::new()),
            event_bus: Arc::new(EventBus::new()),
            http,
            cycle_mutex: Arc::new(Mutex::new(())),
            shutting_down: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    pub fn begin_shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
    }
}
