use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use evac_models::SyncStatus;
use reqwest::StatusCode;
use tokio::sync::Mutex;
use tracing::{error, info, instrument, warn};

use crate::repositories::{FloorRepository, ImageRepository, RouteRepository, SettingsRepository};

const IDLE_POLL_SECONDS: u64 = 60;
const CIRCUIT_BREAKER_HIBERNATION_SECONDS: u64 = 300;

/// Periodic upsert of three local collections to a remote document store.
/// Independent of the per-floor scheduler: its own timer, its own overlap
/// mutex, rearmed from fresh Settings on every firing so an interval or
/// enablement change between cycles takes effect at the next boundary.
pub struct CloudReplicator {
    http: reqwest::Client,
    remote_base_url: String,
    floors: FloorRepository,
    images: ImageRepository,
    routes: RouteRepository,
    settings: SettingsRepository,
    overlap_guard: Mutex<()>,
    last_circuit_trip: Mutex<Option<Instant>>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ReplicationSummary {
    pub floors_replicated: usize,
    pub image_records_replicated: usize,
    pub routes_replicated: usize,
}

impl CloudReplicator {
    pub fn new(
        http: reqwest::Client,
        remote_base_url: String,
        floors: FloorRepository,
        images: ImageRepository,
        routes: RouteRepository,
        settings: SettingsRepository,
    ) -> Self {
        CloudReplicator {
            http,
            remote_base_url,
            floors,
            images,
            routes,
            settings,
            overlap_guard: Mutex::new(()),
            last_circuit_trip: Mutex::new(None),
        }
    }

    /// Performs one full replication pass: floors -> `floormaps`,
    /// image records -> `imagerecords`, routes -> `routes`. Records status
    /// and duration back onto the Settings singleton regardless of outcome.
    #[instrument(skip(self))]
    pub async fn replicate_once(&self) -> anyhow::Result<ReplicationSummary> {
        let Ok(_permit) = self.overlap_guard.try_lock() else {
            warn!("replication already in progress; skipping overlapping trigger");
            return Ok(ReplicationSummary::default());
        };

        if let Some(tripped_at) = *self.last_circuit_trip.lock().await {
            if tripped_at.elapsed() < Duration::from_secs(CIRCUIT_BREAKER_HIBERNATION_SECONDS) {
                warn!("circuit breaker open; skipping replication cycle");
                return Ok(ReplicationSummary::default());
            }
        }

        let started = Instant::now();
        self.mark_in_progress().await;

        let result = self.replicate_all_collections().await;

        let duration_ms = started.elapsed().as_millis() as i64;
        match &result {
            Ok(summary) => {
                self.mark_success(duration_ms).await;
                info!(
                    floors = summary.floors_replicated,
                    image_records = summary.image_records_replicated,
                    routes = summary.routes_replicated,
                    "replication cycle completed"
                );
            }
            Err(e) => {
                *self.last_circuit_trip.lock().await = Some(Instant::now());
                self.mark_failed(duration_ms, &e.to_string()).await;
                error!(error = %e, "replication cycle failed");
            }
        }

        result
    }

    async fn replicate_all_collections(&self) -> anyhow::Result<ReplicationSummary> {
        let floors = self.floors.list_all().await?;
        for floor in &floors {
            self.upsert("floormaps", &floor.floor_id, floor).await?;
        }

        let images = self.images.list_all().await?;
        for record in &images {
            self.upsert("imagerecords", &record.id.to_string(), record).await?;
        }

        let routes = self.routes.list_all().await?;
        for route in &routes {
            self.upsert("routes", &route.floor_id, route).await?;
        }

        Ok(ReplicationSummary {
            floors_replicated: floors.len(),
            image_records_replicated: images.len(),
            routes_replicated: routes.len(),
        })
    }

    async fn upsert<T: serde::Serialize>(&self, collection: &str, key: &str, document: &T) -> anyhow::Result<()> {
        let url = format!("{}/{}/{}", self.remote_base_url.trim_end_matches('/'), collection, key);
        let response = self.http.put(&url).json(document).send().await?;
        // 409 (already-present with a stale key) counts as success: the
        // upsert semantics are `replaceOne(..., {upsert: true})`, so a
        // conflict on the key alone never indicates data loss here.
        if response.status().is_success() || response.status() == StatusCode::CONFLICT {
            Ok(())
        } else {
            anyhow::bail!("replication PUT to {url} returned {}", response.status())
        }
    }

    async fn mark_in_progress(&self) {
        if let Ok(mut settings) = self.settings.get().await {
            settings.cloud_sync.last_sync_status = Some(SyncStatus::InProgress);
            let _ = self.settings.save(&settings).await;
        }
    }

    async fn mark_success(&self, duration_ms: i64) {
        if let Ok(mut settings) = self.settings.get().await {
            settings.cloud_sync.last_sync_status = Some(SyncStatus::Success);
            settings.cloud_sync.last_sync_at = Some(Utc::now());
            settings.cloud_sync.last_sync_error = None;
            settings.cloud_sync.last_sync_duration_ms = Some(duration_ms);
            let _ = self.settings.save(&settings).await;
        }
    }

    async fn mark_failed(&self, duration_ms: i64, error: &str) {
        if let Ok(mut settings) = self.settings.get().await {
            settings.cloud_sync.last_sync_status = Some(SyncStatus::Failed);
            settings.cloud_sync.last_sync_error = Some(error.to_string());
            settings.cloud_sync.last_sync_duration_ms = Some(duration_ms);
            let _ = self.settings.save(&settings).await;
        }
    }
}

/// Arms the independent replication timer. Never replicates on process
/// start: the first pass only happens at the first period boundary.
///
/// Rather than sleeping the full `intervalHours` in one shot, this polls
/// every `IDLE_POLL_SECONDS` and re-reads Settings on every poll, comparing
/// elapsed armed time against a freshly read interval. An interval or
/// enablement change takes effect within one poll tick instead of waiting
/// out a stale long sleep — a change from 12h to 1h mid-wait fires the next
/// replication within `IDLE_POLL_SECONDS`, not within the remainder of 12h.
pub fn spawn_replication_loop(replicator: Arc<CloudReplicator>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut armed_since: Option<Instant> = None;

        loop {
            tokio::time::sleep(Duration::from_secs(IDLE_POLL_SECONDS)).await;

            let settings = match replicator.settings.get().await {
                Ok(s) => s,
                Err(e) => {
                    error!(error = %e, "could not read settings for replication scheduling");
                    continue;
                }
            };

            if !settings.cloud_sync.enabled {
                armed_since = None;
                continue;
            }

            let since = *armed_since.get_or_insert_with(Instant::now);
            let interval_hours = settings.cloud_sync.interval_hours.clamp(1, 168);
            let target = Duration::from_secs(interval_hours as u64 * 3600);

            if since.elapsed() < target {
                continue;
            }

            armed_since = Some(Instant::now());
            if let Err(e) = replicator.replicate_once().await {
                error!(error = %e, "replication loop iteration failed");
            }
        }
    })
}
