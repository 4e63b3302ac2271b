use std::time::Duration;

use tracing::{error, info, instrument, warn};

use crate::pipeline::{
    run_floor_cycle, CycleCollaborators, HazardDetector, HttpCloudUploader, HttpFrameSource, HttpHazardDetector,
};
use crate::state::AppState;

/// Drives the global capture ticker (§4.12). One process-wide cycle mutex
/// gates every tick: if the previous tick is still running when the next
/// one fires, this tick is skipped outright — no catch-up, no queueing.
/// The first tick runs immediately on start, not after the first interval.
pub async fn run_scheduler(state: AppState) {
    let mut ticker = tokio::time::interval(Duration::from_secs(state.config.capture_interval_sec.max(1)));
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        if state.is_shutting_down() {
            info!("scheduler stopping: shutdown in progress");
            break;
        }

        let Ok(_permit) = state.cycle_mutex.try_lock() else {
            warn!("previous capture cycle still running; skipping this tick");
            continue;
        };

        run_tick(&state).await;
    }
}

#[instrument(skip(state))]
async fn run_tick(state: &AppState) {
    let settings = match state.settings.get().await {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "could not read settings for this tick; falling back to defaults");
            evac_models::Settings::default()
        }
    };

    let mut floors = match state.floors.list_active().await {
        Ok(f) => f,
        Err(e) => {
            error!(error = %e, "could not list active floors; skipping tick");
            return;
        }
    };

    let frame_source = HttpFrameSource::new(state.http.clone());
    let uploader = HttpCloudUploader::new(state.http.clone(), state.config.cloud_storage_endpoint.clone());
    let local_detector = HttpHazardDetector::new(
        state.http.clone(),
        state.config.local_ai_endpoint.clone(),
        state.config.ai_api_key.clone(),
        Duration::from_millis(state.config.local_ai_timeout_ms),
    );
    let cloud_detector = state.config.cloud_ai_endpoint.clone().map(|endpoint| {
        HttpHazardDetector::new(
            state.http.clone(),
            endpoint,
            state.config.ai_api_key.clone(),
            Duration::from_millis(state.config.cloud_ai_timeout_ms),
        )
    });

    let collaborators = CycleCollaborators {
        frame_source: &frame_source,
        uploader: &uploader,
        local_detector: &local_detector,
        cloud_detector: cloud_detector.as_ref().map(|d| d as &dyn HazardDetector),
    };

    // §4.12: floors are cycled one at a time within a tick, not fanned out
    // concurrently — each floor's camera loop already isolates its own
    // per-camera faults, so a slow or wedged floor only delays its peers,
    // it never corrupts their state.
    for floor in &mut floors {
        if let Err(e) = run_floor_cycle(state, floor, &collaborators, settings.cloud_processing.enabled).await {
            error!(floor_id = %floor.floor_id, error = %e, "floor cycle failed; continuing with remaining floors");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use evac_store::StoreClient;

    #[tokio::test]
    async fn run_tick_with_no_floors_completes_without_panicking() {
        let store = StoreClient::connect(":memory:", None).await.unwrap();
        let config = PipelineConfig::from_env();
        let state = AppState::new(store, config).await;
        run_tick(&state).await;
    }
}
