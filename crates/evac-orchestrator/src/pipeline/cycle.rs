use std::collections::HashSet;
use std::path::Path;

use evac_graph::{shortest_paths, GraphView, WeightParams};
use evac_models::{Camera, Edge, EdgeCurrent, Floor, ImageRecord, RouteDocument};
use tracing::{instrument, warn};

use crate::dispatch;
use crate::error::PipelineError;
use crate::pipeline::acquire::{acquire_frame, FrameSource};
use crate::pipeline::fuser::{fuse_hazard_readings, DetectorRequest, HazardDetector};
use crate::pipeline::health::{record_failure, record_success};
use crate::pipeline::storage::{place_frame, upload_frame, CloudUploader};
use crate::state::AppState;

/// Everything the cycle needs to reach the outside world, grouped so the
/// per-floor function stays testable against fakes without touching
/// `reqwest`/filesystem directly.
pub struct CycleCollaborators<'a> {
    pub frame_source: &'a dyn FrameSource,
    pub uploader: &'a dyn CloudUploader,
    pub local_detector: &'a dyn HazardDetector,
    pub cloud_detector: Option<&'a dyn HazardDetector>,
}

/// Runs one capture-fuse-route-dispatch pass for a single floor (§4.8).
/// Per-camera failures are isolated: one camera's acquire/upload/detector
/// fault never aborts the floor's routing, it only leaves that camera's
/// edge at its last-known (or zeroed) reading.
#[instrument(skip_all, fields(floor_id = %floor.floor_id))]
pub async fn run_floor_cycle(
    state: &AppState,
    floor: &mut Floor,
    collaborators: &CycleCollaborators<'_>,
    cloud_processing_enabled: bool,
) -> Result<(), PipelineError> {
    for edge in &mut floor.edges {
        edge.current = EdgeCurrent::default();
    }

    let base_dir = Path::new(&state.config.local_storage_dir);

    let active_cameras: Vec<Camera> = floor.cameras.iter().filter(|c| c.is_active()).cloned().collect();

    for camera in active_cameras {
        let outcome = run_camera(
            state,
            &floor.floor_id,
            &camera,
            collaborators,
            base_dir,
            cloud_processing_enabled,
        )
        .await;

        if let Some(idx) = floor.cameras.iter().position(|c| c.id == camera.id) {
            match outcome {
                Ok((updated, current)) => {
                    floor.cameras[idx] = updated;
                    if let Some(edge) = floor.edges.iter_mut().find(|e| e.id == camera.edge_id) {
                        edge.current = current;
                    }
                }
                Err(e) => {
                    warn!(camera_id = %camera.id, error = %e, "camera cycle step failed; isolating failure");
                    floor.cameras[idx] = record_failure(
                        floor.cameras[idx].clone(),
                        state.config.camera_failure_threshold,
                        &e.to_string(),
                    );
                }
            }
        }
    }

    state.floors.save(floor).await?;

    let starts = floor.active_screen_node_ids();
    if starts.is_empty() {
        warn!("no active screens for floor; skipping routing and dispatch");
        return Ok(());
    }

    let exits: HashSet<String> = floor.exit_points.iter().cloned().collect();
    let graph = GraphView {
        nodes: floor.nodes.clone(),
        edges: floor.edges.clone(),
        scale: floor.map_image.as_ref().and_then(|m| m.scale),
    };

    let output = shortest_paths(&graph, &starts, &exits, &state.config.weight_params);
    for err in &output.errors {
        warn!(floor_id = %floor.floor_id, error = %err, "dijkstra reported a non-fatal graph error");
    }

    let document = RouteDocument {
        floor_id: floor.floor_id.clone(),
        computed_at: chrono::Utc::now(),
        emergency: RouteDocument::is_emergency(&output.routes),
        overall_hazard_level: RouteDocument::overall_level(&output.routes),
        routes: output.routes,
    };

    state.routes.save(&document).await?;

    dispatch::dispatch(state, &floor.floor_id, &floor.name, document.routes.clone()).await;

    Ok(())
}

/// Acquire → place → upload → fuse → persist for one camera. Returns the
/// camera's updated health state on success (a clean success streak) plus
/// the fused reading to stamp onto its edge; the caller applies
/// `record_failure` itself so every failure reason — not just detector
/// faults — feeds the same auto-disable counter.
async fn run_camera(
    state: &AppState,
    floor_id: &str,
    camera: &Camera,
    collaborators: &CycleCollaborators<'_>,
    base_dir: &Path,
    cloud_processing_enabled: bool,
) -> Result<(Camera, EdgeCurrent), PipelineError> {
    let stream_url = camera.resolve_stream_url(&state.config.rtsp_template);

    let temp_path = acquire_frame(collaborators.frame_source, &stream_url, floor_id, &camera.id, base_dir).await?;

    let placed = place_frame(base_dir, &temp_path, floor_id, &camera.id).await?;

    let upload = if cloud_processing_enabled {
        upload_frame(collaborators.uploader, &placed.absolute_path, floor_id, &camera.id).await
    } else {
        None
    };

    let mut record = ImageRecord::new(
        floor_id.to_string(),
        camera.id.clone(),
        camera.edge_id.clone(),
        placed.relative_path.clone(),
    );
    record.cloud_url = upload.as_ref().map(|u| u.url.clone());

    let detect_request = DetectorRequest {
        image_url: record.cloud_url.as_deref(),
        local_path: Some(placed.absolute_path.to_string_lossy().as_ref()),
        camera_id: &camera.id,
        edge_id: &camera.edge_id,
    };

    let fused = fuse_hazard_readings(
        collaborators.local_detector,
        collaborators.cloud_detector,
        detect_request,
        cloud_processing_enabled,
    )
    .await;

    record.people_count = fused.people_count;
    record.fire_prob = fused.fire_prob;
    record.smoke_prob = fused.smoke_prob;
    record.processed = true;

    state.images.insert(&record).await?;

    let current = EdgeCurrent {
        people: fused.people_count,
        fire: fused.fire_prob,
        smoke: fused.smoke_prob,
    };

    Ok((record_success(camera.clone()), current))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::pipeline::fuser::{DetectorFields, DetectorRequest as FuserRequest};
    use crate::pipeline::storage::UploadResult;
    use evac_models::{EdgeCurrent, EdgeThresholds, FloorStatus, Node, NodeType, Screen, ScreenStatus};
    use evac_store::StoreClient;
    use futures::future::BoxFuture;

    struct StubFrameSource;
    impl FrameSource for StubFrameSource {
        fn fetch<'a>(&'a self, _stream_url: &'a str) -> BoxFuture<'a, anyhow::Result<Vec<u8>>> {
            Box::pin(async move { Ok(vec![0xFF, 0xD8]) })
        }
    }

    struct StubUploader;
    impl CloudUploader for StubUploader {
        fn upload<'a>(
            &'a self,
            _absolute_path: &'a Path,
            _folder_key: &'a str,
        ) -> BoxFuture<'a, anyhow::Result<UploadResult>> {
            Box::pin(async move {
                Ok(UploadResult {
                    url: "https://cdn/frame.jpg".into(),
                    public_id: "abc".into(),
                    width: 100,
                    height: 100,
                })
            })
        }
    }

    struct StubDetector(DetectorFields);
    impl HazardDetector for StubDetector {
        fn detect<'a>(&'a self, _request: FuserRequest<'a>) -> BoxFuture<'a, anyhow::Result<DetectorFields>> {
            let fields = self.0;
            Box::pin(async move { Ok(fields) })
        }
    }

    fn sample_floor() -> Floor {
        Floor {
            floor_id: "F1".into(),
            status: FloorStatus::Active,
            name: "Floor One".into(),
            nodes: vec![
                Node {
                    id: "A".into(),
                    x: 0.0,
                    y: 0.0,
                    node_type: NodeType::Room,
                },
                Node {
                    id: "B".into(),
                    x: 10.0,
                    y: 0.0,
                    node_type: NodeType::Exit,
                },
            ],
            edges: vec![Edge {
                id: "E1".into(),
                from: "A".into(),
                to: "B".into(),
                weight: 1.0,
                thresholds: EdgeThresholds {
                    people: 10.0,
                    fire: 0.7,
                    smoke: 0.6,
                },
                current: EdgeCurrent::default(),
            }],
            cameras: vec![Camera {
                id: "CAM1".into(),
                edge_id: "E1".into(),
                stream_url: Some("rtsp://irrelevant".into()),
                status: evac_models::CameraStatus::Active,
                failure_count: 0,
                last_failure: None,
                last_success: None,
                disabled_reason: None,
                disabled_at: None,
                disabled_by: None,
            }],
            screens: vec![Screen {
                id: "S1".into(),
                node_id: "A".into(),
                name: "Lobby Screen".into(),
                status: ScreenStatus::Active,
            }],
            start_points: vec![],
            exit_points: vec!["B".into()],
            map_image: None,
        }
    }

    #[tokio::test]
    async fn full_cycle_persists_route_document_and_clears_camera_failures() {
        let store = StoreClient::connect(":memory:", None).await.unwrap();
        let config = PipelineConfig::from_env();
        let state = AppState::new(store, config).await;

        let mut floor = sample_floor();

        let local = StubDetector(DetectorFields {
            people_count: Some(1.0),
            fire_prob: Some(0.1),
            smoke_prob: Some(0.0),
        });
        let collaborators = CycleCollaborators {
            frame_source: &StubFrameSource,
            uploader: &StubUploader,
            local_detector: &local,
            cloud_detector: None,
        };

        run_floor_cycle(&state, &mut floor, &collaborators, true).await.unwrap();

        assert_eq!(floor.cameras[0].failure_count, 0);
        let saved = state.routes.latest("F1").await.unwrap().expect("route document persisted");
        assert_eq!(saved.routes.len(), 1);
    }

    #[tokio::test]
    async fn no_active_screens_skips_routing_without_error() {
        let store = StoreClient::connect(":memory:", None).await.unwrap();
        let config = PipelineConfig::from_env();
        let state = AppState::new(store, config).await;

        let mut floor = sample_floor();
        floor.screens.clear();

        let local = StubDetector(DetectorFields::default());
        let collaborators = CycleCollaborators {
            frame_source: &StubFrameSource,
            uploader: &StubUploader,
            local_detector: &local,
            cloud_detector: None,
        };

        run_floor_cycle(&state, &mut floor, &collaborators, true).await.unwrap();
        assert!(state.routes.latest("F1").await.unwrap().is_none());
    }
}
