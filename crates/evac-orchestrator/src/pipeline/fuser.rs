use std::time::Duration;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

/// Per-field detector output. Every field is independently optional: a
/// detector call can succeed overall yet still omit a reading for one
/// field (see S6), which the fusion rule treats the same as a whole-call
/// failure for that field alone.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectorFields {
    pub people_count: Option<f64>,
    pub fire_prob: Option<f64>,
    pub smoke_prob: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct FusedSnapshot {
    pub people_count: f64,
    pub fire_prob: f64,
    pub smoke_prob: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct DetectRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    image_url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    local_path: Option<&'a str>,
    camera_id: &'a str,
    edge_id: &'a str,
}

/// A JSON POST hazard detector endpoint (§6). Non-2xx, timeout or
/// malformed body all count as "null result" for the whole call; the
/// caller still sees per-field partial results when the body decodes but
/// the detector itself chose to omit a field.
pub trait HazardDetector: Send + Sync {
    fn detect<'a>(&'a self, request: DetectorRequest<'a>) -> BoxFuture<'a, anyhow::Result<DetectorFields>>;
}

#[derive(Debug, Clone, Copy)]
pub struct DetectorRequest<'a> {
    pub image_url: Option<&'a str>,
    pub local_path: Option<&'a str>,
    pub camera_id: &'a str,
    pub edge_id: &'a str,
}

pub struct HttpHazardDetector {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl HttpHazardDetector {
    pub fn new(client: reqwest::Client, endpoint: String, api_key: String, timeout: Duration) -> Self {
        HttpHazardDetector {
            client,
            endpoint,
            api_key,
            timeout,
        }
    }
}

impl HazardDetector for HttpHazardDetector {
    fn detect<'a>(&'a self, request: DetectorRequest<'a>) -> BoxFuture<'a, anyhow::Result<DetectorFields>> {
        Box::pin(async move {
            let body = DetectRequest {
                image_url: request.image_url,
                local_path: request.local_path,
                camera_id: request.camera_id,
                edge_id: request.edge_id,
            };

            let call = self
                .client
                .post(&self.endpoint)
                .bearer_auth(&self.api_key)
                .json(&body)
                .send();

            let response = tokio::time::timeout(self.timeout, call).await??.error_for_status()?;
            Ok(response.json::<DetectorFields>().await?)
        })
    }
}

/// Calls the local and (when enabled and a cloud URL exists) cloud
/// detectors concurrently, each independently timed out, then fuses with
/// cloud-precedence per field. A camera with both detectors failing
/// yields an all-zero snapshot — "no hazard observed".
#[instrument(skip(local, cloud), fields(camera_id = %request.camera_id))]
pub async fn fuse_hazard_readings(
    local: &dyn HazardDetector,
    cloud: Option<&dyn HazardDetector>,
    request: DetectorRequest<'_>,
    cloud_processing_enabled: bool,
) -> FusedSnapshot {
    let local_call = local.detect(request);

    let cloud_call = async {
        match (cloud_processing_enabled, cloud, request.image_url) {
            (true, Some(detector), Some(_)) => Some(detector.detect(request).await),
            _ => None,
        }
    };

    let (local_result, cloud_result) = tokio::join!(local_call, cloud_call);

    let local_fields = match local_result {
        Ok(fields) => Some(fields),
        Err(e) => {
            warn!(error = %e, "local detector call failed");
            None
        }
    };

    let cloud_fields = match cloud_result {
        Some(Ok(fields)) => Some(fields),
        Some(Err(e)) => {
            warn!(error = %e, "cloud detector call failed");
            None
        }
        None => None,
    };

    fuse(local_fields, cloud_fields)
}

fn fuse(local: Option<DetectorFields>, cloud: Option<DetectorFields>) -> FusedSnapshot {
    let pick = |f: fn(&DetectorFields) -> Option<f64>| -> f64 {
        cloud.as_ref().and_then(f).or_else(|| local.as_ref().and_then(f)).unwrap_or(0.0)
    };

    FusedSnapshot {
        people_count: pick(|d| d.people_count),
        fire_prob: pick(|d| d.fire_prob),
        smoke_prob: pick(|d| d.smoke_prob),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubDetector(DetectorFields);
    impl HazardDetector for StubDetector {
        fn detect<'a>(&'a self, _request: DetectorRequest<'a>) -> BoxFuture<'a, anyhow::Result<DetectorFields>> {
            let fields = self.0;
            Box::pin(async move { Ok(fields) })
        }
    }

    struct FailingDetector;
    impl HazardDetector for FailingDetector {
        fn detect<'a>(&'a self, _request: DetectorRequest<'a>) -> BoxFuture<'a, anyhow::Result<DetectorFields>> {
            Box::pin(async move { anyhow::bail!("detector unreachable") })
        }
    }

    fn req<'a>() -> DetectorRequest<'a> {
        DetectorRequest {
            image_url: Some("https://cloud/frame.jpg"),
            local_path: Some("/tmp/frame.jpg"),
            camera_id: "CAM1",
            edge_id: "E1",
        }
    }

    // S6: local {people:5, fire:0.1, smoke:0.0}; cloud {people:null, fire:0.2, smoke:0.0}.
    #[tokio::test]
    async fn s6_cloud_precedence_fuses_field_wise() {
        let local = StubDetector(DetectorFields {
            people_count: Some(5.0),
            fire_prob: Some(0.1),
            smoke_prob: Some(0.0),
        });
        let cloud = StubDetector(DetectorFields {
            people_count: None,
            fire_prob: Some(0.2),
            smoke_prob: Some(0.0),
        });
        let fused = fuse_hazard_readings(&local, Some(&cloud), req(), true).await;
        assert_eq!(fused.people_count, 5.0);
        assert!((fused.fire_prob - 0.2).abs() < 1e-9);
        assert_eq!(fused.smoke_prob, 0.0);
    }

    #[tokio::test]
    async fn both_detectors_failing_yields_all_zero_snapshot() {
        let fused = fuse_hazard_readings(&FailingDetector, Some(&FailingDetector), req(), true).await;
        assert_eq!(fused.people_count, 0.0);
        assert_eq!(fused.fire_prob, 0.0);
        assert_eq!(fused.smoke_prob, 0.0);
    }

    #[tokio::test]
    async fn cloud_processing_disabled_skips_cloud_call_entirely() {
        let local = StubDetector(DetectorFields {
            people_count: Some(2.0),
            fire_prob: Some(0.3),
            smoke_prob: Some(0.1),
        });
        let cloud = FailingDetector;
        let fused = fuse_hazard_readings(&local, Some(&cloud), req(), false).await;
        assert_eq!(fused.people_count, 2.0);
    }
}
