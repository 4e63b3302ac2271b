use chrono::Utc;
use evac_models::{Camera, CameraStatus};
use tracing::{info, instrument, warn};

/// Consecutive-failure counter with auto-disable and manual-reset
/// semantics (§4.7). `Error` is reserved for this system-driven
/// transition; only an operator may clear it, so `record_success` never
/// flips a camera back to `Active` once it has tripped.
#[instrument(skip(camera), fields(camera_id = %camera.id))]
pub fn record_failure(mut camera: Camera, threshold: u32, error_message: &str) -> Camera {
    camera.failure_count += 1;
    camera.last_failure = Some(Utc::now());

    if camera.failure_count >= threshold && camera.status != CameraStatus::Error {
        warn!(failure_count = camera.failure_count, threshold, "auto-disabling camera");
        camera.status = CameraStatus::Error;
        camera.disabled_by = Some("system".to_string());
        camera.disabled_reason = Some(format!(
            "Auto-disabled after {} consecutive failures: {}",
            camera.failure_count, error_message
        ));
        camera.disabled_at = Some(Utc::now());
    }

    camera
}

#[instrument(skip(camera), fields(camera_id = %camera.id))]
pub fn record_success(mut camera: Camera) -> Camera {
    if camera.failure_count > 0 {
        info!(previous_failure_count = camera.failure_count, "clearing failure streak on success");
        camera.failure_count = 0;
    }
    camera.last_success = Some(Utc::now());
    // §4.7: a success never clears `Error` automatically, even though it
    // zeroes the counter above — an operator action is required.
    camera
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera {
            id: "CAM1".into(),
            edge_id: "E1".into(),
            stream_url: None,
            status: CameraStatus::Active,
            failure_count: 0,
            last_failure: None,
            last_success: None,
            disabled_reason: None,
            disabled_at: None,
            disabled_by: None,
        }
    }

    // S4: three consecutive failures trip the auto-disable at threshold 3.
    #[test]
    fn s4_auto_disables_at_threshold() {
        let mut cam = camera();
        cam = record_failure(cam, 3, "timeout");
        assert_eq!(cam.status, CameraStatus::Active);
        cam = record_failure(cam, 3, "timeout");
        assert_eq!(cam.status, CameraStatus::Active);
        cam = record_failure(cam, 3, "timeout");
        assert_eq!(cam.status, CameraStatus::Error);
        assert_eq!(cam.disabled_by.as_deref(), Some("system"));
        assert_eq!(cam.failure_count, 3);
    }

    #[test]
    fn s4_success_after_error_does_not_reenable() {
        let mut cam = camera();
        for _ in 0..3 {
            cam = record_failure(cam, 3, "timeout");
        }
        assert_eq!(cam.status, CameraStatus::Error);
        cam = record_success(cam);
        assert_eq!(cam.status, CameraStatus::Error);
        assert_eq!(cam.failure_count, 0);
    }

    #[test]
    fn success_zeroes_failure_count_without_tripping() {
        let mut cam = camera();
        cam = record_failure(cam, 3, "timeout");
        cam = record_failure(cam, 3, "timeout");
        assert_eq!(cam.failure_count, 2);
        cam = record_success(cam);
        assert_eq!(cam.failure_count, 0);
        assert_eq!(cam.status, CameraStatus::Active);
        assert!(cam.last_success.is_some());
    }

    #[test]
    fn auto_disable_transition_is_idempotent() {
        let mut cam = camera();
        for _ in 0..4 {
            cam = record_failure(cam, 3, "timeout");
        }
        assert_eq!(cam.status, CameraStatus::Error);
        assert_eq!(cam.failure_count, 4);
    }
}
