use std::process::Stdio;
use std::time::Duration;

use evac_models::Envelope;
use tokio::process::{Child, Command};
use tracing::{error, info, instrument, warn};

use crate::config::PipelineConfig;
use crate::error::PipelineError;

#[derive(Debug, Clone)]
pub struct RadioOutcome {
    pub ok: bool,
    pub output: String,
}

/// Writes a padded JSON envelope and spawns the sibling modulator process,
/// the radio fallback used whenever a floor has no live push subscriber.
/// The subprocess lifecycle (timeout, graceful term, forceful kill) is
/// written in the idiom of the rest of this crate.
pub struct RadioFramer {
    config: std::sync::Arc<PipelineConfig>,
}

impl RadioFramer {
    pub fn new(config: std::sync::Arc<PipelineConfig>) -> Self {
        RadioFramer { config }
    }

    #[instrument(skip(self, envelope), fields(floor_id = %envelope.floor_id))]
    pub async fn transmit(&self, envelope: &Envelope) -> Result<RadioOutcome, PipelineError> {
        let framed = self.frame(envelope).map_err(|e| PipelineError::Radio {
            floor_id: envelope.floor_id.clone(),
            reason: e.to_string(),
        })?;

        tokio::fs::write(&self.config.usrp_tx_data_file, framed)
            .await
            .map_err(|e| PipelineError::Radio {
                floor_id: envelope.floor_id.clone(),
                reason: format!("failed to write padded envelope: {e}"),
            })?;

        let mut command = Command::new(&self.config.usrp_modulator_path);
        command
            .arg(&self.config.usrp_tx_data_file)
            .env_remove("LD_LIBRARY_PATH")
            .env_remove("PYTHONPATH")
            .env("UHD_IMAGES_DIR", &self.config.usrp_uhd_images_dir)
            .env("LD_PRELOAD", &self.config.usrp_ld_preload)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(|e| PipelineError::Radio {
            floor_id: envelope.floor_id.clone(),
            reason: format!("failed to spawn modulator: {e}"),
        })?;

        // Drain stdout concurrently with the wait so a chatty modulator
        // can't deadlock on a full pipe buffer while we hold `child` for
        // the timeout race below.
        let stdout = child.stdout.take();
        let output_handle = tokio::spawn(async move {
            use tokio::io::AsyncReadExt;
            let mut buf = Vec::new();
            if let Some(mut out) = stdout {
                let _ = out.read_to_end(&mut buf).await;
            }
            buf
        });

        let timeout = Duration::from_millis(self.config.usrp_transmission_timeout_ms);
        match tokio::time::timeout(timeout, child.wait()).await {
            Ok(Ok(status)) if status.success() => {
                info!("modulator exited cleanly");
                let output = output_handle.await.unwrap_or_default();
                Ok(RadioOutcome {
                    ok: true,
                    output: String::from_utf8_lossy(&output).into_owned(),
                })
            }
            Ok(Ok(status)) => {
                output_handle.abort();
                Err(PipelineError::Radio {
                    floor_id: envelope.floor_id.clone(),
                    reason: format!("modulator exited with status {status}"),
                })
            }
            Ok(Err(e)) => {
                output_handle.abort();
                Err(PipelineError::Radio {
                    floor_id: envelope.floor_id.clone(),
                    reason: format!("failed to wait on modulator: {e}"),
                })
            }
            Err(_) => {
                warn!("modulator exceeded the transmission timeout; terminating");
                output_handle.abort();
                terminate_timed_out(child).await;
                Err(PipelineError::Radio {
                    floor_id: envelope.floor_id.clone(),
                    reason: "modulator timed out".to_string(),
                })
            }
        }
    }

    fn frame(&self, envelope: &Envelope) -> Result<String, serde_json::Error> {
        let json = serde_json::to_string_pretty(envelope)?;
        let pad_lead = "=".repeat(self.config.usrp_padding_length);
        let pad_trail = "=".repeat(self.config.usrp_padding_length_extra);
        Ok(format!("{pad_lead}\n{json}\n{pad_trail}\n"))
    }
}

/// Sends SIGTERM to the modulator, waits 2 s, then force-kills it if it is
/// still running. Used by callers that hold the `Child` handle directly
/// (rather than `wait_with_output`, which consumes it) and need the
/// graceful-then-forceful sequence from §4.11.
#[instrument(skip(child))]
pub async fn terminate_timed_out(mut child: Child) {
    if let Some(pid) = child.id() {
        let term = Command::new("kill").arg("-TERM").arg(pid.to_string()).status().await;
        if let Err(e) = term {
            error!(error = %e, "failed to send SIGTERM to modulator");
        }
    }

    tokio::time::sleep(Duration::from_secs(2)).await;

    if child.try_wait().ok().flatten().is_none() {
        warn!("modulator still alive after SIGTERM grace period; forcing kill");
        let _ = child.start_kill();
        let _ = tokio::time::timeout(Duration::from_secs(5), child.wait()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evac_models::HazardLevel;

    fn sample_config(tmp_dir: &std::path::Path) -> PipelineConfig {
        crate::config::PipelineConfig {
            capture_interval_sec: 30,
            camera_failure_threshold: 3,
            camera_failure_reset_hours: 24,
            rtsp_template: String::new(),
            local_ai_endpoint: String::new(),
            local_ai_timeout_ms: 15_000,
            cloud_ai_endpoint: None,
            cloud_ai_timeout_ms: 25_000,
            ai_api_key: String::new(),
            local_storage_dir: String::new(),
            cloud_storage_endpoint: String::new(),
            usrp_tx_data_file: tmp_dir.join("tx.json").to_string_lossy().into_owned(),
            usrp_padding_length: 8,
            usrp_padding_length_extra: 16,
            usrp_transmission_timeout_ms: 1000,
            usrp_uhd_images_dir: String::new(),
            usrp_ld_preload: String::new(),
            usrp_modulator_path: "/bin/true".into(),
            weight_params: evac_graph::WeightParams::default(),
        }
    }

    #[test]
    fn frame_layout_matches_padded_envelope_contract() {
        let tmp = tempfile::tempdir().unwrap();
        let config = sample_config(tmp.path());
        let framer = RadioFramer::new(std::sync::Arc::new(config));
        let envelope = Envelope {
            floor_id: "F1".into(),
            floor_name: "Floor One".into(),
            routes: vec![],
            emergency: false,
            overall_hazard_level: HazardLevel::Safe,
            timestamp: chrono::Utc::now(),
            total_routes: 0,
        };
        let framed = framer.frame(&envelope).unwrap();
        let lines: Vec<&str> = framed.lines().collect();
        assert_eq!(lines[0], "=".repeat(8));
        assert_eq!(lines.last().unwrap(), &"=".repeat(16));
        assert!(framed.contains("\"floorId\""));
    }
}
