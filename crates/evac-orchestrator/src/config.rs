use evac_graph::WeightParams;

/// Every knob recognized by the core, read once at startup with direct
/// `std::env::var(...).unwrap_or(...)` calls, no layered config crate.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub capture_interval_sec: u64,
    pub camera_failure_threshold: u32,
    pub camera_failure_reset_hours: u64,

    pub rtsp_template: String,
    pub local_ai_endpoint: String,
    pub local_ai_timeout_ms: u64,
    pub cloud_ai_endpoint: Option<String>,
    pub cloud_ai_timeout_ms: u64,
    pub ai_api_key: String,

    pub local_storage_dir: String,
    pub cloud_storage_endpoint: String,

    pub usrp_tx_data_file: String,
    pub usrp_padding_length: usize,
    pub usrp_padding_length_extra: usize,
    pub usrp_transmission_timeout_ms: u64,
    pub usrp_uhd_images_dir: String,
    pub usrp_ld_preload: String,
    pub usrp_modulator_path: String,

    pub weight_params: WeightParams,
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        PipelineConfig {
            capture_interval_sec: env_u64("CAPTURE_INTERVAL_SEC", 30),
            camera_failure_threshold: env_u32("CAMERA_FAILURE_THRESHOLD", 3),
            camera_failure_reset_hours: env_u64("CAMERA_FAILURE_RESET_HOURS", 24),

            rtsp_template: env_string("RTSP_TEMPLATE", "rtsp://cameras.local?cameraId={cameraId}"),
            local_ai_endpoint: env_string("LOCAL_AI_ENDPOINT", "http://localhost:9001/detect"),
            local_ai_timeout_ms: env_u64("LOCAL_AI_TIMEOUT_MS", 15_000),
            cloud_ai_endpoint: env_opt_string("CLOUD_AI_ENDPOINT"),
            cloud_ai_timeout_ms: env_u64("CLOUD_AI_TIMEOUT_MS", 25_000),
            ai_api_key: env_string("AI_API_KEY", ""),

            local_storage_dir: env_string("LOCAL_STORAGE_DIR", "./data/frames"),
            cloud_storage_endpoint: env_string("CLOUD_STORAGE_ENDPOINT", "http://localhost:9002/upload"),

            usrp_tx_data_file: env_string("USRP_TX_DATA_FILE", "./data/usrp_tx.json"),
            usrp_padding_length: env_usize("USRP_PADDING_LENGTH", 80),
            usrp_padding_length_extra: env_usize("USRP_PADDING_LENGTH_EXTRA", 33_000),
            usrp_transmission_timeout_ms: env_u64("USRP_TRANSMISSION_TIMEOUT_MS", 30_000),
            usrp_uhd_images_dir: env_string("USRP_UHD_IMAGES_DIR", "/usr/share/uhd/images"),
            usrp_ld_preload: env_string("USRP_LD_PRELOAD", ""),
            usrp_modulator_path: env_string("USRP_MODULATOR_PATH", "/opt/evac/bin/modulator"),

            weight_params: WeightParams {
                fire_pen: env_f64("HAZARD_FIRE_PEN", 1000.0),
                smoke_pen: env_f64("HAZARD_SMOKE_PEN", 500.0),
                people_pen: env_f64("HAZARD_PEOPLE_PEN", 2.0),
                people_factor: env_f64("HAZARD_PEOPLE_FACTOR", 0.5),
                fire_factor: env_f64("HAZARD_FIRE_FACTOR", 2.0),
                smoke_factor: env_f64("HAZARD_SMOKE_FACTOR", 1.5),
                threshold_mult: env_f64("HAZARD_THRESHOLD_MULT", 100.0),
            },
        }
    }
}
