use thiserror::Error;

/// Per-camera and per-floor failure kinds. Every variant is recovered at
/// its own scope (§7 propagation policy) — nothing here ever aborts a
/// tick; these exist to make the failure kind explicit in logs and tests.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("[ACQUIRE_FAULT]: frame capture failed for camera {camera_id} -> {source}")]
    Acquire {
        camera_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("[UPLOAD_FAULT]: cloud upload failed for camera {camera_id} -> {source}")]
    Upload {
        camera_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("[AI_FAULT]: detector call failed for camera {camera_id} -> {source}")]
    Ai {
        camera_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("[PERSIST_FAULT]: local store write failed -> {0}")]
    Persist(#[from] evac_store::StoreError),

    #[error("[DISPATCH_FAULT]: push channel write failed for floor {floor_id} -> {source}")]
    Dispatch {
        floor_id: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("[RADIO_FAULT]: modulator subprocess failed for floor {floor_id} -> {reason}")]
    Radio { floor_id: String, reason: String },

    #[error("[CONFIG_FAULT]: settings unreadable, falling back to defaults -> {0}")]
    Config(String),
}
