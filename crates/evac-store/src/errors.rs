use thiserror::Error;

/// Typed catalog for the local-store boundary. Short machine-readable tags
/// in the message so logs stay greppable, matching the convention of the
/// teacher's database error catalog.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("[STORE_NET_FAULT]: database uplink failed -> {0}")]
    Connection(String),

    #[error("[STORE_CONFIG_FAULT]: store misconfigured -> {0}")]
    Configuration(String),

    #[error("[STORE_QUERY_FAULT]: query rejected -> {0}")]
    Query(#[from] libsql::Error),

    #[error("[STORE_MAPPING_FAULT]: document mapping failed -> {0}")]
    Mapping(#[from] serde_json::Error),

    #[error("[STORE_NOT_FOUND]: no document for key {0}")]
    NotFound(String),
}
