use std::sync::Arc;

use libsql::{Builder, Connection, Database};
use tracing::{error, info, instrument};

use crate::errors::StoreError;
use crate::schema::apply_schema;

/// Local libSQL handle. Holds an in-memory anchor connection when the URL
/// points at `:memory:`, since SQLite otherwise purges the schema as soon
/// as the bootstrap connection closes.
#[derive(Clone)]
pub struct StoreClient {
    database: Arc<Database>,
    _memory_anchor: Option<Arc<Connection>>,
}

impl StoreClient {
    #[instrument(skip(access_token))]
    pub async fn connect(url: &str, access_token: Option<String>) -> Result<Self, StoreError> {
        if url.is_empty() {
            return Err(StoreError::Configuration("LOCAL_STORAGE_URL is empty".into()));
        }

        let is_remote = url.starts_with("libsql://") || url.starts_with("https://");
        let is_memory = url.contains(":memory:") || url.contains("mode=memory");

        info!(url, "connecting to local store");

        let database = if is_remote {
            let token = access_token
                .ok_or_else(|| StoreError::Configuration("remote store requires an access token".into()))?;
            Builder::new_remote(url.to_string(), token).build().await
        } else {
            Builder::new_local(url).build().await
        }
        .map_err(|e| StoreError::Connection(e.to_string()))?;

        let database = Arc::new(database);
        let mut anchor = None;

        if is_memory {
            let anchor_conn = database
                .connect()
                .map_err(|e| StoreError::Connection(format!("memory anchor: {e}")))?;
            apply_schema(&anchor_conn).await?;
            anchor = Some(Arc::new(anchor_conn));
        } else {
            let bootstrap = database
                .connect()
                .map_err(|e| StoreError::Connection(format!("bootstrap: {e}")))?;
            apply_schema(&bootstrap).await?;
        }

        Ok(StoreClient {
            database,
            _memory_anchor: anchor,
        })
    }

    pub fn connection(&self) -> Result<Connection, StoreError> {
        self.database.connect().map_err(|e| {
            error!(error = %e, "failed to allocate a connection");
            StoreError::Connection(e.to_string())
        })
    }
}
