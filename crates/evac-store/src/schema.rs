use libsql::Connection;
use tracing::{debug, info, instrument};

use crate::errors::StoreError;

/// Every floor, camera and screen lives inside one JSON document column
/// per floor; the store is a thin record-store for the core's purposes
/// (administrative CRUD over the individual entities is an external
/// collaborator's concern per the scope notes).
const TABLES: &[(&str, &str)] = &[
    (
        "TABLE_FLOORS",
        r#"
        CREATE TABLE IF NOT EXISTS floors (
            id TEXT PRIMARY KEY,
            status TEXT NOT NULL DEFAULT 'active',
            document_json TEXT NOT NULL,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#,
    ),
    (
        "TABLE_IMAGE_RECORDS",
        r#"
        CREATE TABLE IF NOT EXISTS image_records (
            id TEXT PRIMARY KEY,
            floor_id TEXT NOT NULL,
            camera_id TEXT NOT NULL,
            edge_id TEXT NOT NULL,
            document_json TEXT NOT NULL,
            captured_at DATETIME NOT NULL
        );
    "#,
    ),
    (
        "TABLE_ROUTES",
        r#"
        CREATE TABLE IF NOT EXISTS routes (
            floor_id TEXT PRIMARY KEY,
            document_json TEXT NOT NULL,
            computed_at DATETIME NOT NULL
        );
    "#,
    ),
    (
        "TABLE_SETTINGS",
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            document_json TEXT NOT NULL,
            updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
        );
    "#,
    ),
];

const INDEXES: &[(&str, &str)] = &[
    (
        "IDX_IMAGE_RECORDS_FLOOR",
        "CREATE INDEX IF NOT EXISTS idx_image_records_floor ON image_records(floor_id, camera_id);",
    ),
    (
        "IDX_FLOORS_STATUS",
        "CREATE INDEX IF NOT EXISTS idx_floors_status ON floors(status);",
    ),
];

#[instrument(skip(conn))]
pub async fn apply_schema(conn: &Connection) -> Result<(), StoreError> {
    info!("applying local store schema");
    for (name, sql) in TABLES {
        debug!(table = %name, "creating table if missing");
        conn.execute(sql, ()).await.map_err(StoreError::Query)?;
    }
    for (name, sql) in INDEXES {
        debug!(index = %name, "creating index if missing");
        conn.execute(sql, ()).await.map_err(StoreError::Query)?;
    }
    Ok(())
}
