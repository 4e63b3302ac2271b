//! Tracing initialization shared by every binary and integration test in
//! the workspace. One subscriber, two renderings: compact and colored in
//! debug builds, flattened JSON in release, so the replication target can
//! ingest logs line by line.

use std::panic;

use tracing::{error, info, instrument};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as formatting_layer, EnvFilter};

/// Initializes the global tracing subscriber and installs a panic hook
/// that logs the panic location and payload through `tracing::error!`
/// before the default hook unwinds the thread.
///
/// # Panics
/// Panics if a global subscriber has already been installed in this
/// process.
#[instrument(skip_all)]
pub fn init_tracing(service_name: &str) {
    let environmental_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "{service_name}={level},tower_http=warn,hyper=warn,libsql=error",
            level = if cfg!(debug_assertions) { "debug" } else { "info" }
        )
        .into()
    });

    let is_production = !cfg!(debug_assertions);

    if is_production {
        tracing_subscriber::registry()
            .with(environmental_filter)
            .with(formatting_layer::layer().json().flatten_event(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(environmental_filter)
            .with(formatting_layer::layer().compact().with_target(false))
            .init();
    }

    let service_id = service_name.to_string();
    panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
            .unwrap_or_else(|| "unknown".to_string());

        let payload = panic_info
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| panic_info.payload().downcast_ref::<String>().map(|s| s.as_str()))
            .unwrap_or("<no panic message>");

        error!(
            target: "panic_monitor",
            service = %service_id,
            location = %location,
            "thread panicked: {}",
            payload
        );
    }));

    info!("tracing initialized for [{service_name}]");
}
