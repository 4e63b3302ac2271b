use dotenvy::dotenv;
use evac_orchestrator::OrchestratorKernel;
use evac_telemetry::init_tracing;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing("evac_orchestrator");

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async {
        let database_connection_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "./data/evac.db".to_string());
        let database_access_token = std::env::var("TURSO_AUTH_TOKEN").ok();
        let listening_port: u16 = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().unwrap_or(3000);

        let kernel = OrchestratorKernel::ignite(&database_connection_url, database_access_token, listening_port).await;

        info!(port = listening_port, "evacuation orchestrator online");
        kernel.launch().await;
    });

    Ok(())
}
