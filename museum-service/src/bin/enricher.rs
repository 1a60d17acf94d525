//! Museum enricher entry point.
//!
//! Consumes bucket notifications and geocodes each newly stored museum.

use museum_service::shutdown::cancel_on_signal;
use museum_service::telemetry::init_tracing;
use museum_service::{EnricherDependencies, ServiceError, Settings};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    dotenv::dotenv().ok();
    init_tracing();

    info!("Starting museum enricher");

    let settings = Settings::from_env()?;
    let deps = EnricherDependencies::new(&settings)?;

    let shutdown = CancellationToken::new();
    cancel_on_signal(shutdown.clone());

    let summary = deps.run(shutdown).await?;

    info!(
        enriched = summary.enriched,
        incomplete = summary.incomplete,
        errors = summary.errors,
        "Museum enricher stopped"
    );

    Ok(())
}
