//! Museum parser entry point.
//!
//! Crawls the Wikipedia museum lists and stores every museum found.

use std::time::Instant;

use museum_service::shutdown::cancel_on_signal;
use museum_service::telemetry::init_tracing;
use museum_service::{ParserDependencies, ServiceError, Settings};
use tokio_util::sync::CancellationToken;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), ServiceError> {
    dotenv::dotenv().ok();
    init_tracing();

    info!("Starting museum parser");
    let started = Instant::now();

    let settings = Settings::from_env()?;
    let deps = ParserDependencies::new(&settings)?;

    let shutdown = CancellationToken::new();
    cancel_on_signal(shutdown.clone());

    let summary = deps.run(shutdown).await?;

    info!(
        received = summary.received(),
        stored = summary.stored,
        skipped_existing = summary.skipped_existing,
        failed = summary.failed,
        stream_errors = summary.stream_errors,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Museum parser finished"
    );

    Ok(())
}
