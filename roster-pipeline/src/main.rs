use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::info;

use roster_core::storage::{SqliteStorage, Storage};
use roster_pipeline::config::PipelineConfig;
use roster_pipeline::observability::logging;
use roster_pipeline::pipeline::PipelineOrchestrator;

#[derive(Parser)]
#[command(name = "roster-pipeline")]
#[command(about = "Employee roster cleaning pipeline: ingest, normalize, dedupe, impute")]
#[command(version)]
struct Cli {
    /// Path to the source CSV file (overrides configuration)
    source: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize logging
    logging::init_logging();

    let mut config = PipelineConfig::load()?;
    if let Some(source) = cli.source {
        config.source_path = source;
    }

    info!(
        "Initializing SQLite storage at {}",
        config.database_path.display()
    );
    let storage: Arc<dyn Storage> = Arc::new(SqliteStorage::new(&config.database_path));

    let orchestrator = PipelineOrchestrator::new(storage, config);
    let summary = orchestrator.run().await?;

    println!(
        "✅ Cleaning completed — {} records written ({} duplicates removed, {} experience values and {} ratings imputed)",
        summary.rows_written,
        summary.duplicates_removed,
        summary.experience_imputed,
        summary.ratings_imputed
    );
    Ok(())
}
