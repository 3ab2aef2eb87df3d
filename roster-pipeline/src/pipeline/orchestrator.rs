use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use roster_core::common::error::PipelineError;
use roster_core::domain::{EmployeeRecord, PipelineRun};
use roster_core::storage::Storage;

use crate::config::PipelineConfig;
use crate::ingest;
use crate::observability::run_log;
use crate::pipeline::transform::{
    DuplicateResolver, ExperienceImputer, Normalizer, RatingImputer,
};

/// Orchestrator for one complete cleaning run.
///
/// Stages run in strict order, each consuming the previous stage's output.
/// The destination table is written exactly once, after every stage has
/// succeeded; any stage failure aborts the run with the originating error
/// and leaves the destination untouched.
pub struct PipelineOrchestrator {
    storage: Arc<dyn Storage>,
    config: PipelineConfig,
}

/// Counts and provenance for a completed run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    pub run: PipelineRun,
    pub rows_ingested: usize,
    pub normalize_warnings: usize,
    pub duplicates_removed: usize,
    pub experience_imputed: usize,
    pub ratings_imputed: usize,
    pub rows_written: usize,
}

impl PipelineOrchestrator {
    pub fn new(storage: Arc<dyn Storage>, config: PipelineConfig) -> Self {
        Self { storage, config }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        info!(
            "🔄 Starting cleaning run from {}",
            self.config.source_path.display()
        );

        // Step 1: Extract — read the raw source file.
        info!("📄 Step 1: Extract");
        let batch = ingest::read_source(&self.config.source_path)?;
        let rows_ingested = batch.records.len();
        let mut run = PipelineRun::start(
            &self.config.source_path.display().to_string(),
            &batch.checksum,
        );

        // Step 2: Load — stage the raw rows unmodified.
        info!("📥 Step 2: Load staging table '{}'", self.config.staging_table);
        self.storage
            .replace_source_table(&self.config.staging_table, &batch.records)
            .await
            .context("failed to load staging table")?;

        // Transform works off the staged copy, not the in-memory batch.
        let staged = self
            .storage
            .load_source_table(&self.config.staging_table)
            .await
            .context("failed to read staging table")?;

        // Step 3: Normalize.
        info!("🔧 Step 3: Normalize");
        let normalized = Normalizer.normalize(staged);
        let normalize_warnings = normalized.warnings;

        // Step 4: Resolve duplicates.
        info!("🧹 Step 4: Resolve duplicates");
        let deduped = DuplicateResolver.resolve(normalized.records);
        let duplicates_removed = deduped.removed;
        info!("Removed {} duplicate records", duplicates_removed);

        // Step 5: Impute missing experience.
        info!("📈 Step 5: Impute years of experience");
        let experience = ExperienceImputer::new(self.config.min_training_rows)
            .apply(deduped.records)
            .context("experience imputation failed")?;

        // Step 6: Impute missing ratings.
        info!("🎯 Step 6: Impute performance ratings");
        let rated = RatingImputer::new(self.config.min_training_rows)
            .apply(experience.records)
            .context("rating imputation failed")?;

        // Step 7: Verify invariants before anything is persisted.
        verify_clean(&rated.records)?;

        // Step 8: Persist — the only write to the destination table.
        info!("💾 Step 8: Persist '{}'", self.config.clean_table);
        self.storage
            .replace_employee_table(&self.config.clean_table, &rated.records)
            .await
            .context("failed to write destination table")?;

        run.finished_at = Some(Utc::now());
        let summary = RunSummary {
            run,
            rows_ingested,
            normalize_warnings,
            duplicates_removed,
            experience_imputed: experience.imputed,
            ratings_imputed: rated.imputed,
            rows_written: rated.records.len(),
        };

        // Run-log failures are reported but never fail a completed run.
        if let Err(e) = run_log::append_rotating(Path::new("logs"), &summary) {
            warn!("failed to append run log: {e}");
        }

        info!(
            "✅ Cleaning run completed: {} ingested, {} written, {} duplicates removed",
            summary.rows_ingested, summary.rows_written, summary.duplicates_removed
        );
        Ok(summary)
    }
}

/// Final gate: the cleaned set must have both imputed fields populated on
/// every record.
fn verify_clean(records: &[EmployeeRecord]) -> std::result::Result<(), PipelineError> {
    for record in records {
        if record.years_experience.is_none() {
            return Err(PipelineError::Validation {
                field: "years_experience".to_string(),
                message: format!("null after imputation for employee {}", record.employee_id),
            });
        }
        if record.performance_rating.is_none() {
            return Err(PipelineError::Validation {
                field: "performance_rating".to_string(),
                message: format!("null after imputation for employee {}", record.employee_id),
            });
        }
    }
    Ok(())
}
