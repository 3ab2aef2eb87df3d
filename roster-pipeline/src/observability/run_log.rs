use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use chrono::Utc;

use crate::pipeline::RunSummary;

/// Append a run summary to a daily-rotated ndjson log under `log_dir`.
/// Pattern: run_YYYY-MM-DD.ndjson, one JSON line per completed run.
pub fn append_rotating(log_dir: &Path, summary: &RunSummary) -> anyhow::Result<()> {
    fs::create_dir_all(log_dir)?;

    let date_str = Utc::now().format("%Y-%m-%d");
    let target_path = log_dir.join(format!("run_{date_str}.ndjson"));

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&target_path)?;
    let line = serde_json::to_string(summary)?;
    writeln!(file, "{line}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use roster_core::domain::PipelineRun;

    #[test]
    fn appends_one_json_line_per_run() {
        let dir = tempfile::tempdir().unwrap();
        let summary = RunSummary {
            run: PipelineRun::start("data/employee_data_source.csv", "abc123"),
            rows_ingested: 10,
            normalize_warnings: 1,
            duplicates_removed: 2,
            experience_imputed: 3,
            ratings_imputed: 4,
            rows_written: 8,
        };

        append_rotating(dir.path(), &summary).unwrap();
        append_rotating(dir.path(), &summary).unwrap();

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
        let contents = fs::read_to_string(entries[0].as_ref().unwrap().path()).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        let parsed: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(parsed["rows_written"], 8);
    }
}
