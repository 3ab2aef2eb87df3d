use std::path::Path;

use serde::Deserialize;
use sha2::{Digest, Sha256};
use tracing::info;

use roster_core::common::error::{PipelineError, Result};
use roster_core::domain::SourceRecord;

/// The raw rows read from one source file, plus its content checksum for
/// run provenance.
#[derive(Debug)]
pub struct SourceBatch {
    pub records: Vec<SourceRecord>,
    pub checksum: String,
}

/// One row of the source file, named after the headers the HR export uses.
/// Empty cells deserialize to `None`; nothing is interpreted here.
#[derive(Debug, Deserialize)]
struct SourceRow {
    #[serde(rename = "Employee ID")]
    employee_id: String,
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "Department")]
    department: Option<String>,
    #[serde(rename = "Country")]
    country: Option<String>,
    #[serde(rename = "Date of Joining")]
    date_of_joining: Option<String>,
    #[serde(rename = "Years of Experience")]
    years_experience: Option<String>,
    #[serde(rename = "Salary")]
    salary: Option<String>,
    #[serde(rename = "Performance Rating")]
    performance_rating: Option<String>,
}

impl From<SourceRow> for SourceRecord {
    fn from(row: SourceRow) -> Self {
        SourceRecord {
            employee_id: row.employee_id,
            name: row.name,
            department: row.department,
            country: row.country,
            date_of_joining: row.date_of_joining,
            years_experience: row.years_experience,
            salary: row.salary,
            performance_rating: row.performance_rating,
        }
    }
}

/// Read the delimited source file into raw records.
///
/// A missing file or a structurally malformed one (wrong headers, rows that
/// cannot be decoded) fails the whole read; garbage inside individual cells
/// is kept verbatim for the transform stages to deal with.
pub fn read_source(path: &Path) -> Result<SourceBatch> {
    let bytes = std::fs::read(path).map_err(|e| PipelineError::Read {
        message: format!("cannot read source file {}: {e}", path.display()),
    })?;

    let checksum = {
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        hex::encode(hasher.finalize())
    };

    let mut reader = csv::Reader::from_reader(bytes.as_slice());
    let mut records = Vec::new();
    for (index, row) in reader.deserialize::<SourceRow>().enumerate() {
        let row = row.map_err(|e| PipelineError::Read {
            message: format!("malformed source row {}: {e}", index + 1),
        })?;
        records.push(SourceRecord::from(row));
    }

    info!(
        path = %path.display(),
        rows = records.len(),
        checksum = %checksum,
        "source file ingested"
    );
    Ok(SourceBatch { records, checksum })
}
