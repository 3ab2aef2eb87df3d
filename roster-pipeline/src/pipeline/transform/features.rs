use chrono::{NaiveDate, NaiveTime};
use ndarray::Array2;

use roster_core::common::error::{PipelineError, Result};
use roster_core::domain::EmployeeRecord;

/// Number of model features per record: experience, salary, join date,
/// department index, country index.
pub const FEATURE_COUNT: usize = 5;

/// Encodes records into numeric feature rows for the imputation models.
///
/// Label indices are fitted over the whole record set, not just the
/// training subset, so a prediction row can never present a department or
/// country the encoder has not seen. Missing salary and join date fall
/// back to the medians of the observed values; those fills exist only in
/// feature space and never leak back into the records.
#[derive(Debug)]
pub struct FeatureSpace {
    departments: Vec<String>,
    countries: Vec<String>,
    median_salary: f64,
    median_join_epoch: f64,
}

impl FeatureSpace {
    pub fn fit(records: &[EmployeeRecord]) -> Self {
        let mut departments: Vec<String> =
            records.iter().map(|r| r.department.clone()).collect();
        departments.sort();
        departments.dedup();

        let mut countries: Vec<String> = records.iter().map(|r| r.country.clone()).collect();
        countries.sort();
        countries.dedup();

        let salaries: Vec<f64> = records.iter().filter_map(|r| r.salary).collect();
        let join_epochs: Vec<f64> = records
            .iter()
            .filter_map(|r| r.date_of_joining)
            .map(epoch_seconds)
            .collect();

        Self {
            departments,
            countries,
            median_salary: median(&salaries),
            median_join_epoch: median(&join_epochs),
        }
    }

    pub fn feature_row(&self, record: &EmployeeRecord) -> [f64; FEATURE_COUNT] {
        [
            record.years_experience.unwrap_or(0.0),
            record.salary.unwrap_or(self.median_salary),
            record
                .date_of_joining
                .map(epoch_seconds)
                .unwrap_or(self.median_join_epoch),
            index_of(&self.departments, &record.department),
            index_of(&self.countries, &record.country),
        ]
    }

    pub fn matrix(&self, rows: &[&EmployeeRecord]) -> Result<Array2<f64>> {
        let flat: Vec<f64> = rows
            .iter()
            .flat_map(|record| self.feature_row(record))
            .collect();
        Array2::from_shape_vec((rows.len(), FEATURE_COUNT), flat).map_err(|e| {
            PipelineError::Model {
                message: format!("feature matrix shape error: {e}"),
            }
        })
    }
}

/// Join date as epoch seconds at midnight UTC.
pub fn epoch_seconds(date: NaiveDate) -> f64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp() as f64
}

fn index_of(index: &[String], value: &str) -> f64 {
    index
        .binary_search_by(|candidate| candidate.as_str().cmp(value))
        .unwrap_or(0) as f64
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}
