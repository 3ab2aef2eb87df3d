use linfa::prelude::*;
use linfa::Dataset;
use linfa_linear::LinearRegression;
use ndarray::{Array1, Array2};
use tracing::{debug, info};

use roster_core::common::error::{PipelineError, Result};
use roster_core::domain::EmployeeRecord;

use super::features::epoch_seconds;
use super::ImputeOutcome;

/// Upper bound for a plausible tenure, in years.
const MAX_YEARS: f64 = 50.0;

/// Fills missing `years_experience` with a regression on the join date.
///
/// The model is fitted on records that carry both a join date and an
/// experience value. Predictions are rounded and clamped to
/// `0.0..=MAX_YEARS`; records with neither experience nor a parseable
/// join date fall back to zero.
#[derive(Debug)]
pub struct ExperienceImputer {
    min_training_rows: usize,
}

impl ExperienceImputer {
    pub fn new(min_training_rows: usize) -> Self {
        Self { min_training_rows }
    }

    pub fn apply(&self, mut records: Vec<EmployeeRecord>) -> Result<ImputeOutcome> {
        let train: Vec<(f64, f64)> = records
            .iter()
            .filter_map(|r| match (r.date_of_joining, r.years_experience) {
                (Some(date), Some(years)) => Some((epoch_seconds(date), years)),
                _ => None,
            })
            .collect();

        if records.iter().all(|r| r.years_experience.is_some()) {
            return Ok(ImputeOutcome {
                records,
                imputed: 0,
            });
        }

        if train.len() < self.min_training_rows {
            return Err(PipelineError::InsufficientData {
                stage: "experience imputer",
                available: train.len(),
                required: self.min_training_rows,
            });
        }

        let mut imputed = 0;
        let constant_target = train.iter().all(|(_, y)| *y == train[0].1);
        if constant_target {
            // Nothing to regress on; fill with the single observed value.
            debug!(value = train[0].1, "constant experience targets, filling directly");
            for record in records.iter_mut().filter(|r| r.years_experience.is_none()) {
                record.years_experience = Some(clamp_years(train[0].1));
                imputed += 1;
            }
        } else {
            let x = Array2::from_shape_vec(
                (train.len(), 1),
                train.iter().map(|(epoch, _)| *epoch).collect(),
            )
            .map_err(|e| PipelineError::Model {
                message: format!("training matrix shape error: {e}"),
            })?;
            let y = Array1::from_iter(train.iter().map(|(_, years)| *years));
            let model = LinearRegression::new()
                .fit(&Dataset::new(x, y))
                .map_err(|e| PipelineError::Model {
                    message: format!("experience regression failed: {e}"),
                })?;

            let missing: Vec<usize> = records
                .iter()
                .enumerate()
                .filter(|(_, r)| r.years_experience.is_none() && r.date_of_joining.is_some())
                .map(|(i, _)| i)
                .collect();
            if !missing.is_empty() {
                let flat: Vec<f64> = missing
                    .iter()
                    .filter_map(|&i| records[i].date_of_joining)
                    .map(epoch_seconds)
                    .collect();
                let features = Array2::from_shape_vec((missing.len(), 1), flat).map_err(|e| {
                    PipelineError::Model {
                        message: format!("prediction matrix shape error: {e}"),
                    }
                })?;
                let predictions = model.predict(&features);
                for (&index, &prediction) in missing.iter().zip(predictions.iter()) {
                    records[index].years_experience = Some(clamp_years(prediction));
                    imputed += 1;
                }
            }
        }

        // No join date to predict from; default to zero tenure.
        for record in records.iter_mut().filter(|r| r.years_experience.is_none()) {
            record.years_experience = Some(0.0);
            imputed += 1;
        }

        info!(imputed, trained_on = train.len(), "experience imputation complete");
        Ok(ImputeOutcome { records, imputed })
    }
}

fn clamp_years(value: f64) -> f64 {
    value.round().clamp(0.0, MAX_YEARS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(id: u32, year: i32, years_experience: Option<f64>) -> EmployeeRecord {
        EmployeeRecord {
            employee_id: id.to_string(),
            name: "Test Person".to_string(),
            department: "Engineering".to_string(),
            country: "Usa".to_string(),
            date_of_joining: NaiveDate::from_ymd_opt(year, 6, 1),
            years_experience,
            salary: None,
            performance_rating: None,
        }
    }

    /// Longer tenure for earlier joiners, one year per calendar year.
    fn training_set() -> Vec<EmployeeRecord> {
        (0..12)
            .map(|i| record(i, 2010 + i as i32, Some((12 - i) as f64)))
            .collect()
    }

    #[test]
    fn fills_every_missing_value() {
        let mut records = training_set();
        records.push(record(100, 2015, None));
        records.push(EmployeeRecord {
            date_of_joining: None,
            ..record(101, 2015, None)
        });

        let outcome = ExperienceImputer::new(10).apply(records).unwrap();
        assert_eq!(outcome.imputed, 2);
        assert!(outcome.records.iter().all(|r| r.years_experience.is_some()));
    }

    #[test]
    fn predictions_are_plausible() {
        let mut records = training_set();
        records.push(record(100, 2015, None));

        let outcome = ExperienceImputer::new(10).apply(records).unwrap();
        let predicted = outcome.records.last().unwrap().years_experience.unwrap();
        assert!((0.0..=MAX_YEARS).contains(&predicted));
        // 2015 sits in the middle of the 2010..2021 training span.
        assert!((4.0..=10.0).contains(&predicted), "got {predicted}");
        assert_eq!(predicted, predicted.round());
    }

    #[test]
    fn too_few_training_rows_is_insufficient_data() {
        let records = vec![record(1, 2020, Some(2.0)), record(2, 2021, None)];
        let err = ExperienceImputer::new(10).apply(records).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InsufficientData {
                stage: "experience imputer",
                available: 1,
                required: 10,
            }
        ));
    }

    #[test]
    fn complete_input_short_circuits_the_threshold() {
        let records = vec![record(1, 2020, Some(2.0))];
        let outcome = ExperienceImputer::new(10).apply(records).unwrap();
        assert_eq!(outcome.imputed, 0);
    }

    #[test]
    fn constant_targets_fill_without_a_model() {
        let mut records: Vec<_> = (0..10).map(|i| record(i, 2010 + i as i32, Some(5.0))).collect();
        records.push(record(100, 2018, None));
        let outcome = ExperienceImputer::new(10).apply(records).unwrap();
        assert_eq!(outcome.records.last().unwrap().years_experience, Some(5.0));
    }

    #[test]
    fn no_join_date_falls_back_to_zero() {
        let mut records = training_set();
        records.push(EmployeeRecord {
            date_of_joining: None,
            ..record(100, 2015, None)
        });
        let outcome = ExperienceImputer::new(10).apply(records).unwrap();
        assert_eq!(outcome.records.last().unwrap().years_experience, Some(0.0));
    }
}
