use std::collections::HashMap;

use linfa::prelude::*;
use linfa::Dataset;
use linfa_trees::{DecisionTree, SplitQuality};
use ndarray::Array1;
use tracing::{debug, info};

use roster_core::common::error::{PipelineError, Result};
use roster_core::domain::{EmployeeRecord, PerformanceRating};

use super::features::FeatureSpace;
use super::ImputeOutcome;

/// Fills missing `performance_rating` with a decision-tree classifier.
///
/// Features are experience, salary, join date, and the department/country
/// label indices; targets are the closed rating label set. When the
/// training rows carry only a single class there is nothing to learn and
/// the majority class is filled in directly. Decoded predictions always
/// come from the `PerformanceRating` encoding, so an out-of-vocabulary
/// label cannot be produced.
#[derive(Debug)]
pub struct RatingImputer {
    min_training_rows: usize,
}

impl RatingImputer {
    pub fn new(min_training_rows: usize) -> Self {
        Self { min_training_rows }
    }

    pub fn apply(&self, mut records: Vec<EmployeeRecord>) -> Result<ImputeOutcome> {
        let missing: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.performance_rating.is_none())
            .map(|(i, _)| i)
            .collect();
        if missing.is_empty() {
            return Ok(ImputeOutcome {
                records,
                imputed: 0,
            });
        }

        let labeled: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.performance_rating.is_some())
            .map(|(i, _)| i)
            .collect();
        if labeled.len() < self.min_training_rows {
            return Err(PipelineError::InsufficientData {
                stage: "rating imputer",
                available: labeled.len(),
                required: self.min_training_rows,
            });
        }

        let mut class_counts: HashMap<usize, usize> = HashMap::new();
        for &index in &labeled {
            if let Some(rating) = records[index].performance_rating {
                *class_counts.entry(rating.index()).or_insert(0) += 1;
            }
        }

        let imputed = missing.len();
        if class_counts.len() <= 1 {
            // A single observed class; fitting a tree would just memorize it.
            let majority = majority_class(&class_counts)?;
            debug!(class = %majority, "single rating class in training data, filling directly");
            for &index in &missing {
                records[index].performance_rating = Some(majority);
            }
        } else {
            let space = FeatureSpace::fit(&records);

            let train_rows: Vec<&EmployeeRecord> = labeled.iter().map(|&i| &records[i]).collect();
            let x_train = space.matrix(&train_rows)?;
            let y_train = Array1::from_iter(labeled.iter().filter_map(|&i| {
                records[i].performance_rating.map(|rating| rating.index())
            }));

            let model = DecisionTree::params()
                .split_quality(SplitQuality::Gini)
                .max_depth(Some(16))
                .fit(&Dataset::new(x_train, y_train))
                .map_err(|e| PipelineError::Model {
                    message: format!("rating classifier failed: {e}"),
                })?;

            let missing_rows: Vec<&EmployeeRecord> = missing.iter().map(|&i| &records[i]).collect();
            let x_missing = space.matrix(&missing_rows)?;
            let predictions = model.predict(&x_missing);
            for (&index, &class) in missing.iter().zip(predictions.iter()) {
                let rating =
                    PerformanceRating::from_index(class).ok_or_else(|| PipelineError::Model {
                        message: format!("classifier produced unknown class index {class}"),
                    })?;
                records[index].performance_rating = Some(rating);
            }
        }

        info!(imputed, trained_on = labeled.len(), "rating imputation complete");
        Ok(ImputeOutcome { records, imputed })
    }
}

fn majority_class(class_counts: &HashMap<usize, usize>) -> Result<PerformanceRating> {
    class_counts
        .iter()
        .max_by_key(|(_, count)| **count)
        .and_then(|(&class, _)| PerformanceRating::from_index(class))
        .ok_or_else(|| PipelineError::Model {
            message: "no rating classes in training data".to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(
        id: u32,
        years_experience: f64,
        salary: f64,
        rating: Option<PerformanceRating>,
    ) -> EmployeeRecord {
        EmployeeRecord {
            employee_id: id.to_string(),
            name: "Test Person".to_string(),
            department: if years_experience > 6.0 { "Engineering" } else { "Sales" }.to_string(),
            country: "Usa".to_string(),
            date_of_joining: NaiveDate::from_ymd_opt(2018, 6, 1),
            years_experience: Some(years_experience),
            salary: Some(salary),
            performance_rating: rating,
        }
    }

    /// Low experience/salary rows are Low performers, high ones are Top.
    fn training_set() -> Vec<EmployeeRecord> {
        let mut records = Vec::new();
        for i in 0..6 {
            records.push(record(i, 1.0 + i as f64 * 0.1, 40_000.0, Some(PerformanceRating::Low)));
        }
        for i in 6..12 {
            records.push(record(i, 10.0 + i as f64 * 0.1, 120_000.0, Some(PerformanceRating::Top)));
        }
        records
    }

    #[test]
    fn fills_every_missing_rating_within_the_label_set() {
        let mut records = training_set();
        records.push(record(100, 1.2, 41_000.0, None));
        records.push(record(101, 11.0, 125_000.0, None));

        let outcome = RatingImputer::new(10).apply(records).unwrap();
        assert_eq!(outcome.imputed, 2);
        for record in &outcome.records {
            let rating = record.performance_rating.expect("rating filled");
            assert!(PerformanceRating::ALL.contains(&rating));
        }
    }

    #[test]
    fn predictions_follow_the_training_signal() {
        let mut records = training_set();
        records.push(record(100, 1.2, 41_000.0, None));
        records.push(record(101, 11.0, 125_000.0, None));

        let outcome = RatingImputer::new(10).apply(records).unwrap();
        let low = &outcome.records[outcome.records.len() - 2];
        let top = &outcome.records[outcome.records.len() - 1];
        assert_eq!(low.performance_rating, Some(PerformanceRating::Low));
        assert_eq!(top.performance_rating, Some(PerformanceRating::Top));
    }

    #[test]
    fn too_few_labeled_rows_is_insufficient_data() {
        let records = vec![
            record(1, 2.0, 50_000.0, Some(PerformanceRating::Average)),
            record(2, 3.0, 55_000.0, None),
        ];
        let err = RatingImputer::new(10).apply(records).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::InsufficientData {
                stage: "rating imputer",
                available: 1,
                required: 10,
            }
        ));
    }

    #[test]
    fn complete_input_short_circuits_the_threshold() {
        let records = vec![record(1, 2.0, 50_000.0, Some(PerformanceRating::Average))];
        let outcome = RatingImputer::new(10).apply(records).unwrap();
        assert_eq!(outcome.imputed, 0);
    }

    #[test]
    fn single_class_training_data_fills_that_class() {
        let mut records: Vec<_> = (0..10)
            .map(|i| record(i, 5.0, 60_000.0, Some(PerformanceRating::Average)))
            .collect();
        records.push(record(100, 5.0, 60_000.0, None));

        let outcome = RatingImputer::new(10).apply(records).unwrap();
        assert_eq!(
            outcome.records.last().unwrap().performance_rating,
            Some(PerformanceRating::Average)
        );
    }
}
