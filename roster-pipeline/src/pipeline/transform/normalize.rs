use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use tracing::warn;

use roster_core::domain::{EmployeeRecord, PerformanceRating, SourceRecord};

/// Canonical department vocabulary, keyed by the lowercased spellings seen
/// in the wild. Canonical values map to themselves so normalization is
/// idempotent.
static DEPARTMENT_MAP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("h r", "HR"),
        ("hr", "HR"),
        ("eng", "Engineering"),
        ("engineering", "Engineering"),
        ("it", "IT"),
        ("i t", "IT"),
        ("fin", "Finance"),
        ("finance", "Finance"),
        ("cust support", "Customer Support"),
        ("customer support", "Customer Support"),
        ("marketing", "Marketing"),
        ("sales", "Sales"),
        ("legal", "Legal"),
        ("logistics", "Logistics"),
        ("operations", "Operations"),
        ("unknown", "Unknown"),
    ])
});

/// Date spellings accepted from the source file, ISO first.
const DATE_FORMATS: [&str; 9] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
];

const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Per-field cleanup of raw source rows.
///
/// Every rule fails softly: a value that cannot be interpreted becomes
/// `None` (or a placeholder for the required string fields) with a warning,
/// never an error for the whole batch.
#[derive(Debug, Default)]
pub struct Normalizer;

/// A normalized batch plus the number of soft failures encountered.
#[derive(Debug)]
pub struct NormalizedBatch {
    pub records: Vec<EmployeeRecord>,
    pub warnings: usize,
}

impl Normalizer {
    pub fn normalize(&self, rows: Vec<SourceRecord>) -> NormalizedBatch {
        let mut warnings = 0;
        let records = rows
            .into_iter()
            .map(|row| self.normalize_record(row, &mut warnings))
            .collect();
        NormalizedBatch { records, warnings }
    }

    fn normalize_record(&self, row: SourceRecord, warnings: &mut usize) -> EmployeeRecord {
        let employee_id = row.employee_id.trim().to_string();

        let name = match row.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => title_case(name),
            _ => "Unknown Name".to_string(),
        };

        let department = normalize_department(row.department.as_deref());
        let country = normalize_country(row.country.as_deref());

        let date_of_joining = match row.date_of_joining.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => {
                let parsed = parse_date(raw);
                if parsed.is_none() {
                    warn!(employee_id = %employee_id, value = raw, "unparseable join date, left null");
                    *warnings += 1;
                }
                parsed
            }
            _ => None,
        };

        let years_experience =
            parse_number(row.years_experience.as_deref(), &employee_id, "years_experience", warnings);
        let salary = parse_number(row.salary.as_deref(), &employee_id, "salary", warnings);

        let performance_rating = match row.performance_rating.as_deref().map(str::trim) {
            Some(label) if !label.is_empty() => {
                let rating = PerformanceRating::from_label(label);
                if rating.is_none() {
                    warn!(employee_id = %employee_id, value = label, "unknown rating label, left null");
                    *warnings += 1;
                }
                rating
            }
            _ => None,
        };

        EmployeeRecord {
            employee_id,
            name,
            department,
            country,
            date_of_joining,
            years_experience,
            salary,
            performance_rating,
        }
    }
}

fn normalize_department(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(dept) if !dept.is_empty() => {
            let key = dept.to_lowercase();
            match DEPARTMENT_MAP.get(key.as_str()) {
                Some(canonical) => (*canonical).to_string(),
                // Unrecognized departments pass through title-cased.
                None => title_case(dept),
            }
        }
        _ => "Unknown".to_string(),
    }
}

fn normalize_country(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(country) if !country.is_empty() => capitalize(&country.to_lowercase()),
        _ => "Unknown".to_string(),
    }
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(date);
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(datetime.date());
        }
    }
    None
}

fn parse_number(
    raw: Option<&str>,
    employee_id: &str,
    field: &'static str,
    warnings: &mut usize,
) -> Option<f64> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty())?;
    match raw.parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(employee_id = %employee_id, field, value = raw, "unparseable number, left null");
            *warnings += 1;
            None
        }
    }
}

fn title_case(raw: &str) -> String {
    raw.split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_row() -> SourceRecord {
        SourceRecord {
            employee_id: "1".to_string(),
            name: Some(" john  smith ".to_string()),
            department: Some("eng".to_string()),
            country: Some("usa".to_string()),
            date_of_joining: Some("2020-01-15".to_string()),
            years_experience: Some("4".to_string()),
            salary: Some("85000".to_string()),
            performance_rating: Some("high performers".to_string()),
        }
    }

    /// Renders a cleaned record back into source form, for idempotence checks.
    fn to_source(record: &EmployeeRecord) -> SourceRecord {
        SourceRecord {
            employee_id: record.employee_id.clone(),
            name: Some(record.name.clone()),
            department: Some(record.department.clone()),
            country: Some(record.country.clone()),
            date_of_joining: record.date_of_joining.map(|d| d.format("%Y-%m-%d").to_string()),
            years_experience: record.years_experience.map(|v| v.to_string()),
            salary: record.salary.map(|v| v.to_string()),
            performance_rating: record.performance_rating.map(|r| r.as_label().to_string()),
        }
    }

    #[test]
    fn cleans_the_example_row() {
        let batch = Normalizer.normalize(vec![raw_row()]);
        let record = &batch.records[0];
        assert_eq!(record.name, "John Smith");
        assert_eq!(record.department, "Engineering");
        assert_eq!(record.country, "Usa");
        assert_eq!(record.date_of_joining, NaiveDate::from_ymd_opt(2020, 1, 15));
        assert_eq!(record.years_experience, Some(4.0));
        assert_eq!(record.performance_rating, Some(PerformanceRating::High));
        assert_eq!(batch.warnings, 0);
    }

    #[test]
    fn blank_fields_get_placeholders() {
        let row = SourceRecord {
            employee_id: "2".to_string(),
            name: Some("   ".to_string()),
            department: None,
            country: None,
            date_of_joining: None,
            years_experience: None,
            salary: None,
            performance_rating: None,
        };
        let batch = Normalizer.normalize(vec![row]);
        let record = &batch.records[0];
        assert_eq!(record.name, "Unknown Name");
        assert_eq!(record.department, "Unknown");
        assert_eq!(record.country, "Unknown");
        assert_eq!(record.date_of_joining, None);
    }

    #[test]
    fn accepts_a_variety_of_date_spellings() {
        for raw in [
            "2020-01-15",
            "2020/01/15",
            "01/15/2020",
            "15-01-2020",
            "Jan 15, 2020",
            "January 15, 2020",
            "15 Jan 2020",
            "2020-01-15 09:30:00",
        ] {
            assert_eq!(
                parse_date(raw),
                NaiveDate::from_ymd_opt(2020, 1, 15),
                "failed for {raw}"
            );
        }
    }

    #[test]
    fn bad_date_is_soft_null_not_an_error() {
        let mut row = raw_row();
        row.date_of_joining = Some("not a date".to_string());
        let batch = Normalizer.normalize(vec![row]);
        assert_eq!(batch.records[0].date_of_joining, None);
        assert_eq!(batch.warnings, 1);
    }

    #[test]
    fn unknown_department_passes_through_title_cased() {
        let mut row = raw_row();
        row.department = Some("quantum research".to_string());
        let batch = Normalizer.normalize(vec![row]);
        assert_eq!(batch.records[0].department, "Quantum Research");
    }

    #[test]
    fn unknown_rating_label_is_left_for_imputation() {
        let mut row = raw_row();
        row.performance_rating = Some("stellar".to_string());
        let batch = Normalizer.normalize(vec![row]);
        assert_eq!(batch.records[0].performance_rating, None);
        assert_eq!(batch.warnings, 1);
    }

    #[test]
    fn garbage_numbers_are_soft_null() {
        let mut row = raw_row();
        row.years_experience = Some("four".to_string());
        row.salary = Some("a lot".to_string());
        let batch = Normalizer.normalize(vec![row]);
        assert_eq!(batch.records[0].years_experience, None);
        assert_eq!(batch.records[0].salary, None);
        assert_eq!(batch.warnings, 2);
    }

    #[test]
    fn normalizing_normalized_output_is_a_no_op() {
        let first = Normalizer.normalize(vec![raw_row()]);
        let again = Normalizer.normalize(first.records.iter().map(to_source).collect());
        assert_eq!(again.records, first.records);
        assert_eq!(again.warnings, 0);
    }
}
