use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::debug;

use roster_core::domain::EmployeeRecord;

/// Removes duplicate records after normalization.
///
/// Records are grouped by business key (lowercased name, lowercased
/// department, join date); the first-seen member of each group is retained
/// and the rest are discarded, matching the source-order retention of the
/// upstream export. A later record reusing an already-seen non-blank
/// employee id is also discarded, which keeps ids unique in the output.
/// Running the resolver on already-deduplicated input is a no-op.
#[derive(Debug, Default)]
pub struct DuplicateResolver;

#[derive(Debug)]
pub struct DedupOutcome {
    pub records: Vec<EmployeeRecord>,
    pub removed: usize,
}

type BusinessKey = (String, String, Option<NaiveDate>);

impl DuplicateResolver {
    pub fn resolve(&self, records: Vec<EmployeeRecord>) -> DedupOutcome {
        let total = records.len();
        let mut seen_keys: HashSet<BusinessKey> = HashSet::new();
        let mut seen_ids: HashSet<String> = HashSet::new();
        let mut kept = Vec::with_capacity(total);

        for record in records {
            let key = business_key(&record);
            if seen_keys.contains(&key) {
                debug!(employee_id = %record.employee_id, name = %record.name, "dropping duplicate record");
                continue;
            }
            if !record.employee_id.is_empty() && seen_ids.contains(&record.employee_id) {
                debug!(employee_id = %record.employee_id, "dropping record with duplicate id");
                continue;
            }
            seen_keys.insert(key);
            if !record.employee_id.is_empty() {
                seen_ids.insert(record.employee_id.clone());
            }
            kept.push(record);
        }

        DedupOutcome {
            removed: total - kept.len(),
            records: kept,
        }
    }
}

fn business_key(record: &EmployeeRecord) -> BusinessKey {
    (
        record.name.to_lowercase(),
        record.department.to_lowercase(),
        record.date_of_joining,
    )
}
