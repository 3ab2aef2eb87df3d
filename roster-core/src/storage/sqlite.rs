use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rusqlite::{params, Connection};
use tracing::debug;

use crate::common::error::{PipelineError, Result};
use crate::domain::{EmployeeRecord, PerformanceRating, SourceRecord};
use crate::storage::traits::Storage;

/// SQLite-backed storage.
///
/// A connection is opened per operation; the pipeline touches storage at
/// most a handful of times per run, so there is nothing to pool. Each
/// `replace_*` runs as a single transaction (drop, create, insert), which
/// gives atomic replacement of the table contents.
pub struct SqliteStorage {
    path: PathBuf,
}

impl SqliteStorage {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        Ok(conn)
    }
}

/// Table names are interpolated into DDL, so they are restricted to
/// identifier characters.
fn check_table_name(table: &str) -> Result<()> {
    let valid = !table.is_empty()
        && table
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(PipelineError::Validation {
            field: "table".to_string(),
            message: format!("invalid table name: {table:?}"),
        })
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn replace_source_table(&self, table: &str, rows: &[SourceRecord]) -> Result<()> {
        check_table_name(table)?;
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table};
             CREATE TABLE {table} (
                 employee_id        TEXT NOT NULL,
                 name               TEXT,
                 department         TEXT,
                 country            TEXT,
                 date_of_joining    TEXT,
                 years_experience   TEXT,
                 salary             TEXT,
                 performance_rating TEXT
             );"
        ))?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {table} (employee_id, name, department, country, date_of_joining,
                                      years_experience, salary, performance_rating)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
            ))?;
            for row in rows {
                stmt.execute(params![
                    row.employee_id,
                    row.name,
                    row.department,
                    row.country,
                    row.date_of_joining,
                    row.years_experience,
                    row.salary,
                    row.performance_rating,
                ])?;
            }
        }
        tx.commit()?;
        debug!(table, rows = rows.len(), "replaced source table");
        Ok(())
    }

    async fn load_source_table(&self, table: &str) -> Result<Vec<SourceRecord>> {
        check_table_name(table)?;
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT employee_id, name, department, country, date_of_joining,
                    years_experience, salary, performance_rating
             FROM {table}"
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok(SourceRecord {
                employee_id: row.get(0)?,
                name: row.get(1)?,
                department: row.get(2)?,
                country: row.get(3)?,
                date_of_joining: row.get(4)?,
                years_experience: row.get(5)?,
                salary: row.get(6)?,
                performance_rating: row.get(7)?,
            })
        })?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }

    async fn replace_employee_table(&self, table: &str, rows: &[EmployeeRecord]) -> Result<()> {
        check_table_name(table)?;
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        tx.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table};
             CREATE TABLE {table} (
                 employee_id        TEXT NOT NULL,
                 name               TEXT NOT NULL,
                 department         TEXT NOT NULL,
                 country            TEXT NOT NULL,
                 date_of_joining    TEXT,
                 years_experience   REAL,
                 salary             REAL,
                 performance_rating TEXT
             );"
        ))?;
        {
            let mut stmt = tx.prepare(&format!(
                "INSERT INTO {table} (employee_id, name, department, country, date_of_joining,
                                      years_experience, salary, performance_rating)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)"
            ))?;
            for row in rows {
                stmt.execute(params![
                    row.employee_id,
                    row.name,
                    row.department,
                    row.country,
                    row.date_of_joining,
                    row.years_experience,
                    row.salary,
                    row.performance_rating.map(|r| r.as_label()),
                ])?;
            }
        }
        tx.commit()?;
        debug!(table, rows = rows.len(), "replaced employee table");
        Ok(())
    }

    async fn load_employee_table(&self, table: &str) -> Result<Vec<EmployeeRecord>> {
        check_table_name(table)?;
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT employee_id, name, department, country, date_of_joining,
                    years_experience, salary, performance_rating
             FROM {table}"
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, Option<chrono::NaiveDate>>(4)?,
                row.get::<_, Option<f64>>(5)?,
                row.get::<_, Option<f64>>(6)?,
                row.get::<_, Option<String>>(7)?,
            ))
        })?;
        let mut records = Vec::new();
        for row in rows {
            let (employee_id, name, department, country, date_of_joining, years, salary, rating) =
                row?;
            let performance_rating = match rating {
                Some(label) => Some(PerformanceRating::from_label(&label).ok_or_else(|| {
                    PipelineError::Validation {
                        field: "performance_rating".to_string(),
                        message: format!("unknown stored label: {label}"),
                    }
                })?),
                None => None,
            };
            records.push(EmployeeRecord {
                employee_id,
                name,
                department,
                country,
                date_of_joining,
                years_experience: years,
                salary,
                performance_rating,
            });
        }
        Ok(records)
    }
}
