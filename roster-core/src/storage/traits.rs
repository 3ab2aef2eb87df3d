use crate::common::error::Result;
use crate::domain::{EmployeeRecord, SourceRecord};
use async_trait::async_trait;

/// Storage collaborator for the pipeline's two tables.
///
/// The staging table holds raw rows exactly as ingested; the employee table
/// holds cleaned records. Both `replace_*` operations overwrite any prior
/// content atomically, so readers never observe a half-written table.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn replace_source_table(&self, table: &str, rows: &[SourceRecord]) -> Result<()>;
    async fn load_source_table(&self, table: &str) -> Result<Vec<SourceRecord>>;

    async fn replace_employee_table(&self, table: &str, rows: &[EmployeeRecord]) -> Result<()>;
    async fn load_employee_table(&self, table: &str) -> Result<Vec<EmployeeRecord>>;
}
