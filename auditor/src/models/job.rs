//! Typed records for everything crossing the warehouse-client boundary.
//!
//! Every row shape is deserialized exactly once, here; downstream components
//! never inspect the origin shape of a record.

use serde::{Deserialize, Serialize};

/// One audited query execution from the job-history source.
///
/// `billed_gb` and `duration_seconds` are nullable in the source and are
/// treated as 0.0 / 0 for ranking purposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub job_id: String,
    pub query: String,
    pub region_name: String,
    #[serde(default)]
    pub billed_gb: Option<f64>,
    #[serde(default)]
    pub duration_seconds: Option<i64>,
    #[serde(default)]
    pub slot_hours: Option<f64>,
    #[serde(default)]
    pub source_type: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub referenced_tables: Vec<TableRef>,
}

impl JobRecord {
    pub fn billed_gb_or_zero(&self) -> f64 {
        self.billed_gb.unwrap_or(0.0)
    }

    pub fn duration_or_zero(&self) -> i64 {
        self.duration_seconds.unwrap_or(0)
    }
}

/// Table identifier triple as recorded in job history. Any part may be
/// missing; schema lookup skips incomplete references.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TableRef {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub dataset_id: Option<String>,
    #[serde(default)]
    pub table_id: Option<String>,
}

/// Dataset listing entry from the warehouse metadata API.
#[derive(Debug, Clone, Deserialize)]
pub struct DatasetInfo {
    pub id: String,
    #[serde(default)]
    pub location: Option<String>,
}

/// Table metadata used for schema enrichment.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TableMeta {
    pub time_partitioning: Option<TimePartitioning>,
    pub clustering_fields: Option<Vec<String>>,
    pub schema: Vec<ColumnSchema>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TimePartitioning {
    #[serde(default)]
    pub field: Option<String>,
    #[serde(rename = "type")]
    pub partition_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub field_type: String,
}

/// One row of the per-region storage-cost analysis result.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageRow {
    pub dataset_name: String,
    pub logical_gb: f64,
    pub physical_gb: f64,
    pub compression_ratio: f64,
    pub recommendation: String,
}

/// Accepted storage-analysis result for one region.
#[derive(Debug, Clone)]
pub struct StorageProposal {
    pub region: String,
    pub table_markdown: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionUserRow {
    pub user_email: String,
}

/// One master-dictionary row: an anti-pattern name with its problem and
/// remediation text.
#[derive(Debug, Clone, Deserialize)]
pub struct DictionaryRow {
    pub pattern_name: String,
    pub problem_description: String,
    pub best_practice: String,
}
