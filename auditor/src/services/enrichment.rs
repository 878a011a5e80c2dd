use crate::models::{JobRecord, TableMeta, TableRef};
use crate::services::analyzer_client::AnalyzerClient;
use crate::services::dictionary::MasterDictionary;
use crate::services::warehouse_client::WarehouseClient;

/// Substituted when a job references no tables, or none could be resolved.
pub const NO_TABLES_SENTINEL: &str = "No referenced-table information was available.";

/// Everything gathered for one selected job ahead of prompt assembly.
#[derive(Debug, Clone)]
pub struct JobEnrichment {
    pub schema_info_text: String,
    pub antipattern_raw_text: String,
    pub master_dict_text: String,
}

/// Per-job context gathering: referenced-table schemas, analyzer findings
/// and the narrowed master-dictionary excerpt. Every lookup is tolerant of
/// partial failure; enrichment itself never fails a job.
pub struct JobEnricher<'a> {
    warehouse: &'a WarehouseClient,
    analyzer: &'a AnalyzerClient,
    dictionary: &'a MasterDictionary,
}

impl<'a> JobEnricher<'a> {
    pub fn new(
        warehouse: &'a WarehouseClient,
        analyzer: &'a AnalyzerClient,
        dictionary: &'a MasterDictionary,
    ) -> Self {
        Self { warehouse, analyzer, dictionary }
    }

    pub async fn enrich(&self, job: &JobRecord) -> JobEnrichment {
        let schema_info_text = self.schema_info(&job.referenced_tables).await;
        let antipattern_raw_text = self.analyzer.analyze(&job.query).await;
        let master_dict_text = self.dictionary.narrow(&antipattern_raw_text);

        JobEnrichment { schema_info_text, antipattern_raw_text, master_dict_text }
    }

    /// One descriptive block per referenced table. A table whose metadata
    /// cannot be fetched (permissions, missing table) yields a degraded
    /// block instead of aborting the job's enrichment.
    async fn schema_info(&self, referenced_tables: &[TableRef]) -> String {
        if referenced_tables.is_empty() {
            return NO_TABLES_SENTINEL.to_string();
        }

        let mut blocks = Vec::new();
        for table_ref in referenced_tables {
            let (Some(project), Some(dataset), Some(table)) =
                (&table_ref.project_id, &table_ref.dataset_id, &table_ref.table_id)
            else {
                continue;
            };

            let name = format!("{}.{}.{}", project, dataset, table);
            match self.warehouse.table_meta(project, dataset, table).await {
                Ok(meta) => blocks.push(format_table_block(&name, &meta)),
                Err(e) => {
                    tracing::warn!("Failed to get schema for {}: {}", table, e);
                    blocks.push(format!(
                        "■ Table: {} (schema lookup failed, e.g. insufficient permissions)",
                        table
                    ));
                },
            }
        }

        if blocks.is_empty() {
            NO_TABLES_SENTINEL.to_string()
        } else {
            blocks.join("\n\n")
        }
    }
}

/// Render one table's partitioning, clustering and column list.
fn format_table_block(name: &str, meta: &TableMeta) -> String {
    let mut info = vec![format!("■ Table: {}", name)];

    match &meta.time_partitioning {
        Some(partitioning) => {
            let field = partitioning.field.as_deref().unwrap_or("_PARTITIONTIME");
            info.push(format!(
                "  - Partition column: {} (granularity: {})",
                field, partitioning.partition_type
            ));
        },
        None => info.push("  - Partitioning: none (full scan risk)".to_string()),
    }

    if let Some(fields) = &meta.clustering_fields {
        if !fields.is_empty() {
            info.push(format!("  - Clustering columns: {}", fields.join(", ")));
        }
    }

    let columns: Vec<String> =
        meta.schema.iter().map(|field| format!("{} ({})", field.name, field.field_type)).collect();
    info.push(format!("  - Columns: {}", columns.join(", ")));

    info.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalyzerConfig, WarehouseConfig};
    use crate::models::{ColumnSchema, TimePartitioning};

    #[test]
    fn test_table_block_with_partition_and_clustering() {
        let meta = TableMeta {
            time_partitioning: Some(TimePartitioning {
                field: Some("event_date".to_string()),
                partition_type: "DAY".to_string(),
            }),
            clustering_fields: Some(vec!["customer_id".to_string(), "region".to_string()]),
            schema: vec![
                ColumnSchema { name: "event_date".to_string(), field_type: "DATE".to_string() },
                ColumnSchema { name: "customer_id".to_string(), field_type: "STRING".to_string() },
            ],
        };
        let block = format_table_block("p.d.events", &meta);

        assert!(block.contains("■ Table: p.d.events"));
        assert!(block.contains("Partition column: event_date (granularity: DAY)"));
        assert!(block.contains("Clustering columns: customer_id, region"));
        assert!(block.contains("event_date (DATE), customer_id (STRING)"));
    }

    #[test]
    fn test_table_block_without_partitioning_flags_full_scan_risk() {
        let meta = TableMeta {
            time_partitioning: None,
            clustering_fields: None,
            schema: vec![ColumnSchema { name: "id".to_string(), field_type: "INT64".to_string() }],
        };
        let block = format_table_block("p.d.t", &meta);

        assert!(block.contains("Partitioning: none (full scan risk)"));
        assert!(!block.contains("Clustering columns"));
    }

    #[test]
    fn test_unnamed_partition_column_uses_pseudocolumn() {
        let meta = TableMeta {
            time_partitioning: Some(TimePartitioning {
                field: None,
                partition_type: "DAY".to_string(),
            }),
            clustering_fields: None,
            schema: Vec::new(),
        };
        let block = format_table_block("p.d.t", &meta);
        assert!(block.contains("Partition column: _PARTITIONTIME"));
    }

    #[tokio::test]
    async fn test_no_referenced_tables_yields_sentinel() {
        let warehouse = WarehouseClient::new(&WarehouseConfig::default());
        let analyzer = AnalyzerClient::new(&AnalyzerConfig::default());
        let dictionary = MasterDictionary::default();
        let enricher = JobEnricher::new(&warehouse, &analyzer, &dictionary);

        assert_eq!(enricher.schema_info(&[]).await, NO_TABLES_SENTINEL);
    }

    #[tokio::test]
    async fn test_incomplete_table_refs_yield_sentinel() {
        let warehouse = WarehouseClient::new(&WarehouseConfig::default());
        let analyzer = AnalyzerClient::new(&AnalyzerConfig::default());
        let dictionary = MasterDictionary::default();
        let enricher = JobEnricher::new(&warehouse, &analyzer, &dictionary);

        let refs = vec![TableRef {
            project_id: Some("p".to_string()),
            dataset_id: None,
            table_id: Some("t".to_string()),
        }];
        assert_eq!(enricher.schema_info(&refs).await, NO_TABLES_SENTINEL);
    }
}
