//! Per-region collection: storage-cost analysis and worst-query extraction.
//!
//! Regions are processed one at a time and fail independently: a region
//! whose query errors contributes zero jobs and zero storage proposals
//! without stopping the run.

use crate::models::{JobRecord, StorageProposal, StorageRow};
use crate::services::time_window::TimeWindow;
use crate::services::warehouse_client::WarehouseClient;
use crate::utils::{templates, AuditResult};
use std::collections::{BTreeSet, HashMap};

/// Inputs shared by every per-region collection pass.
pub struct CollectorContext<'a> {
    pub client: &'a WarehouseClient,
    pub source_project: &'a str,
    pub target_project: &'a str,
    /// Executing account, excluded from the worst-query extraction.
    pub analyzer_email: &'a str,
    pub window: &'a TimeWindow,
    /// Bounds each region's contribution to the merge; not the global limit.
    pub per_region_limit: usize,
    pub worst_ranking_sql: &'a str,
    pub storage_analysis_sql: &'a str,
}

/// Merged output of the collection phase.
#[derive(Debug, Default)]
pub struct CollectionOutcome {
    pub jobs: Vec<JobRecord>,
    pub proposals: Vec<StorageProposal>,
}

pub async fn collect_regions(
    ctx: &CollectorContext<'_>,
    regions: &BTreeSet<String>,
) -> CollectionOutcome {
    let mut outcome = CollectionOutcome::default();

    for region in regions {
        if let Some(proposal) = analyze_storage_pricing(ctx, region).await {
            outcome.proposals.push(proposal);
        }

        tracing::info!("[{}] Start extracting the worst queries...", region);
        match collect_worst_jobs(ctx, region).await {
            Ok(mut jobs) => {
                tracing::info!("[{}] Extracted {} job(s)", region, jobs.len());
                outcome.jobs.append(&mut jobs);
            },
            Err(e) => tracing::error!("Error in {}: {}", region, e),
        }
    }

    outcome
}

/// Storage pricing-model review for one region. Only a successful, non-empty
/// result becomes a proposal; everything else is logged and skipped.
async fn analyze_storage_pricing(
    ctx: &CollectorContext<'_>,
    region: &str,
) -> Option<StorageProposal> {
    let params = HashMap::from([
        ("target_project", ctx.target_project.to_string()),
        ("region", region.to_string()),
    ]);
    let sql = match templates::render(ctx.storage_analysis_sql, &params) {
        Ok(sql) => sql,
        Err(e) => {
            tracing::error!("Storage analysis template error: {}", e);
            return None;
        },
    };

    let rows = match ctx.client.query::<StorageRow>(ctx.source_project, &sql, Some(region)).await {
        Ok(rows) => rows,
        Err(e) => {
            tracing::error!("Storage analysis failed in {}: {}", region, e);
            return None;
        },
    };

    if rows.is_empty() {
        tracing::info!("No storage data to review in {}", region);
        return None;
    }

    Some(StorageProposal {
        region: region.to_string(),
        table_markdown: storage_table_markdown(&rows),
    })
}

/// Markdown table over the storage-analysis rows (numeric columns
/// right-aligned).
fn storage_table_markdown(rows: &[StorageRow]) -> String {
    let mut lines = vec![
        "| Dataset | Logical (GB) | Physical (GB) | Compression | Recommended action |"
            .to_string(),
        "|---|--:|--:|--:|---|".to_string(),
    ];
    for row in rows {
        lines.push(format!(
            "| `{}` | {:.2} | {:.2} | {:.2} | *{}* |",
            row.dataset_name,
            row.logical_gb,
            row.physical_gb,
            row.compression_ratio,
            row.recommendation
        ));
    }
    lines.join("\n")
}

async fn collect_worst_jobs(
    ctx: &CollectorContext<'_>,
    region: &str,
) -> AuditResult<Vec<JobRecord>> {
    let params = HashMap::from([
        ("target_project", ctx.target_project.to_string()),
        ("region", region.to_string()),
        ("analyzer_email", ctx.analyzer_email.to_string()),
        ("start_time_expr", ctx.window.start_expr.clone()),
        ("end_time_expr", ctx.window.end_clause.clone()),
        ("limit", ctx.per_region_limit.to_string()),
    ]);
    let sql = templates::render(ctx.worst_ranking_sql, &params)?;
    ctx.client.query::<JobRecord>(ctx.source_project, &sql, Some(region)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_table_markdown_formats_rows() {
        let rows = vec![StorageRow {
            dataset_name: "sales".to_string(),
            logical_gb: 120.5,
            physical_gb: 40.1666,
            compression_ratio: 3.0,
            recommendation: "Consider physical storage billing".to_string(),
        }];
        let table = storage_table_markdown(&rows);

        assert!(table.starts_with("| Dataset | Logical (GB) |"));
        assert!(table.contains("| `sales` | 120.50 | 40.17 | 3.00 | *Consider physical storage billing* |"));
    }
}
