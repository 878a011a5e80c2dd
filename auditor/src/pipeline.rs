//! End-to-end audit run: region discovery, per-region collection, global
//! ranking, per-job enrichment, report assembly and publishing.

use crate::config::Config;
use crate::models::JobRecord;
use crate::services::enrichment::JobEnrichment;
use crate::services::{
    collect_regions, rank_and_select, time_window, AnalyzerClient, CollectorContext, GenerativeModel,
    JobEnricher, MasterDictionary, Publisher, RegionDirectory, ReportBuilder, WarehouseClient,
};
use crate::utils::{templates, AuditResult};
use std::collections::HashMap;
use std::path::Path;

/// Substituted for a job section when the model call fails.
pub const MODEL_FAILED_SENTINEL: &str =
    "The recommendation model call failed; no guidance is available for this query.";

pub struct AuditPipeline<'a> {
    config: &'a Config,
    warehouse: &'a WarehouseClient,
    analyzer: &'a AnalyzerClient,
    model: &'a dyn GenerativeModel,
    publisher: &'a Publisher,
}

impl<'a> AuditPipeline<'a> {
    pub fn new(
        config: &'a Config,
        warehouse: &'a WarehouseClient,
        analyzer: &'a AnalyzerClient,
        model: &'a dyn GenerativeModel,
        publisher: &'a Publisher,
    ) -> Self {
        Self { config, warehouse, analyzer, model, publisher }
    }

    pub async fn run(&self) -> AuditResult<()> {
        // Required template files abort the run before any external call
        let worst_ranking_sql =
            templates::load(Path::new(&self.config.templates.worst_ranking_sql))?;
        let storage_analysis_sql =
            templates::load(Path::new(&self.config.templates.storage_analysis_sql))?;
        let prompt_template = templates::load(Path::new(&self.config.templates.prompt))?;

        let source_project = &self.config.warehouse.source_project;
        let target_project = &self.config.warehouse.target_project;

        let analyzer_email = self.warehouse.session_user(source_project).await;
        tracing::info!("Execution account: {} (to be excluded)", analyzer_email);

        let dictionary = MasterDictionary::load(self.warehouse, source_project).await;

        let regions = RegionDirectory::new(self.warehouse).active_regions(target_project).await;
        let mut report = ReportBuilder::new(target_project);

        if regions.is_empty() {
            tracing::info!("No active regions found. Nothing to audit.");
            report.push_no_jobs_notice();
            self.publisher.publish(report.build(), target_project).await;
            return Ok(());
        }

        let window = time_window::resolve(&self.config.time_range);
        let ctx = CollectorContext {
            client: self.warehouse,
            source_project,
            target_project,
            analyzer_email: &analyzer_email,
            window: &window,
            per_region_limit: self.config.audit.worst_query_limit,
            worst_ranking_sql: &worst_ranking_sql,
            storage_analysis_sql: &storage_analysis_sql,
        };
        let collected = collect_regions(&ctx, &regions).await;

        let outcome = rank_and_select(&collected.jobs, self.config.audit.worst_query_limit);
        tracing::info!(
            "Filtered down to project-wide worst queries: {} queries.",
            outcome.selected.len()
        );

        report.push_storage_section(&collected.proposals);

        if outcome.selected.is_empty() {
            tracing::info!("No queries to analyze.");
            report.push_no_jobs_notice();
            self.publisher.publish(report.build(), target_project).await;
            return Ok(());
        }

        report.push_worst_query_header(outcome.selected.len());

        let enricher = JobEnricher::new(self.warehouse, self.analyzer, &dictionary);
        let total = outcome.selected.len();
        for (i, job) in outcome.selected.iter().enumerate() {
            tracing::info!("Analyzing job {}/{}: {} ({})", i + 1, total, job.job_id, job.region_name);

            let enrichment = enricher.enrich(job).await;
            let prompt = build_prompt(&prompt_template, job, &enrichment);

            let model_text = match self.model.generate(&prompt).await {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!("Model generation failed for job {}: {}", job.job_id, e);
                    MODEL_FAILED_SENTINEL.to_string()
                },
            };

            report.push_job_section(
                i + 1,
                total,
                &job.job_id,
                outcome.ranks.get(&job.job_id),
                &model_text,
            );
        }

        self.publisher.publish(report.build(), target_project).await;
        Ok(())
    }
}

/// Build the per-job prompt. Any template problem degrades to a minimal
/// prompt containing only the query text; prompt assembly never aborts the
/// run.
pub fn build_prompt(template: &str, job: &JobRecord, enrichment: &JobEnrichment) -> String {
    let params = HashMap::from([
        ("billed_gb", job.billed_gb_or_zero().to_string()),
        ("duration_seconds", job.duration_or_zero().to_string()),
        ("slot_hours", job.slot_hours.unwrap_or(0.0).to_string()),
        ("source_type", job.source_type.clone().unwrap_or_default()),
        ("difficulty", job.difficulty.clone().unwrap_or_default()),
        ("query", job.query.clone()),
        ("schema_info_text", enrichment.schema_info_text.clone()),
        ("antipattern_raw_text", enrichment.antipattern_raw_text.clone()),
        ("master_dict_text", enrichment.master_dict_text.clone()),
    ]);

    match templates::render(template, &params) {
        Ok(prompt) => prompt,
        Err(e) => {
            tracing::error!("Failed to build prompt from template: {}", e);
            format!("Analyze this SQL: {}", job.query)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_job() -> JobRecord {
        JobRecord {
            job_id: "job-1".to_string(),
            query: "SELECT * FROM big".to_string(),
            region_name: "us-east1".to_string(),
            billed_gb: Some(12.5),
            duration_seconds: None,
            slot_hours: None,
            source_type: Some("QUERY".to_string()),
            difficulty: None,
            referenced_tables: Vec::new(),
        }
    }

    fn sample_enrichment() -> JobEnrichment {
        JobEnrichment {
            schema_info_text: "schema".to_string(),
            antipattern_raw_text: "raw".to_string(),
            master_dict_text: "dict".to_string(),
        }
    }

    #[test]
    fn test_build_prompt_substitutes_metrics_with_null_defaults() {
        let template = "gb={billed_gb} secs={duration_seconds} slots={slot_hours} \
                        type={source_type} diff={difficulty}\n{query}\n{schema_info_text}\n\
                        {antipattern_raw_text}\n{master_dict_text}";
        let prompt = build_prompt(template, &sample_job(), &sample_enrichment());

        assert!(prompt.contains("gb=12.5"));
        assert!(prompt.contains("secs=0"));
        assert!(prompt.contains("slots=0"));
        assert!(prompt.contains("type=QUERY"));
        assert!(prompt.contains("SELECT * FROM big"));
    }

    #[test]
    fn test_build_prompt_falls_back_on_bad_template() {
        let prompt = build_prompt("{unknown_key}", &sample_job(), &sample_enrichment());
        assert_eq!(prompt, "Analyze this SQL: SELECT * FROM big");
    }

    #[test]
    fn test_query_with_placeholder_syntax_does_not_corrupt_prompt() {
        let mut job = sample_job();
        job.query = "SELECT '{master_dict_text}' FROM t".to_string();
        let prompt = build_prompt("q: {query} dict: {master_dict_text}", &job, &sample_enrichment());

        assert!(prompt.contains("q: SELECT '{master_dict_text}' FROM t"));
        assert!(prompt.ends_with("dict: dict"));
    }
}
