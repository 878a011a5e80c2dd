use crate::models::StorageProposal;
use crate::services::ranking::JobRanks;
use chrono::Local;

/// Ordered, append-only audit report document. Sections are appended during
/// assembly; the rendered document is immutable once handed to the
/// publisher.
pub struct ReportBuilder {
    lines: Vec<String>,
}

impl ReportBuilder {
    /// Start a report with the project header and generation timestamp.
    pub fn new(target_project: &str) -> Self {
        let lines = vec![
            "# Warehouse Audit Report".to_string(),
            format!("**Target project:** `{}`", target_project),
            format!("**Generated at:** {}", Local::now().format("%Y-%m-%d %H:%M:%S")),
            "\n---".to_string(),
        ];
        Self { lines }
    }

    /// Storage-proposal section, one sub-section per region with an accepted
    /// proposal. Omitted entirely when no region produced one.
    pub fn push_storage_section(&mut self, proposals: &[StorageProposal]) {
        if proposals.is_empty() {
            tracing::info!("No valid storage data to report.");
            return;
        }

        self.lines.push("## 💾 Storage pricing-model review\n".to_string());
        for proposal in proposals {
            self.lines.push(format!(
                "### 📍 Region: {}\n\n{}\n",
                proposal.region, proposal.table_markdown
            ));
        }
        self.lines.push("---\n".to_string());
    }

    pub fn push_no_jobs_notice(&mut self) {
        self.lines.push("No worst queries were found for the audited window.\n".to_string());
    }

    pub fn push_worst_query_header(&mut self, total: usize) {
        self.lines.push(format!("## 🚨 Worst-query analysis ({} total)\n", total));
    }

    /// One job section: the two project-wide rank annotations ("-" when the
    /// rank is absent) followed by the model's raw response text.
    pub fn push_job_section(
        &mut self,
        index: usize,
        total: usize,
        job_id: &str,
        ranks: Option<&JobRanks>,
        model_text: &str,
    ) {
        self.lines.push(format!("### 🔍 Worst query {}/{} (Job: `{}`)\n", index, total, job_id));

        let cost_rank = ranks
            .and_then(|r| r.cost_rank)
            .map(|rank| rank.to_string())
            .unwrap_or_else(|| "-".to_string());
        let duration_rank = ranks
            .and_then(|r| r.duration_rank)
            .map(|rank| rank.to_string())
            .unwrap_or_else(|| "-".to_string());
        self.lines.push(format!(
            "**Project-wide ranking**\n- Scanned volume: worst **#{}**\n- Execution time: worst **#{}**\n",
            cost_rank, duration_rank
        ));

        self.lines.push(model_text.to_string());
        self.lines.push("\n---".to_string());
    }

    /// Render the final document.
    pub fn build(self) -> String {
        self.lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_carries_project_and_timestamp_labels() {
        let report = ReportBuilder::new("acme-prod").build();
        assert!(report.starts_with("# Warehouse Audit Report"));
        assert!(report.contains("**Target project:** `acme-prod`"));
        assert!(report.contains("**Generated at:**"));
    }

    #[test]
    fn test_empty_storage_section_is_omitted() {
        let mut builder = ReportBuilder::new("acme-prod");
        builder.push_storage_section(&[]);
        assert!(!builder.build().contains("Storage pricing-model review"));
    }

    #[test]
    fn test_storage_section_has_one_subsection_per_region() {
        let mut builder = ReportBuilder::new("acme-prod");
        builder.push_storage_section(&[
            StorageProposal { region: "us-east1".to_string(), table_markdown: "| a |".to_string() },
            StorageProposal { region: "eu-west1".to_string(), table_markdown: "| b |".to_string() },
        ]);
        let report = builder.build();

        assert!(report.contains("## 💾 Storage pricing-model review"));
        assert!(report.contains("### 📍 Region: us-east1"));
        assert!(report.contains("### 📍 Region: eu-west1"));
    }

    #[test]
    fn test_job_section_shows_ranks() {
        let mut builder = ReportBuilder::new("acme-prod");
        let ranks = JobRanks { cost_rank: Some(2), duration_rank: Some(7) };
        builder.push_job_section(1, 3, "job-1", Some(&ranks), "Use a partition filter.");
        let report = builder.build();

        assert!(report.contains("### 🔍 Worst query 1/3 (Job: `job-1`)"));
        assert!(report.contains("Scanned volume: worst **#2**"));
        assert!(report.contains("Execution time: worst **#7**"));
        assert!(report.contains("Use a partition filter."));
    }

    #[test]
    fn test_missing_ranks_render_as_dashes() {
        let mut builder = ReportBuilder::new("acme-prod");
        builder.push_job_section(1, 1, "job-x", None, "text");
        let report = builder.build();

        assert!(report.contains("Scanned volume: worst **#-**"));
        assert!(report.contains("Execution time: worst **#-**"));
    }

    #[test]
    fn test_sections_keep_append_order() {
        let mut builder = ReportBuilder::new("acme-prod");
        builder.push_worst_query_header(2);
        builder.push_job_section(1, 2, "first", None, "a");
        builder.push_job_section(2, 2, "second", None, "b");
        let report = builder.build();

        let first = report.find("`first`").unwrap();
        let second = report.find("`second`").unwrap();
        assert!(first < second);
    }
}
