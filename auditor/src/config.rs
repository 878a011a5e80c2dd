use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub warehouse: WarehouseConfig,
    pub analyzer: AnalyzerConfig,
    pub model: ModelConfig,
    pub storage: StorageConfig,
    pub notify: NotifyConfig,
    pub time_range: TimeRangeConfig,
    pub audit: AuditConfig,
    pub logging: LoggingConfig,
    pub templates: TemplatesConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WarehouseConfig {
    pub base_url: String,
    /// Project that runs the audit queries and hosts the master dictionary.
    pub source_project: String,
    /// Project whose workload is audited.
    pub target_project: String,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Base URL of the anti-pattern analyzer service; unset skips analysis.
    pub base_url: Option<String>,
    /// Identity-token endpoint queried per audience.
    pub token_url: String,
    pub timeout_secs: u64,
    pub token_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub base_url: String,
    pub location: String,
    pub model_name: String,
    pub api_token: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Destination bucket; unset skips report persistence.
    pub bucket: Option<String>,
    pub base_url: String,
    pub console_base_url: String,
    pub api_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotifyConfig {
    /// Chat webhook; unset skips the notification.
    pub webhook_url: Option<String>,
    pub timeout_secs: u64,
}

/// Audited time window. The three inputs are mutually exclusive and are
/// resolved in priority order: interval, then start/[end], then a 1-day
/// default (see `services::time_window`).
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct TimeRangeConfig {
    pub interval: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Top-K size per ranking metric; doubles as the per-region row limit.
    pub worst_query_limit: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TemplatesConfig {
    pub worst_ranking_sql: String,
    pub storage_analysis_sql: String,
    pub prompt: String,
}

impl Config {
    /// Load configuration with environment variable override support
    ///
    /// Loading order:
    /// 1. Load from config.toml file (explicit path or well-known locations)
    /// 2. Override with environment variables
    /// 3. Validate the final configuration
    pub fn load(explicit_path: Option<&str>) -> Result<Self, anyhow::Error> {
        let mut config = if let Some(path) = explicit_path {
            Self::from_toml(path)?
        } else if let Some(config_path) = Self::find_config_file() {
            Self::from_toml(&config_path)?
        } else {
            tracing::warn!("Configuration file not found, using defaults");
            Config::default()
        };

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - SAAS_PROJECT_ID: project running the audit queries
    /// - CUSTOMER_PROJECT_ID: project whose workload is audited
    /// - WAREHOUSE_BASE_URL: warehouse service base URL
    /// - ANTIPATTERN_ANALYZER_URL: analyzer service base URL
    /// - WEBHOOK_URL: chat webhook URL
    /// - STORAGE_BUCKET: report bucket name
    /// - TIME_RANGE_INTERVAL / TIME_RANGE_START / TIME_RANGE_END: audit window
    /// - WORST_QUERY_LIMIT: top-K size per ranking metric
    /// - APP_LOG_LEVEL: logging filter (e.g., "info,query_auditor=debug")
    fn apply_env_overrides(&mut self) {
        if let Ok(project) = std::env::var("SAAS_PROJECT_ID") {
            self.warehouse.source_project = project;
            tracing::info!("Override warehouse.source_project from env");
        }

        if let Ok(project) = std::env::var("CUSTOMER_PROJECT_ID") {
            self.warehouse.target_project = project;
            tracing::info!("Override warehouse.target_project from env");
        }

        if let Ok(url) = std::env::var("WAREHOUSE_BASE_URL") {
            self.warehouse.base_url = url;
            tracing::info!("Override warehouse.base_url from env");
        }

        if let Ok(url) = std::env::var("ANTIPATTERN_ANALYZER_URL") {
            self.analyzer.base_url = Some(url);
            tracing::info!("Override analyzer.base_url from env");
        }

        if let Ok(url) = std::env::var("WEBHOOK_URL") {
            self.notify.webhook_url = Some(url);
            tracing::info!("Override notify.webhook_url from env");
        }

        if let Ok(bucket) = std::env::var("STORAGE_BUCKET") {
            self.storage.bucket = Some(bucket);
            tracing::info!("Override storage.bucket from env");
        }

        if let Ok(interval) = std::env::var("TIME_RANGE_INTERVAL") {
            self.time_range.interval = Some(interval);
            tracing::info!("Override time_range.interval from env");
        }

        if let Ok(start) = std::env::var("TIME_RANGE_START") {
            self.time_range.start = Some(start);
            tracing::info!("Override time_range.start from env");
        }

        if let Ok(end) = std::env::var("TIME_RANGE_END") {
            self.time_range.end = Some(end);
            tracing::info!("Override time_range.end from env");
        }

        if let Ok(limit) = std::env::var("WORST_QUERY_LIMIT") {
            match limit.parse() {
                Ok(val) => {
                    self.audit.worst_query_limit = val;
                    tracing::info!(
                        "Override audit.worst_query_limit from env: {}",
                        self.audit.worst_query_limit
                    );
                },
                Err(e) => tracing::warn!(
                    "Invalid WORST_QUERY_LIMIT '{}': {} (keep {})",
                    limit,
                    e,
                    self.audit.worst_query_limit
                ),
            }
        }

        if let Ok(level) = std::env::var("APP_LOG_LEVEL") {
            self.logging.level = level;
            tracing::info!("Override logging.level from env: {}", self.logging.level);
        }
    }

    /// Validate configuration
    fn validate(&self) -> Result<(), anyhow::Error> {
        if self.warehouse.source_project.is_empty() || self.warehouse.target_project.is_empty() {
            anyhow::bail!(
                "warehouse.source_project and warehouse.target_project must be set \
                 (SAAS_PROJECT_ID / CUSTOMER_PROJECT_ID)"
            );
        }

        if self.audit.worst_query_limit == 0 {
            anyhow::bail!("audit.worst_query_limit must be > 0");
        }

        if self.time_range.interval.is_some() && self.time_range.start.is_some() {
            tracing::warn!(
                "Both time_range.interval and time_range.start are set; the interval takes precedence"
            );
        }

        Ok(())
    }

    fn find_config_file() -> Option<String> {
        let possible_paths =
            ["conf/config.toml", "config.toml", "./conf/config.toml", "./config.toml"];

        for path in &possible_paths {
            if Path::new(path).exists() {
                return Some(path.to_string());
            }
        }
        None
    }

    fn from_toml(path: &str) -> Result<Self, anyhow::Error> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9050".to_string(),
            source_project: String::new(),
            target_project: String::new(),
            api_token: None,
            timeout_secs: 120,
        }
    }
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            token_url: "http://metadata.google.internal/computeMetadata/v1/instance/service-accounts/default/identity"
                .to_string(),
            timeout_secs: 60,
            token_ttl_secs: 45 * 60,
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://aiplatform.googleapis.com".to_string(),
            location: "us-central1".to_string(),
            model_name: "gemini-2.5-flash".to_string(),
            api_token: None,
            timeout_secs: 120,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            base_url: "https://storage.googleapis.com".to_string(),
            console_base_url: "https://console.cloud.google.com/storage/browser/_details"
                .to_string(),
            api_token: None,
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self { webhook_url: None, timeout_secs: 10 }
    }
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self { worst_query_limit: 1 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info,query_auditor=debug".to_string(), file: None }
    }
}

impl Default for TemplatesConfig {
    fn default() -> Self {
        Self {
            worst_ranking_sql: "sql/worst_ranking.sql".to_string(),
            storage_analysis_sql: "sql/storage_analysis.sql".to_string(),
            prompt: "prompts/recommendation_prompt.txt".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_both_projects() {
        let config = Config::default();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.warehouse.source_project = "saas-project".to_string();
        assert!(config.validate().is_err());

        config.warehouse.target_project = "customer-project".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_limit() {
        let mut config = Config::default();
        config.warehouse.source_project = "saas-project".to_string();
        config.warehouse.target_project = "customer-project".to_string();
        config.audit.worst_query_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_worst_query_limit_defaults_to_one() {
        assert_eq!(AuditConfig::default().worst_query_limit, 1);
    }
}
