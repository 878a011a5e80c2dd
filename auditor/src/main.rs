use clap::Parser;
use query_auditor::config::{Config, LoggingConfig};
use query_auditor::pipeline::AuditPipeline;
use query_auditor::services::{AnalyzerClient, Publisher, VertexModelClient, WarehouseClient};
use std::path::Path;
use tracing_subscriber::EnvFilter;

/// Cross-region worst-query audit pipeline.
#[derive(Parser, Debug)]
#[command(name = "query-auditor", version, about)]
struct Cli {
    /// Path to the configuration file (defaults to conf/config.toml lookup)
    #[arg(long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is only relevant for local runs; a missing file is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let _log_guard = init_tracing(&config.logging);

    tracing::info!("Auditing project {}", config.warehouse.target_project);

    let warehouse = WarehouseClient::new(&config.warehouse);
    let analyzer = AnalyzerClient::new(&config.analyzer);
    let model = VertexModelClient::new(&config.model, &config.warehouse.source_project);
    let publisher = Publisher::new(config.storage.clone(), config.notify.clone());

    let pipeline = AuditPipeline::new(&config, &warehouse, &analyzer, &model, &publisher);
    pipeline.run().await?;

    tracing::info!("Audit run finished");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    let filter =
        EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if let Some(path) = &logging.file {
        let path = Path::new(path);
        let directory = path.parent().unwrap_or_else(|| Path::new("."));
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "query-auditor.log".to_string());

        let appender = tracing_appender::rolling::never(directory, filename);
        let (writer, guard) = tracing_appender::non_blocking(appender);
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(writer)
            .with_ansi(false)
            .init();
        Some(guard)
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        None
    }
}
