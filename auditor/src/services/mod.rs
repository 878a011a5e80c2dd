pub mod analyzer_client;
pub mod collector;
pub mod dictionary;
pub mod enrichment;
pub mod model_client;
pub mod publisher;
pub mod ranking;
pub mod region_directory;
pub mod report;
pub mod time_window;
pub mod warehouse_client;

pub use analyzer_client::{AnalyzerClient, TokenCache};
pub use collector::{collect_regions, CollectionOutcome, CollectorContext};
pub use dictionary::MasterDictionary;
pub use enrichment::{JobEnricher, JobEnrichment};
pub use model_client::{GenerativeModel, VertexModelClient};
pub use publisher::Publisher;
pub use ranking::{rank_and_select, JobRanks, RankingOutcome};
pub use region_directory::RegionDirectory;
pub use report::ReportBuilder;
pub use time_window::TimeWindow;
pub use warehouse_client::WarehouseClient;
