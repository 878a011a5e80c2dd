use crate::services::warehouse_client::WarehouseClient;
use std::collections::BTreeSet;

/// Resolves which geographic regions actually host the target project's
/// datasets. Derived once per run; the resulting set is immutable afterward.
pub struct RegionDirectory<'a> {
    client: &'a WarehouseClient,
}

impl<'a> RegionDirectory<'a> {
    pub fn new(client: &'a WarehouseClient) -> Self {
        Self { client }
    }

    /// Lower-cased locations of every dataset in the target project. A
    /// dataset with no location is silently skipped. Listing failure is
    /// non-fatal: the empty set means "nothing to audit".
    pub async fn active_regions(&self, target_project: &str) -> BTreeSet<String> {
        tracing::info!("Discovering active regions in {}...", target_project);

        let datasets = match self.client.list_datasets(target_project).await {
            Ok(datasets) => datasets,
            Err(e) => {
                tracing::error!("Error discovering regions: {}", e);
                return BTreeSet::new();
            },
        };

        let mut regions = BTreeSet::new();
        for dataset in datasets {
            if let Some(location) = dataset.location {
                if !location.is_empty() {
                    regions.insert(location.to_lowercase());
                }
            }
        }

        tracing::info!("Found {} active regions", regions.len());
        regions
    }
}
