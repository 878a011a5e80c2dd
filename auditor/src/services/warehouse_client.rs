use crate::config::WarehouseConfig;
use crate::models::{DatasetInfo, SessionUserRow, TableMeta};
use crate::utils::{AuditError, AuditResult};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// REST client for the warehouse query/metadata service.
pub struct WarehouseClient {
    http_client: Client,
    base_url: String,
    api_token: Option<String>,
}

impl WarehouseClient {
    pub fn new(config: &WarehouseConfig) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            http_client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        }
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Execute SQL, optionally scoped to a region, returning raw JSON rows.
    pub async fn query_raw(
        &self,
        project: &str,
        sql: &str,
        location: Option<&str>,
    ) -> AuditResult<Vec<Value>> {
        let url = format!("{}/api/v1/projects/{}/queries", self.base_url, project);
        let mut body = serde_json::json!({ "query": sql });
        if let Some(location) = location {
            body["location"] = Value::String(location.to_string());
        }
        tracing::debug!("Executing warehouse query (location: {:?})", location);

        let response = self
            .authorize(self.http_client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| AuditError::warehouse(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AuditError::warehouse(format!(
                "Query failed with status {}: {}",
                status, error_text
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| AuditError::warehouse(format!("Failed to parse response: {}", e)))?;

        let rows = data.get("rows").and_then(|v| v.as_array()).cloned().unwrap_or_default();
        Ok(rows)
    }

    /// Execute SQL and deserialize each row into `T`, skipping rows that do
    /// not match the expected shape.
    pub async fn query<T>(
        &self,
        project: &str,
        sql: &str,
        location: Option<&str>,
    ) -> AuditResult<Vec<T>>
    where
        T: DeserializeOwned,
    {
        let rows = self.query_raw(project, sql, location).await?;
        let mut entities = Vec::with_capacity(rows.len());

        for row in rows {
            match serde_json::from_value::<T>(row) {
                Ok(value) => entities.push(value),
                Err(e) => {
                    tracing::warn!("Failed to deserialize result row: {}", e);
                },
            }
        }

        Ok(entities)
    }

    /// Enumerate the target project's datasets with their storage locations.
    pub async fn list_datasets(&self, project: &str) -> AuditResult<Vec<DatasetInfo>> {
        let url = format!("{}/api/v1/projects/{}/datasets", self.base_url, project);

        let response = self
            .authorize(self.http_client.get(&url))
            .send()
            .await
            .map_err(|e| AuditError::warehouse(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AuditError::warehouse(format!(
                "Dataset listing failed with status {}",
                response.status()
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| AuditError::warehouse(format!("Failed to parse response: {}", e)))?;

        // Accept both {"datasets": [...]} and a bare array
        let entries = data
            .get("datasets")
            .and_then(|v| v.as_array())
            .or_else(|| data.as_array())
            .cloned()
            .unwrap_or_default();

        let mut datasets = Vec::with_capacity(entries.len());
        for entry in entries {
            match serde_json::from_value::<DatasetInfo>(entry) {
                Ok(dataset) => datasets.push(dataset),
                Err(e) => {
                    tracing::warn!("Failed to deserialize dataset entry: {}", e);
                },
            }
        }

        tracing::debug!("Found {} datasets in project {}", datasets.len(), project);
        Ok(datasets)
    }

    /// Fetch one table's metadata (partitioning, clustering, columns).
    pub async fn table_meta(
        &self,
        project: &str,
        dataset: &str,
        table: &str,
    ) -> AuditResult<TableMeta> {
        let url = format!(
            "{}/api/v1/projects/{}/datasets/{}/tables/{}",
            self.base_url, project, dataset, table
        );

        let response = self
            .authorize(self.http_client.get(&url))
            .send()
            .await
            .map_err(|e| AuditError::warehouse(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AuditError::warehouse(format!(
                "Table metadata lookup failed with status {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuditError::warehouse(format!("Failed to parse table metadata: {}", e)))
    }

    /// The executing account, excluded from the worst-query extraction so the
    /// audit does not report its own queries.
    pub async fn session_user(&self, project: &str) -> String {
        match self
            .query::<SessionUserRow>(project, "SELECT session_user() AS user_email", None)
            .await
        {
            Ok(rows) => rows
                .into_iter()
                .next()
                .map(|row| row.user_email)
                .unwrap_or_else(|| "unknown".to_string()),
            Err(e) => {
                tracing::warn!("Could not detect analyzer email: {}", e);
                "unknown".to_string()
            },
        }
    }
}
