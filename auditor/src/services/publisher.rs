use crate::config::{NotifyConfig, StorageConfig};
use crate::utils::{AuditError, AuditResult};
use chrono::Local;
use reqwest::Client;
use std::time::Duration;

/// Persists the finished report to object storage and announces it on the
/// chat webhook.
pub struct Publisher {
    storage: StorageConfig,
    notify: NotifyConfig,
    http_client: Client,
    notify_client: Client,
}

impl Publisher {
    pub fn new(storage: StorageConfig, notify: NotifyConfig) -> Self {
        let http_client =
            Client::builder().timeout(Duration::from_secs(120)).build().unwrap_or_default();
        // Webhook posts are fire-and-forget with a short timeout
        let notify_client = Client::builder()
            .timeout(Duration::from_secs(notify.timeout_secs))
            .build()
            .unwrap_or_default();

        Self { storage, notify, http_client, notify_client }
    }

    /// Upload then notify. The notification fires exactly once whether or
    /// not persistence succeeded; only its text differs.
    pub async fn publish(&self, report: String, project: &str) {
        let report_url = self.upload(&report, project).await;
        self.send_notification(&notification_text(report_url.as_deref())).await;
    }

    /// Upload the report as a single Markdown document, returning its
    /// console-browsable URL. No configured bucket or a failed upload yields
    /// no location; the run continues either way.
    async fn upload(&self, report: &str, project: &str) -> Option<String> {
        let bucket = match &self.storage.bucket {
            Some(bucket) if !bucket.is_empty() => bucket,
            _ => {
                tracing::warn!("Storage bucket is not set. Skipping report upload.");
                return None;
            },
        };

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let filename = format!("warehouse_audit_report_{}_{}.md", project, timestamp);

        match self.try_upload(bucket, &filename, report).await {
            Ok(()) => Some(format!(
                "{}/{}/{}?project={}",
                self.storage.console_base_url.trim_end_matches('/'),
                bucket,
                filename,
                project
            )),
            Err(e) => {
                tracing::error!("Failed to upload report to storage: {}", e);
                None
            },
        }
    }

    async fn try_upload(&self, bucket: &str, filename: &str, report: &str) -> AuditResult<()> {
        let url = format!(
            "{}/upload/storage/v1/b/{}/o?uploadType=media&name={}",
            self.storage.base_url.trim_end_matches('/'),
            bucket,
            filename
        );

        let mut request = self
            .http_client
            .post(&url)
            .header("Content-Type", "text/markdown")
            .body(report.to_string());
        if let Some(token) = &self.storage.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AuditError::storage(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AuditError::storage(format!(
                "Upload failed with status {}: {}",
                status, error_text
            )));
        }

        Ok(())
    }

    /// Fire the webhook. Failures are logged only; they never affect the
    /// run's outcome.
    async fn send_notification(&self, text: &str) {
        let webhook_url = match &self.notify.webhook_url {
            Some(url) if !url.is_empty() => url,
            _ => {
                tracing::warn!("Webhook URL is not set. Skipping notification.");
                return;
            },
        };

        let result = self
            .notify_client
            .post(webhook_url)
            .json(&serde_json::json!({ "text": text }))
            .send()
            .await;

        match result {
            Ok(response) if !response.status().is_success() => {
                tracing::error!("Webhook returned status {}", response.status());
            },
            Ok(_) => tracing::info!("Notification sent"),
            Err(e) => tracing::error!("Failed to send webhook notification: {}", e),
        }
    }
}

/// Success and degraded notification texts differ so the channel can tell
/// whether the report was persisted.
pub fn notification_text(report_url: Option<&str>) -> String {
    match report_url {
        Some(url) => format!(
            "✅ *The warehouse audit report is ready.*\nFull report (Markdown):\n{}",
            url
        ),
        None => "✅ *The warehouse audit report is ready.*\n\
                 (The report could not be persisted: upload failed or no bucket is configured.)"
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_text_differs_when_not_persisted() {
        let persisted = notification_text(Some("https://console.example/report.md"));
        let degraded = notification_text(None);

        assert_ne!(persisted, degraded);
        assert!(persisted.contains("https://console.example/report.md"));
        assert!(degraded.contains("could not be persisted"));
    }
}
