use crate::config::ModelConfig;
use crate::utils::{AuditError, AuditResult};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

/// Single-shot prompt-in/text-out generative model. No conversation state.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, prompt: &str) -> AuditResult<String>;
}

/// Client for a Vertex-style `generateContent` endpoint.
pub struct VertexModelClient {
    http_client: Client,
    endpoint: String,
    api_token: Option<String>,
}

impl VertexModelClient {
    pub fn new(config: &ModelConfig, project: &str) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        let endpoint = format!(
            "{}/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            project,
            config.location,
            config.model_name
        );

        Self { http_client, endpoint, api_token: config.api_token.clone() }
    }
}

#[async_trait]
impl GenerativeModel for VertexModelClient {
    async fn generate(&self, prompt: &str) -> AuditResult<String> {
        let body = json!({
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }]
        });

        let mut request = self.http_client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AuditError::model(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AuditError::model(format!(
                "Model returned status {}: {}",
                status, error_text
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| AuditError::model(format!("Failed to parse response: {}", e)))?;

        data["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|text| text.to_string())
            .ok_or_else(|| AuditError::model("Response contained no candidate text"))
    }
}
