use crate::config::AnalyzerConfig;
use crate::utils::{AuditError, AuditResult};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Substituted when no analyzer URL is configured.
pub const ANALYZER_SKIPPED_SENTINEL: &str =
    "Anti-pattern analysis was skipped: no analyzer URL is configured.";

/// Substituted when the analyzer call fails for any reason.
pub const ANALYZER_FAILED_SENTINEL: &str = "The anti-pattern analyzer call failed.";

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    #[serde(default)]
    recommendations: String,
}

struct CachedToken {
    token: String,
    fetched_at: Instant,
}

/// Per-audience identity-token cache with a fixed refresh TTL.
///
/// Entries expire after `ttl` and can be invalidated early when the analyzer
/// answers 401, so a long-lived process never keeps serving an expired token.
pub struct TokenCache {
    http_client: Client,
    token_url: String,
    ttl: Duration,
    entries: Mutex<HashMap<String, CachedToken>>,
}

impl TokenCache {
    pub fn new(token_url: String, ttl: Duration) -> Self {
        let http_client =
            Client::builder().timeout(Duration::from_secs(10)).build().unwrap_or_default();
        Self { http_client, token_url, ttl, entries: Mutex::new(HashMap::new()) }
    }

    fn cached(&self, audience: &str) -> Option<String> {
        let entries = self.entries.lock().expect("token cache lock poisoned");
        entries
            .get(audience)
            .filter(|entry| entry.fetched_at.elapsed() < self.ttl)
            .map(|entry| entry.token.clone())
    }

    pub fn invalidate(&self, audience: &str) {
        let mut entries = self.entries.lock().expect("token cache lock poisoned");
        entries.remove(audience);
    }

    /// A valid token for `audience`, fetched only when the cached entry is
    /// missing or older than the TTL.
    pub async fn token_for(&self, audience: &str) -> AuditResult<String> {
        if let Some(token) = self.cached(audience) {
            return Ok(token);
        }

        let token = self.fetch(audience).await?;
        let mut entries = self.entries.lock().expect("token cache lock poisoned");
        entries.insert(
            audience.to_string(),
            CachedToken { token: token.clone(), fetched_at: Instant::now() },
        );
        Ok(token)
    }

    async fn fetch(&self, audience: &str) -> AuditResult<String> {
        let response = self
            .http_client
            .get(&self.token_url)
            .query(&[("audience", audience)])
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| AuditError::token(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AuditError::token(format!(
                "Token endpoint returned status {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map(|token| token.trim().to_string())
            .map_err(|e| AuditError::token(format!("Failed to read token: {}", e)))
    }
}

/// Client for the anti-pattern analyzer service.
pub struct AnalyzerClient {
    http_client: Client,
    base_url: Option<String>,
    tokens: TokenCache,
}

impl AnalyzerClient {
    pub fn new(config: &AnalyzerConfig) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();

        Self {
            http_client,
            base_url: config
                .base_url
                .as_ref()
                .map(|url| url.trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty()),
            tokens: TokenCache::new(
                config.token_url.clone(),
                Duration::from_secs(config.token_ttl_secs),
            ),
        }
    }

    /// Submit a query for anti-pattern analysis.
    ///
    /// Never fails the caller: any transport, auth or service problem
    /// degrades to a fixed sentinel so a bad response only affects its own
    /// report section.
    pub async fn analyze(&self, query: &str) -> String {
        let base_url = match &self.base_url {
            Some(url) => url,
            None => {
                tracing::warn!("Analyzer URL is not set. Skipping analyzer call.");
                return ANALYZER_SKIPPED_SENTINEL.to_string();
            },
        };

        match self.try_analyze(base_url, query).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Anti-pattern analyzer call failed: {}", e);
                ANALYZER_FAILED_SENTINEL.to_string()
            },
        }
    }

    async fn try_analyze(&self, base_url: &str, query: &str) -> AuditResult<String> {
        let endpoint = format!("{}/analyze", base_url);
        // The analyzer base URL is the token audience
        let response = self.post_analyze(&endpoint, base_url, query).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            // Cached token may have expired mid-run: refresh once and retry
            tracing::warn!("Analyzer rejected the token (401); refreshing and retrying");
            self.tokens.invalidate(base_url);
            let retry = self.post_analyze(&endpoint, base_url, query).await?;
            return Self::read_recommendations(retry).await;
        }

        Self::read_recommendations(response).await
    }

    async fn post_analyze(
        &self,
        endpoint: &str,
        audience: &str,
        query: &str,
    ) -> AuditResult<reqwest::Response> {
        let token = self.tokens.token_for(audience).await?;
        self.http_client
            .post(endpoint)
            .bearer_auth(token)
            .json(&serde_json::json!({ "query": query }))
            .send()
            .await
            .map_err(|e| AuditError::analyzer(format!("Request failed: {}", e)))
    }

    async fn read_recommendations(response: reqwest::Response) -> AuditResult<String> {
        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AuditError::analyzer(format!(
                "Analyzer returned status {}: {}",
                status, error_text
            )));
        }

        let parsed: AnalyzeResponse = response
            .json()
            .await
            .map_err(|e| AuditError::analyzer(format!("Failed to parse response: {}", e)))?;
        Ok(parsed.recommendations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;

    fn cache_with(ttl: Duration, audience: &str, age: Duration) -> TokenCache {
        let cache = TokenCache::new("http://localhost/token".to_string(), ttl);
        cache.entries.lock().unwrap().insert(
            audience.to_string(),
            CachedToken { token: "tok-1".to_string(), fetched_at: Instant::now() - age },
        );
        cache
    }

    #[test]
    fn test_fresh_token_is_served_from_cache() {
        let cache = cache_with(Duration::from_secs(60), "aud", Duration::from_secs(0));
        assert_eq!(cache.cached("aud"), Some("tok-1".to_string()));
    }

    #[test]
    fn test_expired_token_is_not_served() {
        let cache = cache_with(Duration::from_secs(1), "aud", Duration::from_secs(5));
        assert_eq!(cache.cached("aud"), None);
    }

    #[test]
    fn test_invalidate_clears_the_entry() {
        let cache = cache_with(Duration::from_secs(60), "aud", Duration::from_secs(0));
        cache.invalidate("aud");
        assert_eq!(cache.cached("aud"), None);
    }

    #[tokio::test]
    async fn test_unconfigured_analyzer_yields_skip_sentinel() {
        let client = AnalyzerClient::new(&AnalyzerConfig::default());
        assert_eq!(client.analyze("SELECT 1").await, ANALYZER_SKIPPED_SENTINEL);
    }
}
