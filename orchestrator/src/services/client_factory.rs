//! Production client construction
//!
//! Raw service clients are wrapped in their rate-limited, caching front before
//! they reach the registry. Each service gets one limiter shared by every
//! operation of that service.

use async_trait::async_trait;
use std::sync::Arc;

use analyzer::{LlmClient, OpenAiClient, RateLimitedLlmClient};
use catalog::{CatalogClient, RateLimitedCatalogClient, SpotifyClient};
use shared::SlidingWindowLimiter;
use tracing::debug;

use crate::config::PipelineConfig;
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::{ClientFactory, Credentials};

pub struct RealClientFactory {
    config: PipelineConfig,
    catalog_limiter: Arc<SlidingWindowLimiter>,
    llm_limiter: Arc<SlidingWindowLimiter>,
}

impl RealClientFactory {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            catalog_limiter: Arc::new(config.limits.catalog.limiter()),
            llm_limiter: Arc::new(config.limits.llm.limiter()),
            config,
        }
    }
}

#[async_trait]
impl ClientFactory for RealClientFactory {
    async fn http_client(&self) -> OrchestratorResult<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.config.http_timeout())
            .build()
            .map_err(|e| OrchestratorError::config(format!("HTTP client: {e}")))
    }

    async fn catalog_client(
        &self,
        credentials: &Credentials,
        http: reqwest::Client,
    ) -> OrchestratorResult<Arc<dyn CatalogClient>> {
        let client = SpotifyClient::with_http_client(http, credentials.catalog.clone());
        client.authenticate().await?;
        debug!("🎧 Catalog client authenticated");

        Ok(Arc::new(RateLimitedCatalogClient::new(
            Arc::new(client),
            self.catalog_limiter.clone(),
            self.config.limits.catalog.cache_ttl(),
        )))
    }

    async fn llm_client(
        &self,
        credentials: &Credentials,
        http: reqwest::Client,
    ) -> OrchestratorResult<Arc<dyn LlmClient>> {
        let llm = credentials.require_llm()?;
        let mut client = OpenAiClient::with_http_client(http, llm.api_key.clone());
        if let Some(base_url) = &llm.base_url {
            client = client.with_base_url(base_url.clone());
        }

        Ok(Arc::new(RateLimitedLlmClient::new(
            Arc::new(client),
            self.llm_limiter.clone(),
            self.config.limits.llm.cache_ttl(),
        )))
    }
}
