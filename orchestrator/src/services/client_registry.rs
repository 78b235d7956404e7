//! Lazily constructed, shared service clients
//!
//! Each slot is built at most once, under its own lock, so concurrent callers
//! wait for the first construction instead of racing a second one.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use analyzer::LlmClient;
use catalog::CatalogClient;

use crate::error::{OrchestratorError, OrchestratorResult};
use crate::traits::{ClientFactory, CredentialSource, Credentials};

pub struct ClientRegistry {
    credential_source: Arc<dyn CredentialSource>,
    factory: Arc<dyn ClientFactory>,
    credentials: Mutex<Option<Credentials>>,
    http: Mutex<Option<reqwest::Client>>,
    catalog: Mutex<Option<Arc<dyn CatalogClient>>>,
    llm: Mutex<Option<Arc<dyn LlmClient>>>,
}

impl ClientRegistry {
    pub fn new(credential_source: Arc<dyn CredentialSource>, factory: Arc<dyn ClientFactory>) -> Self {
        Self {
            credential_source,
            factory,
            credentials: Mutex::new(None),
            http: Mutex::new(None),
            catalog: Mutex::new(None),
            llm: Mutex::new(None),
        }
    }

    /// Validated credentials; fails before any network call when keys are missing
    pub async fn credentials(&self) -> OrchestratorResult<Credentials> {
        let mut slot = self.credentials.lock().await;
        if let Some(credentials) = slot.as_ref() {
            return Ok(credentials.clone());
        }

        let credentials = self
            .credential_source
            .load_credentials()
            .await
            .map_err(|e| OrchestratorError::ConfigurationError { field: e.message })?;
        *slot = Some(credentials.clone());
        Ok(credentials)
    }

    pub async fn http_client(&self) -> OrchestratorResult<reqwest::Client> {
        let mut slot = self.http.lock().await;
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        let client = self.factory.http_client().await?;
        *slot = Some(client.clone());
        Ok(client)
    }

    pub async fn catalog_client(&self) -> OrchestratorResult<Arc<dyn CatalogClient>> {
        let mut slot = self.catalog.lock().await;
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        let credentials = self.credentials().await?;
        let http = self.http_client().await?;
        let client = self.factory.catalog_client(&credentials, http).await?;
        info!("🔌 Catalog client ready");

        *slot = Some(client.clone());
        Ok(client)
    }

    pub async fn llm_client(&self) -> OrchestratorResult<Arc<dyn LlmClient>> {
        let mut slot = self.llm.lock().await;
        if let Some(client) = slot.as_ref() {
            return Ok(client.clone());
        }

        let credentials = self.credentials().await?;
        let http = self.http_client().await?;
        let client = self.factory.llm_client(&credentials, http).await?;
        info!("🔌 Language model client ready");

        *slot = Some(client.clone());
        Ok(client)
    }

    /// Drop every held client; the next request constructs afresh
    pub async fn cleanup(&self) {
        self.catalog.lock().await.take();
        self.llm.lock().await.take();
        self.http.lock().await.take();
        self.credentials.lock().await.take();
        debug!("🧹 Client registry cleared");
    }
}
