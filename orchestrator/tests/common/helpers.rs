//! Test helpers and builder patterns for orchestrator tests
//!
//! The builder wires mock services into a real [`Orchestrator`] and
//! [`ClientRegistry`], so a test only states the expectations it cares about.

use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use analyzer::{ExtractionMode, LlmClient, LlmFailure, MockContentExtractor, MockLlmClient};
use catalog::{CatalogClient, MockCatalogClient, SpotifyCredentials};
use ::orchestrator::*;
use shared::{ProgressEvent, RetryPolicy, RunPhase};

use super::fixtures::TestFixtures;

pub type TestOrchestrator = Orchestrator<MockContentExtractor, MockFileSystem>;

/// Builder for orchestrators backed by mocks
pub struct OrchestratorBuilder {
    config: PipelineConfig,
    extractor: MockContentExtractor,
    file_system: MockFileSystem,
    credentials: MockCredentialSource,
    catalog: MockCatalogClient,
    llm: MockLlmClient,
    llm_unavailable: bool,
}

impl OrchestratorBuilder {
    /// Valid credentials, no retries, no batch delay; nothing else expected
    pub fn new() -> Self {
        let mut credentials = MockCredentialSource::new();
        credentials
            .expect_load_credentials()
            .returning(|| Ok(TestHelpers::credentials()));

        Self {
            config: TestHelpers::test_config(),
            extractor: MockContentExtractor::new(),
            file_system: MockFileSystem::new(),
            credentials,
            catalog: MockCatalogClient::new(),
            llm: MockLlmClient::new(),
            llm_unavailable: false,
        }
    }

    pub fn with_mode(mut self, mode: ExtractionMode) -> Self {
        self.config.extraction.mode = mode;
        self
    }

    pub fn with_config(mut self, update: impl FnOnce(&mut PipelineConfig)) -> Self {
        update(&mut self.config);
        self
    }

    /// Extractor serving `html` once and expecting exactly one cleanup
    pub fn with_page(mut self, html: String) -> Self {
        self.extractor
            .expect_extract()
            .times(1)
            .returning(move |_| Ok(html.clone()));
        self.extractor.expect_cleanup().times(1).returning(|| Ok(()));
        self
    }

    pub fn with_extractor(mut self, extractor: MockContentExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Every completion answers with `reply`
    pub fn with_llm_reply(mut self, reply: String) -> Self {
        self.llm
            .expect_complete()
            .returning(move |_| Ok(TestFixtures::completion(&reply)));
        self
    }

    pub fn with_llm_failure(mut self) -> Self {
        self.llm
            .expect_complete()
            .returning(|_| Err(LlmFailure::ServiceUnavailable));
        self
    }

    /// The factory fails to construct the model client
    pub fn with_llm_unavailable(mut self) -> Self {
        self.llm_unavailable = true;
        self
    }

    pub fn with_catalog(mut self, catalog: MockCatalogClient) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_file_system(mut self, file_system: MockFileSystem) -> Self {
        self.file_system = file_system;
        self
    }

    pub fn with_missing_credentials(mut self, keys: &[&str]) -> Self {
        let missing: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        let mut credentials = MockCredentialSource::new();
        credentials.expect_load_credentials().returning(move || {
            Err(RequiredKeyMissing {
                missing: missing.clone(),
                message: format!("Missing required keys: {}", missing.join(", ")),
            })
        });
        self.credentials = credentials;
        self
    }

    /// Catalog keys present, no language model key
    pub fn without_llm_key(mut self) -> Self {
        let mut credentials = MockCredentialSource::new();
        credentials.expect_load_credentials().returning(|| {
            Ok(Credentials {
                llm: None,
                ..TestHelpers::credentials()
            })
        });
        self.credentials = credentials;
        self
    }

    pub fn build(self) -> TestOrchestrator {
        let catalog: Arc<dyn CatalogClient> = Arc::new(self.catalog);
        let llm: Arc<dyn LlmClient> = Arc::new(self.llm);

        let mut factory = MockClientFactory::new();
        factory
            .expect_http_client()
            .returning(|| Ok(reqwest::Client::new()));
        factory
            .expect_catalog_client()
            .returning(move |_, _| Ok(catalog.clone()));
        let llm_unavailable = self.llm_unavailable;
        factory.expect_llm_client().returning(move |_, _| {
            if llm_unavailable {
                Err(OrchestratorError::config("model endpoint rejected the client"))
            } else {
                Ok(llm.clone())
            }
        });

        let registry = Arc::new(ClientRegistry::new(Arc::new(self.credentials), Arc::new(factory)));
        Orchestrator::new(self.extractor, self.file_system, registry, self.config)
    }
}

impl Default for OrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Run helpers and assertions
pub struct TestHelpers;

impl TestHelpers {
    pub fn credentials() -> Credentials {
        Credentials {
            catalog: SpotifyCredentials {
                client_id: "client-id".to_string(),
                client_secret: "client-secret".to_string(),
                redirect_uri: Some("http://localhost:8888/callback".to_string()),
                refresh_token: Some("refresh".to_string()),
            },
            llm: Some(LlmCredentials {
                api_key: "sk-test".to_string(),
                base_url: None,
                model: None,
            }),
        }
    }

    pub fn test_config() -> PipelineConfig {
        let mut config = PipelineConfig::default();
        config.extraction.retry = RetryPolicy::no_retry();
        config.playlist.retry = RetryPolicy::no_retry();
        config.playlist.batch_delay_ms = 0;
        config
    }

    /// Run a scan and collect every progress event it sent
    pub async fn run(
        orchestrator: &TestOrchestrator,
        options: &RunOptions,
        cancel: CancellationToken,
    ) -> (OrchestratorResult<RunSummary>, Vec<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(256);
        let result = orchestrator.run(TestFixtures::PAGE_URL, options, tx, cancel).await;
        (result, Self::drain(rx).await)
    }

    pub async fn rebuild(
        orchestrator: &TestOrchestrator,
        path: &Path,
        options: &PlaylistOptions,
    ) -> (OrchestratorResult<RunSummary>, Vec<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(256);
        let result = orchestrator
            .build_from_snapshot(path, options, tx, CancellationToken::new())
            .await;
        (result, Self::drain(rx).await)
    }

    async fn drain(mut rx: mpsc::Receiver<ProgressEvent>) -> Vec<ProgressEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    pub fn playlist_options(name: &str) -> PlaylistOptions {
        PlaylistOptions {
            name: Some(name.to_string()),
            description: Some("test playlist".to_string()),
            selection: catalog::TrackSelection::All,
        }
    }

    pub fn assert_monotonic(events: &[ProgressEvent]) {
        for pair in events.windows(2) {
            assert!(
                pair[0].progress <= pair[1].progress,
                "progress went from {} to {}",
                pair[0].progress,
                pair[1].progress
            );
        }
    }

    pub fn assert_completed(events: &[ProgressEvent]) {
        let last = events.last().expect("at least one event");
        assert_eq!(last.progress, 100);
        assert_eq!(last.phase, RunPhase::Complete);
    }

    /// Last event is a failure whose message contains `needle`
    pub fn assert_failed_with(events: &[ProgressEvent], needle: &str) {
        let last = events.last().expect("at least one event");
        match &last.phase {
            RunPhase::Failed(reason) => assert!(reason.contains(needle), "unexpected failure: {reason}"),
            other => panic!("expected failure, got {other:?}"),
        }
    }

    pub fn phases(events: &[ProgressEvent]) -> Vec<RunPhase> {
        let mut phases: Vec<RunPhase> = Vec::new();
        for event in events {
            if phases.last() != Some(&event.phase) {
                phases.push(event.phase.clone());
            }
        }
        phases
    }
}
