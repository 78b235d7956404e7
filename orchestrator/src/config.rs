//! Pipeline configuration
//!
//! Every field has a default, so a partial JSON file only overrides what it
//! names. The playlist batch size is clamped to the service ceiling when used
//! rather than rejected here.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use analyzer::{BrowserOptions, ExtractionConfig};
use catalog::{PlaylistConfig, ResolverConfig, TrackSelection};
use shared::SlidingWindowLimiter;

use crate::error::{OrchestratorError, OrchestratorResult};

/// Call budget and cache lifetime for one external service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceLimits {
    pub max_calls: usize,
    pub window_secs: u64,
    pub cache_ttl_secs: u64,
}

impl ServiceLimits {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn limiter(&self) -> SlidingWindowLimiter {
        SlidingWindowLimiter::new(self.max_calls, self.window())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimits {
    pub catalog: ServiceLimits,
    pub llm: ServiceLimits,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            catalog: ServiceLimits {
                max_calls: 100,
                window_secs: 60,
                cache_ttl_secs: 3600,
            },
            llm: ServiceLimits {
                max_calls: 50,
                window_secs: 60,
                cache_ttl_secs: 3600,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub extraction: ExtractionConfig,
    pub browser: BrowserOptions,
    pub resolver: ResolverConfig,
    pub playlist: PlaylistConfig,
    pub limits: RateLimits,
    pub selection: TrackSelection,
    /// Timeout applied to every HTTP request
    pub http_timeout_secs: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extraction: ExtractionConfig::default(),
            browser: BrowserOptions::default(),
            resolver: ResolverConfig::default(),
            playlist: PlaylistConfig::default(),
            limits: RateLimits::default(),
            selection: TrackSelection::default(),
            http_timeout_secs: 30,
        }
    }
}

impl PipelineConfig {
    /// Load from a JSON file and validate
    pub async fn from_file(path: &Path) -> OrchestratorResult<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: PipelineConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> OrchestratorResult<()> {
        if self.http_timeout_secs == 0 {
            return Err(OrchestratorError::config("http_timeout_secs must be positive"));
        }
        if self.extraction.chunk_size == 0 {
            return Err(OrchestratorError::config("extraction.chunk_size must be positive"));
        }
        if self.extraction.chunk_concurrency == 0 {
            return Err(OrchestratorError::config("extraction.chunk_concurrency must be positive"));
        }
        if self.resolver.negative_ttl_secs > self.resolver.positive_ttl_secs {
            return Err(OrchestratorError::config(
                "resolver.negative_ttl_secs must not exceed resolver.positive_ttl_secs",
            ));
        }
        for (name, limits) in [("catalog", &self.limits.catalog), ("llm", &self.limits.llm)] {
            if limits.max_calls == 0 || limits.window_secs == 0 {
                return Err(OrchestratorError::config(format!("limits.{name} must allow calls")));
            }
        }
        Ok(())
    }
}
