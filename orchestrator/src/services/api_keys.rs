//! Environment-based credential loading
//!
//! Credentials are loaded from:
//! 1. `.env` file in the current directory or parent directories (if present)
//! 2. System environment variables
//!
//! Environment variables take precedence over .env file values. The catalog
//! keys are also accepted under their legacy `SPOTIPY_*` names. The model key
//! is optional here; runs that read text check for it themselves.

use std::collections::HashMap;
use tracing::{debug, info};

use catalog::SpotifyCredentials;

use crate::traits::{CredentialSource, Credentials, LlmCredentials, RequiredKeyMissing};

/// Credential source reading environment variables
pub struct EnvCredentialSource {
    /// Fixed values used instead of the process environment
    overrides: Option<HashMap<String, String>>,
}

impl EnvCredentialSource {
    /// Keys that must be present, each with its legacy alias
    const REQUIRED_KEYS: &'static [(&'static str, Option<&'static str>)] = &[
        ("SPOTIFY_CLIENT_ID", Some("SPOTIPY_CLIENT_ID")),
        ("SPOTIFY_CLIENT_SECRET", Some("SPOTIPY_CLIENT_SECRET")),
        ("SPOTIFY_REDIRECT_URI", Some("SPOTIPY_REDIRECT_URI")),
    ];

    const OPTIONAL_KEYS: &'static [(&'static str, Option<&'static str>)] = &[
        ("SPOTIFY_REFRESH_TOKEN", Some("SPOTIPY_REFRESH_TOKEN")),
        ("OPENAI_API_KEY", None),
        ("OPENAI_BASE_URL", None),
        ("OPENAI_MODEL", None),
    ];

    pub fn new() -> Self {
        Self { overrides: None }
    }

    /// Read from a fixed map instead of the environment
    pub fn with_vars(vars: HashMap<String, String>) -> Self {
        Self {
            overrides: Some(vars),
        }
    }

    /// Load `.env` if present; already-set variables win
    fn init_env() {
        let _ = dotenv::dotenv();
    }

    fn var(&self, name: &str) -> Option<String> {
        let value = match &self.overrides {
            Some(vars) => vars.get(name).cloned(),
            None => std::env::var(name).ok(),
        };
        value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
    }

    /// Value under the primary name, else under the legacy alias
    fn lookup(&self, (name, alias): (&str, Option<&str>)) -> Option<String> {
        self.var(name).or_else(|| {
            let value = alias.and_then(|alias| self.var(alias));
            if value.is_some() {
                debug!("Using legacy variable for {}", name);
            }
            value
        })
    }
}

impl Default for EnvCredentialSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CredentialSource for EnvCredentialSource {
    async fn load_credentials(&self) -> Result<Credentials, RequiredKeyMissing> {
        if self.overrides.is_none() {
            Self::init_env();
        }

        let mut found = HashMap::new();
        let mut missing = Vec::new();

        for &key in Self::REQUIRED_KEYS {
            match self.lookup(key) {
                Some(value) => {
                    found.insert(key.0, value);
                }
                None => missing.push(key.0.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(RequiredKeyMissing {
                message: format!(
                    "Missing required keys: {}. These keys must be set as environment variables or in .env.",
                    missing.join(", ")
                ),
                missing,
            });
        }

        for &key in Self::OPTIONAL_KEYS {
            if let Some(value) = self.lookup(key) {
                found.insert(key.0, value);
            }
        }

        let optional: Vec<&str> = Self::OPTIONAL_KEYS
            .iter()
            .map(|(name, _)| *name)
            .filter(|name| found.contains_key(*name))
            .collect();
        info!("🔑 Credentials loaded (optional: {})", if optional.is_empty() { "none".to_string() } else { optional.join(", ") });

        let mut take = |name: &str| found.remove(name);
        Ok(Credentials {
            catalog: SpotifyCredentials {
                client_id: take("SPOTIFY_CLIENT_ID").unwrap_or_default(),
                client_secret: take("SPOTIFY_CLIENT_SECRET").unwrap_or_default(),
                redirect_uri: take("SPOTIFY_REDIRECT_URI"),
                refresh_token: take("SPOTIFY_REFRESH_TOKEN"),
            },
            llm: take(Credentials::LLM_KEY).map(|api_key| LlmCredentials {
                api_key,
                base_url: take("OPENAI_BASE_URL"),
                model: take("OPENAI_MODEL"),
            }),
        })
    }
}
