//! Tests for environment credential loading

use std::collections::HashMap;

use assert_matches::assert_matches;

use crate::error::OrchestratorError;
use crate::services::api_keys::EnvCredentialSource;
use crate::traits::CredentialSource;

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn complete_vars() -> HashMap<String, String> {
    vars(&[
        ("SPOTIFY_CLIENT_ID", "id"),
        ("SPOTIFY_CLIENT_SECRET", "secret"),
        ("SPOTIFY_REDIRECT_URI", "http://localhost:8888/callback"),
        ("OPENAI_API_KEY", "sk-test"),
    ])
}

#[tokio::test]
async fn test_all_required_keys_present() {
    let source = EnvCredentialSource::with_vars(complete_vars());

    let credentials = source.load_credentials().await.unwrap();

    assert_eq!(credentials.catalog.client_id, "id");
    assert_eq!(credentials.catalog.client_secret, "secret");
    assert_eq!(credentials.catalog.redirect_uri.as_deref(), Some("http://localhost:8888/callback"));
    assert_eq!(credentials.catalog.refresh_token, None);
    let llm = credentials.require_llm().unwrap();
    assert_eq!(llm.api_key, "sk-test");
    assert_eq!(llm.model, None);
}

#[tokio::test]
async fn test_optional_keys_are_picked_up() {
    let mut all = complete_vars();
    all.extend(vars(&[
        ("SPOTIFY_REFRESH_TOKEN", "refresh"),
        ("OPENAI_BASE_URL", "http://localhost:11434/v1"),
        ("OPENAI_MODEL", "gpt-4o"),
    ]));
    let source = EnvCredentialSource::with_vars(all);

    let credentials = source.load_credentials().await.unwrap();

    assert_eq!(credentials.catalog.refresh_token.as_deref(), Some("refresh"));
    let llm = credentials.require_llm().unwrap();
    assert_eq!(llm.base_url.as_deref(), Some("http://localhost:11434/v1"));
    assert_eq!(llm.model.as_deref(), Some("gpt-4o"));
}

#[tokio::test]
async fn test_legacy_names_are_accepted() {
    let source = EnvCredentialSource::with_vars(vars(&[
        ("SPOTIPY_CLIENT_ID", "legacy-id"),
        ("SPOTIPY_CLIENT_SECRET", "legacy-secret"),
        ("SPOTIPY_REDIRECT_URI", "http://localhost/cb"),
        ("SPOTIFY_CLIENT_ID", "new-id"),
        ("OPENAI_API_KEY", "sk-test"),
    ]));

    let credentials = source.load_credentials().await.unwrap();

    // Primary name wins over the alias
    assert_eq!(credentials.catalog.client_id, "new-id");
    assert_eq!(credentials.catalog.client_secret, "legacy-secret");
}

#[tokio::test]
async fn test_every_missing_key_is_listed() {
    let source = EnvCredentialSource::with_vars(vars(&[("SPOTIFY_CLIENT_ID", "id")]));

    let err = source.load_credentials().await.unwrap_err();

    assert_eq!(err.missing, vec!["SPOTIFY_CLIENT_SECRET", "SPOTIFY_REDIRECT_URI"]);
    assert!(err.message.contains("SPOTIFY_CLIENT_SECRET"));
    assert!(!err.message.contains("OPENAI_API_KEY"));
}

#[tokio::test]
async fn test_model_key_is_only_needed_for_text() {
    let mut catalog_only = complete_vars();
    catalog_only.remove("OPENAI_API_KEY");
    catalog_only.insert("OPENAI_MODEL".to_string(), "gpt-4o".to_string());
    let source = EnvCredentialSource::with_vars(catalog_only);

    let credentials = source.load_credentials().await.unwrap();

    assert_eq!(credentials.catalog.client_id, "id");
    assert_eq!(credentials.llm, None);
    assert_matches!(
        credentials.require_llm(),
        Err(OrchestratorError::ConfigurationError { field }) if field.contains("OPENAI_API_KEY")
    );
}

#[tokio::test]
async fn test_blank_values_count_as_missing() {
    let mut all = complete_vars();
    all.insert("OPENAI_API_KEY".to_string(), "   ".to_string());
    all.insert("SPOTIFY_CLIENT_ID".to_string(), "  padded-id  ".to_string());
    let source = EnvCredentialSource::with_vars(all);

    let credentials = source.load_credentials().await.unwrap();

    assert_eq!(credentials.llm, None);
    assert_eq!(credentials.catalog.client_id, "padded-id");
}
