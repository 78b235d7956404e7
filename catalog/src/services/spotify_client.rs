//! Spotify Web API client
//!
//! Catalog reads use an app token from the client-credentials flow. Playlist
//! mutations and `/me` need a user token, obtained by exchanging the configured
//! refresh token. Each token sits behind its own mutex that stays held while a
//! new token is fetched, so concurrent callers share one handshake.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, info};

use shared::ReferenceKind;

use crate::error::{CatalogError, CatalogResult};
use crate::traits::CatalogClient;
use crate::types::{Album, AlbumSummary, SearchHit, Track, artist_names, MAX_BATCH_SIZE, MAX_TRACK_LOOKUP};

pub const DEFAULT_API_BASE: &str = "https://api.spotify.com/v1";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Tokens are refreshed this long before they expire
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// OAuth application credentials
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpotifyCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: Option<String>,
    /// Needed for playlist mutations
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TokenScope {
    App,
    User,
}

struct AccessToken {
    value: String,
    expires_at: Instant,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        self.expires_at > Instant::now() + TOKEN_EXPIRY_MARGIN
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    albums: Option<crate::types::Paging<AlbumSummary>>,
    #[serde(default)]
    tracks: Option<crate::types::Paging<Track>>,
}

#[derive(Deserialize)]
struct TracksResponse {
    #[serde(default)]
    tracks: Vec<Option<Track>>,
}

#[derive(Deserialize)]
struct UserResponse {
    id: String,
}

#[derive(Deserialize)]
struct CreatedPlaylist {
    id: String,
}

/// Spotify Web API implementation of [`CatalogClient`]
pub struct SpotifyClient {
    http: reqwest::Client,
    credentials: SpotifyCredentials,
    api_base: String,
    token_url: String,
    app_token: Mutex<Option<AccessToken>>,
    user_token: Mutex<Option<AccessToken>>,
}

impl SpotifyClient {
    pub fn new(credentials: SpotifyCredentials) -> Self {
        Self::with_http_client(reqwest::Client::new(), credentials)
    }

    /// Share an existing connection pool
    pub fn with_http_client(http: reqwest::Client, credentials: SpotifyCredentials) -> Self {
        Self {
            http,
            credentials,
            api_base: DEFAULT_API_BASE.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            app_token: Mutex::new(None),
            user_token: Mutex::new(None),
        }
    }

    /// Point the client at other endpoints
    pub fn with_endpoints(mut self, api_base: impl Into<String>, token_url: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self.token_url = token_url.into();
        self
    }

    /// Fetch the app token eagerly so bad credentials surface early
    pub async fn authenticate(&self) -> CatalogResult<()> {
        self.token(TokenScope::App).await.map(|_| ())
    }

    async fn token(&self, scope: TokenScope) -> CatalogResult<String> {
        let slot = match scope {
            TokenScope::App => &self.app_token,
            TokenScope::User => &self.user_token,
        };

        let mut token = slot.lock().await;
        if let Some(current) = token.as_ref() {
            if current.is_fresh() {
                return Ok(current.value.clone());
            }
        }

        let form: Vec<(&str, &str)> = match scope {
            TokenScope::App => vec![("grant_type", "client_credentials")],
            TokenScope::User => {
                let refresh_token = self.credentials.refresh_token.as_deref().ok_or_else(|| {
                    CatalogError::AuthenticationError {
                        message: "user authorization required: set SPOTIFY_REFRESH_TOKEN".to_string(),
                    }
                })?;
                vec![("grant_type", "refresh_token"), ("refresh_token", refresh_token)]
            }
        };

        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(&self.credentials.client_id, Some(&self.credentials.client_secret))
            .form(&form)
            .send()
            .await
            .map_err(network_error)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CatalogError::AuthenticationError {
                message: format!("token request returned {status}: {message}"),
            });
        }

        let body: TokenResponse = response.json().await.map_err(parse_error)?;
        info!("🔑 Obtained {:?} access token", scope);

        let value = body.access_token.clone();
        *token = Some(AccessToken {
            value: body.access_token,
            expires_at: Instant::now() + Duration::from_secs(body.expires_in),
        });
        Ok(value)
    }

    async fn forget_token(&self, scope: TokenScope) {
        match scope {
            TokenScope::App => *self.app_token.lock().await = None,
            TokenScope::User => *self.user_token.lock().await = None,
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        scope: TokenScope,
    ) -> CatalogResult<T> {
        let token = self.token(scope).await?;
        let request = self
            .http
            .get(format!("{}{}", self.api_base, path))
            .bearer_auth(token)
            .query(query);
        self.send(request, path, scope).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &serde_json::Value,
        scope: TokenScope,
    ) -> CatalogResult<T> {
        let token = self.token(scope).await?;
        let request = self
            .http
            .post(format!("{}{}", self.api_base, path))
            .bearer_auth(token)
            .json(body);
        self.send(request, path, scope).await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        path: &str,
        scope: TokenScope,
    ) -> CatalogResult<T> {
        let response = request.send().await.map_err(network_error)?;
        let status = response.status();

        if status.is_success() {
            return response.json().await.map_err(parse_error);
        }

        debug!("Catalog request {} returned {}", path, status);
        Err(match status.as_u16() {
            401 => {
                self.forget_token(scope).await;
                CatalogError::AuthenticationError {
                    message: format!("{path} rejected the access token"),
                }
            }
            404 => CatalogError::NotFound {
                resource: path.to_string(),
            },
            429 => CatalogError::RateLimited {
                retry_after: retry_after_header(response.headers()),
            },
            code => CatalogError::ApiError {
                status: code,
                message: response.text().await.unwrap_or_default(),
            },
        })
    }
}

fn network_error(err: reqwest::Error) -> CatalogError {
    CatalogError::NetworkError {
        message: err.to_string(),
    }
}

fn parse_error(err: reqwest::Error) -> CatalogError {
    CatalogError::ParseError {
        message: err.to_string(),
    }
}

fn retry_after_header(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

#[async_trait]
impl CatalogClient for SpotifyClient {
    async fn search(&self, query: &str, kind: ReferenceKind, limit: u32) -> CatalogResult<Vec<SearchHit>> {
        let params = [
            ("q", query.to_string()),
            ("type", kind.catalog_type().to_string()),
            ("limit", limit.clamp(1, 50).to_string()),
        ];
        let response: SearchResponse = self.get_json("/search", &params, TokenScope::App).await?;

        let hits = match kind {
            ReferenceKind::Album => response
                .albums
                .map(|page| page.items)
                .unwrap_or_default()
                .into_iter()
                .map(|album| SearchHit {
                    artist: artist_names(&album.artists),
                    id: album.id,
                    kind,
                    name: album.name,
                })
                .collect(),
            ReferenceKind::Song => response
                .tracks
                .map(|page| page.items)
                .unwrap_or_default()
                .into_iter()
                .filter_map(|track| {
                    Some(SearchHit {
                        artist: artist_names(&track.artists),
                        id: track.id?,
                        kind,
                        name: track.name,
                    })
                })
                .collect(),
        };
        Ok(hits)
    }

    async fn get_album(&self, id: &str) -> CatalogResult<Album> {
        self.get_json(&format!("/albums/{id}"), &[], TokenScope::App).await
    }

    async fn get_track(&self, id: &str) -> CatalogResult<Track> {
        self.get_json(&format!("/tracks/{id}"), &[], TokenScope::App).await
    }

    async fn get_tracks(&self, ids: &[String]) -> CatalogResult<Vec<Track>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        if ids.len() > MAX_TRACK_LOOKUP {
            return Err(CatalogError::InvalidRequest {
                message: format!("{} ids exceed the lookup limit of {MAX_TRACK_LOOKUP}", ids.len()),
            });
        }

        let response: TracksResponse = self
            .get_json("/tracks", &[("ids", ids.join(","))], TokenScope::App)
            .await?;
        Ok(response.tracks.into_iter().flatten().collect())
    }

    async fn current_user_id(&self) -> CatalogResult<String> {
        let user: UserResponse = self.get_json("/me", &[], TokenScope::User).await?;
        Ok(user.id)
    }

    async fn create_playlist(&self, user_id: &str, name: &str, description: &str, public: bool) -> CatalogResult<String> {
        let body = serde_json::json!({
            "name": name,
            "description": description,
            "public": public
        });
        let created: CreatedPlaylist = self
            .post_json(&format!("/users/{user_id}/playlists"), &body, TokenScope::User)
            .await?;
        Ok(created.id)
    }

    async fn add_playlist_items(&self, playlist_id: &str, uris: &[String]) -> CatalogResult<()> {
        if uris.len() > MAX_BATCH_SIZE {
            return Err(CatalogError::InvalidRequest {
                message: format!("{} items exceed the batch limit of {MAX_BATCH_SIZE}", uris.len()),
            });
        }

        let body = serde_json::json!({ "uris": uris });
        let _: serde_json::Value = self
            .post_json(&format!("/playlists/{playlist_id}/tracks"), &body, TokenScope::User)
            .await?;
        Ok(())
    }
}
