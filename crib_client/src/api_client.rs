//! HTTP API client for the cribbage server.

use async_trait::async_trait;
use cribbage::{
    ClientError, GameView, RequestKind,
    messages::{
        DiscardRequest, ErrorBody, GameList, GoRequest, JoinRequest, PlayRequest, PlayerStats,
    },
};
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use tracing::debug;

/// The requests a session makes against one game. Every call either
/// yields a full snapshot or a [`ClientError`]; nothing is retried here.
#[async_trait]
pub trait GameApi: Send + Sync {
    async fn join(&self, request: &JoinRequest) -> Result<GameView, ClientError>;

    async fn fetch_state(&self, player_id: &str) -> Result<GameView, ClientError>;

    async fn discard(&self, request: &DiscardRequest) -> Result<GameView, ClientError>;

    async fn play(&self, request: &PlayRequest) -> Result<GameView, ClientError>;

    /// The server answers a go with a short status body rather than a
    /// snapshot, so only success is reported.
    async fn go(&self, request: &GoRequest) -> Result<(), ClientError>;

    async fn player_stats(&self, player_id: &str) -> Result<PlayerStats, ClientError>;
}

/// API client for communicating with the cribbage server
#[derive(Clone, Debug)]
pub struct ApiClient {
    base_url: String,
    game_id: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a new API client for one game
    pub fn new(base_url: impl Into<String>, game_id: impl Into<String>) -> Self {
        Self::with_client(base_url, game_id, reqwest::Client::new())
    }

    /// Create a client whose requests give up after `timeout`
    pub fn with_timeout(
        base_url: impl Into<String>,
        game_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(network_fault)?;
        Ok(Self::with_client(base_url, game_id, client))
    }

    fn with_client(
        base_url: impl Into<String>,
        game_id: impl Into<String>,
        client: reqwest::Client,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            game_id: game_id.into(),
            client,
        }
    }

    #[must_use]
    pub fn game_id(&self) -> &str {
        &self.game_id
    }

    /// List the games the server knows about
    pub async fn list_games(&self) -> Result<Vec<String>, ClientError> {
        let url = format!("{}/games", self.base_url);
        let list: GameList = self.get(&url, "Failed to list games").await?;
        Ok(list.games)
    }

    fn game_url(&self, path: &str) -> String {
        format!("{}/games/{}/{}", self.base_url, self.game_id, path)
    }

    async fn get<T: DeserializeOwned>(&self, url: &str, fallback: &str) -> Result<T, ClientError> {
        debug!(%url, "GET");
        let response = self.client.get(url).send().await.map_err(network_fault)?;
        read_json(response, fallback).await
    }

    async fn post<B, T>(&self, url: &str, body: &B, fallback: &str) -> Result<T, ClientError>
    where
        B: Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        debug!(%url, "POST");
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(network_fault)?;
        read_json(response, fallback).await
    }
}

#[async_trait]
impl GameApi for ApiClient {
    async fn join(&self, request: &JoinRequest) -> Result<GameView, ClientError> {
        let url = self.game_url("join");
        self.post(&url, request, RequestKind::Join.fallback_reason())
            .await
    }

    async fn fetch_state(&self, player_id: &str) -> Result<GameView, ClientError> {
        let url = self.game_url(&format!("{player_id}/state"));
        self.get(&url, RequestKind::Poll.fallback_reason()).await
    }

    async fn discard(&self, request: &DiscardRequest) -> Result<GameView, ClientError> {
        let url = self.game_url("discard");
        self.post(&url, request, RequestKind::Discard.fallback_reason())
            .await
    }

    async fn play(&self, request: &PlayRequest) -> Result<GameView, ClientError> {
        let url = self.game_url("play");
        self.post(&url, request, RequestKind::Play.fallback_reason())
            .await
    }

    async fn go(&self, request: &GoRequest) -> Result<(), ClientError> {
        let url = self.game_url("go");
        debug!(%url, "POST");
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(network_fault)?;
        read_body(response, RequestKind::Go.fallback_reason())
            .await
            .map(|_| ())
    }

    async fn player_stats(&self, player_id: &str) -> Result<PlayerStats, ClientError> {
        let url = format!("{}/players/{}/stats", self.base_url, player_id);
        self.get(&url, "Failed to fetch player stats").await
    }
}

fn network_fault(error: reqwest::Error) -> ClientError {
    ClientError::NetworkFault(error.to_string())
}

/// Read the body of a successful response. Non-success statuses become
/// [`ClientError::RejectedAction`] carrying the server's `detail`, or
/// `fallback` when there isn't one.
async fn read_body(response: reqwest::Response, fallback: &str) -> Result<String, ClientError> {
    let status = response.status();
    let body = response.text().await.map_err(network_fault)?;

    if !status.is_success() {
        let detail = ErrorBody::reason_from(&body).unwrap_or_else(|| fallback.to_string());
        debug!(status = status.as_u16(), %detail, "request rejected");
        return Err(ClientError::RejectedAction {
            status: status.as_u16(),
            detail,
        });
    }
    Ok(body)
}

async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    fallback: &str,
) -> Result<T, ClientError> {
    let body = read_body(response, fallback).await?;
    serde_json::from_str(&body).map_err(ClientError::from)
}
