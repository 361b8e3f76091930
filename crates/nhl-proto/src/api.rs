//! Data-source contract and the HTTP client for the public stats API.

use chrono::NaiveDate;
use futures_util::future::{FutureExt, LocalBoxFuture};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::model::{Boxscore, GameId, LiveGameData, Schedule};
use crate::score::{FeedScore, ScoreStrategy};

/// Failure of a data-source request. The `Display` text is what the user sees.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{0}")]
    Transport(String),
    #[error("server returned {status} for {url}")]
    Status { status: u16, url: String },
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },
    #[error("not found: {0}")]
    NotFound(String),
}

/// Where schedule and game feeds come from.
///
/// Futures are local: the engine runs on a single-threaded runtime and never
/// moves a fetch across threads.
pub trait DataSource {
    fn fetch_schedule(&self, date: NaiveDate) -> LocalBoxFuture<'_, Result<Schedule, ApiError>>;

    fn fetch_live_game(&self, game_id: GameId)
        -> LocalBoxFuture<'_, Result<LiveGameData, ApiError>>;

    /// How scores are derived from this source's feeds.
    fn score_strategy(&self) -> &dyn ScoreStrategy;
}

pub struct NhlClient {
    client: reqwest::Client,
    base_url: String,
    strategy: FeedScore,
}

impl NhlClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("nhl-viewer/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            strategy: FeedScore,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn schedule(&self, date: NaiveDate) -> Result<Schedule, ApiError> {
        self.get_json(&format!("/schedule/{}", date.format("%Y-%m-%d")))
            .await
    }

    pub async fn play_by_play(&self, game_id: GameId) -> Result<LiveGameData, ApiError> {
        self.get_json(&format!("/gamecenter/{game_id}/play-by-play"))
            .await
    }

    pub async fn boxscore(&self, game_id: GameId) -> Result<Boxscore, ApiError> {
        self.get_json(&format!("/gamecenter/{game_id}/boxscore")).await
    }

    /// Play-by-play feed, with final scores copied from the boxscore once the
    /// game is over. A failed boxscore leaves the scores to the strategy.
    pub async fn live_game(&self, game_id: GameId) -> Result<LiveGameData, ApiError> {
        let mut feed = self.play_by_play(game_id).await?;
        if feed.game_state.is_finished() {
            match self.boxscore(game_id).await {
                Ok(boxscore) => {
                    feed.away_team.score = boxscore.away_team.score.or(feed.away_team.score);
                    feed.home_team.score = boxscore.home_team.score.or(feed.home_team.score);
                }
                Err(e) => warn!("[api] boxscore for {} unavailable: {}", game_id, e),
            }
        }
        Ok(feed)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("[api] GET {}", url);

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| ApiError::Transport(describe_transport(&e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(url));
        }
        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| ApiError::Transport(describe_transport(&e)))?;
        serde_json::from_slice(&body).map_err(|e| ApiError::Decode {
            url,
            message: e.to_string(),
        })
    }
}

fn describe_transport(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        "could not connect to the stats server".to_string()
    } else {
        e.to_string()
    }
}

impl DataSource for NhlClient {
    fn fetch_schedule(&self, date: NaiveDate) -> LocalBoxFuture<'_, Result<Schedule, ApiError>> {
        self.schedule(date).boxed_local()
    }

    fn fetch_live_game(
        &self,
        game_id: GameId,
    ) -> LocalBoxFuture<'_, Result<LiveGameData, ApiError>> {
        self.live_game(game_id).boxed_local()
    }

    fn score_strategy(&self) -> &dyn ScoreStrategy {
        &self.strategy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_readable() {
        assert_eq!(ApiError::Transport("network down".into()).to_string(), "network down");
        let status = ApiError::Status {
            status: 503,
            url: "http://x/schedule/2024-01-15".into(),
        };
        assert_eq!(
            status.to_string(),
            "server returned 503 for http://x/schedule/2024-01-15"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let config = ApiConfig {
            base_url: "http://127.0.0.1:9/v1/".to_string(),
            timeout_secs: 1,
        };
        let client = NhlClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:9/v1");
    }
}
