//! `NhlClient` against an in-process mock of the stats API.
//!
//! Run with: cargo test -p nhl-proto --test client_mock_server

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::NaiveDate;
use serde_json::{json, Value};

use nhl_proto::api::{ApiError, DataSource, NhlClient};
use nhl_proto::config::ApiConfig;
use nhl_proto::model::GameState;
use nhl_proto::score::Score;

fn team(id: u64, abbrev: &str, score: Option<u32>) -> Value {
    let mut t = json!({
        "id": id,
        "abbrev": abbrev,
        "placeName": { "default": abbrev },
        "commonName": { "default": "Team" },
    });
    if let Some(s) = score {
        t["score"] = json!(s);
    }
    t
}

fn game(id: u64, state: &str) -> Value {
    json!({
        "id": id,
        "gameState": state,
        "startTimeUTC": "2024-01-16T00:00:00Z",
        "awayTeam": team(10, "TOR", None),
        "homeTeam": team(8, "MTL", None),
        "venue": { "default": "Bell Centre" },
        "neutralSite": false,
    })
}

fn goal(event_id: u64, owner: u64) -> Value {
    json!({
        "eventId": event_id,
        "typeDescKey": "goal",
        "periodDescriptor": { "number": 1, "periodType": "REG" },
        "timeInPeriod": "05:00",
        "details": { "eventOwnerTeamId": owner, "scoringPlayerId": 97 },
    })
}

fn feed(id: u64, state: &str) -> Value {
    json!({
        "id": id,
        "gameState": state,
        "venue": { "default": "Bell Centre" },
        "awayTeam": team(10, "TOR", None),
        "homeTeam": team(8, "MTL", None),
        "periodDescriptor": { "number": 3, "periodType": "REG" },
        "clock": { "timeRemaining": "00:00", "running": false, "inIntermission": false },
        "plays": [goal(1, 10), goal(2, 8), goal(3, 10)],
        "rosterSpots": [
            { "playerId": 97, "teamId": 10, "firstName": { "default": "Connor" }, "lastName": { "default": "Test" } }
        ],
    })
}

async fn schedule() -> Json<Value> {
    Json(json!({
        "nextStartDate": "2024-01-22",
        "gameWeek": [
            {
                "date": "2024-01-15",
                "dayAbbrev": "MON",
                "games": [game(1, "FINAL"), game(2, "LIVE"), game(3, "FUT")],
            },
            { "date": "2024-01-16", "games": [] },
        ],
    }))
}

async fn finished_feed() -> Json<Value> {
    Json(feed(1, "FINAL"))
}

async fn finished_boxscore() -> Json<Value> {
    Json(json!({
        "awayTeam": team(10, "TOR", Some(5)),
        "homeTeam": team(8, "MTL", Some(4)),
    }))
}

async fn off_feed_without_boxscore() -> Json<Value> {
    Json(feed(2, "OFF"))
}

async fn failing_feed() -> impl IntoResponse {
    (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded")
}

async fn garbled_feed() -> impl IntoResponse {
    (StatusCode::OK, "{ not json")
}

async fn start_mock() -> String {
    let app = Router::new()
        .route("/v1/schedule/2024-01-15", get(schedule))
        .route("/v1/gamecenter/1/play-by-play", get(finished_feed))
        .route("/v1/gamecenter/1/boxscore", get(finished_boxscore))
        .route("/v1/gamecenter/2/play-by-play", get(off_feed_without_boxscore))
        .route("/v1/gamecenter/3/play-by-play", get(failing_feed))
        .route("/v1/gamecenter/4/play-by-play", get(garbled_feed));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}/v1", addr)
}

fn client(base_url: String) -> NhlClient {
    NhlClient::new(&ApiConfig {
        base_url,
        timeout_secs: 5,
    })
    .unwrap()
}

#[tokio::test]
async fn test_schedule_week_decodes() {
    let client = client(start_mock().await);
    let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();

    let schedule = client.fetch_schedule(date).await.unwrap();
    assert_eq!(schedule.total_games(), 3);
    let games = schedule.games_on(date);
    assert_eq!(games[1].game_state, GameState::Live);
    assert_eq!(games[0].away_team.abbrev, "TOR");
    assert_eq!(games[0].venue.default, "Bell Centre");
}

#[tokio::test]
async fn test_finished_game_takes_boxscore_scores() {
    let client = client(start_mock().await);

    let feed = client.fetch_live_game(1).await.unwrap();
    assert_eq!(feed.game_state, GameState::Final);
    assert_eq!(feed.away_team.score, Some(5));
    assert_eq!(feed.home_team.score, Some(4));
    assert_eq!(
        client.score_strategy().score(&feed),
        Score { away: 5, home: 4 }
    );
    assert_eq!(feed.player_name(97).as_deref(), Some("Connor Test"));
}

#[tokio::test]
async fn test_missing_boxscore_falls_back_to_goal_count() {
    let client = client(start_mock().await);

    let feed = client.fetch_live_game(2).await.unwrap();
    assert_eq!(feed.away_team.score, None);
    assert_eq!(
        client.score_strategy().score(&feed),
        Score { away: 2, home: 1 }
    );
}

#[tokio::test]
async fn test_error_mapping() {
    let base = start_mock().await;
    let client = client(base.clone());

    match client.fetch_live_game(3).await {
        Err(ApiError::Status { status, .. }) => assert_eq!(status, 500),
        other => panic!("expected status error, got {:?}", other),
    }
    assert!(matches!(
        client.fetch_live_game(4).await,
        Err(ApiError::Decode { .. })
    ));
    assert_eq!(
        client.fetch_live_game(99).await.unwrap_err(),
        ApiError::NotFound(format!("{}/gamecenter/99/play-by-play", base))
    );
}

#[tokio::test]
async fn test_unreachable_server_is_transport_error() {
    // Nothing listens on the discard port.
    let client = client("http://127.0.0.1:9/v1".to_string());
    let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();

    let err = client.fetch_schedule(date).await.unwrap_err();
    assert!(matches!(err, ApiError::Transport(_)));
    assert!(!err.to_string().is_empty());
}
