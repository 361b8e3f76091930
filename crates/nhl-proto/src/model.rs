//! Upstream domain model for the schedule and game-center endpoints.
//!
//! Only the fields the dashboard reads are modelled; everything else in the
//! payload is ignored by serde. Optional fields default so that a sparse
//! pre-game feed still decodes.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type GameId = u64;
pub type TeamId = u64;
pub type PlayerId = u64;

/// `{ "default": "..." }` wrapper used for every localisable string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Localized {
    #[serde(default)]
    pub default: String,
}

impl Localized {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            default: value.into(),
        }
    }
}

/// Lifecycle of a game as reported upstream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GameState {
    /// Scheduled, not started.
    Fut,
    /// Pre-game warmup.
    Pre,
    Live,
    /// Live, final minutes.
    Crit,
    Final,
    /// Final and official.
    Off,
    Unknown(String),
}

impl GameState {
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live | Self::Crit)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Final | Self::Off)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Fut => "FUT",
            Self::Pre => "PRE",
            Self::Live => "LIVE",
            Self::Crit => "CRIT",
            Self::Final => "FINAL",
            Self::Off => "OFF",
            Self::Unknown(s) => s.as_str(),
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::Fut
    }
}

impl From<String> for GameState {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "FUT" => Self::Fut,
            "PRE" => Self::Pre,
            "LIVE" => Self::Live,
            "CRIT" => Self::Crit,
            "FINAL" => Self::Final,
            "OFF" => Self::Off,
            _ => Self::Unknown(value),
        }
    }
}

impl From<GameState> for String {
    fn from(value: GameState) -> Self {
        value.as_str().to_string()
    }
}

impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Schedule ──────────────────────────────────────────────────────────────────

/// `/schedule/{date}` payload: the week starting at the requested date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(default)]
    pub game_week: Vec<GameDay>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameDay {
    pub date: NaiveDate,
    #[serde(default)]
    pub games: Vec<Game>,
}

impl Schedule {
    /// Games of one calendar day; empty when the week does not cover it.
    pub fn games_on(&self, date: NaiveDate) -> &[Game] {
        self.game_week
            .iter()
            .find(|day| day.date == date)
            .map(|day| day.games.as_slice())
            .unwrap_or(&[])
    }

    pub fn total_games(&self) -> usize {
        self.game_week.iter().map(|day| day.games.len()).sum()
    }
}

/// A scheduled game as listed in the week payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: GameId,
    #[serde(default)]
    pub game_state: GameState,
    #[serde(rename = "startTimeUTC", default)]
    pub start_time_utc: Option<DateTime<Utc>>,
    pub away_team: TeamRef,
    pub home_team: TeamRef,
    #[serde(default)]
    pub venue: Localized,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRef {
    pub id: TeamId,
    pub abbrev: String,
    #[serde(default)]
    pub score: Option<u32>,
    #[serde(default)]
    pub place_name: Option<Localized>,
    #[serde(default)]
    pub common_name: Option<Localized>,
}

impl TeamRef {
    /// "Toronto Maple Leafs" when both parts are known, else the abbreviation.
    pub fn full_name(&self) -> String {
        match (&self.place_name, &self.common_name) {
            (Some(place), Some(common)) => format!("{} {}", place.default, common.default),
            (Some(place), None) => place.default.clone(),
            (None, Some(common)) => common.default.clone(),
            (None, None) => self.abbrev.clone(),
        }
    }
}

// ── Game center ───────────────────────────────────────────────────────────────

/// `/gamecenter/{id}/play-by-play` payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveGameData {
    pub id: GameId,
    #[serde(default)]
    pub game_state: GameState,
    #[serde(default)]
    pub venue: Localized,
    pub away_team: TeamRef,
    pub home_team: TeamRef,
    #[serde(default)]
    pub period_descriptor: Option<PeriodDescriptor>,
    #[serde(default)]
    pub clock: Option<Clock>,
    #[serde(default)]
    pub plays: Vec<Play>,
    #[serde(default)]
    pub roster_spots: Vec<RosterSpot>,
}

impl LiveGameData {
    pub fn player_name(&self, player_id: PlayerId) -> Option<String> {
        self.roster_spots
            .iter()
            .find(|spot| spot.player_id == player_id)
            .map(|spot| format!("{} {}", spot.first_name.default, spot.last_name.default))
    }

    /// Which side a team id belongs to in this game.
    pub fn side_of(&self, team_id: TeamId) -> Option<Side> {
        if team_id == self.away_team.id {
            Some(Side::Away)
        } else if team_id == self.home_team.id {
            Some(Side::Home)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Away,
    Home,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodDescriptor {
    #[serde(default)]
    pub number: u32,
    /// `REG`, `OT` or `SO`.
    #[serde(default)]
    pub period_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clock {
    #[serde(default)]
    pub time_remaining: String,
    #[serde(default)]
    pub running: bool,
    #[serde(default)]
    pub in_intermission: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Play {
    #[serde(default)]
    pub event_id: u64,
    /// `goal`, `shot-on-goal`, `hit`, `penalty`, `faceoff`, ...
    pub type_desc_key: String,
    #[serde(default)]
    pub period_descriptor: PeriodDescriptor,
    #[serde(default)]
    pub time_in_period: String,
    #[serde(default)]
    pub details: Option<PlayDetails>,
}

impl Play {
    pub fn owner_team(&self) -> Option<TeamId> {
        self.details.as_ref().and_then(|d| d.event_owner_team_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayDetails {
    #[serde(default)]
    pub event_owner_team_id: Option<TeamId>,
    #[serde(default)]
    pub player_id: Option<PlayerId>,
    #[serde(default)]
    pub scoring_player_id: Option<PlayerId>,
    #[serde(default)]
    pub shooting_player_id: Option<PlayerId>,
    #[serde(default)]
    pub hitting_player_id: Option<PlayerId>,
    #[serde(default)]
    pub committed_by_player_id: Option<PlayerId>,
    #[serde(default)]
    pub winning_player_id: Option<PlayerId>,
}

impl PlayDetails {
    /// The player the event is primarily about.
    pub fn primary_player(&self) -> Option<PlayerId> {
        self.scoring_player_id
            .or(self.shooting_player_id)
            .or(self.hitting_player_id)
            .or(self.committed_by_player_id)
            .or(self.winning_player_id)
            .or(self.player_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RosterSpot {
    pub player_id: PlayerId,
    #[serde(default)]
    pub team_id: TeamId,
    #[serde(default)]
    pub first_name: Localized,
    #[serde(default)]
    pub last_name: Localized,
}

/// `/gamecenter/{id}/boxscore` payload; only the final team scores are read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Boxscore {
    pub away_team: TeamRef,
    pub home_team: TeamRef,
}
