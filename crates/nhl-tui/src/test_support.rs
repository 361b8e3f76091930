//! Scripted in-memory data source and fixture builders for engine tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::time::Duration;

use chrono::NaiveDate;
use futures_util::future::{FutureExt, LocalBoxFuture};

use nhl_proto::api::{ApiError, DataSource};
use nhl_proto::model::{
    Clock, Game, GameDay, GameId, GameState, LiveGameData, Localized, PeriodDescriptor, Play,
    PlayDetails, Schedule, TeamRef,
};
use nhl_proto::score::{FeedScore, ScoreStrategy};

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
}

fn team(id: u64, abbrev: &str) -> TeamRef {
    TeamRef {
        id,
        abbrev: abbrev.to_string(),
        score: None,
        place_name: None,
        common_name: None,
    }
}

pub fn game(id: GameId, state: GameState) -> Game {
    Game {
        id,
        game_state: state,
        start_time_utc: None,
        away_team: team(10, "TOR"),
        home_team: team(8, "MTL"),
        venue: Localized::new("Bell Centre"),
    }
}

pub fn schedule(date: NaiveDate, games: Vec<Game>) -> Schedule {
    Schedule {
        game_week: vec![GameDay { date, games }],
    }
}

pub fn feed(id: GameId, state: GameState) -> LiveGameData {
    let goal = Play {
        event_id: 1,
        type_desc_key: "goal".to_string(),
        period_descriptor: PeriodDescriptor {
            number: 1,
            period_type: "REG".to_string(),
        },
        time_in_period: "04:12".to_string(),
        details: Some(PlayDetails {
            event_owner_team_id: Some(10),
            ..PlayDetails::default()
        }),
    };
    LiveGameData {
        id,
        game_state: state,
        venue: Localized::new("Bell Centre"),
        away_team: team(10, "TOR"),
        home_team: team(8, "MTL"),
        period_descriptor: Some(PeriodDescriptor {
            number: 2,
            period_type: "REG".to_string(),
        }),
        clock: Some(Clock {
            time_remaining: "12:34".to_string(),
            running: true,
            in_intermission: false,
        }),
        plays: vec![goal],
        roster_spots: Vec::new(),
    }
}

struct Script<T> {
    queue: VecDeque<Result<T, ApiError>>,
    last: Option<Result<T, ApiError>>,
}

impl<T> Default for Script<T> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            last: None,
        }
    }
}

impl<T: Clone> Script<T> {
    fn next(&mut self) -> Result<T, ApiError> {
        if let Some(reply) = self.queue.pop_front() {
            self.last = Some(reply.clone());
            return reply;
        }
        self.last
            .clone()
            .unwrap_or_else(|| Err(ApiError::Transport("no scripted reply".to_string())))
    }
}

/// Replies are consumed in order; the last one repeats once the script runs
/// out.
#[derive(Default)]
pub struct FakeSource {
    schedules: RefCell<Script<Schedule>>,
    games: RefCell<Script<LiveGameData>>,
    latency: Cell<Duration>,
    schedule_calls: Cell<usize>,
    game_calls: Cell<usize>,
}

impl FakeSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_latency(self, latency: Duration) -> Self {
        self.latency.set(latency);
        self
    }

    pub fn reply_schedule(self, reply: Result<Schedule, ApiError>) -> Self {
        self.schedules.borrow_mut().queue.push_back(reply);
        self
    }

    pub fn reply_game(self, reply: Result<LiveGameData, ApiError>) -> Self {
        self.games.borrow_mut().queue.push_back(reply);
        self
    }

    /// Append a reply after construction (e.g. the next poll's payload).
    pub fn push_game(&self, reply: Result<LiveGameData, ApiError>) {
        self.games.borrow_mut().queue.push_back(reply);
    }

    pub fn schedule_calls(&self) -> usize {
        self.schedule_calls.get()
    }

    pub fn game_calls(&self) -> usize {
        self.game_calls.get()
    }

    fn delayed<T: 'static>(&self, reply: Result<T, ApiError>) -> LocalBoxFuture<'_, Result<T, ApiError>> {
        let latency = self.latency.get();
        async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            reply
        }
        .boxed_local()
    }
}

impl DataSource for FakeSource {
    fn fetch_schedule(&self, _date: NaiveDate) -> LocalBoxFuture<'_, Result<Schedule, ApiError>> {
        self.schedule_calls.set(self.schedule_calls.get() + 1);
        self.delayed(self.schedules.borrow_mut().next())
    }

    fn fetch_live_game(
        &self,
        _game_id: GameId,
    ) -> LocalBoxFuture<'_, Result<LiveGameData, ApiError>> {
        self.game_calls.set(self.game_calls.get() + 1);
        self.delayed(self.games.borrow_mut().next())
    }

    fn score_strategy(&self) -> &dyn ScoreStrategy {
        &FeedScore
    }
}
