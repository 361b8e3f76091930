//! AppState — the single shared snapshot every view renders from.
//!
//! Heavy payloads sit behind `Rc`, so cloning a snapshot is cheap and a
//! subscriber can only read them. Mutating a received snapshot never reaches
//! the store: the clone is the subscriber's own.

use std::rc::Rc;

use chrono::NaiveDate;
use nhl_proto::model::{Game, LiveGameData, Schedule};

/// Which view is on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Schedule,
    Game,
    Stats,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppState {
    pub current_view: ViewKind,
    /// Scopes schedule queries.
    pub selected_date: NaiveDate,
    pub selected_game: Option<Rc<Game>>,
    pub schedule_data: Option<Rc<Schedule>>,
    pub live_game_data: Option<Rc<LiveGameData>>,
    /// True while any fetch is in flight.
    pub loading: bool,
    pub error: Option<String>,
}

impl AppState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            current_view: ViewKind::Schedule,
            selected_date: today,
            selected_game: None,
            schedule_data: None,
            live_game_data: None,
            loading: false,
            error: None,
        }
    }

    /// The loaded feed, but only when it belongs to the selected game.
    pub fn selected_feed(&self) -> Option<&LiveGameData> {
        let game = self.selected_game.as_ref()?;
        self.live_game_data
            .as_deref()
            .filter(|feed| feed.id == game.id)
    }
}

/// A shallow patch over [`AppState`]. Absent fields are left untouched; for
/// nullable fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialState {
    pub current_view: Option<ViewKind>,
    pub selected_date: Option<NaiveDate>,
    pub selected_game: Option<Option<Rc<Game>>>,
    pub schedule_data: Option<Option<Rc<Schedule>>>,
    pub live_game_data: Option<Option<Rc<LiveGameData>>>,
    pub loading: Option<bool>,
    pub error: Option<Option<String>>,
}

impl PartialState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(mut self, kind: ViewKind) -> Self {
        self.current_view = Some(kind);
        self
    }

    pub fn selected_date(mut self, date: NaiveDate) -> Self {
        self.selected_date = Some(date);
        self
    }

    pub fn selected_game(mut self, game: Option<Rc<Game>>) -> Self {
        self.selected_game = Some(game);
        self
    }

    pub fn schedule_data(mut self, schedule: Option<Rc<Schedule>>) -> Self {
        self.schedule_data = Some(schedule);
        self
    }

    pub fn live_game_data(mut self, feed: Option<Rc<LiveGameData>>) -> Self {
        self.live_game_data = Some(feed);
        self
    }

    pub fn loading(mut self, loading: bool) -> Self {
        self.loading = Some(loading);
        self
    }

    pub fn error(mut self, error: Option<String>) -> Self {
        self.error = Some(error);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Later patches win field by field.
    pub fn merge(mut self, later: PartialState) -> Self {
        macro_rules! take_later {
            ($($field:ident),*) => {
                $( if later.$field.is_some() { self.$field = later.$field; } )*
            };
        }
        take_later!(
            current_view,
            selected_date,
            selected_game,
            schedule_data,
            live_game_data,
            loading,
            error
        );
        self
    }

    pub fn apply_to(self, state: &mut AppState) {
        if let Some(v) = self.current_view {
            state.current_view = v;
        }
        if let Some(v) = self.selected_date {
            state.selected_date = v;
        }
        if let Some(v) = self.selected_game {
            state.selected_game = v;
        }
        if let Some(v) = self.schedule_data {
            state.schedule_data = v;
        }
        if let Some(v) = self.live_game_data {
            state.live_game_data = v;
        }
        if let Some(v) = self.loading {
            state.loading = v;
        }
        if let Some(v) = self.error {
            state.error = v;
        }
    }
}
