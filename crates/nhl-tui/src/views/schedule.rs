//! ScheduleView — the games of the selected date.

use std::rc::Rc;

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use ratatui::layout::{Constraint, Direction};
use ratatui::style::Style;
use ratatui::text::{Line, Span, Text};

use nhl_proto::format::{pad_text, start_time_label, status_label};
use nhl_proto::model::{Game, GameState};

use super::{key_hints, step, ViewContext};
use crate::action::{Action, LoadRequest};
use crate::app_state::{AppState, PartialState, ViewKind};
use crate::keymap::KeyBinding;
use crate::screen::ElementId;
use crate::theme::{state_color, style_accent, style_default, style_muted, style_secondary};
use crate::view::{View, ViewBase, ViewCommand, DOWN_KEYS, QUIT_KEYS, UP_KEYS};

pub struct ScheduleView {
    base: ViewBase,
    header: Option<ElementId>,
    list: Option<ElementId>,
}

impl ScheduleView {
    pub fn new(ctx: &ViewContext) -> Self {
        Self {
            base: ctx.base(),
            header: None,
            list: None,
        }
    }

    fn games(state: &AppState) -> &[Game] {
        state
            .schedule_data
            .as_deref()
            .map(|schedule| schedule.games_on(state.selected_date))
            .unwrap_or(&[])
    }

    fn header_text(state: &AppState) -> Text<'static> {
        let date = state.selected_date.format("%A, %B %-d %Y").to_string();
        let summary = match &state.schedule_data {
            None => "not loaded".to_string(),
            Some(_) => match Self::games(state).len() {
                1 => "1 game".to_string(),
                n => format!("{n} games"),
            },
        };
        Text::from(Line::from(vec![
            Span::styled(format!(" {date}"), style_accent()),
            Span::styled(format!("  ·  {summary}"), style_secondary()),
        ]))
    }

    fn rows(state: &AppState) -> Vec<Line<'static>> {
        if state.schedule_data.is_none() {
            return vec![Line::from(Span::styled(
                "Schedule not loaded, press r to retry",
                style_muted(),
            ))];
        }
        let games = Self::games(state);
        if games.is_empty() {
            return vec![Line::from(Span::styled("No games scheduled", style_muted()))];
        }
        games.iter().map(game_row).collect()
    }

    fn selected_game(&self, state: &AppState) -> Option<Game> {
        let list = self.list?;
        let index = self.base.screen.selected(list)?;
        Self::games(state).get(index).cloned()
    }
}

fn game_row(game: &Game) -> Line<'static> {
    let matchup = format!("{} @ {}", game.away_team.abbrev, game.home_team.abbrev);
    let score = match (game.away_team.score, game.home_team.score) {
        (Some(away), Some(home)) => format!("{away} - {home}"),
        _ => String::new(),
    };
    let status = match game.game_state {
        GameState::Fut | GameState::Pre => start_time_label(game.start_time_utc),
        _ => status_label(&game.game_state, None, None),
    };
    Line::from(vec![
        Span::styled(pad_text(&matchup, 14), style_default()),
        Span::styled(pad_text(&score, 9), style_default()),
        Span::styled(status, Style::default().fg(state_color(&game.game_state))),
    ])
}

impl View for ScheduleView {
    fn kind(&self) -> ViewKind {
        ViewKind::Schedule
    }

    fn base(&self) -> &ViewBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ViewBase {
        &mut self.base
    }

    fn create_container(&mut self) -> ElementId {
        let screen = &self.base.screen;
        let container = screen.panel(
            screen.root(),
            Some("NHL Schedule"),
            Direction::Vertical,
            Constraint::Min(0),
        );
        self.header = Some(screen.text(container, None, Constraint::Length(2)));
        self.list = Some(screen.list(container, Some("Games"), Constraint::Min(3)));
        let footer = screen.text(container, None, Constraint::Length(1));
        screen.set_content(
            footer,
            key_hints(&[
                ("←/h", "prev day"),
                ("→/l", "next day"),
                ("↑↓", "move"),
                ("enter", "open"),
                ("r", "reload"),
                ("q", "quit"),
            ]),
        );
        container
    }

    fn setup_event_handlers(&mut self) {
        self.base
            .keymap
            .bind(
                &[KeyBinding::key(KeyCode::Left), KeyBinding::char('h')],
                ViewCommand::PrevDate,
            )
            .bind(
                &[KeyBinding::key(KeyCode::Right), KeyBinding::char('l')],
                ViewCommand::NextDate,
            )
            .bind(UP_KEYS, ViewCommand::Up)
            .bind(DOWN_KEYS, ViewCommand::Down)
            .bind(&[KeyBinding::key(KeyCode::Enter)], ViewCommand::Open)
            .bind(&[KeyBinding::char('r')], ViewCommand::Refresh)
            .bind(QUIT_KEYS, ViewCommand::Quit);
    }

    fn on_state_change(&mut self, state: &AppState) -> Vec<Action> {
        let current = state.current_view == ViewKind::Schedule;
        self.base.sync_overlays(state, current, "Loading schedule…");

        let (Some(header), Some(list)) = (self.header, self.list) else {
            return Vec::new();
        };
        let screen = &self.base.screen;
        let mut changed = screen.set_content(header, Self::header_text(state));
        changed |= screen.set_items(list, Self::rows(state));
        if changed {
            screen.render();
        }
        Vec::new()
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if let Some(actions) = self.base.intercept_key(&key) {
            return actions;
        }
        let Some(command) = self.base.keymap.lookup(&key) else {
            return Vec::new();
        };

        match command {
            ViewCommand::PrevDate | ViewCommand::NextDate => {
                let date = if command == ViewCommand::PrevDate {
                    state.selected_date.pred_opt()
                } else {
                    state.selected_date.succ_opt()
                };
                match date {
                    Some(date) => vec![
                        Action::Update(PartialState::new().selected_date(date)),
                        Action::Load(LoadRequest::Schedule(date)),
                    ],
                    None => Vec::new(),
                }
            }
            ViewCommand::Up | ViewCommand::Down => {
                if let Some(list) = self.list {
                    let delta = if command == ViewCommand::Up { -1 } else { 1 };
                    let len = Self::games(state).len();
                    let screen = &self.base.screen;
                    if screen.select(list, step(screen.selected(list), delta, len)) {
                        screen.render();
                    }
                }
                Vec::new()
            }
            ViewCommand::Open => match self.selected_game(state) {
                Some(game) => vec![Action::Update(
                    PartialState::new()
                        .selected_game(Some(Rc::new(game)))
                        .live_game_data(None)
                        .view(ViewKind::Game),
                )],
                None => Vec::new(),
            },
            ViewCommand::Refresh => vec![Action::Load(LoadRequest::Schedule(state.selected_date))],
            ViewCommand::Quit => vec![Action::Quit],
            _ => Vec::new(),
        }
    }
}
