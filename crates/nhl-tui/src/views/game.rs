//! GameView — score, status and play-by-play of the selected game.
//!
//! While the selected game is live and this view is current, a
//! [`LiveScheduler`] re-requests the feed every `polling.live_interval_secs`.
//! The scheduler is reconciled on every state change, so it stops as soon as
//! the game ends or the user navigates away.

use std::rc::Rc;
use std::time::Duration;

use ratatui::crossterm::event::KeyEvent;
use ratatui::layout::{Constraint, Direction};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};
use tracing::debug;

use nhl_proto::api::DataSource;
use nhl_proto::config::Config;
use nhl_proto::format::{event_icon, pad_text, period_label, status_label, truncate_text};
use nhl_proto::model::{Game, GameId, LiveGameData, Play, Side};
use nhl_proto::score::{Score, TeamTally};

use super::{key_hints, step, ViewContext};
use crate::action::{Action, LoadRequest};
use crate::app_state::{AppState, PartialState, ViewKind};
use crate::keymap::KeyBinding;
use crate::scheduler::LiveScheduler;
use crate::screen::ElementId;
use crate::theme::{
    state_color, style_default, style_live, style_muted, style_secondary, C_AWAY, C_GOAL, C_HOME,
    C_LIVE,
};
use crate::view::{View, ViewBase, ViewCommand, BACK_KEYS, DOWN_KEYS, QUIT_KEYS, UP_KEYS};
use crate::widgets::pane_chrome::Badge;

/// True when the game view is current and its game is live. The loaded feed
/// wins over the schedule entry once it belongs to the selected game.
pub fn should_poll(state: &AppState) -> bool {
    if state.current_view != ViewKind::Game {
        return false;
    }
    let Some(game) = state.selected_game.as_deref() else {
        return false;
    };
    match state.selected_feed() {
        Some(feed) => feed.game_state.is_live(),
        None => game.game_state.is_live(),
    }
}

pub struct GameView {
    base: ViewBase,
    source: Rc<dyn DataSource>,
    scheduler: LiveScheduler,
    poll_interval: Duration,
    polling_enabled: bool,
    play_rows: usize,
    /// Game whose feed was last requested on entry; cleared on the schedule.
    loaded_for: Option<GameId>,
    header: Option<ElementId>,
    score: Option<ElementId>,
    summary: Option<ElementId>,
    plays: Option<ElementId>,
}

impl GameView {
    pub fn new(ctx: &ViewContext, source: Rc<dyn DataSource>, config: &Config) -> Self {
        Self {
            base: ctx.base(),
            source,
            scheduler: LiveScheduler::new(ViewKind::Game, ctx.store.clone()),
            poll_interval: config.polling.live_interval(),
            polling_enabled: config.polling.enabled,
            play_rows: config.ui.play_by_play_rows.max(1),
            loaded_for: None,
            header: None,
            score: None,
            summary: None,
            plays: None,
        }
    }

    pub fn is_polling(&self) -> bool {
        self.scheduler.is_polling()
    }

    /// Request the feed the first time this view becomes current for a game.
    fn entry_load(&mut self, state: &AppState) -> Option<Action> {
        match state.current_view {
            ViewKind::Schedule => {
                self.loaded_for = None;
                None
            }
            ViewKind::Game => {
                let game = state.selected_game.as_deref()?;
                if self.loaded_for == Some(game.id) {
                    return None;
                }
                self.loaded_for = Some(game.id);
                Some(Action::Load(LoadRequest::Game(game.id)))
            }
            ViewKind::Stats => None,
        }
    }

    fn sync_polling(&mut self, state: &AppState) {
        let wanted = self.polling_enabled && should_poll(state);
        if wanted == self.scheduler.is_polling() {
            return;
        }
        if !wanted {
            self.scheduler.stop();
            return;
        }

        let store = self.base.store.clone();
        let tx = self.base.actions.clone();
        self.scheduler.start(self.poll_interval, should_poll, move || {
            if let Some(game) = store.get_state().selected_game {
                let _ = tx.send(Action::Load(LoadRequest::Game(game.id)));
            }
        });
        debug!("[game] live polling every {:?}", self.poll_interval);
    }

    fn render_widgets(&self, state: &AppState) -> bool {
        let (Some(container), Some(header), Some(score), Some(summary), Some(plays)) =
            (self.base.container, self.header, self.score, self.summary, self.plays)
        else {
            return false;
        };
        let screen = &self.base.screen;

        let badge = self
            .scheduler
            .is_polling()
            .then(|| Badge::new("LIVE", C_LIVE));
        let mut changed = screen.set_badge(container, badge);

        let Some(game) = state.selected_game.as_deref() else {
            changed |= screen.set_content(header, muted("No game selected"));
            changed |= screen.set_content(score, Text::default());
            changed |= screen.set_content(summary, Text::default());
            changed |= screen.set_items(plays, Vec::new());
            return changed;
        };

        let feed = state.selected_feed();
        changed |= screen.set_content(header, header_text(game, feed));
        changed |= screen.set_content(score, self.score_text(game, feed));
        changed |= screen.set_content(summary, summary_text(feed));
        changed |= screen.set_items(plays, self.play_lines(feed));
        changed
    }

    fn score_text(&self, game: &Game, feed: Option<&LiveGameData>) -> Text<'static> {
        let score = match feed {
            Some(feed) => Some(self.source.score_strategy().score(feed)),
            None => match (game.away_team.score, game.home_team.score) {
                (Some(away), Some(home)) => Some(Score { away, home }),
                _ => None,
            },
        };
        let (away, home) = match score {
            Some(score) => (score.away.to_string(), score.home.to_string()),
            None => ("-".to_string(), "-".to_string()),
        };
        let bold = Modifier::BOLD;
        Text::from(vec![
            Line::from(vec![
                Span::styled(
                    format!(" {:<4}", game.away_team.abbrev),
                    Style::default().fg(C_AWAY).add_modifier(bold),
                ),
                Span::styled(format!("{away:>3}"), style_default().add_modifier(bold)),
                Span::styled("  -  ", style_secondary()),
                Span::styled(format!("{home:<3}"), style_default().add_modifier(bold)),
                Span::styled(
                    format!("{:>4}", game.home_team.abbrev),
                    Style::default().fg(C_HOME).add_modifier(bold),
                ),
            ]),
            Line::from(Span::styled(
                format!(
                    " {} at {}",
                    game.away_team.full_name(),
                    game.home_team.full_name()
                ),
                style_secondary(),
            )),
        ])
    }

    fn play_lines(&self, feed: Option<&LiveGameData>) -> Vec<Line<'static>> {
        let Some(feed) = feed else {
            return vec![muted_line("Waiting for the game feed, press r to refresh")];
        };
        if feed.plays.is_empty() {
            return vec![muted_line("No plays yet")];
        }
        feed.plays
            .iter()
            .rev()
            .take(self.play_rows)
            .map(|play| play_line(feed, play))
            .collect()
    }
}

fn muted(text: &str) -> Text<'static> {
    Text::from(muted_line(text))
}

fn muted_line(text: &str) -> Line<'static> {
    Line::from(Span::styled(format!(" {text}"), style_muted()))
}

fn header_text(game: &Game, feed: Option<&LiveGameData>) -> Text<'static> {
    let (state, status) = match feed {
        Some(feed) => (
            &feed.game_state,
            status_label(
                &feed.game_state,
                feed.period_descriptor.as_ref(),
                feed.clock.as_ref(),
            ),
        ),
        None => (&game.game_state, status_label(&game.game_state, None, None)),
    };
    let status_style = if state.is_live() {
        style_live()
    } else {
        Style::default().fg(state_color(state))
    };
    Text::from(Line::from(vec![
        Span::styled(format!(" {status}"), status_style),
        Span::styled(format!("  ·  {}", game.venue.default), style_secondary()),
    ]))
}

fn summary_text(feed: Option<&LiveGameData>) -> Text<'static> {
    let Some(feed) = feed else {
        return Text::default();
    };
    let tally = TeamTally::from_feed(feed);
    Text::from(Line::from(vec![
        Span::styled(" Shots ", style_secondary()),
        Span::styled(
            format!("{}-{}", tally.away.shots, tally.home.shots),
            style_default(),
        ),
        Span::styled("   Hits ", style_secondary()),
        Span::styled(
            format!("{}-{}", tally.away.hits, tally.home.hits),
            style_default(),
        ),
        Span::styled("   PIM events ", style_secondary()),
        Span::styled(
            format!("{}-{}", tally.away.penalties, tally.home.penalties),
            style_default(),
        ),
    ]))
}

fn play_line(feed: &LiveGameData, play: &Play) -> Line<'static> {
    let team = match play.owner_team().and_then(|id| feed.side_of(id)) {
        Some(Side::Away) => feed.away_team.abbrev.clone(),
        Some(Side::Home) => feed.home_team.abbrev.clone(),
        None => String::new(),
    };
    let player = play
        .details
        .as_ref()
        .and_then(|d| d.primary_player())
        .and_then(|id| feed.player_name(id))
        .unwrap_or_default();
    let style = if play.type_desc_key == "goal" {
        Style::default().fg(C_GOAL).add_modifier(Modifier::BOLD)
    } else {
        style_default()
    };
    Line::from(vec![
        Span::styled(format!(" {} ", event_icon(&play.type_desc_key)), style),
        Span::styled(
            pad_text(&period_label(&play.period_descriptor), 5),
            style_secondary(),
        ),
        Span::styled(pad_text(&play.time_in_period, 7), style_secondary()),
        Span::styled(pad_text(&team, 5), style_default()),
        Span::styled(pad_text(&play.type_desc_key.replace('-', " "), 15), style),
        Span::styled(truncate_text(&player, 28), style_default()),
    ])
}

impl View for GameView {
    fn kind(&self) -> ViewKind {
        ViewKind::Game
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
            Some("Game"),
            Direction::Vertical,
            Constraint::Min(0),
        );
        self.header = Some(screen.text(container, None, Constraint::Length(1)));
        self.score = Some(screen.text(container, Some("Score"), Constraint::Length(4)));
        self.summary = Some(screen.text(container, None, Constraint::Length(1)));
        self.plays = Some(screen.list(container, Some("Play-by-play"), Constraint::Min(3)));
        let footer = screen.text(container, None, Constraint::Length(1));
        screen.set_content(
            footer,
            key_hints(&[
                ("b/esc", "back"),
                ("s", "stats"),
                ("r", "refresh"),
                ("↑↓", "scroll"),
                ("q", "quit"),
            ]),
        );
        container
    }

    fn setup_event_handlers(&mut self) {
        self.base
            .keymap
            .bind(BACK_KEYS, ViewCommand::Back)
            .bind(&[KeyBinding::char('r')], ViewCommand::Refresh)
            .bind(&[KeyBinding::char('s')], ViewCommand::Stats)
            .bind(UP_KEYS, ViewCommand::Up)
            .bind(DOWN_KEYS, ViewCommand::Down)
            .bind(QUIT_KEYS, ViewCommand::Quit);
    }

    fn on_state_change(&mut self, state: &AppState) -> Vec<Action> {
        let current = state.current_view == ViewKind::Game;
        self.base.sync_overlays(state, current, "Loading game…");

        let mut actions = Vec::new();
        actions.extend(self.entry_load(state));
        self.sync_polling(state);

        if self.render_widgets(state) {
            self.base.screen.render();
        }
        actions
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if let Some(actions) = self.base.intercept_key(&key) {
            return actions;
        }
        let Some(command) = self.base.keymap.lookup(&key) else {
            return Vec::new();
        };

        match command {
            ViewCommand::Back => {
                self.scheduler.stop();
                vec![Action::Update(PartialState::new().view(ViewKind::Schedule))]
            }
            ViewCommand::Refresh => match state.selected_game.as_deref() {
                Some(game) => vec![Action::Load(LoadRequest::Game(game.id))],
                None => Vec::new(),
            },
            ViewCommand::Stats => vec![Action::Update(PartialState::new().view(ViewKind::Stats))],
            ViewCommand::Up | ViewCommand::Down => {
                if let Some(plays) = self.plays {
                    let delta = if command == ViewCommand::Up { -1 } else { 1 };
                    let len = state
                        .selected_feed()
                        .map(|feed| feed.plays.len().min(self.play_rows))
                        .unwrap_or(0);
                    let screen = &self.base.screen;
                    if screen.select(plays, step(screen.selected(plays), delta, len)) {
                        screen.render();
                    }
                }
                Vec::new()
            }
            ViewCommand::Quit => vec![Action::Quit],
            _ => Vec::new(),
        }
    }

    fn release(&mut self) {
        self.scheduler.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{feed, game, today};
    use nhl_proto::model::GameState;

    fn state_with(view: ViewKind, game_state: GameState) -> AppState {
        let mut state = AppState::new(today());
        state.current_view = view;
        state.selected_game = Some(Rc::new(game(1, game_state)));
        state
    }

    #[test]
    fn test_should_poll_follows_schedule_entry_before_feed() {
        assert!(should_poll(&state_with(ViewKind::Game, GameState::Live)));
        assert!(should_poll(&state_with(ViewKind::Game, GameState::Crit)));
        assert!(!should_poll(&state_with(ViewKind::Game, GameState::Fut)));
        assert!(!should_poll(&state_with(ViewKind::Stats, GameState::Live)));
        assert!(!should_poll(&AppState::new(today())));
    }

    #[test]
    fn test_should_poll_prefers_matching_feed() {
        let mut state = state_with(ViewKind::Game, GameState::Live);
        state.live_game_data = Some(Rc::new(feed(1, GameState::Final)));
        assert!(!should_poll(&state));

        // A feed for some other game is ignored.
        state.live_game_data = Some(Rc::new(feed(2, GameState::Final)));
        assert!(should_poll(&state));
    }
}
