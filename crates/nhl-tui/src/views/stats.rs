//! StatsView — side-by-side event tallies for the selected game.

use ratatui::crossterm::event::KeyEvent;
use ratatui::layout::{Constraint, Direction};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span, Text};

use nhl_proto::format::pad_text;
use nhl_proto::model::LiveGameData;
use nhl_proto::score::{TeamStats, TeamTally};

use super::{key_hints, ViewContext};
use crate::action::{Action, LoadRequest};
use crate::app_state::{AppState, PartialState, ViewKind};
use crate::keymap::KeyBinding;
use crate::screen::ElementId;
use crate::theme::{style_default, style_muted, style_secondary, C_AWAY, C_HOME};
use crate::view::{View, ViewBase, ViewCommand, BACK_KEYS, QUIT_KEYS};

const LABEL_WIDTH: usize = 16;
const COLUMN_WIDTH: usize = 8;

pub struct StatsView {
    base: ViewBase,
    table: Option<ElementId>,
}

impl StatsView {
    pub fn new(ctx: &ViewContext) -> Self {
        Self {
            base: ctx.base(),
            table: None,
        }
    }
}

fn rows(stats: &TeamStats) -> [(&'static str, u32); 7] {
    [
        ("Shots", stats.shots),
        ("Hits", stats.hits),
        ("Penalties", stats.penalties),
        ("Giveaways", stats.giveaways),
        ("Takeaways", stats.takeaways),
        ("Blocked shots", stats.blocked),
        ("Faceoffs won", stats.faceoff_wins),
    ]
}

fn table_text(feed: Option<&LiveGameData>) -> Text<'static> {
    let Some(feed) = feed else {
        return Text::from(Line::from(Span::styled(
            " No game data, press r to load",
            style_muted(),
        )));
    };
    let tally = TeamTally::from_feed(feed);
    let bold = Modifier::BOLD;

    let mut lines = vec![
        Line::from(vec![
            Span::raw(" ".repeat(LABEL_WIDTH + 1)),
            Span::styled(
                pad_text(&feed.away_team.abbrev, COLUMN_WIDTH),
                Style::default().fg(C_AWAY).add_modifier(bold),
            ),
            Span::styled(
                pad_text(&feed.home_team.abbrev, COLUMN_WIDTH),
                Style::default().fg(C_HOME).add_modifier(bold),
            ),
        ]),
        Line::default(),
    ];

    for ((label, away), (_, home)) in rows(&tally.away).into_iter().zip(rows(&tally.home)) {
        lines.push(Line::from(vec![
            Span::styled(format!(" {}", pad_text(label, LABEL_WIDTH)), style_secondary()),
            Span::styled(pad_text(&away.to_string(), COLUMN_WIDTH), style_default()),
            Span::styled(pad_text(&home.to_string(), COLUMN_WIDTH), style_default()),
        ]));
    }

    let (away_pct, home_pct) = match tally.away_faceoff_pct() {
        Some(pct) => (format!("{pct:.1}%"), format!("{:.1}%", 100.0 - pct)),
        None => ("-".to_string(), "-".to_string()),
    };
    lines.push(Line::from(vec![
        Span::styled(format!(" {}", pad_text("Faceoff %", LABEL_WIDTH)), style_secondary()),
        Span::styled(pad_text(&away_pct, COLUMN_WIDTH), style_default()),
        Span::styled(pad_text(&home_pct, COLUMN_WIDTH), style_default()),
    ]));
    Text::from(lines)
}

impl View for StatsView {
    fn kind(&self) -> ViewKind {
        ViewKind::Stats
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
            Some("Team Stats"),
            Direction::Vertical,
            Constraint::Min(0),
        );
        self.table = Some(screen.text(container, None, Constraint::Min(3)));
        let footer = screen.text(container, None, Constraint::Length(1));
        screen.set_content(
            footer,
            key_hints(&[("b/esc", "back"), ("r", "refresh"), ("q", "quit")]),
        );
        container
    }

    fn setup_event_handlers(&mut self) {
        self.base
            .keymap
            .bind(BACK_KEYS, ViewCommand::Back)
            .bind(&[KeyBinding::char('r')], ViewCommand::Refresh)
            .bind(QUIT_KEYS, ViewCommand::Quit);
    }

    fn on_state_change(&mut self, state: &AppState) -> Vec<Action> {
        let current = state.current_view == ViewKind::Stats;
        self.base.sync_overlays(state, current, "Loading stats…");

        let (Some(container), Some(table)) = (self.base.container, self.table) else {
            return Vec::new();
        };
        let screen = &self.base.screen;
        let title = match state.selected_game.as_deref() {
            Some(game) => format!(
                "Team Stats: {} @ {}",
                game.away_team.abbrev, game.home_team.abbrev
            ),
            None => "Team Stats".to_string(),
        };
        let mut changed = screen.set_title(container, title);
        changed |= screen.set_content(table, table_text(state.selected_feed()));
        if changed {
            screen.render();
        }
        Vec::new()
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if let Some(actions) = self.base.intercept_key(&key) {
            return actions;
        }
        match self.base.keymap.lookup(&key) {
            Some(ViewCommand::Back) => {
                vec![Action::Update(PartialState::new().view(ViewKind::Game))]
            }
            Some(ViewCommand::Refresh) => match state.selected_game.as_deref() {
                Some(game) => vec![Action::Load(LoadRequest::Game(game.id))],
                None => Vec::new(),
            },
            Some(ViewCommand::Quit) => vec![Action::Quit],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::feed;
    use nhl_proto::model::GameState;

    #[test]
    fn test_table_counts_goal_as_shot() {
        let text = table_text(Some(&feed(1, GameState::Live)));
        let shots = text
            .lines
            .iter()
            .map(|line| line.to_string())
            .find(|line| line.contains("Shots"))
            .unwrap();
        let cells: Vec<&str> = shots.split_whitespace().collect();
        assert_eq!(cells, vec!["Shots", "1", "0"]);
    }

    #[test]
    fn test_table_without_feed() {
        let text = table_text(None);
        assert!(text.lines[0].to_string().contains("No game data"));
    }
}
