//! Concrete views.

pub mod game;
pub mod schedule;
pub mod stats;


use ratatui::text::{Line, Span};

use crate::action::ActionTx;
use crate::screen::Screen;
use crate::store::Store;
use crate::theme::{style_hint, style_secondary};
use crate::view::ViewBase;

pub use game::GameView;
pub use schedule::ScheduleView;
pub use stats::StatsView;

/// Handles every view is built with.
#[derive(Clone)]
pub struct ViewContext {
    pub screen: Screen,
    pub store: Store,
    pub actions: ActionTx,
}

impl ViewContext {
    pub fn base(&self) -> ViewBase {
        ViewBase::new(self.screen.clone(), self.store.clone(), self.actions.clone())
    }
}

/// Footer line of `key description` pairs.
fn key_hints(hints: &[(&str, &str)]) -> Line<'static> {
    let mut spans = Vec::with_capacity(hints.len() * 3);
    for (key, description) in hints {
        spans.push(Span::styled(format!(" {key}"), style_secondary()));
        spans.push(Span::styled(format!(" {description}"), style_hint()));
        spans.push(Span::raw(" "));
    }
    Line::from(spans)
}

/// Move a list cursor by `delta`, clamped to `len`.
fn step(selected: Option<usize>, delta: isize, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let current = selected.unwrap_or(0) as isize;
    Some((current + delta).clamp(0, len as isize - 1) as usize)
}
