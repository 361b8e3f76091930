//! Action enum — intents produced by views and timers, dispatched by the App.

use chrono::NaiveDate;
use tokio::sync::mpsc;

use nhl_proto::model::GameId;

use crate::app_state::PartialState;

/// What to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadRequest {
    Schedule(NaiveDate),
    Game(GameId),
}

/// Views never touch the store while borrowed: they return actions, and the
/// App applies them once the view has been released.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Merge into the store.
    Update(PartialState),
    Load(LoadRequest),
    Quit,
}

/// Actions raised inside a notification round or a timer tick travel here and
/// are dispatched after the round completes.
pub type ActionTx = mpsc::UnboundedSender<Action>;
pub type ActionRx = mpsc::UnboundedReceiver<Action>;

pub fn channel() -> (ActionTx, ActionRx) {
    mpsc::unbounded_channel()
}
