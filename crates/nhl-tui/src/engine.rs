//! Engine — owns the store, the views and the router, and dispatches actions.
//!
//! Everything here lives on one thread. Views and timers never mutate the
//! store directly from inside a notification round; they emit [`Action`]s
//! that the engine applies once the round is over.

use std::cell::Cell;
use std::rc::Rc;

use chrono::NaiveDate;
use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::{debug, info};

use nhl_proto::api::DataSource;
use nhl_proto::config::Config;

use crate::action::{self, Action, ActionRx, LoadRequest};
use crate::app_state::AppState;
use crate::loader::Loader;
use crate::router::Router;
use crate::screen::Screen;
use crate::store::Store;
use crate::view::mount;
use crate::views::{GameView, ScheduleView, StatsView, ViewContext};

pub struct Engine {
    store: Store,
    screen: Screen,
    router: Router,
    loader: Loader,
    action_rx: ActionRx,
    should_quit: bool,
    shut_down: Cell<bool>,
}

impl Engine {
    pub fn new(source: Rc<dyn DataSource>, config: &Config, today: NaiveDate) -> Self {
        let store = Store::new(AppState::new(today));
        let screen = Screen::new();
        let (actions, action_rx) = action::channel();
        let ctx = ViewContext {
            screen: screen.clone(),
            store: store.clone(),
            actions: actions.clone(),
        };

        let views = vec![
            mount(ScheduleView::new(&ctx), &store, &actions),
            mount(GameView::new(&ctx, source.clone(), config), &store, &actions),
            mount(StatsView::new(&ctx), &store, &actions),
        ];
        let router = Router::new(&store, views);
        let loader = Loader::new(store.clone(), source);

        Self {
            store,
            screen,
            router,
            loader,
            action_rx,
            should_quit: false,
            shut_down: Cell::new(false),
        }
    }

    /// Kick off the initial schedule fetch. Must run inside a `LocalSet`.
    pub fn start(&mut self) {
        let date = self.store.get_state().selected_date;
        info!("[engine] starting on {}", date);
        self.dispatch(Action::Load(LoadRequest::Schedule(date)));
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn dispatch(&mut self, action: Action) {
        if self.shut_down.get() {
            return;
        }
        match action {
            Action::Update(partial) => self.store.set_state(partial),
            Action::Load(request) => self.loader.load(request),
            Action::Quit => {
                debug!("[engine] quit requested");
                self.quit();
            }
        }
    }

    /// Dispatch every queued action, including ones raised while draining.
    pub fn drain(&mut self) {
        while let Ok(action) = self.action_rx.try_recv() {
            self.dispatch(action);
        }
    }

    /// Wait for the next queued action.
    pub async fn next_action(&mut self) -> Option<Action> {
        self.action_rx.recv().await
    }

    /// Route a key press to the visible view.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.quit();
            return;
        }
        let Some(view) = self.router.active() else {
            return;
        };
        let state = self.store.get_state();
        let actions = view
            .with(|v| v.handle_key(key, &state))
            .unwrap_or_default();
        for action in actions {
            self.dispatch(action);
        }
        self.drain();
    }

    /// Destroy every view, cancel timers and drop all subscriptions.
    /// Idempotent.
    pub fn shutdown(&self) {
        if self.shut_down.replace(true) {
            return;
        }
        self.router.destroy();
        info!(
            "[engine] shut down ({} subscribers left)",
            self.store.subscriber_count()
        );
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.shutdown();
    }
}
