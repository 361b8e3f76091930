//! View — the lifecycle every screen of the dashboard implements.
//!
//! Design principles (same as the rest of the UI):
//! - A view owns its container, overlays, key bindings and any timer.
//! - It reads `AppState` snapshots and returns `Vec<Action>`; it never calls
//!   into the store while it is borrowed.
//! - `on_state_change` is a reconciliation: safe to repeat, in any order of
//!   field changes, with no effect when nothing changed.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use ratatui::crossterm::event::{KeyCode, KeyEvent};
use tracing::{debug, warn};

use crate::action::{Action, ActionTx};
use crate::app_state::{AppState, PartialState, ViewKind};
use crate::keymap::{KeyBinding, Keymap};
use crate::overlay::OverlayManager;
use crate::screen::{ElementId, Screen};
use crate::store::{Store, Subscription};

/// Every command a view can bind to a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewCommand {
    PrevDate,
    NextDate,
    Up,
    Down,
    Open,
    Back,
    Refresh,
    Stats,
    Quit,
}

pub const QUIT_KEYS: &[KeyBinding] = &[KeyBinding::char('q'), KeyBinding::ctrl('c')];
pub const UP_KEYS: &[KeyBinding] = &[KeyBinding::key(KeyCode::Up), KeyBinding::char('k')];
pub const DOWN_KEYS: &[KeyBinding] = &[KeyBinding::key(KeyCode::Down), KeyBinding::char('j')];
pub const BACK_KEYS: &[KeyBinding] = &[KeyBinding::char('b'), KeyBinding::key(KeyCode::Esc)];

/// State shared by every view: container, overlays, bindings, subscription.
pub struct ViewBase {
    pub screen: Screen,
    pub store: Store,
    pub actions: ActionTx,
    pub container: Option<ElementId>,
    pub overlays: OverlayManager,
    pub keymap: Keymap<ViewCommand>,
    subscription: Option<Subscription>,
    visible: bool,
    destroyed: bool,
}

impl ViewBase {
    pub fn new(screen: Screen, store: Store, actions: ActionTx) -> Self {
        let overlays = OverlayManager::new(screen.clone(), store.clone());
        Self {
            screen,
            store,
            actions,
            container: None,
            overlays,
            keymap: Keymap::new(),
            subscription: None,
            visible: false,
            destroyed: false,
        }
    }

    pub fn set_container(&mut self, container: ElementId) {
        self.container = Some(container);
        self.overlays.attach(container);
    }

    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    /// Loading and error overlays for one snapshot. Only the current view
    /// creates overlays; any view drops a stale one.
    pub fn sync_overlays(&mut self, state: &AppState, current: bool, loading_message: &str) {
        if state.loading && current {
            self.overlays.show_loading(loading_message);
        }
        self.overlays
            .sync_error(state.error.as_deref(), current);
    }

    /// While the error overlay is open it swallows every key except quit;
    /// enter, esc and space dismiss it and clear `error`.
    pub fn intercept_key(&mut self, key: &KeyEvent) -> Option<Vec<Action>> {
        if !self.overlays.has_error() {
            return None;
        }
        if self.keymap.lookup(key) == Some(ViewCommand::Quit) {
            return None;
        }
        match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => {
                self.overlays.dismiss_error();
                Some(vec![Action::Update(PartialState::new().error(None))])
            }
            _ => Some(Vec::new()),
        }
    }

    fn show(&mut self) {
        self.visible = true;
        if let Some(container) = self.container {
            let mut changed = self.screen.show(container);
            changed |= self.screen.focus(container);
            if changed {
                self.screen.render();
            }
        }
    }

    fn hide(&mut self) {
        self.visible = false;
        if let Some(container) = self.container {
            if self.screen.hide(container) {
                self.screen.render();
            }
        }
    }

    fn destroy(&mut self) {
        if std::mem::replace(&mut self.destroyed, true) {
            return;
        }
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.overlays.clear();
        if let Some(container) = self.container.take() {
            self.screen.destroy(container);
            self.screen.render();
        }
        self.visible = false;
    }
}

/// The capability every concrete view provides. The router and the app only
/// ever see `dyn View`.
pub trait View {
    fn kind(&self) -> ViewKind;

    fn base(&self) -> &ViewBase;
    fn base_mut(&mut self) -> &mut ViewBase;

    /// Build the view's element subtree and return its root. Called once.
    fn create_container(&mut self) -> ElementId;

    /// Register key bindings into the base keymap. Called once, after the
    /// container exists.
    fn setup_event_handlers(&mut self);

    /// Reconcile widgets, overlays and timers with a snapshot.
    fn on_state_change(&mut self, state: &AppState) -> Vec<Action>;

    /// Only called while this view is visible.
    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action>;

    /// Release view-specific resources (timers). Runs before the base teardown.
    fn release(&mut self) {}

    fn container(&self) -> Option<ElementId> {
        self.base().container
    }

    fn is_visible(&self) -> bool {
        self.base().visible
    }

    /// Show and claim input focus.
    fn show(&mut self) {
        self.base_mut().show();
    }

    fn hide(&mut self) {
        self.base_mut().hide();
    }

    /// Unsubscribe, stop timers, drop overlays and the container. Idempotent,
    /// and safe when construction never completed.
    fn destroy(&mut self) {
        if self.base().is_destroyed() {
            return;
        }
        self.release();
        self.base_mut().destroy();
        debug!("[view] {:?} destroyed", self.kind());
    }
}

/// A constructed, subscribed view.
#[derive(Clone)]
pub struct ViewHandle {
    kind: ViewKind,
    view: Rc<RefCell<dyn View>>,
}

impl ViewHandle {
    pub fn kind(&self) -> ViewKind {
        self.kind
    }

    /// Borrow the view mutably for the duration of `f`. `None` when the view
    /// is already borrowed further up the stack.
    pub fn with<R>(&self, f: impl FnOnce(&mut dyn View) -> R) -> Option<R> {
        match self.view.try_borrow_mut() {
            Ok(mut view) => Some(f(&mut *view)),
            Err(_) => {
                warn!("[view] {:?} is busy", self.kind);
                None
            }
        }
    }

    pub fn is_visible(&self) -> bool {
        self.view
            .try_borrow()
            .map(|v| v.is_visible())
            .unwrap_or(false)
    }

    pub fn container(&self) -> Option<ElementId> {
        self.view.try_borrow().ok().and_then(|v| v.container())
    }
}

/// Run the construction sequence (container, handlers, subscription, first
/// reconciliation) and hand back the shared handle.
pub fn mount<V: View + 'static>(view: V, store: &Store, actions: &ActionTx) -> ViewHandle {
    let kind = view.kind();
    let view: Rc<RefCell<dyn View>> = Rc::new(RefCell::new(view));

    {
        let mut v = view.borrow_mut();
        let container = v.create_container();
        v.base_mut().set_container(container);
        v.setup_event_handlers();
        v.hide();
    }

    let weak: Weak<RefCell<dyn View>> = Rc::downgrade(&view);
    let tx = actions.clone();
    let subscription = store.subscribe(move |state| {
        let Some(view) = weak.upgrade() else {
            return Ok(());
        };
        let produced = match view.try_borrow_mut() {
            Ok(mut v) => v.on_state_change(state),
            Err(_) => anyhow::bail!("{:?} view is busy", kind),
        };
        for action in produced {
            // Receiver gone means we are shutting down.
            let _ = tx.send(action);
        }
        Ok(())
    });

    let initial = {
        let mut v = view.borrow_mut();
        v.base_mut().subscription = Some(subscription);
        v.on_state_change(&store.get_state())
    };
    for action in initial {
        let _ = actions.send(action);
    }

    debug!("[view] {:?} mounted", kind);
    ViewHandle { kind, view }
}
