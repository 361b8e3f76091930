//! Router — keeps exactly one view visible, the one matching `current_view`.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::app_state::AppState;
use crate::store::{Store, Subscription};
use crate::view::ViewHandle;

pub struct Router {
    views: Rc<[ViewHandle]>,
    subscription: RefCell<Option<Subscription>>,
}

impl Router {
    /// Subscribes after the views, so every view has reconciled a snapshot
    /// before the router reveals one of them.
    pub fn new(store: &Store, views: Vec<ViewHandle>) -> Self {
        let views: Rc<[ViewHandle]> = views.into();
        let routed = views.clone();
        let subscription = store.subscribe(move |state| {
            route(&routed, state);
            Ok(())
        });
        route(&views, &store.get_state());
        Self {
            views,
            subscription: RefCell::new(Some(subscription)),
        }
    }

    pub fn views(&self) -> &[ViewHandle] {
        &self.views
    }

    /// The view currently on screen.
    pub fn active(&self) -> Option<&ViewHandle> {
        self.views.iter().find(|view| view.is_visible())
    }

    pub fn visible_count(&self) -> usize {
        self.views.iter().filter(|view| view.is_visible()).count()
    }

    /// Stop routing and tear down every view. Idempotent.
    pub fn destroy(&self) {
        let Some(subscription) = self.subscription.borrow_mut().take() else {
            return;
        };
        subscription.unsubscribe();
        for view in self.views.iter() {
            view.with(|v| v.destroy());
        }
        debug!("[router] destroyed {} views", self.views.len());
    }
}

/// Hide every non-matching view, then show the first match. Returns how many
/// views are visible afterwards (0 when no view is registered for the kind).
fn route(views: &[ViewHandle], state: &AppState) -> usize {
    let target = state.current_view;
    let chosen = views.iter().position(|view| view.kind() == target);
    for (index, view) in views.iter().enumerate() {
        if Some(index) != chosen && view.is_visible() {
            view.with(|v| v.hide());
        }
    }

    let Some(index) = chosen else {
        warn!("[router] no view registered for {:?}", target);
        return 0;
    };
    let view = &views[index];
    if !view.is_visible() {
        view.with(|v| v.show());
        debug!("[router] showing {:?}", target);
    }
    1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{self, Action};
    use crate::app_state::{PartialState, ViewKind};
    use crate::screen::{ElementId, Screen};
    use crate::test_support::today;
    use crate::view::{mount, View, ViewBase};
    use ratatui::crossterm::event::KeyEvent;
    use ratatui::layout::{Constraint, Direction};

    struct Blank {
        kind: ViewKind,
        base: ViewBase,
    }

    impl View for Blank {
        fn kind(&self) -> ViewKind {
            self.kind
        }
        fn base(&self) -> &ViewBase {
            &self.base
        }
        fn base_mut(&mut self) -> &mut ViewBase {
            &mut self.base
        }
        fn create_container(&mut self) -> ElementId {
            let screen = &self.base.screen;
            screen.panel(screen.root(), None, Direction::Vertical, Constraint::Min(0))
        }
        fn setup_event_handlers(&mut self) {}
        fn on_state_change(&mut self, _state: &AppState) -> Vec<Action> {
            Vec::new()
        }
        fn handle_key(&mut self, _key: KeyEvent, _state: &AppState) -> Vec<Action> {
            Vec::new()
        }
    }

    fn setup(kinds: &[ViewKind]) -> (Store, Screen, Router) {
        let store = Store::new(AppState::new(today()));
        let screen = Screen::new();
        let (tx, _rx) = action::channel();
        let views = kinds
            .iter()
            .map(|&kind| {
                let base = ViewBase::new(screen.clone(), store.clone(), tx.clone());
                mount(Blank { kind, base }, &store, &tx)
            })
            .collect();
        let router = Router::new(&store, views);
        (store, screen, router)
    }

    #[test]
    fn test_exactly_one_view_visible() {
        let (store, screen, router) =
            setup(&[ViewKind::Schedule, ViewKind::Game, ViewKind::Stats]);
        assert_eq!(router.visible_count(), 1);
        assert_eq!(router.active().map(|v| v.kind()), Some(ViewKind::Schedule));

        for kind in [ViewKind::Game, ViewKind::Stats, ViewKind::Game, ViewKind::Schedule] {
            store.set_state(PartialState::new().view(kind));
            assert_eq!(router.visible_count(), 1);
            let active = router.active().unwrap();
            assert_eq!(active.kind(), kind);
            assert_eq!(screen.focused(), active.container());
        }
    }

    #[test]
    fn test_unregistered_kind_shows_nothing() {
        let (store, _screen, router) = setup(&[ViewKind::Schedule, ViewKind::Game]);
        store.set_state(PartialState::new().view(ViewKind::Stats));
        assert_eq!(router.visible_count(), 0);
        assert!(router.active().is_none());
    }

    #[test]
    fn test_destroy_releases_everything() {
        let (store, screen, router) = setup(&[ViewKind::Schedule, ViewKind::Game]);
        assert_eq!(store.subscriber_count(), 3);

        router.destroy();
        router.destroy();
        assert_eq!(store.subscriber_count(), 0);
        assert_eq!(screen.element_count(), 1);
        assert_eq!(router.visible_count(), 0);
    }
}
