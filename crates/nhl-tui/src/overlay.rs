//! Loading and error overlays owned by one view.
//!
//! - The loading overlay removes itself through a one-shot subscription that
//!   fires when `loading` turns false, then drops that subscription.
//! - The error overlay follows the `error` field and explicit dismissal; it
//!   never disappears because some unrelated field changed.
//! - There is at most one of each per view; asking again updates in place.

use std::cell::RefCell;
use std::rc::Rc;

use ratatui::text::{Line, Span, Text};
use tracing::debug;

use crate::screen::{ElementId, Screen, Tone};
use crate::store::{Store, Subscription};
use crate::theme::{style_default, style_hint};

struct LoadingOverlay {
    element: ElementId,
    message: String,
    /// Dropping this unregisters the watcher.
    _watcher: Subscription,
}

struct ErrorOverlay {
    element: ElementId,
    message: String,
}

pub struct OverlayManager {
    screen: Screen,
    store: Store,
    parent: Option<ElementId>,
    loading: Rc<RefCell<Option<LoadingOverlay>>>,
    error: Option<ErrorOverlay>,
}

impl OverlayManager {
    pub fn new(screen: Screen, store: Store) -> Self {
        Self {
            screen,
            store,
            parent: None,
            loading: Rc::new(RefCell::new(None)),
            error: None,
        }
    }

    /// Overlays are created under `parent` (the view's container).
    pub fn attach(&mut self, parent: ElementId) {
        self.parent = Some(parent);
    }

    /// Show the loading overlay, or retitle the one already showing.
    /// Returns true when a new overlay was created.
    pub fn show_loading(&mut self, message: &str) -> bool {
        let Some(parent) = self.parent else {
            return false;
        };

        if let Some(active) = self.loading.borrow_mut().as_mut() {
            if active.message != message {
                active.message = message.to_string();
                self.screen.set_content(active.element, loading_text(message));
                self.screen.render();
            }
            return false;
        }

        let element = self
            .screen
            .overlay(parent, Tone::Loading, "Loading", loading_text(message));

        let slot = self.loading.clone();
        let screen = self.screen.clone();
        let watcher = self.store.subscribe(move |state| {
            if state.loading {
                return Ok(());
            }
            // Taking the overlay drops `_watcher`, which unregisters this
            // callback.
            let finished = slot.borrow_mut().take();
            if let Some(overlay) = finished {
                screen.destroy(overlay.element);
                screen.render();
                debug!("[overlay] loading overlay {:?} dismissed", overlay.element);
            }
            Ok(())
        });

        *self.loading.borrow_mut() = Some(LoadingOverlay {
            element,
            message: message.to_string(),
            _watcher: watcher,
        });
        self.screen.render();
        debug!("[overlay] loading overlay {:?} shown", element);
        true
    }

    pub fn has_loading(&self) -> bool {
        self.loading.borrow().is_some()
    }

    /// Reconcile the error overlay with the `error` field. A new overlay is only
    /// created when `may_create` (the owning view is current).
    pub fn sync_error(&mut self, error: Option<&str>, may_create: bool) {
        let Some(message) = error else {
            self.dismiss_error();
            return;
        };

        if let Some(active) = self.error.as_mut() {
            if active.message != message {
                active.message = message.to_string();
                self.screen.set_content(active.element, error_text(message));
                self.screen.render();
            }
            return;
        }

        let Some(parent) = self.parent.filter(|_| may_create) else {
            return;
        };
        let element = self
            .screen
            .overlay(parent, Tone::Error, "Error", error_text(message));
        self.error = Some(ErrorOverlay {
            element,
            message: message.to_string(),
        });
        self.screen.render();
        debug!("[overlay] error overlay {:?}: {}", element, message);
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Remove the error overlay. Returns false when none was showing.
    pub fn dismiss_error(&mut self) -> bool {
        let Some(overlay) = self.error.take() else {
            return false;
        };
        self.screen.destroy(overlay.element);
        self.screen.render();
        debug!("[overlay] error overlay {:?} dismissed", overlay.element);
        true
    }

    /// Drop both overlays and the loading watcher.
    pub fn clear(&mut self) {
        let loading = self.loading.borrow_mut().take();
        if let Some(overlay) = loading {
            self.screen.destroy(overlay.element);
        }
        if let Some(overlay) = self.error.take() {
            self.screen.destroy(overlay.element);
        }
    }
}

impl Drop for OverlayManager {
    fn drop(&mut self) {
        self.clear();
    }
}

fn loading_text(message: &str) -> Text<'static> {
    Text::from(Line::from(Span::styled(format!(" ⣾ {message}"), style_default())))
}

fn error_text(message: &str) -> Text<'static> {
    Text::from(vec![
        Line::from(Span::styled(format!(" {message}"), style_default())),
        Line::default(),
        Line::from(Span::styled(" enter / esc / space to dismiss", style_hint())),
    ])
}
