//! Store — owns the application state and notifies subscribers.
//!
//! Single-threaded by construction: the handle is `Rc`-based and never leaves
//! the local task set. Invariants:
//! - Subscribers run in registration order, with no store borrow held, so a
//!   callback may read state, subscribe, unsubscribe or call `set_state`.
//! - A `set_state` issued during a notification round is queued; every
//!   subscriber sees round N before the merge of round N+1 begins.
//! - A failing or panicking subscriber is logged and skipped; the rest of the
//!   round still runs. [`in_subscriber`] tells a panic hook that the panic is
//!   about to be caught here.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::rc::{Rc, Weak};

use tracing::{error, trace};

use crate::app_state::{AppState, PartialState};

type Callback = Rc<RefCell<dyn FnMut(&AppState) -> anyhow::Result<()>>>;

thread_local! {
    static IN_SUBSCRIBER: Cell<bool> = const { Cell::new(false) };
}

/// True while a subscriber callback runs on this thread.
pub fn in_subscriber() -> bool {
    IN_SUBSCRIBER.with(Cell::get)
}

/// Slab key of a registration. The generation makes a stale token inert once
/// its slot has been reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionId {
    index: usize,
    generation: u64,
}

struct Slot {
    generation: u64,
    /// Key into `order`.
    seq: u64,
    callback: Option<Callback>,
}

struct StoreInner {
    state: AppState,
    slots: Vec<Slot>,
    free: Vec<usize>,
    /// Live registrations keyed by registration sequence.
    order: BTreeMap<u64, SubscriptionId>,
    next_seq: u64,
    pending: VecDeque<PartialState>,
    notifying: bool,
}

impl StoreInner {
    fn insert(&mut self, callback: Callback) -> SubscriptionId {
        let seq = self.next_seq;
        self.next_seq += 1;
        let id = match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index];
                slot.generation += 1;
                slot.seq = seq;
                slot.callback = Some(callback);
                SubscriptionId {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    seq,
                    callback: Some(callback),
                });
                SubscriptionId {
                    index: self.slots.len() - 1,
                    generation: 0,
                }
            }
        };
        self.order.insert(seq, id);
        id
    }

    /// The caller drops the returned callback after releasing the borrow.
    fn remove(&mut self, id: SubscriptionId) -> Option<Callback> {
        let slot = self.slots.get_mut(id.index)?;
        if slot.generation != id.generation {
            return None;
        }
        let callback = slot.callback.take()?;
        let seq = slot.seq;
        self.order.remove(&seq);
        self.free.push(id.index);
        Some(callback)
    }

    fn callback(&self, id: SubscriptionId) -> Option<Callback> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.callback.clone())
    }

    /// Live registrations in the order they were made.
    fn round(&self) -> Vec<SubscriptionId> {
        self.order.values().copied().collect()
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

/// Cloneable handle to the one application store.
#[derive(Clone)]
pub struct Store {
    inner: Rc<RefCell<StoreInner>>,
}

impl Store {
    pub fn new(initial: AppState) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                state: initial,
                slots: Vec::new(),
                free: Vec::new(),
                order: BTreeMap::new(),
                next_seq: 0,
                pending: VecDeque::new(),
                notifying: false,
            })),
        }
    }

    /// A private copy of the current snapshot.
    pub fn get_state(&self) -> AppState {
        self.inner.borrow().state.clone()
    }

    pub fn set_state(&self, partial: PartialState) {
        {
            let mut inner = self.inner.borrow_mut();
            inner.pending.push_back(partial);
            if inner.notifying {
                trace!("[store] set_state queued behind active round");
                return;
            }
            inner.notifying = true;
        }

        loop {
            let (snapshot, round) = {
                let mut inner = self.inner.borrow_mut();
                let Some(partial) = inner.pending.pop_front() else {
                    inner.notifying = false;
                    break;
                };
                partial.apply_to(&mut inner.state);
                (inner.state.clone(), inner.round())
            };

            for id in round {
                // Removed earlier in this round: skip.
                let Some(callback) = self.inner.borrow().callback(id) else {
                    continue;
                };
                invoke(id, &callback, &snapshot);
            }
        }
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: FnMut(&AppState) -> anyhow::Result<()> + 'static,
    {
        let callback: Callback = Rc::new(RefCell::new(callback));
        let id = self.inner.borrow_mut().insert(callback);
        trace!("[store] subscribe {:?}", id);
        Subscription {
            store: Rc::downgrade(&self.inner),
            id,
            active: Cell::new(true),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().len()
    }
}

fn invoke(id: SubscriptionId, callback: &Callback, snapshot: &AppState) {
    let outer = IN_SUBSCRIBER.with(|flag| flag.replace(true));
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| match callback.try_borrow_mut() {
        Ok(mut f) => (&mut *f)(snapshot),
        Err(_) => Err(anyhow::anyhow!("subscriber is already running")),
    }));
    IN_SUBSCRIBER.with(|flag| flag.set(outer));
    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!("[store] subscriber {:?} failed: {:#}", id, e),
        Err(payload) => {
            let message = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "non-string panic".to_string());
            error!("[store] subscriber {:?} panicked: {}", id, message);
        }
    }
}

/// Registration token. Unsubscribes when dropped.
pub struct Subscription {
    store: Weak<RefCell<StoreInner>>,
    id: SubscriptionId,
    active: Cell<bool>,
}

impl Subscription {
    /// Remove exactly this registration. Later calls are no-ops.
    pub fn unsubscribe(&self) {
        if !self.active.replace(false) {
            return;
        }
        let Some(inner) = self.store.upgrade() else {
            return;
        };
        let removed = inner.borrow_mut().remove(self.id);
        if removed.is_some() {
            trace!("[store] unsubscribe {:?}", self.id);
        }
        // The callback (and whatever it captured) drops here, outside the borrow.
        drop(removed);
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("active", &self.active.get())
            .finish()
    }
}
