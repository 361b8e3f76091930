//! Loader — runs fetches against the data source and records the outcome.
//!
//! `loading` is true while any request is in flight. A result that has been
//! superseded by a newer request of the same kind is dropped, but still
//! counts towards clearing `loading`. `error` is left alone on issue and only
//! cleared by a successful result, so a failing background refresh never
//! hides an error the user has not dismissed.

use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, warn};

use nhl_proto::api::{ApiError, DataSource};

use crate::action::LoadRequest;
use crate::app_state::PartialState;
use crate::store::Store;

#[derive(Clone)]
pub struct Loader {
    store: Store,
    source: Rc<dyn DataSource>,
    in_flight: Rc<Cell<usize>>,
    schedule_generation: Rc<Cell<u64>>,
    game_generation: Rc<Cell<u64>>,
}

impl Loader {
    pub fn new(store: Store, source: Rc<dyn DataSource>) -> Self {
        Self {
            store,
            source,
            in_flight: Rc::new(Cell::new(0)),
            schedule_generation: Rc::new(Cell::new(0)),
            game_generation: Rc::new(Cell::new(0)),
        }
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.get()
    }

    fn generation(&self, request: LoadRequest) -> &Cell<u64> {
        match request {
            LoadRequest::Schedule(_) => &self.schedule_generation,
            LoadRequest::Game(_) => &self.game_generation,
        }
    }

    /// Mark the store as loading and fetch in the background.
    /// Must run inside a `LocalSet`.
    pub fn load(&self, request: LoadRequest) {
        let counter = self.generation(request);
        let generation = counter.get() + 1;
        counter.set(generation);
        self.in_flight.set(self.in_flight.get() + 1);
        debug!(
            "[loader] {:?} issued (gen {}, {} in flight)",
            request,
            generation,
            self.in_flight.get()
        );

        self.store.set_state(PartialState::new().loading(true));

        let this = self.clone();
        tokio::task::spawn_local(async move {
            let outcome = this.fetch(request).await;
            this.finish(request, generation, outcome);
        });
    }

    async fn fetch(&self, request: LoadRequest) -> Result<PartialState, ApiError> {
        match request {
            LoadRequest::Schedule(date) => {
                let schedule = self.source.fetch_schedule(date).await?;
                debug!(
                    "[loader] schedule {}: {} games this week",
                    date,
                    schedule.total_games()
                );
                Ok(PartialState::new().schedule_data(Some(Rc::new(schedule))))
            }
            LoadRequest::Game(game_id) => {
                let feed = self.source.fetch_live_game(game_id).await?;
                debug!(
                    "[loader] game {}: {} ({} plays)",
                    game_id,
                    feed.game_state,
                    feed.plays.len()
                );
                Ok(PartialState::new().live_game_data(Some(Rc::new(feed))))
            }
        }
    }

    fn finish(
        &self,
        request: LoadRequest,
        generation: u64,
        outcome: Result<PartialState, ApiError>,
    ) {
        let remaining = self.in_flight.get().saturating_sub(1);
        self.in_flight.set(remaining);

        let mut update = PartialState::new();
        if generation == self.generation(request).get() {
            match outcome {
                Ok(data) => update = data.error(None),
                Err(e) => {
                    warn!("[loader] {:?} failed: {}", request, e);
                    update = update.error(Some(e.to_string()));
                }
            }
        } else {
            debug!("[loader] {:?} gen {} superseded, dropped", request, generation);
        }
        if remaining == 0 {
            update = update.loading(false);
        }
        if !update.is_empty() {
            self.store.set_state(update);
        }
    }
}
