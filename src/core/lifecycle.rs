//! In-process fan-out of tile lifecycle batches.
//!
//! Every subscriber gets its own channel. Batches published before a
//! subscriber joined are not replayed to it.

use crate::tiles::tile::{TileHandle, TileState};
use crossbeam_channel::{unbounded, Receiver, Sender};

/// A batch of tiles that all entered `new_state` in one grid operation
#[derive(Debug)]
pub struct LifecycleEvent<M> {
    pub tiles: Vec<TileHandle<M>>,
    pub new_state: TileState,
}

impl<M> Clone for LifecycleEvent<M> {
    fn clone(&self) -> Self {
        Self {
            tiles: self.tiles.clone(),
            new_state: self.new_state,
        }
    }
}

impl<M> LifecycleEvent<M> {
    pub fn new(tiles: Vec<TileHandle<M>>, new_state: TileState) -> Self {
        Self { tiles, new_state }
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Multi-subscriber broadcast of [`LifecycleEvent`]s
pub struct LifecycleBus<M> {
    subscribers: Vec<Sender<LifecycleEvent<M>>>,
}

impl<M> LifecycleBus<M> {
    pub fn new() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }

    /// Registers a new subscriber that sees every batch published from now on
    pub fn subscribe(&mut self) -> Receiver<LifecycleEvent<M>> {
        let (tx, rx) = unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Sends `event` to every live subscriber, dropping the ones whose
    /// receiver is gone
    pub fn publish(&mut self, event: LifecycleEvent<M>) {
        if event.is_empty() {
            return;
        }
        log::debug!(
            "lifecycle: {} tile(s) -> {:?} for {} subscriber(s)",
            event.len(),
            event.new_state,
            self.subscribers.len()
        );
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<M> Default for LifecycleBus<M> {
    fn default() -> Self {
        Self::new()
    }
}
