//! Typed publish/subscribe channels
//!
//! Components that need to hear about changes elsewhere (the document store,
//! the editing session) subscribe here instead of polling or reaching for a
//! shared global. Each subscriber gets its own `mpsc` receiver; receivers
//! that have been dropped are pruned on the next publish.

use std::sync::mpsc::{channel, Receiver, Sender};

/// A fan-out channel for events of type `T`.
#[derive(Debug)]
pub struct EventBus<T> {
    subscribers: Vec<Sender<T>>,
}

impl<T> Default for EventBus<T> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }
}

impl<T: Clone> EventBus<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new subscriber.
    pub fn subscribe(&mut self) -> Receiver<T> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    /// Send `event` to every live subscriber.
    ///
    /// Returns how many subscribers received it.
    pub fn publish(&mut self, event: T) -> usize {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
        self.subscribers.len()
    }
}

/// Drain everything currently queued on a receiver without blocking.
pub fn drain<T>(receiver: &Receiver<T>) -> Vec<T> {
    receiver.try_iter().collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
