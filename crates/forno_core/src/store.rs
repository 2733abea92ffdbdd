//! Single-snapshot state store
//!
//! A [`StateStore`] holds exactly one current state snapshot and exposes a
//! replay-latest feed over it: new subscribers immediately receive the
//! current snapshot, then every future one. Publishing replaces the whole
//! snapshot and notifies observers synchronously, in subscription order,
//! with no backpressure.
//!
//! Each store owns its state; there is no global registry. Two facades
//! built on two stores share nothing.

use crate::stream::{Stream, Subscription};
use tracing::trace;

/// Replay-latest store for a single state snapshot.
///
/// `StateStore` is a cheap handle; clones share the same snapshot and
/// observer list.
pub struct StateStore<S> {
    state: Stream<S>,
}

impl<S> Clone for StateStore<S> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<S: Clone + Send + Sync + 'static> StateStore<S> {
    /// Create a store seeded with `initial`; a store always has a current
    /// snapshot.
    pub fn new(initial: S) -> Self {
        Self {
            state: Stream::seeded(initial),
        }
    }

    /// A clone of the current snapshot. Callers can't reach the store's
    /// own copy, so mutating the result has no effect until it is
    /// published back.
    pub fn snapshot(&self) -> S {
        self.state
            .latest()
            .expect("state store is seeded at construction")
    }

    /// Replace the snapshot and synchronously notify every observer.
    pub fn publish(&self, next: S) {
        trace!("publishing state snapshot");
        self.state.emit_value(next);
    }

    /// Subscribe to the snapshot feed: current value first, then every
    /// future publish.
    pub fn subscribe(&self, f: impl Fn(&S) + Send + Sync + 'static) -> Subscription {
        self.state.subscribe(f)
    }

    /// The snapshot feed as a stream, for composition.
    pub fn stream(&self) -> Stream<S> {
        self.state.clone()
    }

    /// Slice projection over the snapshot feed: a typed, deduplicated
    /// stream of one part of the state.
    pub fn select<U, F>(&self, project: F) -> Stream<U>
    where
        U: Clone + Send + Sync + PartialEq + 'static,
        F: Fn(&S) -> U + Send + Sync + 'static,
    {
        self.state.select(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Debug, PartialEq)]
    struct TestState {
        count: i32,
        label: String,
    }

    fn initial() -> TestState {
        TestState {
            count: 0,
            label: "ready".into(),
        }
    }

    #[test]
    fn test_snapshot_reflects_last_publish() {
        let store = StateStore::new(initial());
        assert_eq!(store.snapshot().count, 0);

        let mut next = store.snapshot();
        next.count = 42;
        store.publish(next);
        assert_eq!(store.snapshot().count, 42);
    }

    #[test]
    fn test_snapshot_is_detached_from_the_store() {
        let store = StateStore::new(initial());
        let mut copy = store.snapshot();
        copy.count = 99;
        assert_eq!(store.snapshot().count, 0);
    }

    #[test]
    fn test_subscribe_delivers_current_then_future() {
        let store = StateStore::new(initial());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = store.subscribe(move |state: &TestState| {
            sink.lock().unwrap().push(state.count);
        });

        let mut next = store.snapshot();
        next.count = 1;
        store.publish(next);

        assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_select_suppresses_unrelated_changes() {
        let store = StateStore::new(initial());
        let labels = store.select(|s: &TestState| s.label.clone());

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _sub = labels.subscribe(move |label: &String| {
            sink.lock().unwrap().push(label.clone());
        });

        // A count-only change must not re-emit the label slice.
        let mut next = store.snapshot();
        next.count = 5;
        store.publish(next);

        let mut next = store.snapshot();
        next.label = "busy".into();
        store.publish(next);

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["ready".to_string(), "busy".to_string()]
        );
    }

    #[test]
    fn test_clones_share_the_same_store() {
        let store = StateStore::new(initial());
        let handle = store.clone();

        let mut next = handle.snapshot();
        next.count = 7;
        handle.publish(next);

        assert_eq!(store.snapshot().count, 7);
    }
}
