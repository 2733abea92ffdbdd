//! Multicast streams with replay-of-latest semantics
//!
//! A [`Stream`] delivers every emission to all current observers,
//! synchronously and in subscription order, and caches the most recent
//! value so late subscribers catch up immediately. Operators derive new
//! streams from existing ones:
//!
//! - [`Stream::map`] projects each value through a typed function
//! - [`Stream::distinct`] / [`Stream::distinct_by`] suppress re-emission of
//!   an unchanged value
//! - [`Stream::select`] is the slice-projection combination of the two
//!
//! A derived stream owns the subscription that feeds it, so it stays
//! attached to its parent exactly as long as it is reachable. Dropping the
//! last handle to a derived stream (including any [`Subscription`] taken on
//! it) detaches it.
//!
//! Emission is fire-and-forget with no backpressure; observers are assumed
//! fast and non-blocking. Observers may publish or subscribe from inside a
//! notification, but they then see nested emissions complete before the
//! outer one resumes.

use smallvec::SmallVec;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

type Observer<T> = Arc<dyn Fn(&T) + Send + Sync>;

pub(crate) struct StreamCore<T> {
    /// Observers in subscription order. Notification walks this in order.
    observers: RwLock<SmallVec<[(u64, Observer<T>); 4]>>,
    /// Most recent emission, replayed to new subscribers.
    latest: RwLock<Option<T>>,
    next_observer_id: AtomicU64,
    /// Subscriptions feeding this stream from upstream. Held so a derived
    /// stream stays attached exactly as long as it is alive.
    upstream: Mutex<Vec<Subscription>>,
}

impl<T: Clone + Send + Sync + 'static> StreamCore<T> {
    fn new(latest: Option<T>) -> Self {
        Self {
            observers: RwLock::new(SmallVec::new()),
            latest: RwLock::new(latest),
            next_observer_id: AtomicU64::new(0),
            upstream: Mutex::new(Vec::new()),
        }
    }

    /// Cache the value and notify all current observers in subscription
    /// order. The observer list is snapshotted first, so observers are free
    /// to subscribe, unsubscribe, or emit without deadlocking.
    pub(crate) fn emit(&self, value: T) {
        *self.latest.write().unwrap() = Some(value.clone());
        let observers: Vec<Observer<T>> = self
            .observers
            .read()
            .unwrap()
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect();
        for observer in &observers {
            observer(&value);
        }
    }
}

/// A multicast observer stream with a last-value cache.
///
/// `Stream` is a cheap handle; clones share the same underlying channel.
pub struct Stream<T> {
    core: Arc<StreamCore<T>>,
}

impl<T> Clone for Stream<T> {
    fn clone(&self) -> Self {
        Self {
            core: Arc::clone(&self.core),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Stream<T> {
    /// A stream with an empty cache; subscribers see nothing until the
    /// first emission.
    pub(crate) fn idle() -> Self {
        Self {
            core: Arc::new(StreamCore::new(None)),
        }
    }

    /// A stream whose cache starts out holding `initial`.
    pub(crate) fn seeded(initial: T) -> Self {
        Self {
            core: Arc::new(StreamCore::new(Some(initial))),
        }
    }

    pub(crate) fn emit_value(&self, value: T) {
        self.core.emit(value);
    }

    pub(crate) fn downgrade(&self) -> std::sync::Weak<StreamCore<T>> {
        Arc::downgrade(&self.core)
    }

    /// Keep `sub` alive for as long as this stream is.
    pub(crate) fn attach_upstream(&self, sub: Subscription) {
        self.core.upstream.lock().unwrap().push(sub);
    }

    /// The most recently emitted value, if any.
    pub fn latest(&self) -> Option<T> {
        self.core.latest.read().unwrap().clone()
    }

    /// Register an observer. If a value has already been emitted, the
    /// observer receives it immediately; afterwards it receives every
    /// emission until the returned [`Subscription`] is dropped.
    pub fn subscribe(&self, f: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let observer: Observer<T> = Arc::new(f);
        let id = self.core.next_observer_id.fetch_add(1, Ordering::Relaxed);
        self.core
            .observers
            .write()
            .unwrap()
            .push((id, Arc::clone(&observer)));

        // Replay outside the observer lock so the callback can publish or
        // subscribe without deadlocking.
        let replay = self.core.latest.read().unwrap().clone();
        if let Some(value) = replay {
            observer(&value);
        }

        let core = Arc::clone(&self.core);
        Subscription::new(move || {
            core.observers
                .write()
                .unwrap()
                .retain(|(observer_id, _)| *observer_id != id);
        })
    }

    /// Derive a stream that emits `project(value)` for every emission.
    pub fn map<U, F>(&self, project: F) -> Stream<U>
    where
        U: Clone + Send + Sync + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        let derived: Stream<U> = Stream::idle();
        let weak = derived.downgrade();
        let sub = self.subscribe(move |value| {
            if let Some(core) = weak.upgrade() {
                core.emit(project(value));
            }
        });
        derived.attach_upstream(sub);
        derived
    }

    /// Derive a stream that suppresses any value equal (under `eq`) to the
    /// last value it emitted. The dedup state lives in the derived stream,
    /// so every subscriber observes the identical sequence.
    pub fn distinct_by<F>(&self, eq: F) -> Stream<T>
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        let derived: Stream<T> = Stream::idle();
        let weak = derived.downgrade();
        let sub = self.subscribe(move |value| {
            if let Some(core) = weak.upgrade() {
                let unchanged = core
                    .latest
                    .read()
                    .unwrap()
                    .as_ref()
                    .map_or(false, |previous| eq(previous, value));
                if !unchanged {
                    core.emit(value.clone());
                }
            }
        });
        derived.attach_upstream(sub);
        derived
    }

    /// [`Stream::distinct_by`] with `PartialEq` as the predicate.
    pub fn distinct(&self) -> Stream<T>
    where
        T: PartialEq,
    {
        self.distinct_by(|a, b| a == b)
    }

    /// Slice projection: `map` followed by `distinct`, the building block
    /// for deriving view-model inputs from a state stream.
    pub fn select<U, F>(&self, project: F) -> Stream<U>
    where
        U: Clone + Send + Sync + PartialEq + 'static,
        F: Fn(&T) -> U + Send + Sync + 'static,
    {
        self.map(project).distinct()
    }
}

/// A push handle paired with the stream it feeds.
///
/// Unlike a [`crate::StateStore`], a source starts out empty: subscribers
/// see nothing until the first `emit`.
pub struct Source<T> {
    stream: Stream<T>,
}

impl<T: Clone + Send + Sync + 'static> Source<T> {
    pub fn new() -> Self {
        Self {
            stream: Stream::idle(),
        }
    }

    pub fn emit(&self, value: T) {
        self.stream.emit_value(value);
    }

    pub fn stream(&self) -> Stream<T> {
        self.stream.clone()
    }
}

impl<T: Clone + Send + Sync + 'static> Default for Source<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// RAII registration of an observer.
///
/// Dropping the subscription detaches the observer; it also releases the
/// subscription's hold on the stream it came from. A subscription pins the
/// whole upstream chain of the stream it was taken on.
#[must_use = "dropping a Subscription detaches the observer"]
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub(crate) fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Detach the observer now instead of at drop time.
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    /// Keep the observer registered for the life of the stream.
    pub fn detach(mut self) {
        self.cancel = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn collector<T: Clone + Send + 'static>() -> (Arc<Mutex<Vec<T>>>, impl Fn(&T) + Send + Sync) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |value: &T| sink.lock().unwrap().push(value.clone()))
    }

    #[test]
    fn test_subscribe_replays_latest() {
        let source = Source::new();
        source.emit(1i32);
        source.emit(2);

        let (seen, sink) = collector();
        let _sub = source.stream().subscribe(sink);
        source.emit(3);

        assert_eq!(*seen.lock().unwrap(), vec![2, 3]);
    }

    #[test]
    fn test_idle_source_emits_nothing_on_subscribe() {
        let source = Source::<i32>::new();
        let (seen, sink) = collector();
        let _sub = source.stream().subscribe(sink);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn test_notification_in_subscription_order() {
        let source = Source::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = Arc::clone(&order);
        let _a = source.stream().subscribe(move |_: &i32| {
            first.lock().unwrap().push("first");
        });
        let second = Arc::clone(&order);
        let _b = source.stream().subscribe(move |_: &i32| {
            second.lock().unwrap().push("second");
        });

        source.emit(1);
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let source = Source::new();
        let (seen, sink) = collector();
        let sub = source.stream().subscribe(sink);

        source.emit(1i32);
        sub.unsubscribe();
        source.emit(2);

        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_drop_detaches_observer() {
        let source = Source::new();
        let (seen, sink) = collector();
        {
            let _sub = source.stream().subscribe(sink);
            source.emit(1i32);
        }
        source.emit(2);
        assert_eq!(*seen.lock().unwrap(), vec![1]);
    }

    #[test]
    fn test_map_projects_values() {
        let source = Source::new();
        let (seen, sink) = collector();
        let doubled = source.stream().map(|v: &i32| v * 2);
        let _sub = doubled.subscribe(sink);

        source.emit(1);
        source.emit(3);
        assert_eq!(*seen.lock().unwrap(), vec![2, 6]);
    }

    #[test]
    fn test_distinct_never_emits_consecutive_equal_values() {
        let source = Source::new();
        let (seen, sink) = collector();
        let distinct = source.stream().distinct();
        let _sub = distinct.subscribe(sink);

        for value in [1i32, 1, 2, 2, 2, 1] {
            source.emit(value);
        }
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 1]);
    }

    #[test]
    fn test_distinct_by_custom_equality() {
        let source = Source::new();
        let (seen, sink) = collector();
        let distinct = source
            .stream()
            .distinct_by(|a: &String, b: &String| a.eq_ignore_ascii_case(b));
        let _sub = distinct.subscribe(sink);

        source.emit("pep".to_string());
        source.emit("PEP".to_string());
        source.emit("pepper".to_string());
        assert_eq!(*seen.lock().unwrap(), vec!["pep", "pepper"]);
    }

    #[test]
    fn test_subscription_pins_derived_chain() {
        let source = Source::new();
        let (seen, sink) = collector();
        // The mapped stream is a temporary; the subscription alone must
        // keep the chain attached.
        let _sub = source.stream().map(|v: &i32| v + 10).subscribe(sink);

        source.emit(1);
        source.emit(2);
        assert_eq!(*seen.lock().unwrap(), vec![11, 12]);
    }

    #[test]
    fn test_dropping_derived_stream_detaches_it() {
        let source = Source::new();
        let (seen, sink) = collector();
        let sub = {
            let doubled = source.stream().map(|v: &i32| v * 2);
            doubled.subscribe(sink)
        };
        source.emit(1);
        // Dropping the subscription releases the last handle to the
        // derived stream.
        drop(sub);
        source.emit(2);
        assert_eq!(*seen.lock().unwrap(), vec![2]);
    }

    #[test]
    fn test_two_subscribers_see_identical_sequences() {
        let source = Source::new();
        let slice = source.stream().select(|v: &i32| v / 10);
        let (a_seen, a_sink) = collector();
        let (b_seen, b_sink) = collector();
        let _a = slice.subscribe(a_sink);
        let _b = slice.subscribe(b_sink);

        for value in [1, 5, 12, 19, 25] {
            source.emit(value);
        }
        assert_eq!(*a_seen.lock().unwrap(), *b_seen.lock().unwrap());
        assert_eq!(*a_seen.lock().unwrap(), vec![0, 1, 2]);
    }
}
