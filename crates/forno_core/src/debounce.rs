//! Suppress-until-quiet rate limiting
//!
//! [`Stream::debounce`] bounds how often a rapidly changing input reaches
//! its consumers without ever losing the final value: each upstream
//! emission re-arms a quiet window, and only the value still pending when
//! the window elapses undisturbed is forwarded.
//!
//! Forwarding happens on a dedicated worker thread, so debounced emissions
//! arrive off the emitting thread. The worker shuts down when the
//! debounced stream is dropped.

use crate::stream::{Stream, Subscription};
use std::sync::{Arc, Condvar, Mutex};
use std::thread;
use std::time::{Duration, Instant};

struct DebounceState<T> {
    pending: Option<T>,
    deadline: Option<Instant>,
    closed: bool,
}

impl<T: Clone + Send + Sync + 'static> Stream<T> {
    /// Derive a stream that forwards a value only after `window` has
    /// elapsed with no further upstream emission.
    pub fn debounce(&self, window: Duration) -> Stream<T> {
        let derived: Stream<T> = Stream::idle();
        let shared = Arc::new((
            Mutex::new(DebounceState::<T> {
                pending: None,
                deadline: None,
                closed: false,
            }),
            Condvar::new(),
        ));

        // Feed side: every upstream emission re-arms the quiet window.
        let feed = Arc::clone(&shared);
        let sub = self.subscribe(move |value| {
            let (state, wakeup) = &*feed;
            let mut guard = state.lock().unwrap();
            guard.pending = Some(value.clone());
            guard.deadline = Some(Instant::now() + window);
            wakeup.notify_one();
        });

        // Worker side: forwards the pending value once the window elapses
        // undisturbed, then parks until the next emission.
        let weak = derived.downgrade();
        let work = Arc::clone(&shared);
        thread::spawn(move || {
            let (state, wakeup) = &*work;
            let mut guard = state.lock().unwrap();
            loop {
                if guard.closed {
                    return;
                }
                match guard.deadline {
                    None => {
                        guard = wakeup.wait(guard).unwrap();
                    }
                    Some(deadline) => {
                        let now = Instant::now();
                        if now < deadline {
                            let (next, _timed_out) =
                                wakeup.wait_timeout(guard, deadline - now).unwrap();
                            guard = next;
                        } else {
                            let pending = guard.pending.take();
                            guard.deadline = None;
                            drop(guard);
                            match (weak.upgrade(), pending) {
                                (Some(core), Some(value)) => {
                                    tracing::trace!("debounce window elapsed, forwarding");
                                    core.emit(value);
                                }
                                (None, _) => return,
                                _ => {}
                            }
                            guard = state.lock().unwrap();
                        }
                    }
                }
            }
        });

        derived.attach_upstream(sub);

        // Wake the worker for shutdown once the debounced stream goes away.
        let close = Arc::clone(&shared);
        derived.attach_upstream(Subscription::new(move || {
            let (state, wakeup) = &*close;
            state.lock().unwrap().closed = true;
            wakeup.notify_one();
        }));

        derived
    }
}
