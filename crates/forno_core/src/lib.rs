//! Forno Core Runtime
//!
//! This crate provides the reactive primitives the Forno facade pattern is
//! built on:
//!
//! - **Streams**: Multicast observer streams with replay-of-latest semantics
//! - **State Store**: A single-snapshot store that notifies synchronously
//! - **Slice Projection**: Typed projections with change suppression
//! - **Composition**: Latest-of-all combination of independent streams
//! - **Debounce**: Suppress-until-quiet intake for rapidly changing input
//!
//! # Example
//!
//! ```rust
//! use forno_core::{CombineLatest, StateStore};
//!
//! #[derive(Clone, PartialEq)]
//! struct AppState {
//!     count: i32,
//!     label: String,
//! }
//!
//! let store = StateStore::new(AppState { count: 0, label: "ready".into() });
//!
//! // Typed slices, each deduplicated independently
//! let count = store.select(|s: &AppState| s.count);
//! let label = store.select(|s: &AppState| s.label.clone());
//!
//! // Re-emits whenever either slice changes, using the latest of the other
//! let vm = (&count, &label).combine_latest();
//! let _sub = vm.subscribe(|(count, label)| {
//!     println!("{label}: {count}");
//! });
//!
//! let mut next = store.snapshot();
//! next.count += 1;
//! store.publish(next);
//! ```

pub mod combine;
pub mod debounce;
pub mod store;
pub mod stream;

pub use combine::CombineLatest;
pub use store::StateStore;
pub use stream::{Source, Stream, Subscription};
