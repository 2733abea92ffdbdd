//! Pizza facade
//!
//! The observable-store facade over [`StateStore`]: one state snapshot,
//! typed slices with change suppression, a combined view-model stream, and
//! intent mutators that shallow-merge and publish.
//!
//! Data flow: a mutator reads the current snapshot, merges the changed
//! fields, and publishes; the store notifies synchronously; per-slice
//! projections drop non-changes; the view-model recombines and the UI
//! redraws. Remote writes publish `loading: true` immediately and merge
//! their result against the snapshot current at *completion* time, so a
//! slow operation never resurrects state it captured at call time.
//!
//! Mutators must not be invoked from inside a store subscriber; observers
//! are assumed fast and non-blocking.

use crate::catalog::Catalog;
use crate::state::{
    Operation, OperationFailure, OperationKind, Pagination, Pizza, PizzaState, Topping,
};
use forno_core::{CombineLatest, Source, StateStore, Stream, Subscription};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Errors raised while constructing the facade or validating an intent.
#[derive(Debug, Error)]
pub enum FacadeError {
    #[error("pagination offers no page sizes")]
    NoPageSizes,

    #[error("page size {selected} is not offered (available: {available:?})")]
    PageSizeNotOffered {
        selected: usize,
        available: Vec<usize>,
    },
}

/// Facade construction parameters.
#[derive(Clone)]
pub struct FacadeConfig {
    pub initial: PizzaState,
    /// Simulated remote latency applied to write operations.
    pub remote_latency: Duration,
    /// Quiet window for the debounced search intake.
    pub debounce_window: Duration,
}

impl Default for FacadeConfig {
    fn default() -> Self {
        Self {
            initial: PizzaState::default(),
            remote_latency: Duration::from_secs(3),
            debounce_window: Duration::from_millis(300),
        }
    }
}

type Merge = Box<dyn FnOnce(&mut PizzaState) + Send>;

/// The store plus the single-writer gate every mutation goes through.
///
/// Completion handlers running on worker threads use the same gate, which
/// makes each read-modify-write atomic: two in-flight remote operations
/// cannot both merge against the same stale base. Merges requested while a
/// publish is already delivering (the reload subscribers) are queued and
/// applied after it finishes, so every observer sees each snapshot whole
/// and in publish order.
struct Commits {
    store: StateStore<PizzaState>,
    gate: Mutex<()>,
    deferred: Mutex<VecDeque<Merge>>,
    publishing: AtomicBool,
}

impl Commits {
    fn new(store: StateStore<PizzaState>) -> Self {
        Self {
            store,
            gate: Mutex::new(()),
            deferred: Mutex::new(VecDeque::new()),
            publishing: AtomicBool::new(false),
        }
    }

    fn commit(&self, merge: impl FnOnce(&mut PizzaState)) {
        let _gate = self.gate.lock().unwrap();
        self.publish_now(merge);
        self.drain();
    }

    /// Merge from inside a store notification. The publish in flight (if
    /// any) already holds the gate on this thread, so the merge is
    /// deferred behind it rather than re-entering the store.
    fn commit_nested(&self, merge: impl FnOnce(&mut PizzaState) + Send + 'static) {
        if self.publishing.load(Ordering::SeqCst) {
            self.deferred.lock().unwrap().push_back(Box::new(merge));
        } else {
            self.publish_now(merge);
            self.drain();
        }
    }

    fn publish_now(&self, merge: impl FnOnce(&mut PizzaState)) {
        let mut next = self.store.snapshot();
        merge(&mut next);
        self.publishing.store(true, Ordering::SeqCst);
        self.store.publish(next);
        self.publishing.store(false, Ordering::SeqCst);
    }

    fn drain(&self) {
        loop {
            let merge = self.deferred.lock().unwrap().pop_front();
            match merge {
                Some(merge) => self.publish_now(merge),
                None => break,
            }
        }
    }
}

/// Debounced intake for the pizza search box.
///
/// `push` accepts every keystroke; only the value still pending after the
/// configured quiet window, deduplicated, reaches the search mutator.
pub struct SearchInput {
    source: Source<String>,
    _forward: Subscription,
}

impl SearchInput {
    pub fn push(&self, text: impl Into<String>) {
        self.source.emit(text.into());
    }
}

/// Observable-store facade for the pizza composer.
pub struct PizzaFacade {
    commits: Arc<Commits>,
    catalog: Arc<Catalog>,
    remote_latency: Duration,
    debounce_window: Duration,

    pizzas: Stream<Vec<Pizza>>,
    toppings: Stream<Vec<Topping>>,
    pizza_search: Stream<String>,
    topping_search: Stream<String>,
    pagination: Stream<Pagination>,
    operation: Stream<Option<Operation>>,
    last_failure: Stream<Option<OperationFailure>>,
    loading: Stream<bool>,
    counter: Stream<u64>,
    vm: Stream<PizzaState>,

    /// Reload subscriptions wired at construction; these pin the reload
    /// chains for the life of the facade.
    _wiring: Vec<Subscription>,
}

impl PizzaFacade {
    /// Build the facade, validate the initial state, and perform the
    /// initial load through the reload wiring.
    pub fn new(catalog: Arc<Catalog>, config: FacadeConfig) -> Result<Self, FacadeError> {
        let FacadeConfig {
            initial,
            remote_latency,
            debounce_window,
        } = config;

        if initial.pagination.page_sizes.is_empty() {
            return Err(FacadeError::NoPageSizes);
        }
        if !initial
            .pagination
            .page_sizes
            .contains(&initial.pagination.selected_size)
        {
            return Err(FacadeError::PageSizeNotOffered {
                selected: initial.pagination.selected_size,
                available: initial.pagination.page_sizes,
            });
        }

        let commits = Arc::new(Commits::new(StateStore::new(initial)));
        let store = &commits.store;

        let pizzas = store.select(|s: &PizzaState| s.pizzas.clone());
        let toppings = store.select(|s: &PizzaState| s.toppings.clone());
        let pizza_search = store.select(|s: &PizzaState| s.pizza_search.clone());
        let topping_search = store.select(|s: &PizzaState| s.topping_search.clone());
        let pagination = store.select(|s: &PizzaState| s.pagination.clone());
        let operation = store.select(|s: &PizzaState| s.operation.clone());
        let last_failure = store.select(|s: &PizzaState| s.last_failure.clone());
        // Projection only: loading re-emits on every publish so consumers
        // can restart spinners even when the flag value is unchanged.
        let loading = store.stream().map(|s: &PizzaState| s.loading);
        let counter = store.select(|s: &PizzaState| s.counter);

        let vm = (
            &pizzas,
            &toppings,
            &pizza_search,
            &topping_search,
            &pagination,
            &operation,
            &last_failure,
            &loading,
            &counter,
        )
            .combine_latest()
            .map(
                |(
                    pizzas,
                    toppings,
                    pizza_search,
                    topping_search,
                    pagination,
                    operation,
                    last_failure,
                    loading,
                    counter,
                )| {
                    PizzaState {
                        pizzas: pizzas.clone(),
                        toppings: toppings.clone(),
                        pizza_search: pizza_search.clone(),
                        topping_search: topping_search.clone(),
                        pagination: pagination.clone(),
                        operation: operation.clone(),
                        last_failure: last_failure.clone(),
                        loading: *loading,
                        counter: *counter,
                    }
                },
            );

        // Reload wiring: search criteria or pagination changes refresh the
        // pizza page; topping search changes refresh the topping list.
        // Slice replay runs both once right here, performing the initial
        // load.
        let mut wiring = Vec::new();
        {
            let commits = Arc::clone(&commits);
            let catalog = Arc::clone(&catalog);
            wiring.push(
                (&pizza_search, &pagination)
                    .combine_latest()
                    .subscribe(move |(search, pagination): &(String, Pagination)| {
                        let page = catalog.find_pizzas(search, pagination);
                        debug!(search = %search, results = page.len(), "pizza reload");
                        commits.commit_nested(move |state| {
                            state.pizzas = page;
                            state.loading = false;
                        });
                    }),
            );
        }
        {
            let commits = Arc::clone(&commits);
            let catalog = Arc::clone(&catalog);
            wiring.push(topping_search.subscribe(move |search: &String| {
                let found = catalog.find_toppings(search);
                debug!(search = %search, results = found.len(), "topping reload");
                commits.commit_nested(move |state| {
                    state.toppings = found;
                    state.loading = false;
                });
            }));
        }

        Ok(Self {
            commits,
            catalog,
            remote_latency,
            debounce_window,
            pizzas,
            toppings,
            pizza_search,
            topping_search,
            pagination,
            operation,
            last_failure,
            loading,
            counter,
            vm,
            _wiring: wiring,
        })
    }

    // ------- Slices & view model ------------------------

    pub fn pizzas(&self) -> Stream<Vec<Pizza>> {
        self.pizzas.clone()
    }

    pub fn toppings(&self) -> Stream<Vec<Topping>> {
        self.toppings.clone()
    }

    pub fn pizza_search(&self) -> Stream<String> {
        self.pizza_search.clone()
    }

    pub fn topping_search(&self) -> Stream<String> {
        self.topping_search.clone()
    }

    pub fn pagination(&self) -> Stream<Pagination> {
        self.pagination.clone()
    }

    pub fn operation(&self) -> Stream<Option<Operation>> {
        self.operation.clone()
    }

    pub fn last_failure(&self) -> Stream<Option<OperationFailure>> {
        self.last_failure.clone()
    }

    pub fn loading(&self) -> Stream<bool> {
        self.loading.clone()
    }

    pub fn counter(&self) -> Stream<u64> {
        self.counter.clone()
    }

    /// The view model: resolves once every slice is ready, then re-emits
    /// whenever any slice changes, built from the latest value of each.
    pub fn vm(&self) -> Stream<PizzaState> {
        self.vm.clone()
    }

    /// Quick snapshot access for init purposes.
    pub fn snapshot(&self) -> PizzaState {
        self.commits.store.snapshot()
    }

    // ------- Mutators ------------------------

    /// Re-emit the current state with only the counter bumped, forcing
    /// consumers to re-render.
    pub fn emit_latest(&self) {
        self.commits.commit(|state| state.counter += 1);
    }

    pub fn update_pizza_search_criteria(&self, search: impl Into<String>) {
        Self::apply_pizza_search(&self.commits, &search.into());
    }

    pub fn update_topping_search_criteria(&self, search: impl Into<String>) {
        let search = search.into();
        debug!(search = %search, "update topping search criteria");
        self.commits.commit(|state| {
            state.topping_search = search;
            state.loading = true;
        });
    }

    /// Merge a new page selection. Only `selected_size` and
    /// `current_page` change; the offered sizes are fixed.
    pub fn update_pagination(
        &self,
        selected_size: usize,
        current_page: usize,
    ) -> Result<(), FacadeError> {
        let offered = self.commits.store.snapshot().pagination.page_sizes;
        if !offered.contains(&selected_size) {
            return Err(FacadeError::PageSizeNotOffered {
                selected: selected_size,
                available: offered,
            });
        }
        debug!(selected_size, current_page, "update pagination");
        self.commits.commit(|state| {
            state.pagination.selected_size = selected_size;
            state.pagination.current_page = current_page;
            state.loading = true;
        });
        Ok(())
    }

    /// Add a pizza through the simulated remote call: `loading` is set
    /// immediately, the result merges in at completion.
    pub fn add_pizza(&self, pizza: Pizza) {
        debug!(name = %pizza.name, "add pizza");
        self.commits.commit(|state| state.loading = true);

        let commits = Arc::clone(&self.commits);
        let catalog = Arc::clone(&self.catalog);
        let latency = self.remote_latency;
        thread::spawn(move || {
            thread::sleep(latency);
            match catalog.create(pizza) {
                Ok(created) => commits.commit(|state| {
                    state.pizzas.push(created);
                    state.loading = false;
                    state.last_failure = None;
                }),
                Err(err) => {
                    warn!(%err, "add pizza failed");
                    commits.commit(|state| {
                        state.last_failure = Some(OperationFailure {
                            kind: OperationKind::Create,
                            message: err.to_string(),
                        });
                        state.loading = false;
                    });
                }
            }
        });
    }

    /// Record an operation intent and dispatch it against the catalog
    /// behind the simulated remote latency. Successful writes refresh the
    /// visible page from the catalog.
    pub fn do_operation(&self, kind: OperationKind, model: Pizza) {
        debug!(?kind, name = %model.name, "do operation");
        let recorded = Operation {
            kind,
            model: model.clone(),
        };
        self.commits.commit(|state| {
            state.operation = Some(recorded);
            state.loading = true;
        });

        let commits = Arc::clone(&self.commits);
        let catalog = Arc::clone(&self.catalog);
        let latency = self.remote_latency;
        thread::spawn(move || {
            thread::sleep(latency);
            let outcome = match kind {
                OperationKind::Create => catalog.create(model).map(|_| ()),
                OperationKind::Update => catalog.update(model).map(|_| ()),
                OperationKind::Delete => catalog.remove(&model.name),
                OperationKind::Read => Ok(()),
            };
            match outcome {
                Ok(()) => commits.commit(|state| {
                    let page = catalog.find_pizzas(&state.pizza_search, &state.pagination);
                    state.pizzas = page;
                    state.loading = false;
                    state.last_failure = None;
                }),
                Err(err) => {
                    warn!(?kind, %err, "operation failed");
                    commits.commit(|state| {
                        state.last_failure = Some(OperationFailure {
                            kind,
                            message: err.to_string(),
                        });
                        state.loading = false;
                    });
                }
            }
        });
    }

    // ------- Search intake ------------------------

    /// Build the debounced search intake: raw keystrokes go in, the value
    /// left standing after the quiet window (deduplicated) is forwarded to
    /// [`PizzaFacade::update_pizza_search_criteria`].
    pub fn search_input(&self) -> SearchInput {
        let source = Source::new();
        let commits = Arc::clone(&self.commits);
        let forward = source
            .stream()
            .debounce(self.debounce_window)
            .distinct()
            .subscribe(move |text: &String| {
                Self::apply_pizza_search(&commits, text);
            });
        SearchInput {
            source,
            _forward: forward,
        }
    }

    fn apply_pizza_search(commits: &Commits, search: &str) {
        debug!(search = %search, "update pizza search criteria");
        let search = search.to_string();
        commits.commit(|state| {
            state.pizza_search = search;
            state.loading = true;
        });
    }
}
