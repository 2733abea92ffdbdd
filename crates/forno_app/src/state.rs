//! Pizza application state model
//!
//! One [`PizzaState`] value is the whole application state at a point in
//! time. Every mutation replaces the snapshot wholesale; no field is ever
//! mutated in place behind a subscriber's back.

use serde::{Deserialize, Serialize};

/// A topping is a plain string drawn from the fixed catalog; it has no
/// identity or lifecycle of its own.
pub type Topping = String;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pizza {
    pub name: String,
    pub toppings: Vec<Topping>,
}

impl Pizza {
    pub fn new(name: impl Into<String>, toppings: Vec<Topping>) -> Self {
        Self {
            name: name.into(),
            toppings,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub current_page: usize,
    pub selected_size: usize,
    pub page_sizes: Vec<usize>,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            current_page: 0,
            selected_size: 5,
            page_sizes: vec![5, 10, 20, 50],
        }
    }
}

/// The four intents a remote operation can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    Create,
    Read,
    Update,
    Delete,
}

/// The last requested mutation intent: what to do, and to which model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    pub kind: OperationKind,
    pub model: Pizza,
}

/// Recorded when a remote operation fails: the data already loaded stays
/// intact, `loading` clears, and this field carries what went wrong.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationFailure {
    pub kind: OperationKind,
    pub message: String,
}

/// The full application snapshot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PizzaState {
    pub pizzas: Vec<Pizza>,
    pub toppings: Vec<Topping>,
    pub pizza_search: String,
    pub topping_search: String,
    pub pagination: Pagination,
    pub operation: Option<Operation>,
    pub last_failure: Option<OperationFailure>,
    pub loading: bool,
    /// Bumped to force a re-emission when no semantic field changed.
    pub counter: u64,
}
