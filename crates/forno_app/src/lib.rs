//! Forno Pizza Application
//!
//! The pizza-composer demo built on the Forno facade pattern:
//!
//! - **State model**: one immutable [`PizzaState`] snapshot per facade
//! - **Catalog**: the fixed pizza/topping source with filtered, paged reads
//! - **Facade**: slices, a combined view-model, and intent mutators
//! - **Form**: UI-side composition and validation
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use forno_app::{Catalog, FacadeConfig, PizzaFacade};
//!
//! let catalog = Arc::new(Catalog::new());
//! let facade = PizzaFacade::new(catalog, FacadeConfig::default()).unwrap();
//!
//! // The constructor performs the initial load through the reload wiring.
//! let state = facade.snapshot();
//! assert_eq!(state.pizzas.len(), 4);
//!
//! // Search criteria reload the visible page synchronously.
//! facade.update_pizza_search_criteria("pep");
//! assert_eq!(facade.snapshot().pizzas.len(), 1);
//! ```

pub mod catalog;
pub mod facade;
pub mod form;
pub mod state;


pub use catalog::{Catalog, CatalogError, TOPPINGS};
pub use facade::{FacadeConfig, FacadeError, PizzaFacade, SearchInput};
pub use form::{FormError, PizzaForm};
pub use state::{
    Operation, OperationFailure, OperationKind, Pagination, Pizza, PizzaState, Topping,
};
