//! Pizza catalog
//!
//! The external collaborator behind the facade: a fixed set of known
//! pizzas and allowed toppings, with filtered/paged reads and full CRUD
//! writes. Reads answer immediately; the facade adds simulated latency on
//! the write path.

use crate::state::{Pagination, Pizza, Topping};
use rustc_hash::FxHashSet;
use std::sync::RwLock;
use thiserror::Error;

const SEED_PIZZAS: &[(&str, &[&str])] = &[
    ("New Yorker", &["Bacon", "Pepperoni", "Ham", "Mushrooms"]),
    ("Hot & Spicy", &["Jalapenos", "Herbs", "Pepperoni", "Chicken"]),
    ("Hawaiian", &["Ham", "Pineapple", "Sweetcorn"]),
    ("Pepperoni", &["Pepperoni"]),
];

/// The fixed topping catalog.
pub const TOPPINGS: &[&str] = &[
    "Bacon",
    "Pepperoni",
    "Mushrooms",
    "Herbs",
    "Chicken",
    "Pineapple",
    "Ham",
    "Jalapenos",
];

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("pizza \"{0}\" already exists")]
    DuplicatePizza(String),

    #[error("pizza \"{0}\" is not in the catalog")]
    UnknownPizza(String),
}

struct CatalogInner {
    pizzas: Vec<Pizza>,
    /// Name index; `pizzas` never holds two entries with the same name.
    names: FxHashSet<String>,
    toppings: Vec<Topping>,
}

/// Thread-safe catalog of known pizzas and allowed toppings.
pub struct Catalog {
    inner: RwLock<CatalogInner>,
}

impl Catalog {
    pub fn new() -> Self {
        let pizzas: Vec<Pizza> = SEED_PIZZAS
            .iter()
            .map(|(name, toppings)| Pizza {
                name: (*name).to_string(),
                toppings: toppings.iter().map(|t| (*t).to_string()).collect(),
            })
            .collect();
        let names = pizzas.iter().map(|p| p.name.clone()).collect();
        let toppings = TOPPINGS.iter().map(|t| (*t).to_string()).collect();
        Self {
            inner: RwLock::new(CatalogInner {
                pizzas,
                names,
                toppings,
            }),
        }
    }

    /// Pizzas whose name contains `search` (case-insensitive), windowed to
    /// the requested page.
    pub fn find_pizzas(&self, search: &str, pagination: &Pagination) -> Vec<Pizza> {
        let needle = search.to_lowercase();
        let inner = self.inner.read().unwrap();
        inner
            .pizzas
            .iter()
            .filter(|p| needle.is_empty() || p.name.to_lowercase().contains(&needle))
            .skip(pagination.current_page * pagination.selected_size)
            .take(pagination.selected_size)
            .cloned()
            .collect()
    }

    /// Toppings matching `search` (case-insensitive substring).
    pub fn find_toppings(&self, search: &str) -> Vec<Topping> {
        let needle = search.to_lowercase();
        let inner = self.inner.read().unwrap();
        inner
            .toppings
            .iter()
            .filter(|t| needle.is_empty() || t.to_lowercase().contains(&needle))
            .cloned()
            .collect()
    }

    pub fn create(&self, pizza: Pizza) -> Result<Pizza, CatalogError> {
        let mut inner = self.inner.write().unwrap();
        if inner.names.contains(&pizza.name) {
            return Err(CatalogError::DuplicatePizza(pizza.name));
        }
        inner.names.insert(pizza.name.clone());
        inner.pizzas.push(pizza.clone());
        Ok(pizza)
    }

    pub fn update(&self, pizza: Pizza) -> Result<Pizza, CatalogError> {
        let mut inner = self.inner.write().unwrap();
        match inner.pizzas.iter_mut().find(|p| p.name == pizza.name) {
            Some(existing) => {
                existing.toppings = pizza.toppings.clone();
                Ok(pizza)
            }
            None => Err(CatalogError::UnknownPizza(pizza.name)),
        }
    }

    pub fn remove(&self, name: &str) -> Result<(), CatalogError> {
        let mut inner = self.inner.write().unwrap();
        if !inner.names.remove(name) {
            return Err(CatalogError::UnknownPizza(name.to_string()));
        }
        inner.pizzas.retain(|p| p.name != name);
        Ok(())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::new()
    }
}
