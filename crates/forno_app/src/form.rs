//! Pizza composition form
//!
//! The UI-side model for composing a pizza: a name plus a set of toggled
//! toppings. Validation happens here, before any intent reaches the
//! facade; an invalid form never becomes a mutator call.

use crate::state::{Pizza, Topping};
use thiserror::Error;

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("pizza name is required")]
    NameRequired,

    #[error("select at least one topping")]
    NoToppings,
}

/// In-progress pizza composition.
#[derive(Clone, Debug, Default)]
pub struct PizzaForm {
    name: String,
    toppings: Vec<Topping>,
}

impl PizzaForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn selected(&self) -> &[Topping] {
        &self.toppings
    }

    /// Select the topping if it isn't selected, deselect it if it is.
    /// Keeps the selection free of duplicates.
    pub fn toggle_topping(&mut self, topping: &str) {
        match self.toppings.iter().position(|t| t == topping) {
            Some(index) => {
                self.toppings.remove(index);
            }
            None => self.toppings.push(topping.to_string()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    pub fn validate(&self) -> Result<(), FormError> {
        if self.name.trim().is_empty() {
            return Err(FormError::NameRequired);
        }
        if self.toppings.is_empty() {
            return Err(FormError::NoToppings);
        }
        Ok(())
    }

    /// Validate and hand back the composed pizza, resetting the form for
    /// the next composition.
    pub fn submit(&mut self) -> Result<Pizza, FormError> {
        self.validate()?;
        let pizza = Pizza::new(
            std::mem::take(&mut self.name),
            std::mem::take(&mut self.toppings),
        );
        Ok(pizza)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_adds_then_removes() {
        let mut form = PizzaForm::new();
        form.toggle_topping("Ham");
        form.toggle_topping("Bacon");
        assert_eq!(form.selected(), ["Ham".to_string(), "Bacon".to_string()]);

        form.toggle_topping("Ham");
        assert_eq!(form.selected(), ["Bacon".to_string()]);
    }

    #[test]
    fn test_toggle_never_duplicates() {
        let mut form = PizzaForm::new();
        form.toggle_topping("Ham");
        form.toggle_topping("Ham");
        form.toggle_topping("Ham");
        assert_eq!(form.selected(), ["Ham".to_string()]);
    }

    #[test]
    fn test_name_is_required() {
        let mut form = PizzaForm::new();
        form.toggle_topping("Ham");
        assert_eq!(form.validate(), Err(FormError::NameRequired));
        form.set_name("   ");
        assert_eq!(form.validate(), Err(FormError::NameRequired));
    }

    #[test]
    fn test_at_least_one_topping_is_required() {
        let mut form = PizzaForm::new();
        form.set_name("Blazin' hot");
        assert_eq!(form.validate(), Err(FormError::NoToppings));
    }

    #[test]
    fn test_submit_returns_pizza_and_resets() {
        let mut form = PizzaForm::new();
        form.set_name("Veggie");
        form.toggle_topping("Mushrooms");

        let pizza = form.submit().unwrap();
        assert_eq!(pizza.name, "Veggie");
        assert_eq!(pizza.toppings, ["Mushrooms".to_string()]);

        assert_eq!(form.name(), "");
        assert!(form.selected().is_empty());
    }
}
