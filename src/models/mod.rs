//! Typed records for the four stored entity kinds.
//!
//! Every record implements [`Validate`]; the store calls it on insert and
//! update so malformed documents never reach a collection.

pub mod item;
pub mod meal_plan;
pub mod recipe;
pub mod user;

pub use item::Item;
pub use meal_plan::{MealPlan, NutritionTarget, ScheduledDay};
pub use recipe::{Ingredient, NutrientMap, Recipe};
pub use user::User;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
#[error("invalid {field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

pub(crate) fn require_non_empty(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    Ok(())
}

pub(crate) fn require_non_negative(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ValidationError::new(
            field,
            format!("must be a finite non-negative number, got {}", value),
        ));
    }
    Ok(())
}
