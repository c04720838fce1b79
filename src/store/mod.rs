//! Document storage.
//!
//! The planner reads recipes through the [`RecipeStore`] trait. The crate ships
//! an in-memory implementation ([`Database`]) that is loaded once at startup and
//! shared behind an `Arc`.

pub mod collection;
pub mod data_loader;
pub mod database;

pub use collection::{Collection, Document};
pub use data_loader::load_recipes_csv;
pub use database::Database;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};
use thiserror::Error;

use crate::models::{Recipe, ValidationError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{collection} document {id} not found")]
    NotFound { collection: &'static str, id: String },

    #[error("{collection} already holds a document with id {id}")]
    DuplicateId { collection: &'static str, id: String },

    #[error("rejected document: {0}")]
    Invalid(#[from] ValidationError),
}

/// Optional recipe filters; `None` means "don't care".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecipeFilter {
    pub diet_label: Option<String>,
    pub cuisine_type: Option<String>,
    pub meal_type: Option<String>,
}

impl RecipeFilter {
    pub fn matches(&self, recipe: &Recipe) -> bool {
        self.diet_label
            .as_deref()
            .map_or(true, |label| recipe.has_diet_label(label))
            && self
                .cuisine_type
                .as_deref()
                .map_or(true, |cuisine| recipe.is_cuisine(cuisine))
            && self
                .meal_type
                .as_deref()
                .map_or(true, |meal| recipe.is_meal_type(meal))
    }
}

#[async_trait]
pub trait RecipeStore: Send + Sync {
    /// Every stored recipe matching `filter`, in storage order.
    async fn find(&self, filter: &RecipeFilter) -> Result<Vec<Document<Recipe>>, StoreError>;

    /// Up to `n` named recipes matching `filter`, drawn uniformly without
    /// replacement. Fewer matches than `n` returns every match.
    async fn sample(
        &self,
        filter: &RecipeFilter,
        n: usize,
        rng: &mut (dyn RngCore + Send),
    ) -> Result<Vec<Document<Recipe>>, StoreError> {
        let candidates: Vec<Document<Recipe>> = self
            .find(filter)
            .await?
            .into_iter()
            .filter(|doc| doc.body.has_name())
            .collect();
        Ok(select_uniform(&candidates, n, rng))
    }
}

/// Up to `n` elements of `items`, chosen uniformly without replacement.
fn select_uniform<T: Clone, R: Rng + ?Sized>(items: &[T], n: usize, rng: &mut R) -> Vec<T> {
    items.choose_multiple(rng, n).cloned().collect()
}
