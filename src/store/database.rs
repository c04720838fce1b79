use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::Path;

use super::{load_recipes_csv, Collection, Document, RecipeFilter, RecipeStore, StoreError};
use crate::models::{Item, MealPlan, Recipe, User};

/// The four entity collections, constructed once at startup and passed to
/// whatever needs them.
#[derive(Debug)]
pub struct Database {
    pub items: Collection<Item>,
    pub recipes: Collection<Recipe>,
    pub users: Collection<User>,
    pub meal_plans: Collection<MealPlan>,
}

impl Default for Database {
    fn default() -> Self {
        Self::new()
    }
}

impl Database {
    pub fn new() -> Self {
        Self {
            items: Collection::new("items"),
            recipes: Collection::new("recipes"),
            users: Collection::new("users"),
            meal_plans: Collection::new("meal_plans"),
        }
    }

    /// A database whose recipe collection holds `recipes`, each under a fresh id.
    pub fn with_recipes(recipes: impl IntoIterator<Item = Recipe>) -> Result<Self, StoreError> {
        let db = Self::new();
        for recipe in recipes {
            db.recipes.insert(recipe)?;
        }
        Ok(db)
    }

    pub fn from_recipe_csv(path: &Path) -> Result<Self> {
        let recipes = load_recipes_csv(path)?;
        Self::with_recipes(recipes)
            .with_context(|| format!("Failed to store recipes loaded from {:?}", path))
    }
}

#[async_trait]
impl RecipeStore for Collection<Recipe> {
    async fn find(&self, filter: &RecipeFilter) -> Result<Vec<Document<Recipe>>, StoreError> {
        Ok(Collection::find(self, |recipe| filter.matches(recipe)))
    }
}

#[async_trait]
impl RecipeStore for Database {
    async fn find(&self, filter: &RecipeFilter) -> Result<Vec<Document<Recipe>>, StoreError> {
        RecipeStore::find(&self.recipes, filter).await
    }
}
