use rand::RngCore;
use serde::Serialize;
use tracing::debug;

use crate::models::Recipe;
use crate::store::{Document, RecipeFilter, RecipeStore, StoreError};

/// Request-scoped recipes offered to the model, addressed by position.
///
/// The model only ever sees positions, never the stored ids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSet {
    recipes: Vec<Document<Recipe>>,
}

/// What the prompt shows for each sampled recipe.
#[derive(Debug, Serialize, PartialEq)]
pub struct SimplifiedRecipe<'a> {
    pub index: usize,
    pub name: &'a str,
    pub calories: Option<i64>,
}

impl SampleSet {
    pub fn new(recipes: Vec<Document<Recipe>>) -> Self {
        Self { recipes }
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn recipes(&self) -> &[Document<Recipe>] {
        &self.recipes
    }

    /// Stored id of the recipe at `index`.
    ///
    /// Panics when `index >= len()`; indices reaching this point come from a
    /// validated `CandidatePlan` over this same sample.
    pub(crate) fn recipe_id(&self, index: usize) -> &str {
        &self.recipes[index].id
    }

    pub fn simplified(&self) -> Vec<SimplifiedRecipe<'_>> {
        self.recipes
            .iter()
            .enumerate()
            .map(|(index, doc)| SimplifiedRecipe {
                index,
                name: doc.body.name.trim(),
                calories: doc.body.calories.map(|c| c.round() as i64),
            })
            .collect()
    }
}

/// Draw at most `n` named recipes matching `filter`.
///
/// Fewer matches than `n` is not an error: every match is returned.
pub async fn sample_recipes<S>(
    store: &S,
    filter: &RecipeFilter,
    n: usize,
    rng: &mut (dyn RngCore + Send),
) -> Result<SampleSet, StoreError>
where
    S: RecipeStore + ?Sized,
{
    let chosen = store.sample(filter, n, rng).await?;
    debug!(requested = n, chosen = chosen.len(), "sampled recipes");
    Ok(SampleSet::new(chosen))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Database;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn recipe(name: &str, cuisine: &str, meal: &str, diet: &[&str]) -> Recipe {
        Recipe {
            name: name.to_string(),
            calories: Some(450.4),
            cuisine_type: cuisine.to_string(),
            meal_type: meal.to_string(),
            diet_labels: diet.iter().map(|d| d.to_string()).collect(),
            ..Default::default()
        }
    }

    fn database() -> Database {
        let mut recipes = Vec::new();
        for i in 0..12 {
            let cuisine = if i % 2 == 0 { "italian" } else { "mexican" };
            let meal = if i % 3 == 0 { "breakfast" } else { "lunch/dinner" };
            let diet: &[&str] = if i % 4 == 0 { &["Low-Carb"] } else { &["Balanced"] };
            recipes.push(recipe(&format!("Dish {}", i), cuisine, meal, diet));
        }
        recipes.push(recipe("   ", "italian", "lunch/dinner", &["Balanced"]));
        recipes.push(recipe("", "italian", "breakfast", &["Low-Carb"]));
        Database::with_recipes(recipes).unwrap()
    }

    #[tokio::test]
    async fn test_sample_never_exceeds_n_or_breaks_filters() {
        let db = database();
        let filters = [
            RecipeFilter::default(),
            RecipeFilter {
                cuisine_type: Some("Italian".to_string()),
                ..Default::default()
            },
            RecipeFilter {
                meal_type: Some("dinner".to_string()),
                diet_label: Some("balanced".to_string()),
                ..Default::default()
            },
            RecipeFilter {
                diet_label: Some("Low-Carb".to_string()),
                cuisine_type: Some("italian".to_string()),
                meal_type: Some("breakfast".to_string()),
            },
        ];
        let mut rng = StdRng::seed_from_u64(7);
        for filter in &filters {
            for n in [0, 1, 3, 5, 100] {
                let sample = sample_recipes(&db, filter, n, &mut rng).await.unwrap();
                assert!(sample.len() <= n);
                for doc in sample.recipes() {
                    assert!(filter.matches(&doc.body));
                    assert!(doc.body.has_name());
                }
                let ids: HashSet<&str> = sample.recipes().iter().map(|d| d.id.as_str()).collect();
                assert_eq!(ids.len(), sample.len(), "sampled with replacement");
            }
        }
    }

    #[tokio::test]
    async fn test_fewer_matches_than_requested_returns_all() {
        let db = database();
        let filter = RecipeFilter {
            diet_label: Some("Low-Carb".to_string()),
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let sample = sample_recipes(&db, &filter, 50, &mut rng).await.unwrap();
        // Dish 0, 4, 8; the unnamed low-carb recipe is excluded.
        assert_eq!(sample.len(), 3);
    }

    #[tokio::test]
    async fn test_no_matches_is_an_empty_sample() {
        let db = database();
        let filter = RecipeFilter {
            cuisine_type: Some("nordic".to_string()),
            ..Default::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let sample = sample_recipes(&db, &filter, 5, &mut rng).await.unwrap();
        assert!(sample.is_empty());
    }

    #[test]
    fn test_simplified_view_uses_positions() {
        let sample = SampleSet::new(vec![
            Document {
                id: "abc".to_string(),
                body: recipe(" Beef Wellington ", "british", "dinner", &[]),
            },
            Document {
                id: "def".to_string(),
                body: Recipe {
                    calories: None,
                    ..recipe("Seafood Linguine", "italian", "dinner", &[])
                },
            },
        ]);
        let simplified = sample.simplified();
        assert_eq!(
            simplified[0],
            SimplifiedRecipe {
                index: 0,
                name: "Beef Wellington",
                calories: Some(450)
            }
        );
        assert_eq!(simplified[1].index, 1);
        assert_eq!(simplified[1].calories, None);
        assert_eq!(sample.recipe_id(1), "def");
    }
}
