use serde::Serialize;

use crate::models::{MealPlan, NutritionTarget, Recipe};

/// Macro totals; `None` means no recipe contributed a value.
#[derive(Debug, Serialize, Default, Clone, Copy, PartialEq)]
pub struct NutritionalSummary {
    pub kcal: Option<f64>,
    pub protein_g: Option<f64>,
    pub carbohydrate_g: Option<f64>,
    pub fat_g: Option<f64>,
}

impl NutritionalSummary {
    fn add_recipe(&mut self, recipe: &Recipe) {
        let kcal = recipe
            .calories
            .or(Some(recipe.nutrients.energy_kcal))
            .filter(|v| *v > 0.0);
        add_optional(&mut self.kcal, kcal);
        add_optional(&mut self.protein_g, Some(recipe.nutrients.protein));
        add_optional(&mut self.carbohydrate_g, Some(recipe.nutrients.carbohydrate));
        add_optional(&mut self.fat_g, Some(recipe.nutrients.fat));
    }

    fn scaled(&self, factor: f64) -> Self {
        Self {
            kcal: self.kcal.map(|v| v * factor),
            protein_g: self.protein_g.map(|v| v * factor),
            carbohydrate_g: self.carbohydrate_g.map(|v| v * factor),
            fat_g: self.fat_g.map(|v| v * factor),
        }
    }
}

fn add_optional(total: &mut Option<f64>, value: Option<f64>) {
    if let Some(value) = value {
        *total = Some(total.unwrap_or(0.0) + value);
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PlanNutritionSummary {
    pub days: usize,
    /// Scheduled recipe ids the lookup could not resolve.
    pub unresolved: Vec<String>,
    pub daily_average: NutritionalSummary,
}

/// Average daily macros of `plan`'s schedule, resolving ids through `lookup`.
pub fn summarize_plan(
    plan: &MealPlan,
    lookup: impl Fn(&str) -> Option<Recipe>,
) -> PlanNutritionSummary {
    let mut total = NutritionalSummary::default();
    let mut unresolved = Vec::new();

    for day in &plan.scheduled_dates {
        for id in day.recipe_ids() {
            match lookup(id) {
                Some(recipe) => total.add_recipe(&recipe),
                None => unresolved.push(id.to_string()),
            }
        }
    }

    let days = plan.scheduled_dates.len();
    let daily_average = if days == 0 {
        NutritionalSummary::default()
    } else {
        total.scaled(1.0 / days as f64)
    };

    PlanNutritionSummary {
        days,
        unresolved,
        daily_average,
    }
}

/// Mean squared error between `summary` and `target` over the macros both
/// sides have. Calorie error is scaled down by 100. Returns 0.0 when nothing
/// is comparable.
pub fn target_deviation(summary: &NutritionalSummary, target: &NutritionTarget) -> f64 {
    let pairs = [
        (summary.protein_g, target.protein, 1.0),
        (summary.carbohydrate_g, target.carbs, 1.0),
        (summary.fat_g, target.fat, 1.0),
        (summary.kcal, target.calories, 100.0),
    ];

    let mut squared_error_sum = 0.0;
    let mut count = 0;
    for (current, goal, scale) in pairs {
        if let Some(current) = current {
            squared_error_sum += (current - goal as f64).powi(2) / scale;
            count += 1;
        }
    }

    if count == 0 {
        0.0
    } else {
        squared_error_sum / count as f64
    }
}
