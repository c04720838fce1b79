use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use super::{require_non_empty, Validate, ValidationError};

/// Daily macro targets, in kcal and grams.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct NutritionTarget {
    pub calories: u32,
    pub protein: u32,
    pub carbs: u32,
    pub fat: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct ScheduledDay {
    pub day: u32,
    pub breakfast: String,
    pub lunch: String,
    pub dinner: String,
}

impl ScheduledDay {
    pub fn recipe_ids(&self) -> [&str; 3] {
        [self.breakfast.as_str(), self.lunch.as_str(), self.dinner.as_str()]
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MealPlan {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub meals: Vec<String>,
    pub scheduled_dates: Vec<ScheduledDay>,
    pub target_nutrition: NutritionTarget,
    #[serde(default)]
    pub description: String,
}

impl Validate for MealPlan {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("userID", &self.user_id)?;
        if self.meals.iter().any(|id| id.trim().is_empty()) {
            return Err(ValidationError::new("meals", "empty recipe id"));
        }
        let mut seen = HashSet::new();
        for day in &self.scheduled_dates {
            if day.day == 0 || !seen.insert(day.day) {
                return Err(ValidationError::new(
                    "scheduledDates",
                    format!("day {} is zero or repeated", day.day),
                ));
            }
            if day.recipe_ids().iter().any(|id| id.trim().is_empty()) {
                return Err(ValidationError::new(
                    "scheduledDates",
                    format!("day {} has an empty slot", day.day),
                ));
            }
        }
        Ok(())
    }
}
