use serde::{Deserialize, Serialize};

use super::{require_non_empty, Validate, ValidationError};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub first_name: String,
    pub last_name: String,
    pub health_goal: String,
    pub calorie_goal: u32,
    pub protein_goal: u32,
    pub carbs_goal: u32,
    pub age: u32,
    pub sex: String,
    pub height: u32,
    pub weight: u32,
}

impl User {
    /// Goal text for the planning prompt, e.g. "lose weight (2000 kcal, 150 g protein, 100 g carbs per day)".
    pub fn goal_summary(&self) -> String {
        format!(
            "{} ({} kcal, {} g protein, {} g carbs per day)",
            self.health_goal.replace('_', " "),
            self.calorie_goal,
            self.protein_goal,
            self.carbs_goal
        )
    }
}

impl Validate for User {
    fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("firstName", &self.first_name)?;
        require_non_empty("lastName", &self.last_name)?;
        require_non_empty("healthGoal", &self.health_goal)?;
        Ok(())
    }
}
