use super::parser::CandidatePlan;
use crate::models::{MealPlan, ScheduledDay};

/// Replace every sample position in `candidate` with the stored recipe id.
///
/// Order and repetition are preserved exactly; target nutrition is copied as-is.
pub fn assemble_meal_plan(
    candidate: &CandidatePlan<'_>,
    user_id: &str,
    description: &str,
) -> MealPlan {
    let sample = candidate.sample();
    let id = |index: usize| sample.recipe_id(index).to_string();

    MealPlan {
        user_id: user_id.to_string(),
        meals: candidate.meals().iter().map(|&index| id(index)).collect(),
        scheduled_dates: candidate
            .days()
            .iter()
            .map(|day| ScheduledDay {
                day: day.day,
                breakfast: id(day.breakfast),
                lunch: id(day.lunch),
                dinner: id(day.dinner),
            })
            .collect(),
        target_nutrition: candidate.target_nutrition(),
        description: description.to_string(),
    }
}
