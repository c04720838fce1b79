use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use super::sampler::SampleSet;
use super::PlanError;
use crate::api_connection::{ApiConnectionError, GenerationOptions, Prompt, TextGenerator};
use crate::models::User;

/// Caller-supplied preferences. Nothing here is inferred by the planner.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlanPreferences {
    pub goal: String,
    pub cuisine_preference: Option<String>,
    pub restrictions: Vec<String>,
}

impl PlanPreferences {
    pub fn from_user(user: &User) -> Self {
        Self {
            goal: user.goal_summary(),
            ..Default::default()
        }
    }
}

const SYSTEM_PROMPT: &str = "/no_thinking
You are a meal planning assistant. You build multi-day meal plans using ONLY the recipes you are given.
Each recipe is identified by its integer \"index\". Never invent recipes or indices.

Return the output as a single JSON object. The JSON object must be the only content in your response.
Do not include any explanatory text, comments, or markdown formatting (like ```json) before or after it.
The JSON object must have exactly these top-level properties:
- \"meals\": an array of recipe indices (integers), listing every meal of the plan in schedule order
  (day 1 breakfast, day 1 lunch, day 1 dinner, day 2 breakfast, ...). Repeating an index is allowed.
- \"scheduledDates\": an array with one object per day. Each object has the integer properties
  \"day\" (1-based day number), \"breakfast\", \"lunch\" and \"dinner\" (recipe indices).
- \"targetNutrition\": an object with the integer properties \"calories\", \"protein\", \"carbs\" and \"fat\",
  giving the daily target in kcal and grams that fits the user's goal.

Example for a 1-day plan:
{\"meals\": [2, 0, 5], \"scheduledDates\": [{\"day\": 1, \"breakfast\": 2, \"lunch\": 0, \"dinner\": 5}],
 \"targetNutrition\": {\"calories\": 2000, \"protein\": 150, \"carbs\": 200, \"fat\": 70}}

Your response must start with { and end with }.";

/// Build the planning prompt for `sample` and `preferences` over `days` days.
pub fn build_prompt(sample: &SampleSet, preferences: &PlanPreferences, days: usize) -> Prompt {
    let recipes = json!(sample.simplified());
    let cuisine = preferences
        .cuisine_preference
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .unwrap_or("no preference");
    let restrictions = if preferences.restrictions.is_empty() {
        "none".to_string()
    } else {
        preferences.restrictions.join(", ")
    };

    let user = format!(
        "Goal: {goal}
Cuisine preference: {cuisine}
Allergens and dietary restrictions: {restrictions}
Plan length: {days} days. \"scheduledDates\" must contain exactly {days} entries numbered 1 to {days}.
Valid recipe indices are 0 to {last}.

Available recipes:
{recipes}
",
        goal = preferences.goal.trim(),
        cuisine = cuisine,
        restrictions = restrictions,
        days = days,
        last = sample.len().saturating_sub(1),
        recipes = recipes,
    );

    Prompt {
        system: SYSTEM_PROMPT.to_string(),
        user,
    }
}

/// Send `prompt` and return the raw model text.
///
/// Any provider failure, including running past `timeout`, is reported as
/// `ServiceUnavailable`. Nothing is retried here.
pub async fn request_plan_text(
    generator: &dyn TextGenerator,
    prompt: &Prompt,
    options: &GenerationOptions,
    timeout: Duration,
) -> Result<String, PlanError> {
    debug!(
        provider = generator.provider_name(),
        model = %options.model,
        prompt_chars = prompt.user.len(),
        "requesting meal plan"
    );
    let text = match tokio::time::timeout(timeout, generator.generate(prompt, options)).await {
        Ok(result) => result?,
        Err(_) => {
            warn!(?timeout, "meal plan request timed out");
            return Err(ApiConnectionError::Timeout(timeout).into());
        }
    };
    if text.trim().is_empty() {
        return Err(ApiConnectionError::EmptyResponse.into());
    }
    debug!(response_chars = text.len(), "received meal plan response");
    Ok(text)
}
