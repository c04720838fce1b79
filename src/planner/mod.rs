//! Meal plan generation: sample recipes, ask the model for a plan over the
//! sample's positions, validate the reply, and resolve it to stored ids.

pub mod assembler;
pub mod parser;
pub mod requester;
pub mod sampler;

pub use assembler::assemble_meal_plan;
pub use parser::{normalize_response, parse_candidate_plan, CandidateDay, CandidatePlan};
pub use requester::{build_prompt, request_plan_text, PlanPreferences};
pub use sampler::{sample_recipes, SampleSet, SimplifiedRecipe};

use rand::RngCore;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::api_connection::{ApiConnectionError, TextGenerator};
use crate::config::PlannerConfig;
use crate::models::MealPlan;
use crate::store::{Database, Document, RecipeFilter, RecipeStore, StoreError};

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("text generation service unavailable: {0}")]
    ServiceUnavailable(#[from] ApiConnectionError),

    #[error("model response is not valid JSON: {0}")]
    ParseError(serde_json::Error),

    #[error("model response is missing required field '{0}'")]
    MissingField(&'static str),

    #[error("model response field '{field}' has the wrong shape: {reason}")]
    InvalidShape { field: &'static str, reason: String },

    #[error("{location} references recipe index {index}, but the sample holds {sample_size} recipes")]
    InvalidReference {
        location: String,
        index: i128,
        sample_size: usize,
    },

    #[error("expected a {expected}-day plan, model returned {actual} days")]
    HorizonMismatch { expected: usize, actual: usize },

    #[error("no recipes match the requested filters")]
    EmptySample,

    #[error("invalid plan request: {0} must be at least 1")]
    InvalidRequest(&'static str),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One meal plan request. Unset sizes fall back to the planner configuration.
#[derive(Debug, Clone, Default)]
pub struct PlanRequest {
    pub user_id: String,
    pub filter: RecipeFilter,
    pub preferences: PlanPreferences,
    pub sample_size: Option<usize>,
    pub days: Option<usize>,
    pub description: Option<String>,
}

/// Runs the sample, request, parse and assemble steps against injected
/// recipe storage and text generation.
#[derive(Clone)]
pub struct MealPlanner {
    store: Arc<dyn RecipeStore>,
    generator: Arc<dyn TextGenerator>,
    config: PlannerConfig,
}

impl std::fmt::Debug for MealPlanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MealPlanner")
            .field("generator", &self.generator)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MealPlanner {
    pub fn new(
        store: Arc<dyn RecipeStore>,
        generator: Arc<dyn TextGenerator>,
        config: PlannerConfig,
    ) -> Self {
        Self {
            store,
            generator,
            config,
        }
    }

    /// The sample `generate` would offer the model for `request`.
    pub async fn sample<R: RngCore + Send>(
        &self,
        request: &PlanRequest,
        rng: &mut R,
    ) -> Result<SampleSet, PlanError> {
        let n = request.sample_size.unwrap_or(self.config.sample_size);
        if n == 0 {
            return Err(PlanError::InvalidRequest("sample_size"));
        }
        Ok(sample_recipes(self.store.as_ref(), &request.filter, n, rng).await?)
    }

    /// Produce a validated meal plan for `request`. Nothing is persisted.
    pub async fn generate<R: RngCore + Send>(
        &self,
        request: &PlanRequest,
        rng: &mut R,
    ) -> Result<MealPlan, PlanError> {
        let days = request.days.unwrap_or(self.config.days);
        if days == 0 {
            return Err(PlanError::InvalidRequest("days"));
        }
        let sample = self.sample(request, rng).await?;
        if sample.is_empty() {
            warn!(filter = ?request.filter, "no recipes to plan with");
            return Err(PlanError::EmptySample);
        }
        info!(
            user_id = %request.user_id,
            sample_size = sample.len(),
            days,
            "generating meal plan"
        );

        let prompt = build_prompt(&sample, &request.preferences, days);
        let raw = request_plan_text(
            self.generator.as_ref(),
            &prompt,
            &self.config.generation,
            self.config.timeout,
        )
        .await?;

        let candidate = parse_candidate_plan(&raw, &sample, days).map_err(|e| {
            debug!(response = %raw, "rejected model response");
            e
        })?;

        let description = match &request.description {
            Some(description) => description.clone(),
            None => default_description(&request.preferences, days),
        };
        let plan = assemble_meal_plan(&candidate, &request.user_id, &description);
        info!(
            meals = plan.meals.len(),
            days = plan.scheduled_dates.len(),
            "meal plan assembled"
        );
        Ok(plan)
    }

    /// Generate a plan and store it in `db.meal_plans`.
    pub async fn generate_and_store<R: RngCore + Send>(
        &self,
        db: &Database,
        request: &PlanRequest,
        rng: &mut R,
    ) -> Result<Document<MealPlan>, PlanError> {
        let plan = self.generate(request, rng).await?;
        let id = db.meal_plans.insert(plan.clone())?;
        info!(meal_plan_id = %id, "meal plan stored");
        Ok(Document { id, body: plan })
    }
}

fn default_description(preferences: &PlanPreferences, days: usize) -> String {
    let goal = preferences.goal.trim();
    if goal.is_empty() {
        format!("{}-day meal plan", days)
    } else {
        format!("{}-day meal plan: {}", days, goal)
    }
}
