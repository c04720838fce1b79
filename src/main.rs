use anyhow::{bail, Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs;
use tracing::{info, warn};

use meal_planner::api_connection::OpenRouterClient;
use meal_planner::cli::{parse_args, Command, GenerateArgs, SampleArgs};
use meal_planner::config::PlannerConfig;
use meal_planner::logging::init_logging;
use meal_planner::models::{User, Validate};
use meal_planner::nutrition::{summarize_plan, target_deviation};
use meal_planner::planner::{sample_recipes, MealPlanner, PlanPreferences, PlanRequest};
use meal_planner::store::{Database, RecipeFilter};

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

fn load_database(path: &Path) -> Result<Arc<Database>> {
    let db = Database::from_recipe_csv(path)
        .with_context(|| format!("Failed to load recipes from {:?}", path))?;
    info!(recipes = db.recipes.len(), "recipe collection loaded");
    Ok(Arc::new(db))
}

async fn load_profile(db: &Database, path: &Path) -> Result<(String, User)> {
    let content = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read user profile '{}'", path.display()))?;
    let user: User = serde_json::from_str(&content)
        .with_context(|| format!("Invalid user profile '{}'", path.display()))?;
    user.validate()?;
    let id = db.users.insert(user.clone())?;
    Ok((id, user))
}

async fn generate(args: GenerateArgs, mut config: PlannerConfig) -> Result<()> {
    if let Some(secs) = args.timeout_secs {
        config.timeout = Duration::from_secs(secs);
    }
    config.validate()?;

    let db = load_database(&args.recipes)?;

    let profile = match &args.profile {
        Some(path) => Some(load_profile(&db, path).await?),
        None => None,
    };
    let mut preferences = match (&args.goal, &profile) {
        (Some(goal), _) => PlanPreferences {
            goal: goal.clone(),
            ..Default::default()
        },
        (None, Some((_, user))) => PlanPreferences::from_user(user),
        (None, None) => bail!("Either --goal or --profile is required"),
    };
    preferences.cuisine_preference = args.cuisine_preference.clone();
    preferences.restrictions = args.restrictions.clone();

    let user_id = args
        .user_id
        .clone()
        .or_else(|| profile.as_ref().map(|(id, _)| id.clone()))
        .unwrap_or_else(|| "local-user".to_string());

    let client = OpenRouterClient::from_env(&config.api_key_env_var)?
        .with_providers(config.providers.clone());
    let planner = MealPlanner::new(db.clone(), Arc::new(client), config);

    let request = PlanRequest {
        user_id,
        filter: RecipeFilter::from(&args.filter),
        preferences,
        sample_size: args.sample_size,
        days: args.days,
        description: args.description.clone(),
    };
    let mut rng = rng_from(args.seed);
    let stored = planner.generate_and_store(&db, &request, &mut rng).await?;

    let report = summarize_plan(&stored.body, |id| db.recipes.get(id).map(|doc| doc.body));
    if !report.unresolved.is_empty() {
        warn!(unresolved = ?report.unresolved, "plan references unknown recipes");
    }
    info!(
        daily_kcal = ?report.daily_average.kcal,
        daily_protein_g = ?report.daily_average.protein_g,
        deviation = target_deviation(&report.daily_average, &stored.body.target_nutrition),
        "plan nutrition against target"
    );

    let json = serde_json::to_string_pretty(&stored)?;
    match &args.output {
        Some(path) => {
            fs::write(path, json)
                .await
                .with_context(|| format!("Failed to write plan to '{}'", path.display()))?;
            info!(path = %path.display(), "meal plan written");
        }
        None => println!("{}", json),
    }
    Ok(())
}

async fn sample(args: SampleArgs, config: PlannerConfig) -> Result<()> {
    let db = load_database(&args.recipes)?;
    let mut rng = rng_from(args.seed);
    let n = args.sample_size.unwrap_or(config.sample_size);
    if n == 0 {
        bail!("--sample-size must be at least 1");
    }
    let filter = RecipeFilter::from(&args.filter);
    let sample = sample_recipes(db.as_ref(), &filter, n, &mut rng).await?;
    println!("{}", serde_json::to_string_pretty(&sample.simplified())?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = parse_args();
    init_logging(cli.verbose)?;
    let config = PlannerConfig::from_env()?;

    match cli.command {
        Command::Generate(args) => generate(args, config).await,
        Command::Sample(args) => sample(args, config).await,
    }
}
