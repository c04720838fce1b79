use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::store::RecipeFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Generate multi-day meal plans from a recipe collection", long_about = None)]
pub struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a meal plan and print it as JSON
    Generate(GenerateArgs),
    /// Print the recipe sample a plan request would offer the model
    Sample(SampleArgs),
}

/// Recipe filters shared by both subcommands.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    #[arg(long)]
    pub diet_label: Option<String>,

    #[arg(long)]
    pub cuisine_type: Option<String>,

    #[arg(long)]
    pub meal_type: Option<String>,
}

impl From<&FilterArgs> for RecipeFilter {
    fn from(args: &FilterArgs) -> Self {
        RecipeFilter {
            diet_label: args.diet_label.clone(),
            cuisine_type: args.cuisine_type.clone(),
            meal_type: args.meal_type.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Recipe CSV produced by the ingestion step
    #[arg(short, long)]
    pub recipes: PathBuf,

    #[command(flatten)]
    pub filter: FilterArgs,

    /// Recipes offered to the model (default: PLANNER_SAMPLE_SIZE or 30)
    #[arg(long)]
    pub sample_size: Option<usize>,

    /// Plan length in days (default: PLANNER_DAYS or 7)
    #[arg(long)]
    pub days: Option<usize>,

    /// Free-text goal, e.g. "lose weight"
    #[arg(long)]
    pub goal: Option<String>,

    #[arg(long)]
    pub cuisine_preference: Option<String>,

    /// Allergen or dietary restriction; repeat for several
    #[arg(long = "restriction")]
    pub restrictions: Vec<String>,

    /// User profile JSON; its goals are used when --goal is absent
    #[arg(long)]
    pub profile: Option<PathBuf>,

    /// Owner of the plan (default: the stored profile's id, else "local-user")
    #[arg(long)]
    pub user_id: Option<String>,

    /// Seed for reproducible recipe sampling
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Write the plan here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args, Debug)]
pub struct SampleArgs {
    #[arg(short, long)]
    pub recipes: PathBuf,

    #[command(flatten)]
    pub filter: FilterArgs,

    #[arg(long)]
    pub sample_size: Option<usize>,

    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn parse_args() -> Cli {
    Cli::parse()
}
