use meal_planner::api_connection::{ApiConnectionError, ScriptedGenerator};
use meal_planner::config::PlannerConfig;
use meal_planner::models::{NutritionTarget, Recipe};
use meal_planner::planner::{MealPlanner, PlanError, PlanPreferences, PlanRequest};
use meal_planner::store::{Database, RecipeFilter};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

const RECIPE_NAMES: [&str; 6] = [
    "Greek Yogurt Bowl with Honey and Nuts",
    "Cobb Salad with Avocado",
    "Beef Wellington",
    "Mango Smoothie Bowl",
    "Seafood Paella",
    "Chicken Biryani",
];

const SEVEN_DAY_PLAN: &str = r#"{
  "meals": [0, 1, 2, 3, 4, 5, 0, 1, 2, 3, 4, 5, 0, 1, 2, 3, 4, 5, 0, 4, 5],
  "scheduledDates": [
    {"day": 1, "breakfast": 0, "lunch": 1, "dinner": 2},
    {"day": 2, "breakfast": 3, "lunch": 4, "dinner": 5},
    {"day": 3, "breakfast": 0, "lunch": 1, "dinner": 2},
    {"day": 4, "breakfast": 3, "lunch": 4, "dinner": 5},
    {"day": 5, "breakfast": 0, "lunch": 1, "dinner": 2},
    {"day": 6, "breakfast": 3, "lunch": 4, "dinner": 5},
    {"day": 7, "breakfast": 0, "lunch": 4, "dinner": 5}
  ],
  "targetNutrition": {"calories": 2200, "protein": 160, "carbs": 220, "fat": 75}
}"#;

fn database() -> Arc<Database> {
    let recipes = RECIPE_NAMES.iter().enumerate().map(|(i, name)| Recipe {
        name: name.to_string(),
        calories: Some(300.0 + 50.0 * i as f64),
        diet_labels: vec!["Balanced".to_string()],
        ..Default::default()
    });
    Arc::new(Database::with_recipes(recipes).unwrap())
}

fn planner(db: &Arc<Database>, generator: &Arc<ScriptedGenerator>) -> MealPlanner {
    MealPlanner::new(db.clone(), generator.clone(), PlannerConfig::default())
}

fn request(sample_size: usize, days: usize) -> PlanRequest {
    PlanRequest {
        user_id: "user_0001".to_string(),
        filter: RecipeFilter {
            diet_label: Some("balanced".to_string()),
            ..Default::default()
        },
        preferences: PlanPreferences {
            goal: "build muscle".to_string(),
            cuisine_preference: None,
            restrictions: vec!["shellfish".to_string()],
        },
        sample_size: Some(sample_size),
        days: Some(days),
        description: Some("Week one".to_string()),
    }
}

/// Recipe names in the order the prompt presented them.
fn names_by_index(prompt: &str) -> Vec<String> {
    let start = prompt.find("Available recipes:").expect("recipe list missing") + "Available recipes:".len();
    let listed: Vec<Value> = serde_json::from_str(prompt[start..].trim()).unwrap();
    listed
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            assert_eq!(entry["index"], i);
            entry["name"].as_str().unwrap().to_string()
        })
        .collect()
}

#[tokio::test]
async fn test_seven_day_plan_end_to_end() {
    let db = database();
    let generator = Arc::new(ScriptedGenerator::with_response(SEVEN_DAY_PLAN));
    let planner = planner(&db, &generator);
    let mut rng = StdRng::seed_from_u64(42);

    let stored = planner
        .generate_and_store(&db, &request(6, 7), &mut rng)
        .await
        .unwrap();
    let plan = &stored.body;

    assert_eq!(plan.meals.len(), 21);
    assert_eq!(plan.scheduled_dates.len(), 7);
    assert_eq!(
        plan.target_nutrition,
        NutritionTarget {
            calories: 2200,
            protein: 160,
            carbs: 220,
            fat: 75
        }
    );
    assert_eq!(plan.user_id, "user_0001");
    assert_eq!(plan.description, "Week one");

    // Every index resolves to the recipe shown at that position in the prompt.
    let prompts = generator.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].user.contains("shellfish"));
    let names = names_by_index(&prompts[0].user);
    assert_eq!(names.len(), 6);
    let id_by_name: HashMap<String, String> = db
        .recipes
        .list()
        .into_iter()
        .map(|doc| (doc.body.name, doc.id))
        .collect();
    let expected_ids: Vec<&String> = [0, 1, 2, 3, 4, 5, 0, 1, 2, 3, 4, 5, 0, 1, 2, 3, 4, 5, 0, 4, 5]
        .iter()
        .map(|&i: &usize| &id_by_name[&names[i]])
        .collect();
    let actual_ids: Vec<&String> = plan.meals.iter().collect();
    assert_eq!(actual_ids, expected_ids);
    assert_eq!(plan.scheduled_dates[6].lunch, id_by_name[&names[4]]);

    assert_eq!(db.meal_plans.len(), 1);
    assert_eq!(db.meal_plans.get(&stored.id).unwrap().body, *plan);
}

#[tokio::test]
async fn test_fenced_response_with_reasoning_is_accepted() {
    let db = database();
    let fenced = format!(
        "<think>The user wants protein.</think>\nHere is the plan:\n```json\n{}\n```",
        SEVEN_DAY_PLAN
    );
    let generator = Arc::new(ScriptedGenerator::with_response(&fenced));
    let mut rng = StdRng::seed_from_u64(1);
    let plan = planner(&db, &generator)
        .generate(&request(6, 7), &mut rng)
        .await
        .unwrap();
    assert_eq!(plan.meals.len(), 21);
}

#[tokio::test]
async fn test_index_outside_sample_is_rejected() {
    let db = database();
    let generator = Arc::new(ScriptedGenerator::with_response(SEVEN_DAY_PLAN));
    let mut rng = StdRng::seed_from_u64(9);

    // Only four recipes are offered, so indices 4 and 5 are out of range.
    let result = planner(&db, &generator)
        .generate_and_store(&db, &request(4, 7), &mut rng)
        .await;
    match result {
        Err(PlanError::InvalidReference {
            index, sample_size, ..
        }) => {
            assert!(index >= 4);
            assert_eq!(sample_size, 4);
        }
        other => panic!("expected InvalidReference, got {:?}", other),
    }
    assert!(db.meal_plans.is_empty());
}

#[tokio::test]
async fn test_wrong_horizon_is_rejected() {
    let db = database();
    let generator = Arc::new(ScriptedGenerator::with_response(SEVEN_DAY_PLAN));
    let mut rng = StdRng::seed_from_u64(9);
    let result = planner(&db, &generator)
        .generate(&request(6, 5), &mut rng)
        .await;
    assert!(matches!(
        result,
        Err(PlanError::HorizonMismatch {
            expected: 5,
            actual: 7
        })
    ));
}

#[tokio::test]
async fn test_slow_provider_is_service_unavailable() {
    let db = database();
    let generator = Arc::new(
        ScriptedGenerator::with_response(SEVEN_DAY_PLAN).with_delay(Duration::from_millis(500)),
    );
    let config = PlannerConfig {
        timeout: Duration::from_millis(20),
        ..Default::default()
    };
    let planner = MealPlanner::new(db.clone(), generator.clone(), config);
    let mut rng = StdRng::seed_from_u64(9);
    let result = planner.generate(&request(6, 7), &mut rng).await;
    assert!(matches!(
        result,
        Err(PlanError::ServiceUnavailable(ApiConnectionError::Timeout(_)))
    ));
}

#[tokio::test]
async fn test_no_matching_recipes_never_calls_the_model() {
    let db = database();
    let generator = Arc::new(ScriptedGenerator::with_response(SEVEN_DAY_PLAN));
    let mut plan_request = request(6, 7);
    plan_request.filter.cuisine_type = Some("nordic".to_string());
    let mut rng = StdRng::seed_from_u64(9);

    let result = planner(&db, &generator)
        .generate(&plan_request, &mut rng)
        .await;
    assert!(matches!(result, Err(PlanError::EmptySample)));
    assert!(generator.prompts().is_empty());
}
