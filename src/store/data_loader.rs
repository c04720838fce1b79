use anyhow::{anyhow, Context, Result};
use csv::{ReaderBuilder, StringRecord};
use std::path::Path;
use tracing::{debug, info};

use crate::models::{Ingredient, NutrientMap, Recipe};

const NAME_COL: &str = "Recipe_Name";
const NAME_COL_ALIAS: &str = "recipe_label";
const CALORIES_COL: &str = "calories";
const CUISINE_COL: &str = "cuisine_type";
const MEAL_TYPE_COL: &str = "meal_type";
const DIET_LABELS_COL: &str = "diet_labels";

/// The ingestion scripts write up to this many ingredient column triples.
pub const MAX_INGREDIENT_SLOTS: usize = 15;

fn parse_optional_f64(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

struct Columns {
    name: usize,
    calories: Option<usize>,
    cuisine: Option<usize>,
    meal_type: Option<usize>,
    diet_labels: Option<usize>,
    headers: StringRecord,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Result<Self> {
        let position = |wanted: &str| headers.iter().position(|h| h.trim() == wanted);
        let name = position(NAME_COL)
            .or_else(|| position(NAME_COL_ALIAS))
            .ok_or_else(|| anyhow!("Column '{}' not found", NAME_COL))?;
        Ok(Self {
            name,
            calories: position(CALORIES_COL),
            cuisine: position(CUISINE_COL),
            meal_type: position(MEAL_TYPE_COL),
            diet_labels: position(DIET_LABELS_COL),
            headers: headers.clone(),
        })
    }

    fn field<'r>(&self, record: &'r StringRecord, idx: Option<usize>) -> &'r str {
        idx.and_then(|i| record.get(i)).map(str::trim).unwrap_or("")
    }

    fn named<'r>(&self, record: &'r StringRecord, column: &str) -> &'r str {
        let idx = self.headers.iter().position(|h| h.trim() == column);
        self.field(record, idx)
    }

    fn to_recipe(&self, record: &StringRecord) -> Recipe {
        let ingredients = (1..=MAX_INGREDIENT_SLOTS)
            .filter_map(|slot| {
                let name = self.named(record, &format!("ingredient_{}_name", slot));
                if name.is_empty() {
                    return None;
                }
                Some(Ingredient {
                    name: name.to_string(),
                    quantity: self.named(record, &format!("ingredient_{}_quantity", slot)).to_string(),
                    unit: self.named(record, &format!("ingredient_{}_unit", slot)).to_string(),
                })
            })
            .collect();

        let diet_labels = self
            .field(record, self.diet_labels)
            .split(',')
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(str::to_string)
            .collect();

        Recipe {
            name: self.field(record, Some(self.name)).to_string(),
            calories: parse_optional_f64(self.field(record, self.calories)),
            cuisine_type: self.field(record, self.cuisine).to_string(),
            meal_type: self.field(record, self.meal_type).to_string(),
            diet_labels,
            ingredients,
            nutrients: NutrientMap::from_lookup(|code| parse_optional_f64(self.named(record, code))),
        }
    }
}

/// Load recipes from the CSV layout produced by the nutrition-API ingestion script.
///
/// Rows with an empty name are kept out of the result.
pub fn load_recipes_csv(csv_path: &Path) -> Result<Vec<Recipe>> {
    if !csv_path.exists() {
        return Err(anyhow!("Recipe CSV file not found at: {:?}", csv_path));
    }

    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open recipe CSV file at {:?}", csv_path))?;
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(file);

    let headers = rdr.headers()?.clone();
    let columns = Columns::from_headers(&headers)?;

    let mut recipes = Vec::new();
    for (row_index, result) in rdr.records().enumerate() {
        let record =
            result.with_context(|| format!("Failed to read record at row index {}", row_index))?;
        let recipe = columns.to_recipe(&record);
        if !recipe.has_name() {
            debug!(row_index, "skipping recipe row without a name");
            continue;
        }
        recipes.push(recipe);
    }

    if recipes.is_empty() {
        return Err(anyhow!("No valid recipes loaded from {:?}", csv_path));
    }

    info!(count = recipes.len(), path = ?csv_path, "loaded recipes");
    Ok(recipes)
}
