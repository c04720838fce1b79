use serde::{Deserialize, Serialize};

use super::{require_non_negative, Validate, ValidationError};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Ingredient {
    pub name: String,
    #[serde(default)]
    pub quantity: String,
    #[serde(default)]
    pub unit: String,
}

macro_rules! nutrient_map {
    ($($field:ident => $code:literal),+ $(,)?) => {
        /// Total nutrients for a whole recipe, keyed by nutrition-API code on the wire.
        #[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
        #[serde(default)]
        pub struct NutrientMap {
            $(
                #[serde(rename = $code)]
                pub $field: f64,
            )+
        }

        impl NutrientMap {
            /// Build a map by asking `lookup` for each code; `None` becomes 0.0.
            pub fn from_lookup(mut lookup: impl FnMut(&str) -> Option<f64>) -> Self {
                Self {
                    $($field: lookup($code).unwrap_or(0.0),)+
                }
            }

            pub fn get(&self, code: &str) -> Option<f64> {
                match code {
                    $($code => Some(self.$field),)+
                    _ => None,
                }
            }

            fn first_invalid(&self) -> Option<(&'static str, f64)> {
                $(
                    if !self.$field.is_finite() || self.$field < 0.0 {
                        return Some(($code, self.$field));
                    }
                )+
                None
            }
        }
    };
}

nutrient_map! {
    energy_kcal => "ENERC_KCAL",
    fat => "FAT",
    saturated_fat => "FASAT",
    trans_fat => "FATRN",
    monounsaturated_fat => "FAMS",
    polyunsaturated_fat => "FAPU",
    carbohydrate => "CHOCDF",
    fiber => "FIBTG",
    sugar => "SUGAR",
    protein => "PROCNT",
    cholesterol => "CHOLE",
    sodium => "NA",
    calcium => "CA",
    magnesium => "MG",
    potassium => "K",
    iron => "FE",
    zinc => "ZN",
    phosphorus => "P",
    vitamin_a => "VITA_RAE",
    vitamin_c => "VITC",
    vitamin_d => "VITD",
    vitamin_e => "TOCPHA",
    vitamin_k => "VITK1",
    water => "WATER",
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Recipe {
    #[serde(rename = "Recipe_Name", alias = "recipe_label", alias = "name")]
    pub name: String,
    pub calories: Option<f64>,
    #[serde(default)]
    pub cuisine_type: String,
    #[serde(default)]
    pub meal_type: String,
    #[serde(default)]
    pub diet_labels: Vec<String>,
    #[serde(default)]
    pub ingredients: Vec<Ingredient>,
    #[serde(default)]
    pub nutrients: NutrientMap,
}

impl Recipe {
    /// Recipes without a usable name are never offered to the model.
    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }

    pub fn has_diet_label(&self, label: &str) -> bool {
        let wanted = label.trim();
        self.diet_labels
            .iter()
            .any(|l| l.trim().eq_ignore_ascii_case(wanted))
    }

    /// `cuisine_type` may hold several comma-joined cuisines ("american, italian").
    pub fn is_cuisine(&self, cuisine: &str) -> bool {
        token_matches(&self.cuisine_type, &[','], cuisine)
    }

    /// `meal_type` may read "lunch/dinner" or "breakfast, brunch".
    pub fn is_meal_type(&self, meal_type: &str) -> bool {
        token_matches(&self.meal_type, &[',', '/'], meal_type)
    }
}

fn token_matches(haystack: &str, separators: &[char], wanted: &str) -> bool {
    let wanted = wanted.trim();
    haystack
        .split(separators)
        .any(|token| token.trim().eq_ignore_ascii_case(wanted))
}

impl Validate for Recipe {
    fn validate(&self) -> Result<(), ValidationError> {
        if let Some(calories) = self.calories {
            require_non_negative("calories", calories)?;
        }
        if let Some((code, value)) = self.nutrients.first_invalid() {
            return Err(ValidationError::new(
                "nutrients",
                format!("{} must be a finite non-negative number, got {}", code, value),
            ));
        }
        if self.ingredients.iter().any(|i| i.name.trim().is_empty()) {
            return Err(ValidationError::new("ingredients", "ingredient without a name"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recipe() -> Recipe {
        Recipe {
            name: "Shrimp Pad Thai".to_string(),
            calories: Some(812.5),
            cuisine_type: "asian, thai".to_string(),
            meal_type: "lunch/dinner".to_string(),
            diet_labels: vec!["High-Protein".to_string(), "Low-Fat".to_string()],
            ..Default::default()
        }
    }

    #[test]
    fn test_filters_are_case_insensitive_and_tokenized() {
        let r = recipe();
        assert!(r.is_cuisine("Thai"));
        assert!(r.is_cuisine("asian"));
        assert!(!r.is_cuisine("italian"));
        assert!(r.is_meal_type("dinner"));
        assert!(r.is_meal_type("LUNCH"));
        assert!(!r.is_meal_type("breakfast"));
        assert!(r.has_diet_label("low-fat"));
        assert!(!r.has_diet_label("Low-Carb"));
    }

    #[test]
    fn test_nutrient_map_wire_codes() {
        let map = NutrientMap::from_lookup(|code| match code {
            "ENERC_KCAL" => Some(500.0),
            "PROCNT" => Some(32.0),
            _ => None,
        });
        assert_eq!(map.energy_kcal, 500.0);
        assert_eq!(map.get("PROCNT"), Some(32.0));
        assert_eq!(map.get("FAT"), Some(0.0));
        assert_eq!(map.get("NOPE"), None);

        let value = serde_json::to_value(&map).unwrap();
        assert_eq!(value["ENERC_KCAL"], 500.0);
        assert_eq!(value["VITK1"], 0.0);
    }

    #[test]
    fn test_recipe_deserializes_ingestion_names() {
        let json = r#"{"recipe_label": "Mushroom Risotto", "calories": null, "cuisine_type": "italian",
                       "meal_type": "lunch/dinner", "nutrients": {"FAT": 12.5}}"#;
        let r: Recipe = serde_json::from_str(json).unwrap();
        assert_eq!(r.name, "Mushroom Risotto");
        assert_eq!(r.calories, None);
        assert_eq!(r.nutrients.fat, 12.5);
        assert!(r.diet_labels.is_empty());
    }

    #[test]
    fn test_validation_rejects_negative_values() {
        let mut r = recipe();
        assert!(r.validate().is_ok());

        r.calories = Some(-1.0);
        assert_eq!(r.validate().unwrap_err().field, "calories");

        let mut r = recipe();
        r.nutrients.sodium = f64::NAN;
        let err = r.validate().unwrap_err();
        assert_eq!(err.field, "nutrients");
        assert!(err.reason.contains("NA"));
    }
}
