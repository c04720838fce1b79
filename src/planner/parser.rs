//! Validation of model output.
//!
//! The response text is treated like untrusted wire input: it is normalized,
//! parsed, checked key by key, and every recipe index is bounds-checked against
//! the sample it claims to reference. Nothing is defaulted or truncated.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Number, Value};
use std::collections::HashSet;

use super::sampler::SampleSet;
use super::PlanError;
use crate::models::NutritionTarget;

const MEALS_KEY: &str = "meals";
const SCHEDULE_KEY: &str = "scheduledDates";
const TARGET_KEY: &str = "targetNutrition";

/// One day of a validated plan, still expressed as sample positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateDay {
    pub day: u32,
    pub breakfast: usize,
    pub lunch: usize,
    pub dinner: usize,
}

/// A model plan whose indices are known to be valid for `sample`.
///
/// Only [`parse_candidate_plan`] constructs one, and it borrows the sample it
/// was checked against.
#[derive(Debug, Clone)]
pub struct CandidatePlan<'s> {
    sample: &'s SampleSet,
    meals: Vec<usize>,
    days: Vec<CandidateDay>,
    target_nutrition: NutritionTarget,
}

impl<'s> CandidatePlan<'s> {
    pub fn sample(&self) -> &'s SampleSet {
        self.sample
    }

    pub fn meals(&self) -> &[usize] {
        &self.meals
    }

    pub fn days(&self) -> &[CandidateDay] {
        &self.days
    }

    pub fn target_nutrition(&self) -> NutritionTarget {
        self.target_nutrition
    }
}

#[derive(Debug, Deserialize)]
struct RawDay {
    day: u32,
    breakfast: Number,
    lunch: Number,
    dinner: Number,
}

const THINK_OPEN: &str = "<think>";
const THINK_CLOSE: &str = "</think>";
const FENCE: &str = "```";

/// Strip the wrapping models put around JSON: reasoning blocks, code fences,
/// `//` comments outside strings and leading/trailing prose.
pub fn normalize_response(raw: &str) -> String {
    let mut text = raw.trim();

    if text.starts_with(THINK_OPEN) {
        if let Some(end) = text.find(THINK_CLOSE) {
            text = text[end + THINK_CLOSE.len()..].trim();
        }
    }

    if let Some(rest) = text.strip_prefix(FENCE) {
        // Drop the language tag ("json") on the opening fence.
        let body = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric());
        text = match body.find(FENCE) {
            Some(close) => &body[..close],
            None => body,
        }
        .trim();
    }

    let uncommented = text
        .lines()
        .map(strip_line_comment)
        .filter(|line| !line.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    match (uncommented.find('{'), uncommented.rfind('}')) {
        (Some(start), Some(end)) if start < end => uncommented[start..=end].to_string(),
        _ => uncommented.trim().to_string(),
    }
}

/// `line` up to the first `//` that is not inside a JSON string.
fn strip_line_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    let mut prev_slash = false;
    for (i, c) in line.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '/' if prev_slash => return &line[..i - 1],
            _ => {}
        }
        prev_slash = c == '/';
    }
    line
}

fn take_key<T: DeserializeOwned>(
    object: &mut Map<String, Value>,
    key: &'static str,
) -> Result<T, PlanError> {
    let value = object.remove(key).ok_or(PlanError::MissingField(key))?;
    serde_json::from_value(value).map_err(|e| PlanError::InvalidShape {
        field: key,
        reason: e.to_string(),
    })
}

fn check_index(
    value: &Number,
    field: &'static str,
    sample_size: usize,
    location: impl FnOnce() -> String,
) -> Result<usize, PlanError> {
    let index: i128 = if let Some(n) = value.as_u64() {
        n.into()
    } else if let Some(n) = value.as_i64() {
        n.into()
    } else {
        // Integers beyond 64 bits arrive as floats; anything else is not an index.
        match value.as_f64() {
            Some(f) if f.fract() == 0.0 && (f >= u64::MAX as f64 || f <= i64::MIN as f64) => {
                f as i128
            }
            _ => {
                return Err(PlanError::InvalidShape {
                    field,
                    reason: format!("recipe index must be an integer, got {}", value),
                })
            }
        }
    };

    usize::try_from(index)
        .ok()
        .filter(|&position| position < sample_size)
        .ok_or_else(|| PlanError::InvalidReference {
            location: location(),
            index,
            sample_size,
        })
}

/// Parse and validate a raw model response against `sample` for a plan of
/// `horizon` days.
pub fn parse_candidate_plan<'s>(
    raw: &str,
    sample: &'s SampleSet,
    horizon: usize,
) -> Result<CandidatePlan<'s>, PlanError> {
    let normalized = normalize_response(raw);
    let value: Value = serde_json::from_str(&normalized).map_err(PlanError::ParseError)?;
    let mut object = match value {
        Value::Object(object) => object,
        other => {
            return Err(PlanError::InvalidShape {
                field: "response",
                reason: format!("expected a JSON object, got {}", json_kind(&other)),
            })
        }
    };

    for key in [MEALS_KEY, SCHEDULE_KEY, TARGET_KEY] {
        if !object.contains_key(key) {
            return Err(PlanError::MissingField(key));
        }
    }
    let raw_meals: Vec<Number> = take_key(&mut object, MEALS_KEY)?;
    let raw_days: Vec<RawDay> = take_key(&mut object, SCHEDULE_KEY)?;
    let target_nutrition: NutritionTarget = take_key(&mut object, TARGET_KEY)?;

    let sample_size = sample.len();
    let meals = raw_meals
        .iter()
        .enumerate()
        .map(|(i, value)| {
            check_index(value, MEALS_KEY, sample_size, || format!("{}[{}]", MEALS_KEY, i))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let days = raw_days
        .iter()
        .enumerate()
        .map(|(i, raw)| -> Result<CandidateDay, PlanError> {
            let slot = |name: &str, value: &Number| {
                check_index(value, SCHEDULE_KEY, sample_size, || {
                    format!("{}[{}].{}", SCHEDULE_KEY, i, name)
                })
            };
            Ok(CandidateDay {
                day: raw.day,
                breakfast: slot("breakfast", &raw.breakfast)?,
                lunch: slot("lunch", &raw.lunch)?,
                dinner: slot("dinner", &raw.dinner)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if days.len() != horizon {
        return Err(PlanError::HorizonMismatch {
            expected: horizon,
            actual: days.len(),
        });
    }
    let mut seen = HashSet::new();
    for day in &days {
        let in_range = day.day >= 1 && (day.day as usize) <= horizon;
        if !in_range || !seen.insert(day.day) {
            return Err(PlanError::InvalidShape {
                field: SCHEDULE_KEY,
                reason: format!("day {} is out of range 1..={} or repeated", day.day, horizon),
            });
        }
    }

    Ok(CandidatePlan {
        sample,
        meals,
        days,
        target_nutrition,
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
