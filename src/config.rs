use anyhow::{bail, Context, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::api_connection::GenerationOptions;

pub const API_KEY_ENV_VAR: &str = "OPENROUTER_API_KEY";

const MODEL_VAR: &str = "PLANNER_MODEL";
const TIMEOUT_VAR: &str = "PLANNER_TIMEOUT_SECS";
const SAMPLE_SIZE_VAR: &str = "PLANNER_SAMPLE_SIZE";
const DAYS_VAR: &str = "PLANNER_DAYS";
const TEMPERATURE_VAR: &str = "PLANNER_TEMPERATURE";
const PROVIDERS_VAR: &str = "PLANNER_PROVIDERS";

/// Planner settings. Read once at startup; CLI flags may override them.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannerConfig {
    pub generation: GenerationOptions,
    pub timeout: Duration,
    /// Recipes offered to the model per request.
    pub sample_size: usize,
    /// Plan horizon in days.
    pub days: usize,
    pub api_key_env_var: String,
    /// Upstream providers to pin requests to; empty lets OpenRouter route.
    pub providers: Vec<String>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            generation: GenerationOptions::default(),
            timeout: Duration::from_secs(60),
            sample_size: 30,
            days: 7,
            api_key_env_var: API_KEY_ENV_VAR.to_string(),
            providers: Vec::new(),
        }
    }
}

impl PlannerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(model) = lookup(MODEL_VAR).filter(|m| !m.trim().is_empty()) {
            config.generation.model = model.trim().to_string();
        }
        if let Some(secs) = parse_var::<u64>(&lookup, TIMEOUT_VAR)? {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(n) = parse_var(&lookup, SAMPLE_SIZE_VAR)? {
            config.sample_size = n;
        }
        if let Some(days) = parse_var(&lookup, DAYS_VAR)? {
            config.days = days;
        }
        if let Some(temperature) = parse_var(&lookup, TEMPERATURE_VAR)? {
            config.generation.temperature = temperature;
        }
        if let Some(providers) = lookup(PROVIDERS_VAR) {
            config.providers = providers
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            bail!("{} must be greater than zero", TIMEOUT_VAR);
        }
        if self.sample_size == 0 {
            bail!("{} must be at least 1", SAMPLE_SIZE_VAR);
        }
        if self.days == 0 {
            bail!("{} must be at least 1", DAYS_VAR);
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            bail!(
                "{} must be between 0 and 2, got {}",
                TEMPERATURE_VAR,
                self.generation.temperature
            );
        }
        Ok(())
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("Invalid value for {}: '{}'", key, raw)),
        _ => Ok(None),
    }
}
