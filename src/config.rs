//! Runtime configuration.
//!
//! Loaded from YAML (every field optional) and then overridden from the
//! environment:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `RIDDLR_API_KEY` | `generation.api_key` |
//! | `RIDDLR_BASE_URL` | `generation.base_url` |
//! | `RIDDLR_MODEL` | `generation.model` |
//! | `RIDDLR_TIMEOUT_SECS` | `generation.timeout_secs` |

use crate::generation::{HarmBlockThreshold, SafetySetting};
use crate::structured::CandidatePolicy;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "models/text-bison-001";

pub const ENV_API_KEY: &str = "RIDDLR_API_KEY";
pub const ENV_BASE_URL: &str = "RIDDLR_BASE_URL";
pub const ENV_MODEL: &str = "RIDDLR_MODEL";
pub const ENV_TIMEOUT_SECS: &str = "RIDDLR_TIMEOUT_SECS";

/// Generation service connection and sampling parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub base_url: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    pub candidate_count: u32,
    pub safety_threshold: HarmBlockThreshold,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout_secs: 30,
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 2048,
            candidate_count: 1,
            safety_threshold: HarmBlockThreshold::BlockLowAndAbove,
        }
    }
}

impl GenerationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn safety_settings(&self) -> Vec<SafetySetting> {
        SafetySetting::all(self.safety_threshold)
    }
}

/// What to ask for and how to treat what comes back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiddleConfig {
    pub num_riddles: usize,
    pub num_incorrect_answers: usize,
    pub candidate_policy: CandidatePolicy,
    /// Persist a successful generation even when it yields no riddles.
    pub cache_empty_results: bool,
}

impl Default for RiddleConfig {
    fn default() -> Self {
        Self {
            num_riddles: 10,
            num_incorrect_answers: 4,
            candidate_policy: CandidatePolicy::Flatten,
            cache_empty_results: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RiddlrConfig {
    pub generation: GenerationConfig,
    pub riddles: RiddleConfig,
}

impl RiddlrConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    /// File (or defaults), then environment overrides, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        let config = config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(self) -> Result<Self> {
        self.apply_overrides_from(|name| std::env::var(name).ok())
    }

    /// Applies overrides from an arbitrary variable lookup.
    pub fn apply_overrides_from<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(ENV_API_KEY) {
            self.generation.api_key = Some(key);
        }
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.generation.base_url = url;
        }
        if let Some(model) = lookup(ENV_MODEL) {
            self.generation.model = model;
        }
        if let Some(raw) = lookup(ENV_TIMEOUT_SECS) {
            self.generation.timeout_secs = raw.trim().parse::<u64>().map_err(|_| {
                Error::configuration_with_context(
                    format!("{} must be a whole number of seconds, got {:?}", ENV_TIMEOUT_SECS, raw),
                    ErrorContext::new().with_field_path("generation.timeout_secs"),
                )
            })?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |field: &str, msg: String| {
            Err(Error::configuration_with_context(
                msg,
                ErrorContext::new().with_field_path(field),
            ))
        };
        let generation = &self.generation;
        if generation.model.trim().is_empty() {
            return invalid("generation.model", "model must not be empty".into());
        }
        if let Err(e) = url::Url::parse(&generation.base_url) {
            return invalid(
                "generation.base_url",
                format!("invalid URL {}: {}", generation.base_url, e),
            );
        }
        if generation.timeout_secs == 0 {
            return invalid("generation.timeout_secs", "timeout must be positive".into());
        }
        if !(0.0..=1.0).contains(&generation.temperature) {
            return invalid(
                "generation.temperature",
                format!("temperature must be within [0, 1], got {}", generation.temperature),
            );
        }
        if !(0.0..=1.0).contains(&generation.top_p) {
            return invalid(
                "generation.top_p",
                format!("top_p must be within [0, 1], got {}", generation.top_p),
            );
        }
        if !(1..=8).contains(&generation.candidate_count) {
            return invalid(
                "generation.candidate_count",
                format!("candidate_count must be within [1, 8], got {}", generation.candidate_count),
            );
        }
        if self.riddles.num_riddles == 0 {
            return invalid("riddles.num_riddles", "at least one riddle must be requested".into());
        }
        Ok(())
    }
}
