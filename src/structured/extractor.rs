//! Turns raw generation candidates into a validated, deduplicated riddle list.

use super::dedup::dedup_riddles;
use super::error::RepairError;
use super::repair::RepairPipeline;
use super::validator::RiddleValidator;
use crate::types::Riddle;
use serde::{Deserialize, Serialize};

/// Which generation candidates contribute riddles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidatePolicy {
    /// Every candidate, flattened in candidate order, then deduplicated globally.
    #[default]
    Flatten,
    /// Only the first candidate.
    FirstOnly,
}

impl std::str::FromStr for CandidatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "flatten" => Ok(CandidatePolicy::Flatten),
            "first_only" | "first" => Ok(CandidatePolicy::FirstOnly),
            _ => Err(format!("Unknown candidate policy: {}", s)),
        }
    }
}

#[derive(Debug, Default)]
pub struct RiddleExtractor {
    pipeline: RepairPipeline,
    validator: RiddleValidator,
    policy: CandidatePolicy,
}

impl RiddleExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pipeline(mut self, pipeline: RepairPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn with_policy(mut self, policy: CandidatePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_max_incorrect_answers(mut self, max: usize) -> Self {
        self.validator = self.validator.with_max_incorrect_answers(max);
        self
    }

    pub fn policy(&self) -> CandidatePolicy {
        self.policy
    }

    /// Repairs, parses and validates one candidate's text.
    pub fn extract_candidate(&self, raw: &str) -> Result<Vec<Riddle>, RepairError> {
        Ok(self
            .pipeline
            .parse(raw)?
            .into_iter()
            .filter_map(|riddle| self.validator.validate(riddle))
            .collect())
    }

    /// Riddles from all selected candidates, deduplicated. Candidates that
    /// cannot be repaired are logged and skipped.
    pub fn extract<S: AsRef<str>>(&self, candidates: &[S]) -> Vec<Riddle> {
        let selected = match self.policy {
            CandidatePolicy::Flatten => candidates.len(),
            CandidatePolicy::FirstOnly => candidates.len().min(1),
        };
        let mut flattened = Vec::new();
        for (index, raw) in candidates.iter().take(selected).enumerate() {
            match self.extract_candidate(raw.as_ref()) {
                Ok(riddles) => {
                    tracing::debug!(candidate = index, riddles = riddles.len(), "extracted riddles");
                    flattened.extend(riddles);
                }
                Err(e) => {
                    tracing::warn!(candidate = index, error = %e, "no riddles extracted from candidate");
                }
            }
        }
        dedup_riddles(flattened)
    }
}
