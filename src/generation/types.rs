//! Request and response types for the text-generation service.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Harm categories the service can filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmCategory {
    HarmCategoryDerogatory,
    HarmCategoryToxicity,
    HarmCategoryViolence,
    HarmCategorySexual,
    HarmCategoryMedical,
    HarmCategoryDangerous,
}

impl HarmCategory {
    pub const ALL: [HarmCategory; 6] = [
        HarmCategory::HarmCategoryDerogatory,
        HarmCategory::HarmCategoryToxicity,
        HarmCategory::HarmCategoryViolence,
        HarmCategory::HarmCategorySexual,
        HarmCategory::HarmCategoryMedical,
        HarmCategory::HarmCategoryDangerous,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    #[default]
    BlockLowAndAbove,
    BlockMediumAndAbove,
    BlockOnlyHigh,
    BlockNone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    pub category: HarmCategory,
    pub threshold: HarmBlockThreshold,
}

impl SafetySetting {
    /// One setting per harm category, all at `threshold`.
    pub fn all(threshold: HarmBlockThreshold) -> Vec<SafetySetting> {
        HarmCategory::ALL
            .iter()
            .map(|&category| SafetySetting {
                category,
                threshold,
            })
            .collect()
    }
}

/// A single prompt plus sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateTextRequest {
    pub prompt: String,
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    pub candidate_count: u32,
    pub safety_settings: Vec<SafetySetting>,
}

impl GenerateTextRequest {
    /// JSON body for the `generateText` endpoint.
    pub fn to_wire_body(&self) -> Value {
        let mut body = serde_json::json!({
            "prompt": { "text": self.prompt },
            "temperature": self.temperature,
            "topK": self.top_k,
            "topP": self.top_p,
            "maxOutputTokens": self.max_output_tokens,
            "candidateCount": self.candidate_count,
        });
        if !self.safety_settings.is_empty() {
            body["safetySettings"] = serde_json::json!(self.safety_settings);
        }
        body
    }
}

/// `generateText` response. Blocked prompts come back with no candidates.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateTextResponse {
    #[serde(default)]
    pub candidates: Vec<TextCompletion>,
    #[serde(default)]
    pub filters: Vec<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextCompletion {
    #[serde(default)]
    pub output: String,
}
