//! Text-generation service access.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`TextGenerator`] | Trait: send a prompt, receive raw candidate texts |
//! | [`GenerativeLanguageClient`] | HTTP implementation over `generateText` |
//! | [`GenerateTextRequest`] | Prompt plus sampling and safety parameters |
//! | [`riddle_prompt`] | Quiz prompt for a topic |

pub mod client;
pub mod prompt;
pub mod types;

pub use client::{GenerativeLanguageClient, GenerativeLanguageClientBuilder, TextGenerator};
pub use prompt::riddle_prompt;
pub use types::{
    GenerateTextRequest, GenerateTextResponse, HarmBlockThreshold, HarmCategory, SafetySetting,
    TextCompletion,
};

use crate::config::{GenerationConfig, RiddleConfig};

/// The request sent for `raw_topic` under the given configuration.
pub fn riddle_request(
    raw_topic: &str,
    generation: &GenerationConfig,
    riddles: &RiddleConfig,
) -> GenerateTextRequest {
    GenerateTextRequest {
        prompt: riddle_prompt(raw_topic, riddles.num_riddles, riddles.num_incorrect_answers),
        temperature: generation.temperature,
        top_k: generation.top_k,
        top_p: generation.top_p,
        max_output_tokens: generation.max_output_tokens,
        candidate_count: generation.candidate_count,
        safety_settings: generation.safety_settings(),
    }
}
