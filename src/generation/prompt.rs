//! Prompt construction for riddle generation.

use crate::topic::humanize_topic;

/// Builds the quiz prompt for `raw_topic`, asking for `num_riddles` items with
/// up to `num_incorrect_answers` wrong answers each.
pub fn riddle_prompt(raw_topic: &str, num_riddles: usize, num_incorrect_answers: usize) -> String {
    format!(
        "I want to quiz a friend on the topic of \"{topic}\". \
         Write {num_riddles} short questions whose answers are a word or a short phrase, \
         each with up to {num_incorrect_answers} other answers that are wrong but plausible. \
         Respond with only a JSON array of objects with the fields: \
         question, correctAnswer, incorrectAnswers, explanation, citationURL.",
        topic = humanize_topic(raw_topic),
    )
}
