//! Per-riddle validation and cleanup.

use crate::types::Riddle;

/// Cleans a parsed riddle and rejects it when it cannot be asked.
///
/// Strings are trimmed. A riddle without a question or a correct answer is
/// dropped. Incorrect answers that are blank, repeat the correct answer, or
/// repeat each other are removed, then the list is capped.
#[derive(Debug, Clone, Default)]
pub struct RiddleValidator {
    max_incorrect_answers: Option<usize>,
}

impl RiddleValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_incorrect_answers(mut self, max: usize) -> Self {
        self.max_incorrect_answers = Some(max);
        self
    }

    pub fn validate(&self, riddle: Riddle) -> Option<Riddle> {
        let question = riddle.question.trim().to_string();
        let correct_answer = riddle.correct_answer.trim().to_string();
        if question.is_empty() || correct_answer.is_empty() {
            return None;
        }

        let mut incorrect_answers: Vec<String> = Vec::with_capacity(riddle.incorrect_answers.len());
        for answer in riddle.incorrect_answers {
            let answer = answer.trim();
            if answer.is_empty()
                || answer.eq_ignore_ascii_case(&correct_answer)
                || incorrect_answers.iter().any(|a| a.eq_ignore_ascii_case(answer))
            {
                continue;
            }
            incorrect_answers.push(answer.to_string());
        }
        if let Some(max) = self.max_incorrect_answers {
            incorrect_answers.truncate(max);
        }

        Some(Riddle {
            question,
            correct_answer,
            incorrect_answers,
            explanation: non_blank(riddle.explanation),
            citation_url: non_blank(riddle.citation_url),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
