//! Single-pass riddle deduplication.

use crate::types::Riddle;
use std::collections::HashSet;

/// Keeps a riddle only if neither its question nor its correct answer has been
/// kept before.
///
/// Order is preserved and there is no backtracking, so among riddles sharing a
/// question or an answer the first one encountered wins. Only kept riddles mark
/// their question and answer as seen.
pub fn dedup_riddles<I>(riddles: I) -> Vec<Riddle>
where
    I: IntoIterator<Item = Riddle>,
{
    let mut seen_questions: HashSet<String> = HashSet::new();
    let mut seen_answers: HashSet<String> = HashSet::new();
    let mut kept = Vec::new();
    for riddle in riddles {
        if seen_questions.contains(&riddle.question) || seen_answers.contains(&riddle.correct_answer) {
            tracing::trace!(question = %riddle.question, "dropping duplicate riddle");
            continue;
        }
        seen_questions.insert(riddle.question.clone());
        seen_answers.insert(riddle.correct_answer.clone());
        kept.push(riddle);
    }
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn questions(riddles: &[Riddle]) -> Vec<&str> {
        riddles.iter().map(|r| r.question.as_str()).collect()
    }

    #[test]
    fn test_first_occurrence_wins() {
        let riddles = vec![
            Riddle::new("Q1", "A1"),
            Riddle::new("Q1", "A2"),
            Riddle::new("Q2", "A1"),
            Riddle::new("Q3", "A3"),
        ];
        assert_eq!(questions(&dedup_riddles(riddles)), vec!["Q1", "Q3"]);
    }

    #[test]
    fn test_rejected_riddles_do_not_block_later_ones() {
        // Q2/A1 is rejected for its answer; Q2 stays available.
        let riddles = vec![
            Riddle::new("Q1", "A1"),
            Riddle::new("Q2", "A1"),
            Riddle::new("Q2", "A2"),
        ];
        assert_eq!(questions(&dedup_riddles(riddles)), vec!["Q1", "Q2"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(dedup_riddles(Vec::new()).is_empty());
    }
}
